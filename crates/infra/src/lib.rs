//! Infrastructure layer: hosting the ledger in a process that does not
//! serialize calls for us, plus journaling, snapshots and config.

pub mod config;
pub mod journal;
pub mod ledger_service;
pub mod snapshot;


pub use config::{ConfigError, LedgerConfig};
pub use journal::EventJournal;
pub use ledger_service::{LedgerService, ServiceError};
pub use snapshot::{LedgerSnapshot, SnapshotError};
