//! Who may credit (mint) points.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use pointsledger_core::Address;

/// Authorization policy for `credit`.
///
/// `Open` lets any caller credit any account. `Restricted` limits crediting
/// to an explicit minter set. The default is `Open`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum MintPolicy {
    #[default]
    Open,
    Restricted { minters: BTreeSet<Address> },
}

impl MintPolicy {
    pub fn restricted(minters: impl IntoIterator<Item = Address>) -> Self {
        Self::Restricted {
            minters: minters.into_iter().collect(),
        }
    }

    pub fn allows(&self, caller: &Address) -> bool {
        match self {
            MintPolicy::Open => true,
            MintPolicy::Restricted { minters } => minters.contains(caller),
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, MintPolicy::Open)
    }
}
