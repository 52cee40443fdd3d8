use proptest::prelude::*;

use pointsledger_core::{Address, Aggregate, AggregateRoot, LedgerId};
use pointsledger_ledger::{
    CreditPoints, DebitPoints, ExecutionContext, Ledger, LedgerCommand, LedgerError,
    TransferPoints, MAX_BALANCE,
};

fn ctx(caller: Address) -> ExecutionContext {
    ExecutionContext::now(caller)
}

fn addr() -> impl Strategy<Value = Address> {
    (0u64..8).prop_map(Address::from_low_u64)
}

fn command() -> impl Strategy<Value = LedgerCommand> {
    prop_oneof![
        (addr(), addr(), 0u64..1_000_000).prop_map(|(caller, user, amount)| {
            LedgerCommand::Credit(CreditPoints {
                context: ctx(caller),
                user,
                amount,
            })
        }),
        (addr(), 0u64..1_000_000).prop_map(|(caller, amount)| {
            LedgerCommand::Debit(DebitPoints {
                context: ctx(caller),
                amount,
            })
        }),
        (addr(), addr(), 0u64..1_000_000).prop_map(|(caller, recipient, amount)| {
            LedgerCommand::Transfer(TransferPoints {
                context: ctx(caller),
                recipient,
                amount,
            })
        }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        ..ProptestConfig::default()
    })]

    /// Two credits accumulate to their sum.
    #[test]
    fn credits_accumulate(user in addr(), a in 0u64..u32::MAX as u64, b in 0u64..u32::MAX as u64) {
        let mut ledger = Ledger::empty(LedgerId::new());
        ledger.credit(ctx(user), user, a).unwrap();
        ledger.credit(ctx(user), user, b).unwrap();
        prop_assert_eq!(ledger.balance_of(&user), a + b);
    }

    /// Debiting the whole balance leaves zero.
    #[test]
    fn debit_full_balance_drains(user in addr(), a in 0u64..=MAX_BALANCE) {
        let mut ledger = Ledger::empty(LedgerId::new());
        ledger.credit(ctx(user), user, a).unwrap();
        ledger.debit(ctx(user), a).unwrap();
        prop_assert_eq!(ledger.balance_of(&user), 0);
    }

    /// Debiting one more than the balance fails and changes nothing.
    #[test]
    fn debit_past_balance_fails(user in addr(), a in 0u64..MAX_BALANCE) {
        let mut ledger = Ledger::empty(LedgerId::new());
        ledger.credit(ctx(user), user, a).unwrap();
        let err = ledger.debit(ctx(user), a + 1).unwrap_err();
        prop_assert_eq!(err, LedgerError::InsufficientBalance { available: a, requested: a + 1 });
        prop_assert_eq!(ledger.balance_of(&user), a);
        prop_assert_eq!(ledger.version(), 1);
    }

    /// Self-transfer always fails, whatever the balance or amount.
    #[test]
    fn self_transfer_always_fails(user in addr(), funded in 0u64..1_000, amount in any::<u64>()) {
        let mut ledger = Ledger::empty(LedgerId::new());
        ledger.credit(ctx(user), user, funded).unwrap();
        let before = ledger.clone();
        let err = ledger.transfer(ctx(user), user, amount).unwrap_err();
        prop_assert_eq!(err, LedgerError::SelfTransferNotAllowed);
        prop_assert_eq!(ledger, before);
    }

    /// A valid transfer preserves the sum of the two balances involved.
    #[test]
    fn transfer_conserves_pair_sum(
        from_funds in 0u64..1_000_000,
        to_funds in 0u64..1_000_000,
        amount in 0u64..1_000_000,
    ) {
        let from = Address::from_low_u64(1);
        let to = Address::from_low_u64(2);
        let mut ledger = Ledger::empty(LedgerId::new());
        ledger.credit(ctx(from), from, from_funds).unwrap();
        ledger.credit(ctx(from), to, to_funds).unwrap();

        let before = u128::from(ledger.balance_of(&from)) + u128::from(ledger.balance_of(&to));
        match ledger.transfer(ctx(from), to, amount) {
            Ok(ev) => {
                let after = u128::from(ev.from_balance) + u128::from(ev.to_balance);
                prop_assert_eq!(before, after);
            }
            Err(err) => {
                prop_assert!(amount > from_funds);
                prop_assert!(matches!(err, LedgerError::InsufficientBalance { .. }), "unexpected error");
            }
        }
    }

    /// Reads are idempotent and never bump the version.
    #[test]
    fn reads_are_idempotent(user in addr(), funded in 0u64..1_000) {
        let mut ledger = Ledger::empty(LedgerId::new());
        ledger.credit(ctx(user), user, funded).unwrap();
        let v = ledger.version();
        prop_assert_eq!(ledger.balance_of(&user), ledger.balance_of(&user));
        prop_assert_eq!(ledger.version(), v);
    }

    /// Over any command sequence, supply moves only by credited/debited
    /// amounts, and failed commands leave the ledger byte-for-byte unchanged.
    #[test]
    fn supply_tracks_credits_and_debits(commands in prop::collection::vec(command(), 1..40)) {
        let mut ledger = Ledger::empty(LedgerId::new());
        let mut expected: u128 = 0;

        for cmd in &commands {
            let before = ledger.clone();
            match ledger.handle(cmd) {
                Ok(events) => {
                    prop_assert_eq!(events.len(), 1);
                    for ev in &events {
                        ledger.apply(ev);
                    }
                    match cmd {
                        LedgerCommand::Credit(c) => expected += u128::from(c.amount),
                        LedgerCommand::Debit(d) => expected -= u128::from(d.amount),
                        LedgerCommand::Transfer(_) => {}
                    }
                }
                Err(_) => prop_assert_eq!(&ledger, &before),
            }
            prop_assert_eq!(ledger.total_supply(), expected);
        }
    }
}

#[test]
fn scenario_from_reference_walkthrough() {
    let alice = Address::from_low_u64(0xA11CE);
    let bob = Address::from_low_u64(0xB0B);
    let mut ledger = Ledger::empty(LedgerId::new());

    ledger.credit(ctx(alice), alice, 100).unwrap();
    assert_eq!(ledger.balance_of(&alice), 100);

    let ev = ledger.transfer(ctx(alice), bob, 40).unwrap();
    assert_eq!((ev.from_balance, ev.to_balance), (60, 40));
    assert_eq!(ledger.version(), 2);

    assert!(matches!(
        ledger.debit(ctx(alice), 61),
        Err(LedgerError::InsufficientBalance { .. })
    ));
    assert_eq!(ledger.balance_of(&alice), 60);

    assert!(matches!(
        ledger.credit(ctx(alice), bob, MAX_BALANCE),
        Err(LedgerError::Overflow { .. })
    ));
    assert_eq!(ledger.balance_of(&bob), 40);
    assert_eq!(ledger.version(), 2);
}
