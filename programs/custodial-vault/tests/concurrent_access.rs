use std::thread;

use anchor_lang::prelude::Pubkey;
use custodial_vault::authority::SignerSet;
use custodial_vault::derivation::vault_address;
use custodial_vault::events::VaultEvent;
use custodial_vault::ledger::{Ledger, LedgerConfig};
use custodial_vault::VaultError;

fn key(byte: u8) -> Pubkey {
    Pubkey::new_from_array([byte; 32])
}

#[test]
fn concurrent_initialize_creates_exactly_one_vault() {
    let ledger = Ledger::default();
    let alice = key(1);
    let vault = vault_address(&alice);
    ledger.fund(&alice, 1_000_000_000).unwrap();

    let results: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let ledger = &ledger;
                scope.spawn(move || {
                    ledger.init_vault(&SignerSet::single(alice), &alice, &vault, i % 2 == 0)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let created = results.iter().filter(|r| r.is_ok()).count();
    let rejected = results
        .iter()
        .filter(|r| **r == Err(VaultError::AlreadyExists))
        .count();
    assert_eq!(created, 1);
    assert_eq!(rejected, 7);
    assert_eq!(ledger.events().len(), 1);
    assert_eq!(
        ledger.lamports(&alice) + ledger.lamports(&vault),
        1_000_000_000
    );
}

#[test]
fn concurrent_deposits_and_withdrawals_conserve_lamports() {
    let ledger = Ledger::new(LedgerConfig::unreserved());
    let owner = key(1);
    let vault = vault_address(&owner);
    ledger
        .init_vault(&SignerSet::single(owner), &owner, &vault, false)
        .unwrap();

    let depositors: Vec<Pubkey> = (10..18).map(key).collect();
    for depositor in &depositors {
        ledger.fund(depositor, 1_000).unwrap();
    }

    thread::scope(|scope| {
        for depositor in &depositors {
            let ledger = &ledger;
            scope.spawn(move || {
                for _ in 0..100 {
                    ledger
                        .deposit(&SignerSet::single(*depositor), depositor, &vault, 10)
                        .unwrap();
                }
            });
        }
        let ledger = &ledger;
        scope.spawn(move || {
            let signers = SignerSet::single(owner);
            let mut withdrawn = 0;
            while withdrawn < 4_000 {
                match ledger.withdraw(&signers, &owner, &vault, 10) {
                    Ok(_) => withdrawn += 10,
                    Err(VaultError::InsufficientBalance) => thread::yield_now(),
                    Err(other) => panic!("unexpected rejection: {other:?}"),
                }
            }
        });
    });

    for depositor in &depositors {
        assert_eq!(ledger.lamports(depositor), 0);
    }
    assert_eq!(ledger.lamports(&owner), 4_000);
    assert_eq!(ledger.vault_balance(&vault), Some(4_000));

    let deposits = ledger
        .events()
        .iter()
        .filter(|event| matches!(event, VaultEvent::Deposited(_)))
        .count();
    assert_eq!(deposits, 800);
}

#[test]
fn independent_vaults_do_not_interfere() {
    let ledger = Ledger::new(LedgerConfig::unreserved());
    let owners: Vec<Pubkey> = (1..9).map(key).collect();

    thread::scope(|scope| {
        for owner in &owners {
            let ledger = &ledger;
            scope.spawn(move || {
                let signers = SignerSet::single(*owner);
                let vault = vault_address(owner);
                ledger.fund(owner, 500).unwrap();
                ledger.init_vault(&signers, owner, &vault, false).unwrap();
                ledger.deposit(&signers, owner, &vault, 500).unwrap();
                ledger.toggle_lock(&signers, owner, &vault).unwrap();
                ledger.toggle_lock(&signers, owner, &vault).unwrap();
                ledger.withdraw(&signers, owner, &vault, 200).unwrap();
            });
        }
    });

    for owner in &owners {
        let vault = vault_address(owner);
        assert_eq!(ledger.lamports(owner), 200);
        assert_eq!(ledger.vault_balance(&vault), Some(300));
        assert!(!ledger.vault(&vault).unwrap().locked);
    }
    assert_eq!(ledger.events().len(), owners.len() * 5);
}
