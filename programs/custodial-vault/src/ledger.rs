//! In-memory host for the vault rules.
//!
//! Models the parts of the Solana account store the program relies on:
//! lamport balances per key, one `Vault` record per vault address,
//! transaction-scoped atomicity and per-account write locks. Every operation
//! runs the same authority and fund checks as the on-chain instructions and
//! returns the event the program would have emitted.
//!
//! Locking: each account has its own `Mutex`. An operation locks every
//! account it touches, in ascending key order, and holds the locks until it
//! has either committed all of its writes or returned an error without
//! writing. Operations on the same vault are therefore totally ordered while
//! operations on unrelated vaults never wait on each other.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use anchor_lang::prelude::*;

use crate::authority::{self, SignerSet};
use crate::derivation;
use crate::errors::VaultError;
use crate::events::{Deposited, LockToggled, VaultEvent, VaultInitialized, Withdrawn};
use crate::funds::{self, ReservePolicy};
use crate::state::Vault;

type LedgerResult<T> = std::result::Result<T, VaultError>;

#[derive(Clone, Debug, PartialEq)]
pub struct LedgerConfig {
    /// Whether vaults keep a rent-exempt reserve out of their balance
    pub reserve_policy: ReservePolicy,
    /// Rent parameters the reserve is computed from
    pub rent: Rent,
}

impl LedgerConfig {
    pub fn unreserved() -> Self {
        Self {
            reserve_policy: ReservePolicy::Unreserved,
            ..Self::default()
        }
    }

    pub fn vault_reserve(&self) -> u64 {
        self.reserve_policy.reserve(&self.rent, Vault::LEN)
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            reserve_policy: ReservePolicy::default(),
            rent: Rent::default(),
        }
    }
}

/// Everything the ledger stores under one key
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LedgerAccount {
    pub lamports: u64,
    pub vault: Option<Vault>,
}

type Slot = Arc<Mutex<LedgerAccount>>;

pub struct Ledger {
    config: LedgerConfig,
    accounts: RwLock<HashMap<Pubkey, Slot>>,
    events: Mutex<Vec<VaultEvent>>,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(LedgerConfig::default())
    }
}

impl Ledger {
    pub fn new(config: LedgerConfig) -> Self {
        Self {
            config,
            accounts: RwLock::new(HashMap::new()),
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Credit `lamports` to `key` from outside the vault system (airdrop).
    /// Returns the new balance.
    pub fn fund(&self, key: &Pubkey, lamports: u64) -> LedgerResult<u64> {
        let slot = self.slot(key);
        let mut account = lock(&slot);
        account.lamports = account
            .lamports
            .checked_add(lamports)
            .ok_or(VaultError::InvalidAmount)?;
        Ok(account.lamports)
    }

    /// Total lamports held by `key`, reserve included
    pub fn lamports(&self, key: &Pubkey) -> u64 {
        match self.existing_slot(key) {
            Some(slot) => {
                let account = lock(&slot);
                account.lamports
            }
            None => 0,
        }
    }

    pub fn vault(&self, address: &Pubkey) -> Option<Vault> {
        let slot = self.existing_slot(address)?;
        let account = lock(&slot);
        account.vault.clone()
    }

    /// Vault-visible balance (lamports above the reserve), `None` if there
    /// is no vault at `address`
    pub fn vault_balance(&self, address: &Pubkey) -> Option<u64> {
        let slot = self.existing_slot(address)?;
        let account = lock(&slot);
        account
            .vault
            .as_ref()
            .map(|_| funds::available(account.lamports, self.config.vault_reserve()))
    }

    /// Committed events, oldest first
    pub fn events(&self) -> Vec<VaultEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn take_events(&self) -> Vec<VaultEvent> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Create `authority`'s vault at `vault_address`.
    ///
    /// The authority pays the reserve; it never counts as vault balance.
    pub fn init_vault(
        &self,
        signers: &SignerSet,
        authority: &Pubkey,
        vault_address: &Pubkey,
        locked: bool,
    ) -> LedgerResult<VaultEvent> {
        authority::authorize_creator(signers, authority, vault_address)?;
        let reserve = self.config.vault_reserve();

        self.transact(
            vault_address,
            authority,
            |vault_account, payer| -> LedgerResult<VaultEvent> {
                let payer = payer.ok_or(VaultError::Unauthorized)?;
                if vault_account.vault.is_some() {
                    return Err(VaultError::AlreadyExists);
                }

                let top_up = reserve.saturating_sub(vault_account.lamports);
                let payer_after = payer
                    .lamports
                    .checked_sub(top_up)
                    .ok_or(VaultError::InsufficientBalance)?;
                let vault_after = vault_account
                    .lamports
                    .checked_add(top_up)
                    .ok_or(VaultError::InvalidAmount)?;

                payer.lamports = payer_after;
                vault_account.lamports = vault_after;
                vault_account.vault = Some(Vault::new(*authority, locked));

                Ok(VaultEvent::Initialized(VaultInitialized {
                    vault: *vault_address,
                    vault_authority: *authority,
                    locked,
                }))
            },
        )
    }

    /// Move `amount` from `depositor` into the vault at `vault_address`
    pub fn deposit(
        &self,
        signers: &SignerSet,
        depositor: &Pubkey,
        vault_address: &Pubkey,
        amount: u64,
    ) -> LedgerResult<VaultEvent> {
        self.transact(
            vault_address,
            depositor,
            |vault_account, depositor_account| -> LedgerResult<VaultEvent> {
                let vault = load(vault_address, vault_account)?;
                // A vault address is a PDA and can never sign for itself
                let depositor_account = depositor_account.ok_or(VaultError::Unauthorized)?;
                authority::require_signer(signers, depositor)?;

                let movement = funds::plan_deposit(
                    &vault,
                    amount,
                    depositor_account.lamports,
                    vault_account.lamports,
                )?;

                depositor_account.lamports = movement.source_after;
                vault_account.lamports = movement.destination_after;

                Ok(VaultEvent::Deposited(Deposited {
                    vault: *vault_address,
                    depositor: *depositor,
                    amount,
                }))
            },
        )
    }

    /// Move `amount` from the vault at `vault_address` to its authority
    pub fn withdraw(
        &self,
        signers: &SignerSet,
        authority: &Pubkey,
        vault_address: &Pubkey,
        amount: u64,
    ) -> LedgerResult<VaultEvent> {
        let reserve = self.config.vault_reserve();

        self.transact(
            vault_address,
            authority,
            |vault_account, authority_account| -> LedgerResult<VaultEvent> {
                let vault = load(vault_address, vault_account)?;
                let authority_account = authority_account.ok_or(VaultError::Unauthorized)?;
                authority::authorize_owner(signers, authority, vault_address, &vault)?;

                let movement = funds::plan_withdraw(
                    &vault,
                    amount,
                    vault_account.lamports,
                    reserve,
                    authority_account.lamports,
                )?;

                vault_account.lamports = movement.source_after;
                authority_account.lamports = movement.destination_after;

                Ok(VaultEvent::Withdrawn(Withdrawn {
                    vault: *vault_address,
                    vault_authority: *authority,
                    amount,
                }))
            },
        )
    }

    /// Flip the lock flag of the vault at `vault_address`
    pub fn toggle_lock(
        &self,
        signers: &SignerSet,
        authority: &Pubkey,
        vault_address: &Pubkey,
    ) -> LedgerResult<VaultEvent> {
        let slot = self
            .existing_slot(vault_address)
            .ok_or(VaultError::NotFound)?;
        let mut vault_account = lock(&slot);

        let mut vault = load(vault_address, &vault_account)?;
        authority::authorize_owner(signers, authority, vault_address, &vault)?;

        let locked = vault.toggle_lock();
        vault_account.vault = Some(vault);

        Ok(self.record(VaultEvent::LockToggled(LockToggled {
            vault: *vault_address,
            vault_authority: *authority,
            locked,
        })))
    }

    /// Append a committed event. Called while the operation still holds its
    /// account locks, so per-vault event order matches commit order.
    fn record(&self, event: VaultEvent) -> VaultEvent {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
        event
    }

    fn existing_slot(&self, key: &Pubkey) -> Option<Slot> {
        self.accounts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Get or create the lock slot for `key`
    fn slot(&self, key: &Pubkey) -> Slot {
        if let Some(slot) = self.existing_slot(key) {
            return slot;
        }
        self.accounts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(*key)
            .or_default()
            .clone()
    }

    /// Copy of the account at `key`, empty if the ledger has never seen it
    fn snapshot(&self, key: &Pubkey) -> LedgerAccount {
        match self.existing_slot(key) {
            Some(slot) => {
                let account = lock(&slot);
                account.clone()
            }
            None => LedgerAccount::default(),
        }
    }

    /// Run `op` against both accounts and record the event it returns.
    ///
    /// Slots are only created for an operation that would commit: when
    /// either key is unknown, `op` first runs against snapshots and its
    /// error is returned without touching the account map.
    fn transact(
        &self,
        primary: &Pubkey,
        secondary: &Pubkey,
        op: impl Fn(&mut LedgerAccount, Option<&mut LedgerAccount>) -> LedgerResult<VaultEvent>,
    ) -> LedgerResult<VaultEvent> {
        let known = self.existing_slot(primary).is_some()
            && (primary == secondary || self.existing_slot(secondary).is_some());
        if !known {
            let mut primary_copy = self.snapshot(primary);
            if primary == secondary {
                op(&mut primary_copy, None)?;
            } else {
                let mut secondary_copy = self.snapshot(secondary);
                op(&mut primary_copy, Some(&mut secondary_copy))?;
            }
        }

        self.with_pair(primary, secondary, |primary_account, secondary_account| {
            op(primary_account, secondary_account).map(|event| self.record(event))
        })
    }

    /// Run `f` with both accounts locked in key order.
    ///
    /// When both keys are the same account the second argument is `None`.
    fn with_pair<R>(
        &self,
        primary: &Pubkey,
        secondary: &Pubkey,
        f: impl FnOnce(&mut LedgerAccount, Option<&mut LedgerAccount>) -> R,
    ) -> R {
        let primary_slot = self.slot(primary);
        if primary == secondary {
            let mut primary_account = lock(&primary_slot);
            return f(&mut *primary_account, None);
        }

        let secondary_slot = self.slot(secondary);
        let (mut primary_account, mut secondary_account) = if primary < secondary {
            let first = lock(&primary_slot);
            (first, lock(&secondary_slot))
        } else {
            let first = lock(&secondary_slot);
            (lock(&primary_slot), first)
        };
        f(&mut *primary_account, Some(&mut *secondary_account))
    }
}

fn lock(slot: &Slot) -> MutexGuard<'_, LedgerAccount> {
    // Writes happen only after every check has passed, so a poisoned
    // account still holds a committed state.
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The vault stored at `address`, or `NotFound`
fn load(address: &Pubkey, account: &LedgerAccount) -> LedgerResult<Vault> {
    let vault = account.vault.clone().ok_or(VaultError::NotFound)?;
    if !derivation::is_vault_address(&vault.vault_authority, address) {
        return Err(VaultError::NotFound);
    }
    Ok(vault)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(byte: u8) -> Pubkey {
        Pubkey::new_from_array([byte; 32])
    }

    #[test]
    fn fund_accumulates_and_rejects_overflow() {
        let ledger = Ledger::default();
        let alice = key(1);
        assert_eq!(ledger.fund(&alice, 10), Ok(10));
        assert_eq!(ledger.fund(&alice, 5), Ok(15));
        assert_eq!(ledger.fund(&alice, u64::MAX), Err(VaultError::InvalidAmount));
        assert_eq!(ledger.lamports(&alice), 15);
    }

    #[test]
    fn unknown_keys_read_as_empty() {
        let ledger = Ledger::default();
        assert_eq!(ledger.lamports(&key(4)), 0);
        assert_eq!(ledger.vault(&key(4)), None);
        assert_eq!(ledger.vault_balance(&key(4)), None);
        assert!(ledger.events().is_empty());
    }

    #[test]
    fn reserve_is_paid_by_the_creator() {
        let ledger = Ledger::default();
        let alice = key(1);
        let vault = derivation::vault_address(&alice);
        let reserve = ledger.config().vault_reserve();
        assert!(reserve > 0);

        ledger.fund(&alice, reserve + 100).unwrap();
        ledger
            .init_vault(&SignerSet::single(alice), &alice, &vault, false)
            .unwrap();

        assert_eq!(ledger.lamports(&alice), 100);
        assert_eq!(ledger.lamports(&vault), reserve);
        assert_eq!(ledger.vault_balance(&vault), Some(0));
    }

    #[test]
    fn creator_without_reserve_funds_is_rejected() {
        let ledger = Ledger::default();
        let alice = key(1);
        let vault = derivation::vault_address(&alice);
        ledger.fund(&alice, 1).unwrap();

        assert_eq!(
            ledger.init_vault(&SignerSet::single(alice), &alice, &vault, false),
            Err(VaultError::InsufficientBalance)
        );
        assert_eq!(ledger.vault(&vault), None);
        assert_eq!(ledger.lamports(&alice), 1);
        assert!(ledger.events().is_empty());
    }

    #[test]
    fn prefunded_address_is_topped_up_not_rejected() {
        let ledger = Ledger::default();
        let alice = key(1);
        let vault = derivation::vault_address(&alice);
        let reserve = ledger.config().vault_reserve();
        ledger.fund(&vault, 10).unwrap();
        ledger.fund(&alice, reserve).unwrap();

        ledger
            .init_vault(&SignerSet::single(alice), &alice, &vault, true)
            .unwrap();

        assert_eq!(ledger.lamports(&alice), 10);
        assert_eq!(ledger.lamports(&vault), reserve);
    }

    #[test]
    fn unreserved_ledger_exposes_every_lamport() {
        let ledger = Ledger::new(LedgerConfig::unreserved());
        let alice = key(1);
        let vault = derivation::vault_address(&alice);
        let signers = SignerSet::single(alice);

        ledger.init_vault(&signers, &alice, &vault, false).unwrap();
        ledger.fund(&alice, 500).unwrap();
        ledger.deposit(&signers, &alice, &vault, 500).unwrap();
        ledger.withdraw(&signers, &alice, &vault, 500).unwrap();

        assert_eq!(ledger.lamports(&vault), 0);
        assert_eq!(ledger.vault_balance(&vault), Some(0));
        assert_eq!(ledger.lamports(&alice), 500);
    }

    #[test]
    fn vault_cannot_deposit_into_itself() {
        let ledger = Ledger::new(LedgerConfig::unreserved());
        let alice = key(1);
        let vault = derivation::vault_address(&alice);
        ledger
            .init_vault(&SignerSet::single(alice), &alice, &vault, false)
            .unwrap();
        ledger.fund(&vault, 50).unwrap();

        assert_eq!(
            ledger.deposit(&SignerSet::single(vault), &vault, &vault, 10),
            Err(VaultError::Unauthorized)
        );
        assert_eq!(ledger.lamports(&vault), 50);
    }

    fn known_accounts(ledger: &Ledger) -> usize {
        ledger.accounts.read().unwrap().len()
    }

    #[test]
    fn rejected_operations_leave_the_account_map_alone() {
        let ledger = Ledger::default();
        let alice = key(1);
        let bob = key(2);
        let vault = derivation::vault_address(&alice);
        let stranger = derivation::vault_address(&bob);

        assert_eq!(
            ledger.deposit(&SignerSet::single(bob), &bob, &stranger, 10),
            Err(VaultError::NotFound)
        );
        assert_eq!(
            ledger.withdraw(&SignerSet::single(bob), &bob, &stranger, 10),
            Err(VaultError::NotFound)
        );
        assert_eq!(
            ledger.toggle_lock(&SignerSet::single(bob), &bob, &stranger),
            Err(VaultError::NotFound)
        );
        assert_eq!(
            ledger.init_vault(&SignerSet::single(alice), &alice, &vault, false),
            Err(VaultError::InsufficientBalance)
        );
        assert_eq!(known_accounts(&ledger), 0);

        ledger.fund(&alice, ledger.config().vault_reserve()).unwrap();
        ledger
            .init_vault(&SignerSet::single(alice), &alice, &vault, false)
            .unwrap();
        assert_eq!(known_accounts(&ledger), 2);

        assert_eq!(
            ledger.deposit(&SignerSet::single(bob), &bob, &vault, 10),
            Err(VaultError::InsufficientBalance)
        );
        assert_eq!(
            ledger.withdraw(&SignerSet::single(bob), &bob, &vault, 10),
            Err(VaultError::Unauthorized)
        );
        assert_eq!(known_accounts(&ledger), 2);
        assert_eq!(ledger.events().len(), 1);
    }

    #[test]
    fn unfunded_authority_can_still_receive_a_withdrawal() {
        let ledger = Ledger::new(LedgerConfig::unreserved());
        let alice = key(1);
        let bob = key(2);
        let vault = derivation::vault_address(&alice);
        let signers = SignerSet::single(alice);

        ledger.init_vault(&signers, &alice, &vault, false).unwrap();
        ledger.fund(&bob, 40).unwrap();
        ledger
            .deposit(&SignerSet::single(bob), &bob, &vault, 40)
            .unwrap();
        ledger.withdraw(&signers, &alice, &vault, 40).unwrap();

        assert_eq!(ledger.lamports(&alice), 40);
        assert_eq!(ledger.vault_balance(&vault), Some(0));
    }

    #[test]
    fn take_events_drains_the_log() {
        let ledger = Ledger::new(LedgerConfig::unreserved());
        let alice = key(1);
        let vault = derivation::vault_address(&alice);
        ledger
            .init_vault(&SignerSet::single(alice), &alice, &vault, false)
            .unwrap();

        assert_eq!(ledger.take_events().len(), 1);
        assert!(ledger.events().is_empty());
    }
}
