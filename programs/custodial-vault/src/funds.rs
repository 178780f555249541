use anchor_lang::prelude::*;

use crate::errors::VaultError;
use crate::state::Vault;

/// How many lamports a vault account keeps out of its visible balance
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReservePolicy {
    /// Keep the rent-exempt minimum for the vault's data length.
    /// The creator pays it at `init_vault`; withdrawals never touch it.
    #[default]
    RentExempt,
    /// Every lamport in the account is withdrawable
    Unreserved,
}

impl ReservePolicy {
    pub fn reserve(&self, rent: &Rent, data_len: usize) -> u64 {
        match self {
            ReservePolicy::RentExempt => rent.minimum_balance(data_len),
            ReservePolicy::Unreserved => 0,
        }
    }
}

/// Lamport totals of both sides of a transfer, after it is applied.
///
/// Computed with checked arithmetic before anything is written, so a
/// rejected operation never leaves a partial update behind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Movement {
    pub amount: u64,
    pub source_after: u64,
    pub destination_after: u64,
}

pub fn require_positive(amount: u64) -> std::result::Result<(), VaultError> {
    if amount == 0 {
        return Err(VaultError::InvalidAmount);
    }
    Ok(())
}

/// Vault-visible balance: lamports above the reserve
pub fn available(lamports: u64, reserve: u64) -> u64 {
    lamports.saturating_sub(reserve)
}

/// Plan a deposit of `amount` from the depositor into `vault`.
///
/// Checks, in order: lock, amount, depositor funds.
pub fn plan_deposit(
    vault: &Vault,
    amount: u64,
    depositor_lamports: u64,
    vault_lamports: u64,
) -> std::result::Result<Movement, VaultError> {
    vault.ensure_unlocked()?;
    require_positive(amount)?;

    let destination_after = vault_lamports
        .checked_add(amount)
        .ok_or(VaultError::InvalidAmount)?;
    let source_after = depositor_lamports
        .checked_sub(amount)
        .ok_or(VaultError::InsufficientBalance)?;

    Ok(Movement {
        amount,
        source_after,
        destination_after,
    })
}

/// Plan a withdrawal of `amount` from `vault` to its authority.
///
/// Checks, in order: lock, amount, vault balance above `reserve`.
pub fn plan_withdraw(
    vault: &Vault,
    amount: u64,
    vault_lamports: u64,
    reserve: u64,
    authority_lamports: u64,
) -> std::result::Result<Movement, VaultError> {
    vault.ensure_unlocked()?;
    require_positive(amount)?;

    if amount > available(vault_lamports, reserve) {
        return Err(VaultError::InsufficientBalance);
    }
    let source_after = vault_lamports
        .checked_sub(amount)
        .ok_or(VaultError::InsufficientBalance)?;
    let destination_after = authority_lamports
        .checked_add(amount)
        .ok_or(VaultError::InvalidAmount)?;

    Ok(Movement {
        amount,
        source_after,
        destination_after,
    })
}
