use anchor_lang::prelude::*;
use anchor_lang::system_program::{self, Transfer};

use crate::derivation;
use crate::errors::VaultError;
use crate::events::{Deposited, VaultEvent};
use crate::funds;
use crate::state::Vault;

/// Deposit lamports into any unlocked vault.
///
/// The depositor does not have to be the vault authority: funds are credited
/// to whichever vault is named, and only its authority can withdraw them.
///
/// `vault` is an `UncheckedAccount` rather than `Account<'info, Vault>` with
/// `seeds`/`bump` constraints so that a missing or foreign account fails with
/// `VaultError::NotFound` instead of an Anchor constraint code. The
/// depositor's signature is enforced by `Signer<'info>` before this runs.
pub fn deposit(ctx: Context<Deposit>, amount: u64) -> Result<()> {
    let depositor_info = ctx.accounts.depositor.to_account_info();
    let vault_info = ctx.accounts.vault.to_account_info();

    let vault = Vault::load(&vault_info)?;
    require!(
        derivation::is_vault_address(&vault.vault_authority, vault_info.key),
        VaultError::NotFound
    );

    let movement = funds::plan_deposit(
        &vault,
        amount,
        depositor_info.lamports(),
        vault_info.lamports(),
    )?;

    system_program::transfer(
        CpiContext::new(
            ctx.accounts.system_program.to_account_info(),
            Transfer {
                from: depositor_info.clone(),
                to: vault_info.clone(),
            },
        ),
        movement.amount,
    )?;

    VaultEvent::Deposited(Deposited {
        vault: vault_info.key(),
        depositor: depositor_info.key(),
        amount,
    })
    .emit();

    msg!("Deposited {} lamports into vault {}", amount, vault_info.key());
    Ok(())
}

#[derive(Accounts)]
pub struct Deposit<'info> {
    /// Any signer can fund a vault
    #[account(mut)]
    pub depositor: Signer<'info>,

    #[account(mut)]
    /// CHECK: loaded through Vault::load, which rejects accounts this
    /// program does not own; the address is re-derived from the record
    pub vault: UncheckedAccount<'info>,

    pub system_program: Program<'info, System>,
}
