use anchor_lang::prelude::*;

use crate::authority::{self, SignerSet};
use crate::constants::RESERVE_POLICY;
use crate::events::{VaultEvent, Withdrawn};
use crate::funds;
use crate::state::Vault;

/// Withdraw lamports from the signer's own vault.
///
/// Only the recorded authority can withdraw, and never below the reserve.
/// The vault is owned by this program, so lamports move by direct
/// debit/credit instead of a system transfer.
///
/// `vault` is an `UncheckedAccount` loaded by hand instead of
/// `Account<'info, Vault>` with `seeds`/`bump`/`has_one`, so that a missing
/// vault reports `VaultError::NotFound` and a foreign signer reports
/// `VaultError::Unauthorized`. `Signer<'info>` already enforces the
/// signature; `authorize_owner` can only fail here on the derivation or the
/// stored authority.
pub fn withdraw(ctx: Context<Withdraw>, amount: u64) -> Result<()> {
    let authority_info = ctx.accounts.vault_authority.to_account_info();
    let vault_info = ctx.accounts.vault.to_account_info();

    let vault = Vault::load(&vault_info)?;
    let signers = SignerSet::from_account_infos(&[authority_info.clone()]);
    authority::authorize_owner(&signers, authority_info.key, vault_info.key, &vault)?;

    let reserve = RESERVE_POLICY.reserve(&Rent::get()?, vault_info.data_len());
    let movement = funds::plan_withdraw(
        &vault,
        amount,
        vault_info.lamports(),
        reserve,
        authority_info.lamports(),
    )?;

    **vault_info.try_borrow_mut_lamports()? = movement.source_after;
    **authority_info.try_borrow_mut_lamports()? = movement.destination_after;

    VaultEvent::Withdrawn(Withdrawn {
        vault: vault_info.key(),
        vault_authority: authority_info.key(),
        amount,
    })
    .emit();

    msg!("Withdrawn {} lamports from vault {}", amount, vault_info.key());
    Ok(())
}

#[derive(Accounts)]
pub struct Withdraw<'info> {
    /// Must be the vault's recorded authority
    #[account(mut)]
    pub vault_authority: Signer<'info>,

    #[account(mut)]
    /// CHECK: loaded through Vault::load; authority, derivation and record
    /// are checked by authority::authorize_owner
    pub vault: UncheckedAccount<'info>,
}
