use anchor_lang::prelude::*;

use crate::authority::{self, SignerSet};
use crate::events::{LockToggled, VaultEvent};
use crate::state::Vault;

/// Flip the vault's lock flag. Allowed whether the vault is locked or not.
///
/// Same account handling as `withdraw`: the vault is loaded by hand so the
/// rejections carry `NotFound`/`Unauthorized` rather than Anchor constraint
/// codes, and the signature itself is enforced by `Signer<'info>`.
pub fn toggle_lock(ctx: Context<ToggleLock>) -> Result<()> {
    let authority_info = ctx.accounts.vault_authority.to_account_info();
    let vault_info = ctx.accounts.vault.to_account_info();

    let mut vault = Vault::load(&vault_info)?;
    let signers = SignerSet::from_account_infos(&[authority_info.clone()]);
    authority::authorize_owner(&signers, authority_info.key, vault_info.key, &vault)?;

    let locked = vault.toggle_lock();
    vault.store(&vault_info)?;

    VaultEvent::LockToggled(LockToggled {
        vault: vault_info.key(),
        vault_authority: vault.vault_authority,
        locked,
    })
    .emit();

    if locked {
        msg!("Vault {} locked", vault_info.key());
    } else {
        msg!("Vault {} unlocked", vault_info.key());
    }
    Ok(())
}

#[derive(Accounts)]
pub struct ToggleLock<'info> {
    pub vault_authority: Signer<'info>,

    #[account(mut)]
    /// CHECK: loaded through Vault::load; authority, derivation and record
    /// are checked by authority::authorize_owner
    pub vault: UncheckedAccount<'info>,
}
