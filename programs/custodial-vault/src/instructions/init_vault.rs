use anchor_lang::prelude::*;
use anchor_lang::system_program::{self, Allocate, Assign, CreateAccount, Transfer};

use crate::authority::{self, SignerSet};
use crate::constants::RESERVE_POLICY;
use crate::derivation;
use crate::errors::VaultError;
use crate::events::{VaultEvent, VaultInitialized};
use crate::state::Vault;

/// Create the signer's vault.
///
/// The account is created by hand instead of through the `init` constraint
/// so that every rejection carries a `VaultError` code:
/// 1. vault address must derive from the signing authority -> `Unauthorized`
///    (the signature itself is enforced by `Signer<'info>`)
/// 2. address must not already be in use -> `AlreadyExists`
/// 3. authority must be able to pay the reserve -> `InsufficientBalance`
///
/// Re-running this against an existing vault always hits check 2 before
/// any data is written, so the stored authority can never be replaced.
pub fn init_vault(ctx: Context<InitVault>, locked: bool) -> Result<()> {
    let authority_info = ctx.accounts.vault_authority.to_account_info();
    let vault_info = ctx.accounts.vault.to_account_info();
    let system_program_info = ctx.accounts.system_program.to_account_info();
    let authority_key = authority_info.key();

    let signers = SignerSet::from_account_infos(&[authority_info.clone()]);
    let bump = authority::authorize_creator(&signers, &authority_key, vault_info.key)?;

    require!(Vault::is_vacant(&vault_info), VaultError::AlreadyExists);

    let reserve = RESERVE_POLICY.reserve(&Rent::get()?, Vault::LEN);
    let top_up = reserve.saturating_sub(vault_info.lamports());
    require!(
        authority_info.lamports() >= top_up,
        VaultError::InsufficientBalance
    );

    let bump_seed = [bump];
    let seeds = derivation::vault_signer_seeds(&authority_key, &bump_seed);
    let signer_seeds: &[&[&[u8]]] = &[&seeds];

    if vault_info.lamports() == 0 {
        system_program::create_account(
            CpiContext::new_with_signer(
                system_program_info,
                CreateAccount {
                    from: authority_info.clone(),
                    to: vault_info.clone(),
                },
                signer_seeds,
            ),
            reserve,
            Vault::LEN as u64,
            &crate::ID,
        )?;
    } else {
        // Someone pre-funded the address. create_account would refuse it,
        // so top up, allocate and assign separately.
        if top_up > 0 {
            system_program::transfer(
                CpiContext::new(
                    system_program_info.clone(),
                    Transfer {
                        from: authority_info.clone(),
                        to: vault_info.clone(),
                    },
                ),
                top_up,
            )?;
        }
        system_program::allocate(
            CpiContext::new_with_signer(
                system_program_info.clone(),
                Allocate {
                    account_to_allocate: vault_info.clone(),
                },
                signer_seeds,
            ),
            Vault::LEN as u64,
        )?;
        system_program::assign(
            CpiContext::new_with_signer(
                system_program_info,
                Assign {
                    account_to_assign: vault_info.clone(),
                },
                signer_seeds,
            ),
            &crate::ID,
        )?;
    }

    let vault = Vault::new(authority_key, locked);
    vault.store(&vault_info)?;

    VaultEvent::Initialized(VaultInitialized {
        vault: vault_info.key(),
        vault_authority: authority_key,
        locked,
    })
    .emit();

    msg!(
        "Vault {} initialized for authority {} (locked: {})",
        vault_info.key(),
        authority_key,
        locked
    );
    Ok(())
}

#[derive(Accounts)]
pub struct InitVault<'info> {
    /// Becomes the vault authority and pays the reserve
    #[account(mut)]
    pub vault_authority: Signer<'info>,

    /// Vault PDA at [b"vault", vault_authority]
    #[account(mut)]
    /// CHECK: address, emptiness and ownership are verified in the handler
    /// before the account is created
    pub vault: UncheckedAccount<'info>,

    pub system_program: Program<'info, System>,
}
