use anchor_lang::prelude::*;

declare_id!("6uYekugofzs15C9Y2R8EXgb6sMUW4ey86wVQCqDdzwJJ");

pub mod authority;
pub mod constants;
pub mod derivation;
pub mod errors;
pub mod events;
pub mod funds;
pub mod instructions;
pub mod ledger;
pub mod state;

pub use errors::VaultError;
pub use instructions::*;
pub use state::*;

#[program]
pub mod custodial_vault {
    use super::*;

    /// Create the caller's vault at `[b"vault", authority]`.
    ///
    /// Fails with `AlreadyExists` when the address is already in use, so a
    /// retried initialization can never overwrite an existing authority.
    pub fn init_vault(ctx: Context<InitVault>, locked: bool) -> Result<()> {
        instructions::init_vault(ctx, locked)
    }

    /// Move lamports from any signer into an unlocked vault
    pub fn deposit(ctx: Context<Deposit>, amount: u64) -> Result<()> {
        instructions::deposit(ctx, amount)
    }

    /// Move lamports out of an unlocked vault to its recorded authority
    pub fn withdraw(ctx: Context<Withdraw>, amount: u64) -> Result<()> {
        instructions::withdraw(ctx, amount)
    }

    /// Flip the lock flag (authority only, allowed in either state)
    pub fn toggle_lock(ctx: Context<ToggleLock>) -> Result<()> {
        instructions::toggle_lock(ctx)
    }
}
