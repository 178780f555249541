use anchor_lang::prelude::*;

/// Every rejection a vault operation can produce.
///
/// Codes are stable (6000 + variant index) so clients can branch on them.
#[error_code]
#[derive(PartialEq, Eq)]
pub enum VaultError {
    #[msg("A vault already exists at this address")]
    AlreadyExists,

    #[msg("No vault exists at this address")]
    NotFound,

    #[msg("Signer is not the vault authority")]
    Unauthorized,

    #[msg("Vault is locked")]
    VaultLocked,

    #[msg("Insufficient balance")]
    InsufficientBalance,

    #[msg("Amount must be non-zero and must not overflow")]
    InvalidAmount,
}
