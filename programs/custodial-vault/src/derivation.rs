use anchor_lang::prelude::*;

use crate::constants::VAULT_SEED;

/// Vault address and canonical bump for `authority`.
///
/// seeds = [b"vault", authority.as_ref()], program = this program.
/// Anyone holding the authority's public key can recompute it, and the
/// authority key inside the seeds keeps every owner's vault distinct:
/// - Alice's vault: [b"vault", ALICE_PUBKEY]
/// - Bob's vault:   [b"vault", BOB_PUBKEY]
pub fn find_vault_address(authority: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[VAULT_SEED, authority.as_ref()], &crate::ID)
}

pub fn vault_address(authority: &Pubkey) -> Pubkey {
    find_vault_address(authority).0
}

/// True when `candidate` is the vault address `authority` derives
pub fn is_vault_address(authority: &Pubkey, candidate: &Pubkey) -> bool {
    vault_address(authority) == *candidate
}

/// Seeds the program signs with when it creates the vault account
pub fn vault_signer_seeds<'a>(authority: &'a Pubkey, bump: &'a [u8; 1]) -> [&'a [u8]; 3] {
    [VAULT_SEED, authority.as_ref(), bump]
}
