//! Authorization checks shared by the program and the ledger.
//!
//! Signature verification is not done here. Callers hand in a [`SignerSet`]
//! of identities whose signatures the host already checked (Anchor's
//! `Signer<'info>` on-chain, the caller off-chain), and these checks decide
//! whether that set is allowed to act on a given vault.

use anchor_lang::prelude::*;

use crate::derivation;
use crate::errors::VaultError;
use crate::state::Vault;

/// Identities that signed the current request
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SignerSet {
    keys: Vec<Pubkey>,
}

impl SignerSet {
    pub fn new(keys: impl IntoIterator<Item = Pubkey>) -> Self {
        let mut keys: Vec<Pubkey> = keys.into_iter().collect();
        keys.sort();
        keys.dedup();
        Self { keys }
    }

    /// Collect the keys of every account marked as signer
    pub fn from_account_infos(infos: &[AccountInfo]) -> Self {
        Self::new(infos.iter().filter(|info| info.is_signer).map(|info| *info.key))
    }

    pub fn single(key: Pubkey) -> Self {
        Self { keys: vec![key] }
    }

    pub fn contains(&self, key: &Pubkey) -> bool {
        self.keys.binary_search(key).is_ok()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl FromIterator<Pubkey> for SignerSet {
    fn from_iter<I: IntoIterator<Item = Pubkey>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// `identity` must have signed the request
pub fn require_signer(signers: &SignerSet, identity: &Pubkey) -> std::result::Result<(), VaultError> {
    if !signers.contains(identity) {
        return Err(VaultError::Unauthorized);
    }
    Ok(())
}

/// Check a request to create the vault at `vault_address`.
///
/// The claimed authority must have signed, and the address must be the one
/// it derives. Returns the bump the program signs account creation with.
pub fn authorize_creator(
    signers: &SignerSet,
    claimed: &Pubkey,
    vault_address: &Pubkey,
) -> std::result::Result<u8, VaultError> {
    require_signer(signers, claimed)?;
    let (expected, bump) = derivation::find_vault_address(claimed);
    if expected != *vault_address {
        return Err(VaultError::Unauthorized);
    }
    Ok(bump)
}

/// Check a Withdraw or ToggleLock request against an existing vault.
///
/// Dual protection:
/// 1. the claimed authority signed and derives `vault_address`
/// 2. the stored `vault_authority` is that same key
pub fn authorize_owner(
    signers: &SignerSet,
    claimed: &Pubkey,
    vault_address: &Pubkey,
    vault: &Vault,
) -> std::result::Result<(), VaultError> {
    require_signer(signers, claimed)?;
    if !derivation::is_vault_address(claimed, vault_address) {
        return Err(VaultError::Unauthorized);
    }
    if vault.vault_authority != *claimed {
        return Err(VaultError::Unauthorized);
    }
    Ok(())
}
