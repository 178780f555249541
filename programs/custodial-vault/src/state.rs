use anchor_lang::prelude::*;

use crate::errors::VaultError;

/// One vault per authority, stored at `[b"vault", vault_authority]`.
///
/// The balance is not stored: it is the account's lamports above the reserve.
///
/// Layout:
/// [0..8]   discriminator
/// [8..40]  vault_authority
/// [40]     locked
#[account]
#[derive(Debug, PartialEq, Eq)]
pub struct Vault {
    /// Owner of the vault. Written once by `init_vault`
    pub vault_authority: Pubkey,
    /// Deposits and withdrawals are rejected while set
    pub locked: bool,
}

impl Vault {
    /// 8 bytes discriminator + 32 bytes pubkey + 1 byte bool
    pub const LEN: usize = 8 + 32 + 1;

    pub fn new(vault_authority: Pubkey, locked: bool) -> Self {
        Self {
            vault_authority,
            locked,
        }
    }

    pub fn ensure_unlocked(&self) -> std::result::Result<(), VaultError> {
        if self.locked {
            return Err(VaultError::VaultLocked);
        }
        Ok(())
    }

    /// Flip the lock flag and return the new value
    pub fn toggle_lock(&mut self) -> bool {
        self.locked = !self.locked;
        self.locked
    }

    /// An address can take a new vault only while it is an empty,
    /// system-owned account. Anything else (including our own vault) is in use.
    pub fn is_vacant(info: &AccountInfo) -> bool {
        info.owner == &System::id() && info.data_is_empty()
    }

    /// Read the vault stored in `info`.
    ///
    /// Accounts this program does not own, or that hold no data, are
    /// reported as `NotFound` instead of a deserialization failure.
    pub fn load(info: &AccountInfo) -> Result<Self> {
        if info.owner != &crate::ID || info.data_is_empty() {
            return err!(VaultError::NotFound);
        }
        let data = info.try_borrow_data()?;
        Vault::try_deserialize(&mut &data[..])
    }

    /// Write the vault (with discriminator) back into `info`
    pub fn store(&self, info: &AccountInfo) -> Result<()> {
        let mut data = info.try_borrow_mut_data()?;
        let mut writer: &mut [u8] = &mut data[..];
        self.try_serialize(&mut writer)
    }
}
