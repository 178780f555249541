use anchor_lang::prelude::*;

#[event]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VaultInitialized {
    pub vault: Pubkey,
    pub vault_authority: Pubkey,
    pub locked: bool,
}

#[event]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Deposited {
    pub vault: Pubkey,
    pub depositor: Pubkey,
    pub amount: u64,
}

#[event]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Withdrawn {
    pub vault: Pubkey,
    pub vault_authority: Pubkey,
    pub amount: u64,
}

/// `locked` is the value after the flip
#[event]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LockToggled {
    pub vault: Pubkey,
    pub vault_authority: Pubkey,
    pub locked: bool,
}

/// One notification per committed operation
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VaultEvent {
    Initialized(VaultInitialized),
    Deposited(Deposited),
    Withdrawn(Withdrawn),
    LockToggled(LockToggled),
}

impl VaultEvent {
    /// Write the event to the program log
    pub fn emit(&self) {
        match self {
            VaultEvent::Initialized(event) => emit!(event.clone()),
            VaultEvent::Deposited(event) => emit!(event.clone()),
            VaultEvent::Withdrawn(event) => emit!(event.clone()),
            VaultEvent::LockToggled(event) => emit!(event.clone()),
        }
    }

    pub fn vault(&self) -> Pubkey {
        match self {
            VaultEvent::Initialized(event) => event.vault,
            VaultEvent::Deposited(event) => event.vault,
            VaultEvent::Withdrawn(event) => event.vault,
            VaultEvent::LockToggled(event) => event.vault,
        }
    }
}
