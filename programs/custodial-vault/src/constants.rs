use crate::funds::ReservePolicy;

/// Namespace tag for vault addresses: seeds = [VAULT_SEED, authority]
pub const VAULT_SEED: &[u8] = b"vault";

/// Reserve kept in every on-chain vault account.
///
/// The runtime rejects a program-owned account left below its rent-exempt
/// minimum, so the program never withdraws into it.
pub const RESERVE_POLICY: ReservePolicy = ReservePolicy::RentExempt;
