//! System-wide constants for the Tradeport settlement engine.

use alloy_primitives::{Address, address};

/// Default human-readable marketplace name (EIP-712 domain `name`).
pub const DEFAULT_MARKETPLACE_NAME: &str = "Marketplace";

/// Default marketplace version (EIP-712 domain `version`).
pub const DEFAULT_MARKETPLACE_VERSION: &str = "1.2";

/// Default chain id (local development network).
pub const DEFAULT_CHAIN_ID: u64 = 31337;

/// Default verifying contract identity: the first contract a fresh local
/// development network deploys.
pub const DEFAULT_VERIFYING_CONTRACT: Address = address!("5FbDB2315678afecb367f032d93F642f64180aa3");

/// A counter bump is the ledger entropy shifted right by this many bits,
/// so the increment fits in 128 bits and counters cannot realistically overflow.
pub const COUNTER_ENTROPY_SHIFT: usize = 128;

/// Signature length of the `(r, s, v)` form.
pub const SIGNATURE_LENGTH: usize = 65;

/// Signature length of the EIP-2098 compact `(r, yParity·s)` form.
pub const COMPACT_SIGNATURE_LENGTH: usize = 64;
