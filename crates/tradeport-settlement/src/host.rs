//! Capabilities supplied by the host ledger.
//!
//! The settlement core never owns balances or token ownership. It moves
//! assets through [`AssetTransfer`], relies on [`Transactional`] for
//! all-or-nothing execution, and reads time and entropy from [`Clock`] and
//! [`EntropySource`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use alloy_primitives::{Address, B256, U256};
use rand::RngCore;
use sha2::{Digest, Sha256};
use tradeport_types::TransferError;

// ═══════════════════════════════════════════════════════════════════
// ASSET TRANSFER
// ═══════════════════════════════════════════════════════════════════

/// Asset movements performed by the marketplace as operator.
///
/// Native value supplied with a call is first pulled into the marketplace's
/// escrow with [`receive_value`](Self::receive_value) and paid out of it with
/// [`send_value`](Self::send_value). Token movements act on behalf of `from`
/// and require `from` to have approved the operator.
pub trait AssetTransfer {
    fn receive_value(&mut self, from: Address, amount: U256) -> Result<(), TransferError>;

    fn send_value(&mut self, to: Address, amount: U256) -> Result<(), TransferError>;

    fn transfer_fungible(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), TransferError>;

    fn transfer_non_fungible(
        &mut self,
        collection: Address,
        from: Address,
        to: Address,
        token_id: U256,
    ) -> Result<(), TransferError>;

    fn transfer_semi_fungible(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        token_id: U256,
        amount: U256,
    ) -> Result<(), TransferError>;
}

/// All-or-nothing execution scope.
///
/// Every `begin` is matched by exactly one `commit` or `rollback`. A
/// rollback discards every change made since `begin`.
pub trait Transactional {
    fn begin(&mut self);
    fn commit(&mut self);
    fn rollback(&mut self);
}

// ═══════════════════════════════════════════════════════════════════
// CLOCK
// ═══════════════════════════════════════════════════════════════════

/// Ledger time in seconds.
pub trait Clock {
    fn now(&self) -> U256;
}

/// Manually driven clock. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct FixedClock(Arc<AtomicU64>);

impl FixedClock {
    #[must_use]
    pub fn at(timestamp: u64) -> Self {
        Self(Arc::new(AtomicU64::new(timestamp)))
    }

    pub fn set(&self, timestamp: u64) {
        self.0.store(timestamp, Ordering::SeqCst);
    }

    pub fn advance(&self, seconds: u64) {
        self.0.fetch_add(seconds, Ordering::SeqCst);
    }

    #[must_use]
    pub fn timestamp(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> U256 {
        U256::from(self.timestamp())
    }
}

/// Wall-clock UTC seconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> U256 {
        U256::from(u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0))
    }
}

// ═══════════════════════════════════════════════════════════════════
// ENTROPY
// ═══════════════════════════════════════════════════════════════════

/// Source of caller-unpredictable 32-byte values for counter increments.
pub trait EntropySource {
    fn next_entropy(&mut self) -> B256;
}

/// Returns the same value every time.
#[derive(Debug, Clone, Copy)]
pub struct FixedEntropy(pub B256);

impl EntropySource for FixedEntropy {
    fn next_entropy(&mut self) -> B256 {
        self.0
    }
}

/// `sha256(domain ‖ sequence ‖ 32 random bytes)`. The sequence number
/// makes successive outputs distinct even if the RNG repeats.
#[derive(Debug, Clone)]
pub struct RandomEntropy {
    domain: B256,
    sequence: u64,
}

impl RandomEntropy {
    /// `domain` is typically the marketplace's domain separator.
    #[must_use]
    pub fn new(domain: B256) -> Self {
        Self {
            domain,
            sequence: 0,
        }
    }

    #[must_use]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

impl EntropySource for RandomEntropy {
    fn next_entropy(&mut self) -> B256 {
        let mut noise = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut noise);

        let mut hasher = Sha256::new();
        hasher.update(self.domain.as_slice());
        hasher.update(self.sequence.to_be_bytes());
        hasher.update(noise);
        self.sequence += 1;

        B256::from_slice(&hasher.finalize())
    }
}
