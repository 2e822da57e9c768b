//! Order Registry: per-offerer counters and per-order status.
//!
//! Both stores are plain maps owned by the registry and handed to the
//! settlement engine by reference. Entries are created lazily and never
//! deleted; a missing counter reads as zero and a missing status as
//! all-false.
//!
//! The registry only records transitions. Whether a transition is allowed
//! (signature, caller rights, time window) is decided before it is called,
//! and calls that move assets apply their registry writes only after every
//! transfer succeeded.

use std::collections::HashMap;

use alloy_primitives::{Address, B256, U256};
use tradeport_types::constants::COUNTER_ENTROPY_SHIFT;
use tradeport_types::{OrderHash, OrderStatus, Result, TradeportError};

#[derive(Debug, Clone, Default)]
pub struct OrderRegistry {
    counters: HashMap<Address, U256>,
    statuses: HashMap<OrderHash, OrderStatus>,
}

impl OrderRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn counter(&self, offerer: Address) -> U256 {
        self.counters.get(&offerer).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn status(&self, order_hash: &OrderHash) -> OrderStatus {
        self.statuses.get(order_hash).copied().unwrap_or_default()
    }

    /// Fail if the order can no longer be fulfilled. Cancellation is
    /// reported first.
    pub fn ensure_fulfillable(&self, order_hash: &OrderHash) -> Result<OrderStatus> {
        let status = self.status(order_hash);
        if status.is_cancelled {
            return Err(TradeportError::OrderIsCancelled(*order_hash));
        }
        if status.is_fulfilled {
            return Err(TradeportError::OrderAlreadyFilled(*order_hash));
        }
        Ok(status)
    }

    /// Counter step derived from `entropy`: its upper 128 bits, at least 1.
    #[must_use]
    pub fn counter_increment(entropy: B256) -> U256 {
        let step = U256::from_be_bytes(entropy.0) >> COUNTER_ENTROPY_SHIFT;
        step.max(U256::from(1))
    }

    /// Advance `offerer`'s counter by an entropy-derived step. Returns the
    /// new counter.
    ///
    /// # Errors
    /// [`TradeportError::ArithmeticOverflow`] if the counter would wrap.
    pub fn increment_counter(&mut self, offerer: Address, entropy: B256) -> Result<U256> {
        let next = self
            .counter(offerer)
            .checked_add(Self::counter_increment(entropy))
            .ok_or(TradeportError::ArithmeticOverflow)?;
        self.counters.insert(offerer, next);
        Ok(next)
    }

    pub fn mark_validated(&mut self, order_hash: OrderHash) {
        self.statuses.entry(order_hash).or_default().is_validated = true;
    }

    /// Cancelling an already-fulfilled order is allowed and only blocks
    /// future attempts.
    pub fn mark_cancelled(&mut self, order_hash: OrderHash) {
        let status = self.statuses.entry(order_hash).or_default();
        status.is_validated = false;
        status.is_cancelled = true;
    }

    pub fn mark_fulfilled(&mut self, order_hash: OrderHash) {
        let status = self.statuses.entry(order_hash).or_default();
        status.is_validated = true;
        status.is_fulfilled = true;
    }

    /// Number of order hashes with a recorded status.
    #[must_use]
    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }
}
