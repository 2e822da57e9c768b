//! Settlement receipts for the Tradeport audit trail.
//!
//! Every fulfillment call that commits returns a [`SettlementReceipt`]
//! listing the orders it filled, the orders it skipped (batch calls only),
//! the native value it consumed and refunded, and the events it emitted.

use alloy_primitives::U256;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{MarketplaceEvent, OrderHash, ReceiptId};

/// An order a batch call passed over instead of failing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedOrder {
    /// Position in the submitted order list.
    pub index: usize,
    /// `None` when the hash could not be derived (e.g. missing original items).
    pub order_hash: Option<OrderHash>,
    /// Display form of the error that caused the skip.
    pub reason: String,
}

/// Outcome of a committed fulfillment call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementReceipt {
    pub id: ReceiptId,
    pub fulfilled: Vec<OrderHash>,
    pub skipped: Vec<SkippedOrder>,
    /// Native value paid out of the supplied amount.
    pub native_consumed: U256,
    /// Supplied value returned to the caller.
    pub native_refunded: U256,
    pub events: Vec<MarketplaceEvent>,
    pub issued_at: DateTime<Utc>,
}

impl SettlementReceipt {
    #[must_use]
    pub fn new(
        fulfilled: Vec<OrderHash>,
        skipped: Vec<SkippedOrder>,
        native_consumed: U256,
        native_refunded: U256,
        events: Vec<MarketplaceEvent>,
    ) -> Self {
        Self {
            id: ReceiptId::new(),
            fulfilled,
            skipped,
            native_consumed,
            native_refunded,
            events,
            issued_at: Utc::now(),
        }
    }

    /// Number of `OrderFulfilled` events in this receipt.
    #[must_use]
    pub fn fulfilled_event_count(&self) -> usize {
        self.events
            .iter()
            .filter(|event| matches!(event, MarketplaceEvent::OrderFulfilled { .. }))
            .count()
    }
}
