//! Notifications emitted by state-changing marketplace calls.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::{OrderHash, ReceivedItem, SpentItem};

/// One marketplace notification. Appended to the event log only when the
/// emitting call commits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum MarketplaceEvent {
    #[serde(rename_all = "camelCase")]
    CounterIncremented { new_counter: U256, offerer: Address },

    #[serde(rename_all = "camelCase")]
    OrderCancelled {
        order_hash: OrderHash,
        offerer: Address,
        zone: Address,
    },

    #[serde(rename_all = "camelCase")]
    OrderValidated {
        order_hash: OrderHash,
        offerer: Address,
        zone: Address,
    },

    #[serde(rename_all = "camelCase")]
    OrderFulfilled {
        order_hash: OrderHash,
        offerer: Address,
        zone: Address,
        recipient: Address,
        offer: Vec<SpentItem>,
        consideration: Vec<ReceivedItem>,
    },
}

impl MarketplaceEvent {
    /// Order hash the event refers to, if any.
    #[must_use]
    pub fn order_hash(&self) -> Option<OrderHash> {
        match self {
            Self::CounterIncremented { .. } => None,
            Self::OrderCancelled { order_hash, .. }
            | Self::OrderValidated { order_hash, .. }
            | Self::OrderFulfilled { order_hash, .. } => Some(*order_hash),
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::CounterIncremented { .. } => "CounterIncremented",
            Self::OrderCancelled { .. } => "OrderCancelled",
            Self::OrderValidated { .. } => "OrderValidated",
            Self::OrderFulfilled { .. } => "OrderFulfilled",
        }
    }
}

impl std::fmt::Display for MarketplaceEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.order_hash() {
            Some(hash) => write!(f, "{}({})", self.name(), hash.short()),
            None => write!(f, "{}", self.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::B256;

    use super::*;

    #[test]
    fn event_json_is_tagged() {
        let event = MarketplaceEvent::CounterIncremented {
            new_counter: U256::from(7),
            offerer: Address::repeat_byte(0x01),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "counterIncremented");
        assert!(json.get("newCounter").is_some());
        let back: MarketplaceEvent = serde_json::from_value(json).unwrap();
        assert_eq!(event, back);
    }

    #[test]
    fn order_hash_accessor() {
        let hash = OrderHash(B256::repeat_byte(0xcd));
        let event = MarketplaceEvent::OrderCancelled {
            order_hash: hash,
            offerer: Address::ZERO,
            zone: Address::ZERO,
        };
        assert_eq!(event.order_hash(), Some(hash));
        assert_eq!(event.to_string(), "OrderCancelled(cdcdcdcd)");
    }
}
