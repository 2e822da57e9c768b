//! Per-order lifecycle status.

use serde::{Deserialize, Serialize};

/// Persisted status of one order hash. All-false for an order never seen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatus {
    pub is_validated: bool,
    pub is_cancelled: bool,
    pub is_fulfilled: bool,
}

impl OrderStatus {
    /// Lifecycle state implied by the flags. A cancelled flag wins over a
    /// fulfilled one, since cancelling a filled order is allowed.
    #[must_use]
    pub fn state(&self) -> OrderState {
        if self.is_cancelled {
            OrderState::Cancelled
        } else if self.is_fulfilled {
            OrderState::Fulfilled
        } else if self.is_validated {
            OrderState::Validated
        } else {
            OrderState::Unseen
        }
    }

    /// Neither cancelled nor fulfilled.
    #[must_use]
    pub fn is_open(&self) -> bool {
        !self.is_cancelled && !self.is_fulfilled
    }
}

/// Lifecycle of an order.
///
/// ```text
/// Unseen | Validated ──validate──▶ Validated
/// Unseen | Validated ──fulfill───▶ Fulfilled
/// Unseen | Validated ──cancel────▶ Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderState {
    Unseen,
    Validated,
    Fulfilled,
    Cancelled,
}

impl OrderState {
    /// Whether `self → next` is a legal transition. Re-validating is a
    /// no-op, and a filled order may still be marked cancelled.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Unseen | Self::Validated, Self::Validated)
                | (Self::Unseen | Self::Validated, Self::Fulfilled)
                | (Self::Unseen | Self::Validated | Self::Fulfilled, Self::Cancelled)
                | (Self::Cancelled, Self::Cancelled)
        )
    }

    /// No further fulfillment possible.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Fulfilled | Self::Cancelled)
    }
}

impl std::fmt::Display for OrderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unseen => write!(f, "UNSEEN"),
            Self::Validated => write!(f, "VALIDATED"),
            Self::Fulfilled => write!(f, "FULFILLED"),
            Self::Cancelled => write!(f, "CANCELLED"),
        }
    }
}
