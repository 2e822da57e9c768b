//! Error types for the Tradeport settlement engine.
//!
//! All errors use the `TP_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Signature errors
//! - 2xx: Order state / validity errors
//! - 3xx: Value accounting errors
//! - 4xx: Fulfillment component errors
//! - 5xx: External transfer errors
//! - 9xx: General / internal errors

use alloy_primitives::{Address, U256};
use thiserror::Error;

use crate::OrderHash;

/// Failure reported by the external asset-transfer capability.
///
/// These surface unmodified through [`TradeportError::Transfer`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    /// Not enough native value in the paying account.
    #[error("insufficient native balance for {account}: need {needed}, have {available}")]
    InsufficientBalance {
        account: Address,
        needed: U256,
        available: U256,
    },

    /// Not enough fungible / semi-fungible token balance.
    #[error("insufficient balance of {token} for {account}: need {needed}, have {available}")]
    InsufficientTokenBalance {
        token: Address,
        account: Address,
        needed: U256,
        available: U256,
    },

    /// `from` does not own the non-fungible token.
    #[error("{from} does not own token {token_id} of {collection}")]
    NotOwner {
        collection: Address,
        token_id: U256,
        from: Address,
    },

    /// The owner has not approved the settlement operator.
    #[error("{operator} is not approved to move assets of {owner} in {token}")]
    NotApproved {
        token: Address,
        owner: Address,
        operator: Address,
    },
}

/// Central error enum for all Tradeport operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TradeportError {
    // =================================================================
    // Signature Errors (1xx)
    // =================================================================
    /// Malformed signature bytes, bad length, or unrecoverable signature.
    #[error("TP_ERR_100: Invalid signature: {reason}")]
    InvalidSignature { reason: String },

    /// The signature recovered to someone other than the offerer.
    #[error("TP_ERR_101: Invalid signer: expected {expected}, recovered {recovered}")]
    InvalidSigner { expected: Address, recovered: Address },

    // =================================================================
    // Order Errors (2xx)
    // =================================================================
    /// Fulfillment attempted outside `[start_time, end_time)`.
    #[error("TP_ERR_200: Invalid time: order active from {start_time} until {end_time}")]
    InvalidTime { start_time: U256, end_time: U256 },

    /// The order was cancelled.
    #[error("TP_ERR_201: Order is cancelled: {0}")]
    OrderIsCancelled(OrderHash),

    /// The order was already fulfilled.
    #[error("TP_ERR_202: Order already filled: {0}")]
    OrderAlreadyFilled(OrderHash),

    /// Caller is neither the offerer nor (for restricted orders) the zone.
    #[error("TP_ERR_203: Caller cannot cancel order")]
    CannotCancelOrder,

    /// Fewer consideration items than `total_original_consideration_items`.
    #[error("TP_ERR_204: Missing original consideration items: expected {expected}, got {actual}")]
    MissingOriginalConsiderationItems { expected: usize, actual: usize },

    /// Unknown item type discriminant.
    #[error("TP_ERR_205: Invalid item type: {0}")]
    InvalidItemType(u8),

    /// Unknown order type discriminant.
    #[error("TP_ERR_206: Invalid order type: {0}")]
    InvalidOrderType(u8),

    /// The order's item amounts cannot be resolved, e.g. its native
    /// requirement exceeds 256 bits.
    #[error("TP_ERR_207: Invalid order amounts")]
    InvalidOrderAmounts,

    // =================================================================
    // Value Errors (3xx)
    // =================================================================
    /// The caller supplied less native value than the accepted orders require.
    #[error("TP_ERR_300: Insufficient native tokens supplied: need {required}, got {supplied}")]
    InsufficientNativeTokensSupplied { required: U256, supplied: U256 },

    /// An amount computation overflowed 256 bits.
    #[error("TP_ERR_301: Arithmetic overflow")]
    ArithmeticOverflow,

    // =================================================================
    // Fulfillment Component Errors (4xx)
    // =================================================================
    /// A component points at an order or item that does not exist.
    #[error("TP_ERR_400: Invalid fulfillment component: order {order_index}, item {item_index}")]
    InvalidFulfillmentComponent {
        order_index: usize,
        item_index: usize,
    },

    /// A fulfillment was given with no components.
    #[error("TP_ERR_401: Missing fulfillment component")]
    MissingFulfillmentComponent,

    /// Components of one fulfillment do not describe the same transfer.
    #[error("TP_ERR_402: Mismatched fulfillment components")]
    MismatchedFulfillmentComponents,

    /// The same item was referenced by more than one component.
    #[error("TP_ERR_403: Duplicate fulfillment component: order {order_index}, item {item_index}")]
    DuplicateFulfillmentComponent {
        order_index: usize,
        item_index: usize,
    },

    /// A consideration item of an accepted order is not covered by any fulfillment.
    #[error("TP_ERR_404: Consideration not met: order {order_index}, item {item_index}")]
    ConsiderationNotMet {
        order_index: usize,
        item_index: usize,
    },

    /// Every order of a fulfill-available call was skipped.
    #[error("TP_ERR_405: No specified orders available")]
    NoSpecifiedOrdersAvailable,

    // =================================================================
    // Transfer Errors (5xx)
    // =================================================================
    /// The external transfer capability refused a transfer.
    #[error("TP_ERR_500: Transfer failed: {0}")]
    Transfer(#[from] TransferError),

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("TP_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("TP_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config file, missing fields, etc.).
    #[error("TP_ERR_902: Configuration error: {0}")]
    Configuration(String),

    /// I/O error (disk, network).
    #[error("TP_ERR_903: I/O error: {0}")]
    Io(String),

    /// Typed-data encoding error (unknown type, value/type mismatch).
    #[error("TP_ERR_904: Encoding error: {0}")]
    Encoding(String),
}

impl TradeportError {
    /// Whether this failure is a pre-transfer validity failure of a single
    /// order. Batch fulfillment skips such orders instead of failing the
    /// whole call; everything else (value shortfall, transfer failures,
    /// malformed fulfillments) stays fatal.
    #[must_use]
    pub fn is_skippable(&self) -> bool {
        matches!(
            self,
            Self::InvalidTime { .. }
                | Self::OrderIsCancelled(_)
                | Self::OrderAlreadyFilled(_)
                | Self::InvalidSignature { .. }
                | Self::InvalidSigner { .. }
                | Self::MissingOriginalConsiderationItems { .. }
                | Self::InvalidOrderAmounts
        )
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, TradeportError>;

impl From<std::io::Error> for TradeportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for TradeportError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
