//! Order types for the Tradeport settlement engine.
//!
//! [`OrderParameters`] is what a fulfiller submits; [`OrderComponents`] is
//! what the offerer signs (the parameters plus the offerer's counter).

use alloy_primitives::{Address, B256, Bytes, U256};
use serde::{Deserialize, Serialize};

use crate::{ConsiderationItem, OfferItem, Result, TradeportError};

/// Who may cancel the order besides the offerer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum OrderType {
    /// Only the offerer may cancel.
    FullOpen = 0,
    /// The offerer or the zone may cancel.
    FullRestricted = 2,
}

impl OrderType {
    #[must_use]
    pub fn is_restricted(self) -> bool {
        self == Self::FullRestricted
    }
}

impl From<OrderType> for u8 {
    fn from(order_type: OrderType) -> Self {
        order_type as u8
    }
}

impl TryFrom<u8> for OrderType {
    type Error = TradeportError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::FullOpen),
            2 => Ok(Self::FullRestricted),
            other => Err(TradeportError::InvalidOrderType(other)),
        }
    }
}

impl std::fmt::Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FullOpen => write!(f, "FULL_OPEN"),
            Self::FullRestricted => write!(f, "FULL_RESTRICTED"),
        }
    }
}

/// Everything a fulfiller needs to settle an order, minus the signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderParameters {
    pub offerer: Address,
    pub zone: Address,
    pub offer: Vec<OfferItem>,
    pub consideration: Vec<ConsiderationItem>,
    pub order_type: OrderType,
    pub start_time: U256,
    pub end_time: U256,
    pub zone_hash: B256,
    pub salt: U256,
    /// Carried for hash compatibility only; transfers never route through a conduit.
    pub conduit_key: B256,
    /// How many leading consideration items the offerer signed. Items past
    /// this count are fulfiller-supplied tips.
    pub total_original_consideration_items: usize,
}

impl OrderParameters {
    /// An open order active from time zero with no expiry.
    #[must_use]
    pub fn new(
        offerer: Address,
        offer: Vec<OfferItem>,
        consideration: Vec<ConsiderationItem>,
    ) -> Self {
        let total_original_consideration_items = consideration.len();
        Self {
            offerer,
            zone: Address::ZERO,
            offer,
            consideration,
            order_type: OrderType::FullOpen,
            start_time: U256::ZERO,
            end_time: U256::MAX,
            zone_hash: B256::ZERO,
            salt: U256::ZERO,
            conduit_key: B256::ZERO,
            total_original_consideration_items,
        }
    }

    #[must_use]
    pub fn with_zone(mut self, zone: Address, order_type: OrderType) -> Self {
        self.zone = zone;
        self.order_type = order_type;
        self
    }

    #[must_use]
    pub fn with_window(mut self, start_time: U256, end_time: U256) -> Self {
        self.start_time = start_time;
        self.end_time = end_time;
        self
    }

    #[must_use]
    pub fn with_salt(mut self, salt: U256) -> Self {
        self.salt = salt;
        self
    }

    /// Whether `start_time <= now < end_time`.
    #[must_use]
    pub fn is_active_at(&self, now: U256) -> bool {
        self.start_time <= now && now < self.end_time
    }

    /// The signed prefix of the consideration list.
    ///
    /// # Errors
    /// [`TradeportError::MissingOriginalConsiderationItems`] if the list is
    /// shorter than `total_original_consideration_items`.
    pub fn original_consideration(&self) -> Result<&[ConsiderationItem]> {
        let expected = self.total_original_consideration_items;
        self.consideration
            .get(..expected)
            .ok_or(TradeportError::MissingOriginalConsiderationItems {
                expected,
                actual: self.consideration.len(),
            })
    }

    /// Components as signed under `counter`.
    pub fn to_components(&self, counter: U256) -> Result<OrderComponents> {
        Ok(OrderComponents {
            offerer: self.offerer,
            zone: self.zone,
            offer: self.offer.clone(),
            consideration: self.original_consideration()?.to_vec(),
            order_type: self.order_type,
            start_time: self.start_time,
            end_time: self.end_time,
            zone_hash: self.zone_hash,
            salt: self.salt,
            conduit_key: self.conduit_key,
            counter,
        })
    }

    /// Native value a fulfiller must supply: the larger amount bound of
    /// every native offer and consideration item.
    pub fn native_value_required(&self) -> Result<U256> {
        self.offer
            .iter()
            .filter(|item| item.is_native())
            .map(OfferItem::max_amount)
            .chain(
                self.consideration
                    .iter()
                    .filter(|item| item.is_native())
                    .map(ConsiderationItem::max_amount),
            )
            .try_fold(U256::ZERO, |acc, amount| {
                acc.checked_add(amount)
                    .ok_or(TradeportError::ArithmeticOverflow)
            })
    }
}

/// The exact structure that is hashed and signed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderComponents {
    pub offerer: Address,
    pub zone: Address,
    pub offer: Vec<OfferItem>,
    pub consideration: Vec<ConsiderationItem>,
    pub order_type: OrderType,
    pub start_time: U256,
    pub end_time: U256,
    pub zone_hash: B256,
    pub salt: U256,
    pub conduit_key: B256,
    pub counter: U256,
}

impl OrderComponents {
    /// Whether `caller` may cancel this order.
    #[must_use]
    pub fn can_be_cancelled_by(&self, caller: Address) -> bool {
        caller == self.offerer || (self.order_type.is_restricted() && caller == self.zone)
    }
}

/// A signed order as submitted for fulfillment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub parameters: OrderParameters,
    /// 65-byte `(r, s, v)` or 64-byte EIP-2098 compact signature.
    pub signature: Bytes,
}

impl Order {
    #[must_use]
    pub fn new(parameters: OrderParameters, signature: impl Into<Bytes>) -> Self {
        Self {
            parameters,
            signature: signature.into(),
        }
    }
}

/// Points at one item of one order in a fulfill-available call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FulfillmentComponent {
    pub order_index: usize,
    pub item_index: usize,
}

impl FulfillmentComponent {
    #[must_use]
    pub fn new(order_index: usize, item_index: usize) -> Self {
        Self {
            order_index,
            item_index,
        }
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl OrderParameters {
    /// Open order with a random salt.
    pub fn dummy(
        offerer: Address,
        offer: Vec<OfferItem>,
        consideration: Vec<ConsiderationItem>,
    ) -> Self {
        use rand::RngCore;

        let mut salt = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut salt);
        Self::new(offerer, offer, consideration).with_salt(U256::from_be_bytes(salt))
    }
}
