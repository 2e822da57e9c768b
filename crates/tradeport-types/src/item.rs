//! Offer and consideration items.
//!
//! An item names an asset (`item_type` + `token` + `identifier`) and an
//! amount that may move linearly from `start_amount` to `end_amount` over the
//! order's active window.

use alloy_primitives::{Address, U256, U512};
use serde::{Deserialize, Serialize};

use crate::{Result, TradeportError};

/// The kind of asset an item transfers. Discriminants are part of the
/// signed encoding (`uint8 itemType`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum ItemType {
    /// The ledger's native value. `token` and `identifier` are zero.
    NativeValue = 0,
    /// Fungible token balance.
    Fungible = 1,
    /// Single non-fungible token.
    NonFungible = 2,
    /// Semi-fungible token balance under an identifier.
    SemiFungible = 3,
}

impl From<ItemType> for u8 {
    fn from(item_type: ItemType) -> Self {
        item_type as u8
    }
}

impl TryFrom<u8> for ItemType {
    type Error = TradeportError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::NativeValue),
            1 => Ok(Self::Fungible),
            2 => Ok(Self::NonFungible),
            3 => Ok(Self::SemiFungible),
            other => Err(TradeportError::InvalidItemType(other)),
        }
    }
}

impl std::fmt::Display for ItemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NativeValue => write!(f, "NATIVE"),
            Self::Fungible => write!(f, "FUNGIBLE"),
            Self::NonFungible => write!(f, "NON_FUNGIBLE"),
            Self::SemiFungible => write!(f, "SEMI_FUNGIBLE"),
        }
    }
}

/// Linear amount interpolation over `[start_time, end_time)`.
///
/// `(start_amount * remaining + end_amount * elapsed) / duration`, rounded
/// up when `round_up` is set. Consideration amounts round up (in favour of
/// the offerer), offer amounts round down. The weighted sum is taken in 512
/// bits, so any window (including the default `[0, U256::MAX)`) interpolates.
pub fn interpolate_amount(
    start_amount: U256,
    end_amount: U256,
    start_time: U256,
    end_time: U256,
    now: U256,
    round_up: bool,
) -> Result<U256> {
    if start_amount == end_amount {
        return Ok(end_amount);
    }
    let duration = end_time.saturating_sub(start_time);
    if duration.is_zero() {
        return Ok(end_amount);
    }
    let elapsed = now.saturating_sub(start_time).min(duration);
    let remaining = duration - elapsed;

    // Each product fits in 512 bits and so does their sum.
    let total = widen(start_amount) * widen(remaining) + widen(end_amount) * widen(elapsed);
    let duration = widen(duration);

    let amount = if round_up && !total.is_zero() {
        (total - U512::from(1)) / duration + U512::from(1)
    } else {
        total / duration
    };
    narrow(amount)
}

fn widen(value: U256) -> U512 {
    let [a, b, c, d] = *value.as_limbs();
    U512::from_limbs([a, b, c, d, 0, 0, 0, 0])
}

fn narrow(value: U512) -> Result<U256> {
    let limbs = value.as_limbs();
    if limbs[4..].iter().any(|limb| *limb != 0) {
        return Err(TradeportError::ArithmeticOverflow);
    }
    Ok(U256::from_limbs([limbs[0], limbs[1], limbs[2], limbs[3]]))
}

// ---------------------------------------------------------------------------
// OfferItem
// ---------------------------------------------------------------------------

/// An asset the offerer gives up.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferItem {
    pub item_type: ItemType,
    pub token: Address,
    pub identifier: U256,
    pub start_amount: U256,
    pub end_amount: U256,
}

impl OfferItem {
    /// Native value offered at a fixed amount.
    #[must_use]
    pub fn native(amount: U256) -> Self {
        Self {
            item_type: ItemType::NativeValue,
            token: Address::ZERO,
            identifier: U256::ZERO,
            start_amount: amount,
            end_amount: amount,
        }
    }

    #[must_use]
    pub fn fungible(token: Address, amount: U256) -> Self {
        Self {
            item_type: ItemType::Fungible,
            token,
            identifier: U256::ZERO,
            start_amount: amount,
            end_amount: amount,
        }
    }

    /// A single non-fungible token.
    #[must_use]
    pub fn non_fungible(collection: Address, token_id: U256) -> Self {
        Self {
            item_type: ItemType::NonFungible,
            token: collection,
            identifier: token_id,
            start_amount: U256::from(1),
            end_amount: U256::from(1),
        }
    }

    #[must_use]
    pub fn semi_fungible(token: Address, token_id: U256, amount: U256) -> Self {
        Self {
            item_type: ItemType::SemiFungible,
            token,
            identifier: token_id,
            start_amount: amount,
            end_amount: amount,
        }
    }

    #[must_use]
    pub fn is_native(&self) -> bool {
        self.item_type == ItemType::NativeValue
    }

    /// The larger of the two amount bounds.
    #[must_use]
    pub fn max_amount(&self) -> U256 {
        self.start_amount.max(self.end_amount)
    }

    /// Amount at `now`, rounded down.
    pub fn amount_at(&self, start_time: U256, end_time: U256, now: U256) -> Result<U256> {
        interpolate_amount(
            self.start_amount,
            self.end_amount,
            start_time,
            end_time,
            now,
            false,
        )
    }
}

// ---------------------------------------------------------------------------
// ConsiderationItem
// ---------------------------------------------------------------------------

/// An asset the offerer demands in return, paid to `recipient`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsiderationItem {
    pub item_type: ItemType,
    pub token: Address,
    pub identifier: U256,
    pub start_amount: U256,
    pub end_amount: U256,
    pub recipient: Address,
}

impl ConsiderationItem {
    /// Native value paid to `recipient` at a fixed amount.
    #[must_use]
    pub fn native(amount: U256, recipient: Address) -> Self {
        Self {
            item_type: ItemType::NativeValue,
            token: Address::ZERO,
            identifier: U256::ZERO,
            start_amount: amount,
            end_amount: amount,
            recipient,
        }
    }

    #[must_use]
    pub fn fungible(token: Address, amount: U256, recipient: Address) -> Self {
        Self {
            item_type: ItemType::Fungible,
            token,
            identifier: U256::ZERO,
            start_amount: amount,
            end_amount: amount,
            recipient,
        }
    }

    #[must_use]
    pub fn non_fungible(collection: Address, token_id: U256, recipient: Address) -> Self {
        Self {
            item_type: ItemType::NonFungible,
            token: collection,
            identifier: token_id,
            start_amount: U256::from(1),
            end_amount: U256::from(1),
            recipient,
        }
    }

    #[must_use]
    pub fn is_native(&self) -> bool {
        self.item_type == ItemType::NativeValue
    }

    /// The larger of the two amount bounds.
    #[must_use]
    pub fn max_amount(&self) -> U256 {
        self.start_amount.max(self.end_amount)
    }

    /// Amount at `now`, rounded up.
    pub fn amount_at(&self, start_time: U256, end_time: U256, now: U256) -> Result<U256> {
        interpolate_amount(
            self.start_amount,
            self.end_amount,
            start_time,
            end_time,
            now,
            true,
        )
    }
}

// ---------------------------------------------------------------------------
// Executed items (event payloads)
// ---------------------------------------------------------------------------

/// An offer item as actually transferred to the fulfiller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpentItem {
    pub item_type: ItemType,
    pub token: Address,
    pub identifier: U256,
    pub amount: U256,
}

/// A consideration item as actually paid to its recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceivedItem {
    pub item_type: ItemType,
    pub token: Address,
    pub identifier: U256,
    pub amount: U256,
    pub recipient: Address,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u(v: u64) -> U256 {
        U256::from(v)
    }

    #[test]
    fn item_type_discriminants() {
        assert_eq!(u8::from(ItemType::NativeValue), 0);
        assert_eq!(u8::from(ItemType::NonFungible), 2);
        assert_eq!(ItemType::try_from(3).unwrap(), ItemType::SemiFungible);
        assert_eq!(
            ItemType::try_from(4).unwrap_err(),
            TradeportError::InvalidItemType(4)
        );
    }

    #[test]
    fn item_type_serializes_as_number() {
        let json = serde_json::to_string(&ItemType::NonFungible).unwrap();
        assert_eq!(json, "2");
        assert!(serde_json::from_str::<ItemType>("9").is_err());
    }

    #[test]
    fn fixed_amount_ignores_time() {
        let amount = interpolate_amount(u(10), u(10), u(0), u(100), u(50), true).unwrap();
        assert_eq!(amount, u(10));
    }

    #[test]
    fn ascending_amount_midpoint() {
        let amount = interpolate_amount(u(100), u(200), u(0), u(100), u(50), false).unwrap();
        assert_eq!(amount, u(150));
    }

    #[test]
    fn descending_amount_endpoints() {
        let at_start = interpolate_amount(u(200), u(100), u(10), u(110), u(10), false).unwrap();
        assert_eq!(at_start, u(200));
        let past_end = interpolate_amount(u(200), u(100), u(10), u(110), u(500), false).unwrap();
        assert_eq!(past_end, u(100));
    }

    #[test]
    fn rounding_direction() {
        // (1 * 2 + 2 * 1) / 3 = 4 / 3
        let down = interpolate_amount(u(1), u(2), u(0), u(3), u(1), false).unwrap();
        let up = interpolate_amount(u(1), u(2), u(0), u(3), u(1), true).unwrap();
        assert_eq!(down, u(1));
        assert_eq!(up, u(2));
    }

    #[test]
    fn full_range_amounts_interpolate() {
        let down = interpolate_amount(U256::MAX, u(0), u(0), u(10), u(1), false).unwrap();
        let up = interpolate_amount(U256::MAX, u(0), u(0), u(10), u(1), true).unwrap();
        assert!(down > U256::MAX / u(2) && down < U256::MAX);
        assert_eq!(up, down + u(1));
    }

    #[test]
    fn default_window_interpolates() {
        let mid = U256::MAX / u(2);
        assert_eq!(
            interpolate_amount(u(10), u(20), U256::ZERO, U256::MAX, mid, false).unwrap(),
            u(14)
        );
        assert_eq!(
            interpolate_amount(u(10), u(20), U256::ZERO, U256::MAX, mid, true).unwrap(),
            u(15)
        );
        assert_eq!(
            interpolate_amount(u(10), u(20), U256::ZERO, U256::MAX, U256::ZERO, true).unwrap(),
            u(10)
        );
    }

    #[test]
    fn max_amount_takes_greater_bound() {
        let mut item = ConsiderationItem::native(u(5), Address::ZERO);
        item.end_amount = u(8);
        assert_eq!(item.max_amount(), u(8));
        item.start_amount = u(9);
        assert_eq!(item.max_amount(), u(9));
    }

    #[test]
    fn consideration_json_uses_camel_case() {
        let item = ConsiderationItem::native(u(1), Address::repeat_byte(0x11));
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["itemType"], 0);
        assert!(json.get("startAmount").is_some());
        assert!(json.get("recipient").is_some());
    }
}
