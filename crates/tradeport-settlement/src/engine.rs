//! Settlement Engine: per-order checks and transfer planning.
//!
//! Fulfillment runs in two phases:
//!
//! 1. [`prepare_order`]: derive the order hash under the offerer's live
//!    counter, check status, time window and signature, and resolve every
//!    item to its amount at `now`. Reads state only.
//! 2. [`apply_executions`]: perform the resolved transfers through the
//!    host's [`AssetTransfer`] capability.
//!
//! Nothing in phase 1 touches the ledger, so a failing order leaves no
//! trace. Phase 2 runs inside a ledger transaction opened by the caller.

use alloy_primitives::{Address, U256};
use tradeport_signing::{OrderHasher, verify_signer};
use tradeport_types::{
    ItemType, MarketplaceEvent, Order, OrderHash, OrderParameters, ReceivedItem, Result,
    SpentItem, TradeportError,
};

use crate::host::AssetTransfer;
use crate::registry::OrderRegistry;

/// Read-only view the engine checks orders against.
#[derive(Debug, Clone, Copy)]
pub struct SettlementContext<'a> {
    pub hasher: &'a OrderHasher,
    pub registry: &'a OrderRegistry,
    pub now: U256,
}

/// An order that passed every pre-transfer check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedOrder {
    pub order_hash: OrderHash,
    pub offerer: Address,
    pub zone: Address,
    /// Offer items at their amount for `now` (rounded down).
    pub offer: Vec<SpentItem>,
    /// Consideration items, tips included, at their amount for `now` (rounded up).
    pub consideration: Vec<ReceivedItem>,
    /// Native value the caller must supply: the greater bound of every native item.
    pub native_required: U256,
}

impl PreparedOrder {
    /// Transfers that settle this order for `caller`.
    ///
    /// Funding per leg:
    /// - native value, offer or consideration: `escrow`, which holds the
    ///   value `caller` supplied with the call;
    /// - fungible, non-fungible and semi-fungible consideration: `caller`
    ///   (the fulfiller), never the offerer;
    /// - fungible, non-fungible and semi-fungible offer: the offerer.
    ///
    /// Consideration legs go to their `recipient`; offer legs go to `caller`.
    #[must_use]
    pub fn executions(&self, caller: Address, escrow: Address) -> Vec<Execution> {
        let consideration = self.consideration.iter().map(|item| Execution {
            item_type: item.item_type,
            token: item.token,
            identifier: item.identifier,
            amount: item.amount,
            from: if item.item_type == ItemType::NativeValue {
                escrow
            } else {
                caller
            },
            to: item.recipient,
        });
        let offer = self.offer.iter().map(|item| Execution {
            item_type: item.item_type,
            token: item.token,
            identifier: item.identifier,
            amount: item.amount,
            from: if item.item_type == ItemType::NativeValue {
                escrow
            } else {
                self.offerer
            },
            to: caller,
        });
        consideration.chain(offer).collect()
    }

    /// The `OrderFulfilled` notification for `recipient`.
    #[must_use]
    pub fn fulfilled_event(&self, recipient: Address) -> MarketplaceEvent {
        MarketplaceEvent::OrderFulfilled {
            order_hash: self.order_hash,
            offerer: self.offerer,
            zone: self.zone,
            recipient,
            offer: self.offer.clone(),
            consideration: self.consideration.clone(),
        }
    }
}

/// One asset movement. For native value `from` is the escrow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    pub item_type: ItemType,
    pub token: Address,
    pub identifier: U256,
    pub amount: U256,
    pub from: Address,
    pub to: Address,
}

/// Derive the order hash under the offerer's live counter.
pub fn derive_order_hash(ctx: &SettlementContext<'_>, params: &OrderParameters) -> Result<OrderHash> {
    let counter = ctx.registry.counter(params.offerer);
    let components = params.to_components(counter)?;
    ctx.hasher.order_hash(&components)
}

/// Pre-transfer checks, in order: hash, cancelled, filled, time window,
/// signature (skipped for validated orders), amounts.
pub fn prepare_order(ctx: &SettlementContext<'_>, order: &Order) -> Result<PreparedOrder> {
    let params = &order.parameters;
    let order_hash = derive_order_hash(ctx, params)?;

    let status = ctx.registry.ensure_fulfillable(&order_hash)?;

    if !params.is_active_at(ctx.now) {
        return Err(TradeportError::InvalidTime {
            start_time: params.start_time,
            end_time: params.end_time,
        });
    }

    if !status.is_validated {
        verify_signer(ctx.hasher.digest(order_hash), &order.signature, params.offerer)?;
    }

    let (offer, consideration, native_required) =
        resolve_amounts(params, ctx.now).map_err(|err| match err {
            TradeportError::ArithmeticOverflow => TradeportError::InvalidOrderAmounts,
            other => other,
        })?;

    Ok(PreparedOrder {
        order_hash,
        offerer: params.offerer,
        zone: params.zone,
        offer,
        consideration,
        native_required,
    })
}

/// Every item at its amount for `now`, plus the order's native requirement.
fn resolve_amounts(
    params: &OrderParameters,
    now: U256,
) -> Result<(Vec<SpentItem>, Vec<ReceivedItem>, U256)> {
    let offer = params
        .offer
        .iter()
        .map(|item| {
            Ok(SpentItem {
                item_type: item.item_type,
                token: item.token,
                identifier: item.identifier,
                amount: item.amount_at(params.start_time, params.end_time, now)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let consideration = params
        .consideration
        .iter()
        .map(|item| {
            Ok(ReceivedItem {
                item_type: item.item_type,
                token: item.token,
                identifier: item.identifier,
                amount: item.amount_at(params.start_time, params.end_time, now)?,
                recipient: item.recipient,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok((offer, consideration, params.native_value_required()?))
}

/// Fail unless `supplied` covers `required`.
pub fn ensure_sufficient_value(required: U256, supplied: U256) -> Result<()> {
    if supplied < required {
        return Err(TradeportError::InsufficientNativeTokensSupplied { required, supplied });
    }
    Ok(())
}

/// Perform `executions` in order. Returns the native value paid out of
/// escrow. Zero-amount executions are skipped.
pub fn apply_executions<L: AssetTransfer>(ledger: &mut L, executions: &[Execution]) -> Result<U256> {
    let mut native_paid = U256::ZERO;
    for exec in executions.iter().filter(|e| !e.amount.is_zero()) {
        tracing::debug!(
            item_type = %exec.item_type,
            token = %exec.token,
            identifier = %exec.identifier,
            amount = %exec.amount,
            from = %exec.from,
            to = %exec.to,
            "transfer"
        );
        match exec.item_type {
            ItemType::NativeValue => {
                ledger.send_value(exec.to, exec.amount)?;
                native_paid = native_paid
                    .checked_add(exec.amount)
                    .ok_or(TradeportError::ArithmeticOverflow)?;
            }
            ItemType::Fungible => {
                ledger.transfer_fungible(exec.token, exec.from, exec.to, exec.amount)?;
            }
            ItemType::NonFungible => {
                ledger.transfer_non_fungible(exec.token, exec.from, exec.to, exec.identifier)?;
            }
            ItemType::SemiFungible => {
                ledger.transfer_semi_fungible(
                    exec.token,
                    exec.from,
                    exec.to,
                    exec.identifier,
                    exec.amount,
                )?;
            }
        }
    }
    Ok(native_paid)
}
