//! Fulfill-available aggregation.
//!
//! A fulfillment is a list of [`FulfillmentComponent`]s, each pointing at one
//! `(order, item)` pair. All components of a fulfillment must describe the
//! same transfer and are netted into a single execution:
//!
//! - **consideration** fulfillments share recipient, item type, token and
//!   identifier; their amounts are summed into one payment to that
//!   recipient by the caller (native value out of escrow)
//! - **offer** fulfillments share offerer, item type, token and identifier;
//!   each component is still paid individually from the offerer to the
//!   caller
//!
//! Components pointing at skipped orders are ignored. Every consideration
//! item of every accepted order must be covered exactly once. Offer items
//! left out of every fulfillment stay with their offerer. Non-fungible
//! items are never summed.

use std::collections::HashSet;

use alloy_primitives::{Address, U256};
use tradeport_types::{FulfillmentComponent, ItemType, Order, Result, TradeportError};

use crate::batch::BatchPlan;
use crate::engine::{Execution, PreparedOrder};

/// Which side of the orders a fulfillment draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Offer,
    Consideration,
}

/// What every component of one fulfillment must agree on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TransferKey {
    item_type: ItemType,
    token: Address,
    identifier: U256,
    /// Offerer for offer fulfillments, recipient for consideration ones.
    party: Address,
}

fn accepted<'p>(plan: &'p BatchPlan, order_index: usize) -> Option<&'p PreparedOrder> {
    plan.accepted
        .iter()
        .find(|(i, _)| *i == order_index)
        .map(|(_, prepared)| prepared)
}

/// Bounds check against the submitted orders, accepted or not.
fn check_range(orders: &[Order], side: Side, c: FulfillmentComponent) -> Result<()> {
    let len = orders.get(c.order_index).map(|order| match side {
        Side::Offer => order.parameters.offer.len(),
        Side::Consideration => order.parameters.consideration.len(),
    });
    match len {
        Some(len) if c.item_index < len => Ok(()),
        _ => Err(TradeportError::InvalidFulfillmentComponent {
            order_index: c.order_index,
            item_index: c.item_index,
        }),
    }
}

/// Key and amount of one component of an accepted order.
fn resolve(prepared: &PreparedOrder, side: Side, item_index: usize) -> Option<(TransferKey, U256)> {
    match side {
        Side::Offer => prepared.offer.get(item_index).map(|item| {
            (
                TransferKey {
                    item_type: item.item_type,
                    token: item.token,
                    identifier: item.identifier,
                    party: prepared.offerer,
                },
                item.amount,
            )
        }),
        Side::Consideration => prepared.consideration.get(item_index).map(|item| {
            (
                TransferKey {
                    item_type: item.item_type,
                    token: item.token,
                    identifier: item.identifier,
                    party: item.recipient,
                },
                item.amount,
            )
        }),
    }
}

fn aggregate_side(
    orders: &[Order],
    plan: &BatchPlan,
    side: Side,
    fulfillments: &[Vec<FulfillmentComponent>],
    caller: Address,
    escrow: Address,
    covered: &mut HashSet<FulfillmentComponent>,
) -> Result<Vec<Execution>> {
    let mut executions = Vec::new();

    for fulfillment in fulfillments {
        if fulfillment.is_empty() {
            return Err(TradeportError::MissingFulfillmentComponent);
        }

        let mut key: Option<TransferKey> = None;
        let mut amounts = Vec::with_capacity(fulfillment.len());

        for &component in fulfillment {
            check_range(orders, side, component)?;
            if !covered.insert(component) {
                return Err(TradeportError::DuplicateFulfillmentComponent {
                    order_index: component.order_index,
                    item_index: component.item_index,
                });
            }
            let Some(prepared) = accepted(plan, component.order_index) else {
                continue;
            };
            let Some((item_key, amount)) = resolve(prepared, side, component.item_index) else {
                return Err(TradeportError::InvalidFulfillmentComponent {
                    order_index: component.order_index,
                    item_index: component.item_index,
                });
            };
            match key {
                None => key = Some(item_key),
                Some(existing) if existing != item_key => {
                    return Err(TradeportError::MismatchedFulfillmentComponents);
                }
                Some(_) => {}
            }
            amounts.push(amount);
        }

        // Every component pointed at a skipped order.
        let Some(key) = key else {
            continue;
        };

        let (from, to) = match side {
            Side::Offer => (key.party, caller),
            Side::Consideration => (caller, key.party),
        };
        let from = if key.item_type == ItemType::NativeValue {
            escrow
        } else {
            from
        };
        let execution = |amount| Execution {
            item_type: key.item_type,
            token: key.token,
            identifier: key.identifier,
            amount,
            from,
            to,
        };

        if side == Side::Offer || key.item_type == ItemType::NonFungible {
            executions.extend(amounts.into_iter().map(execution));
        } else {
            let total = amounts
                .into_iter()
                .try_fold(U256::ZERO, |acc, a| acc.checked_add(a))
                .ok_or(TradeportError::ArithmeticOverflow)?;
            executions.push(execution(total));
        }
    }

    Ok(executions)
}

/// Net the fulfillments of a fulfill-available call into executions:
/// consideration legs first, then offer legs.
///
/// # Errors
/// - [`TradeportError::MissingFulfillmentComponent`] for an empty fulfillment
/// - [`TradeportError::InvalidFulfillmentComponent`] for an out-of-range pointer
/// - [`TradeportError::DuplicateFulfillmentComponent`] for an item referenced twice
/// - [`TradeportError::MismatchedFulfillmentComponents`] for a fulfillment mixing transfers
/// - [`TradeportError::ConsiderationNotMet`] for an uncovered consideration item
pub fn aggregate_fulfillments(
    orders: &[Order],
    plan: &BatchPlan,
    offer_fulfillments: &[Vec<FulfillmentComponent>],
    consideration_fulfillments: &[Vec<FulfillmentComponent>],
    caller: Address,
    escrow: Address,
) -> Result<Vec<Execution>> {
    let mut covered = HashSet::new();
    let mut executions = aggregate_side(
        orders,
        plan,
        Side::Consideration,
        consideration_fulfillments,
        caller,
        escrow,
        &mut covered,
    )?;

    for (order_index, prepared) in &plan.accepted {
        for item_index in 0..prepared.consideration.len() {
            let component = FulfillmentComponent::new(*order_index, item_index);
            if !covered.contains(&component) {
                return Err(TradeportError::ConsiderationNotMet {
                    order_index: *order_index,
                    item_index,
                });
            }
        }
    }

    let mut offer_covered = HashSet::new();
    executions.extend(aggregate_side(
        orders,
        plan,
        Side::Offer,
        offer_fulfillments,
        caller,
        escrow,
        &mut offer_covered,
    )?);

    Ok(executions)
}
