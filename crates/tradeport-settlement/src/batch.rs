//! Batch Coordinator: order selection for multi-order fulfillment.
//!
//! Runs the engine's pre-transfer checks over a list of orders and splits
//! it into accepted and skipped orders. Only validity failures of a single
//! order ([`TradeportError::is_skippable`]) cause a skip; any other failure
//! aborts the whole call. The same order submitted twice is accepted once
//! and skipped as already filled afterwards.

use std::collections::HashSet;

use alloy_primitives::U256;
use tradeport_types::{Order, OrderHash, Result, SkippedOrder, TradeportError};

use crate::engine::{PreparedOrder, SettlementContext, derive_order_hash, prepare_order};

/// Outcome of [`plan_batch`].
#[derive(Debug, Clone, Default)]
pub struct BatchPlan {
    /// `(position in the submitted list, prepared order)`.
    pub accepted: Vec<(usize, PreparedOrder)>,
    pub skipped: Vec<SkippedOrder>,
    /// Sum of `native_required` over accepted orders.
    pub native_required: U256,
}

impl BatchPlan {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty()
    }

    /// Whether the order at `index` was accepted.
    #[must_use]
    pub fn is_accepted(&self, index: usize) -> bool {
        self.accepted.iter().any(|(i, _)| *i == index)
    }

    fn skip(&mut self, index: usize, order_hash: Option<OrderHash>, reason: String) {
        tracing::warn!(
            index,
            order_hash = ?order_hash.map(|h| h.short()),
            reason = %reason,
            "skipping order"
        );
        self.skipped.push(SkippedOrder {
            index,
            order_hash,
            reason,
        });
    }
}

/// Select the fulfillable orders among `orders`, accepting at most
/// `max_orders` of them when a limit is given.
///
/// # Errors
/// The first non-skippable failure, or
/// [`TradeportError::ArithmeticOverflow`] if the aggregate native
/// requirement overflows.
pub fn plan_batch(
    ctx: &SettlementContext<'_>,
    orders: &[Order],
    max_orders: Option<usize>,
) -> Result<BatchPlan> {
    let mut plan = BatchPlan::default();
    let mut seen = HashSet::new();

    for (index, order) in orders.iter().enumerate() {
        if max_orders.is_some_and(|max| plan.accepted.len() >= max) {
            let hash = derive_order_hash(ctx, &order.parameters).ok();
            plan.skip(index, hash, "maximum order count reached".to_string());
            continue;
        }

        match prepare_order(ctx, order) {
            Ok(prepared) if !seen.insert(prepared.order_hash) => {
                let hash = prepared.order_hash;
                plan.skip(
                    index,
                    Some(hash),
                    TradeportError::OrderAlreadyFilled(hash).to_string(),
                );
            }
            Ok(prepared) => {
                plan.native_required = plan
                    .native_required
                    .checked_add(prepared.native_required)
                    .ok_or(TradeportError::ArithmeticOverflow)?;
                plan.accepted.push((index, prepared));
            }
            Err(err) if err.is_skippable() => {
                let hash = derive_order_hash(ctx, &order.parameters).ok();
                plan.skip(index, hash, err.to_string());
            }
            Err(err) => return Err(err),
        }
    }

    Ok(plan)
}

#[cfg(test)]
mod tests {
    use alloy_primitives::Address;
    use tradeport_signing::OrderHasher;
    use tradeport_signing::testing::TestSigner;
    use tradeport_types::{ConsiderationItem, MarketplaceConfig, OfferItem, OrderParameters};

    use super::*;
    use crate::registry::OrderRegistry;

    fn u(v: u64) -> U256 {
        U256::from(v)
    }

    fn listing(seller: Address, token_id: u64) -> OrderParameters {
        OrderParameters::dummy(
            seller,
            vec![OfferItem::non_fungible(Address::repeat_byte(0xc0), u(token_id))],
            vec![ConsiderationItem::native(u(10), seller)],
        )
        .with_window(u(100), u(200))
    }

    fn setup() -> (OrderHasher, OrderRegistry, TestSigner) {
        (
            OrderHasher::new(&MarketplaceConfig::default()).unwrap(),
            OrderRegistry::new(),
            TestSigner::from_seed(1),
        )
    }

    #[test]
    fn expired_order_skipped_valid_accepted() {
        let (hasher, registry, seller) = setup();
        let valid = seller.sign_order(&hasher, listing(seller.address(), 1), U256::ZERO);
        let expired = seller.sign_order(
            &hasher,
            listing(seller.address(), 2).with_window(u(0), u(50)),
            U256::ZERO,
        );
        let ctx = SettlementContext {
            hasher: &hasher,
            registry: &registry,
            now: u(150),
        };

        let plan = plan_batch(&ctx, &[expired, valid], None).unwrap();
        assert_eq!(plan.accepted.len(), 1);
        assert!(plan.is_accepted(1));
        assert_eq!(plan.skipped.len(), 1);
        assert_eq!(plan.skipped[0].index, 0);
        assert!(plan.skipped[0].reason.starts_with("TP_ERR_200"));
        assert_eq!(plan.native_required, u(10));
    }

    #[test]
    fn unrepresentable_amounts_skipped_not_fatal() {
        let (hasher, registry, seller) = setup();
        let mut ascending = ConsiderationItem::native(u(10), seller.address());
        ascending.end_amount = u(20);
        let dutch = OrderParameters::dummy(
            seller.address(),
            vec![OfferItem::non_fungible(Address::repeat_byte(0xc0), u(3))],
            vec![ascending],
        );
        let mut broken = listing(seller.address(), 2);
        broken.consideration[0].start_amount = U256::MAX;
        broken.consideration[0].end_amount = U256::MAX;
        broken.consideration.push(ConsiderationItem::native(u(1), seller.address()));
        broken.total_original_consideration_items = 2;

        let orders = [
            seller.sign_order(&hasher, listing(seller.address(), 1), U256::ZERO),
            seller.sign_order(&hasher, broken, U256::ZERO),
            seller.sign_order(&hasher, dutch, U256::ZERO),
        ];
        let ctx = SettlementContext {
            hasher: &hasher,
            registry: &registry,
            now: u(150),
        };

        let plan = plan_batch(&ctx, &orders, None).unwrap();
        assert!(plan.is_accepted(0));
        assert!(plan.is_accepted(2));
        assert_eq!(plan.skipped.len(), 1);
        assert_eq!(plan.skipped[0].index, 1);
        assert!(plan.skipped[0].reason.starts_with("TP_ERR_207"));
        assert_eq!(plan.native_required, u(30));
    }

    #[test]
    fn duplicate_order_skipped() {
        let (hasher, registry, seller) = setup();
        let order = seller.sign_order(&hasher, listing(seller.address(), 1), U256::ZERO);
        let ctx = SettlementContext {
            hasher: &hasher,
            registry: &registry,
            now: u(150),
        };
        let plan = plan_batch(&ctx, &[order.clone(), order], None).unwrap();
        assert_eq!(plan.accepted.len(), 1);
        assert!(plan.skipped[0].reason.starts_with("TP_ERR_202"));
    }

    #[test]
    fn max_orders_caps_acceptance() {
        let (hasher, registry, seller) = setup();
        let orders: Vec<Order> = (1..=3)
            .map(|id| seller.sign_order(&hasher, listing(seller.address(), id), U256::ZERO))
            .collect();
        let ctx = SettlementContext {
            hasher: &hasher,
            registry: &registry,
            now: u(150),
        };
        let plan = plan_batch(&ctx, &orders, Some(2)).unwrap();
        assert_eq!(plan.accepted.len(), 2);
        assert_eq!(plan.skipped.len(), 1);
        assert_eq!(plan.skipped[0].index, 2);
        assert!(plan.skipped[0].order_hash.is_some());
    }

    #[test]
    fn bad_signature_skipped() {
        let (hasher, registry, seller) = setup();
        let forged = TestSigner::from_seed(9).sign_order(
            &hasher,
            listing(seller.address(), 1),
            U256::ZERO,
        );
        let ctx = SettlementContext {
            hasher: &hasher,
            registry: &registry,
            now: u(150),
        };
        let plan = plan_batch(&ctx, &[forged], None).unwrap();
        assert!(plan.is_empty());
        assert!(plan.skipped[0].reason.starts_with("TP_ERR_101"));
    }
}
