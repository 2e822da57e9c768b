//! The [`Marketplace`]: public reads and writes over one deployment.
//!
//! Every write follows the same shape: run all checks against the current
//! registry, perform transfers inside a ledger transaction, and only after
//! the transaction committed apply registry writes and append events.
//! A failing call therefore leaves ledger, registry and event log untouched.

use std::collections::HashSet;

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};
use tradeport_signing::{OrderHasher, verify_signer};
use tradeport_types::{
    FulfillmentComponent, MarketplaceConfig, MarketplaceEvent, Order, OrderComponents, OrderHash,
    OrderStatus, Result, SettlementReceipt, TradeportError,
};

use crate::available::aggregate_fulfillments;
use crate::batch::{BatchPlan, plan_batch};
use crate::engine::{
    Execution, SettlementContext, apply_executions, derive_order_hash, ensure_sufficient_value,
    prepare_order,
};
use crate::host::{AssetTransfer, Clock, EntropySource, Transactional};
use crate::registry::OrderRegistry;

/// Result of [`Marketplace::information`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Information {
    pub version: String,
    pub domain_separator: B256,
}

/// Native value accounting of one committed settlement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct ValueFlow {
    consumed: U256,
    refunded: U256,
}

pub struct Marketplace<L, C, E> {
    config: MarketplaceConfig,
    hasher: OrderHasher,
    registry: OrderRegistry,
    ledger: L,
    clock: C,
    entropy: E,
    events: Vec<MarketplaceEvent>,
}

impl<L, C, E> Marketplace<L, C, E>
where
    L: AssetTransfer + Transactional,
    C: Clock,
    E: EntropySource,
{
    /// # Errors
    /// [`TradeportError::Configuration`] if `config` does not validate.
    pub fn new(config: MarketplaceConfig, ledger: L, clock: C, entropy: E) -> Result<Self> {
        config.validate()?;
        let hasher = OrderHasher::new(&config)?;
        tracing::info!(
            name = %config.name,
            version = %config.version,
            chain_id = config.chain_id,
            domain_separator = %hasher.domain_separator(),
            "marketplace initialised"
        );
        Ok(Self {
            config,
            hasher,
            registry: OrderRegistry::new(),
            ledger,
            clock,
            entropy,
            events: Vec::new(),
        })
    }

    // ═══════════════════════════════════════════════════════════════
    // READS
    // ═══════════════════════════════════════════════════════════════

    #[must_use]
    pub fn name(&self) -> &str {
        &self.config.name
    }

    #[must_use]
    pub fn information(&self) -> Information {
        Information {
            version: self.config.version.clone(),
            domain_separator: self.hasher.domain_separator(),
        }
    }

    #[must_use]
    pub fn get_counter(&self, offerer: Address) -> U256 {
        self.registry.counter(offerer)
    }

    /// Hash of `components` as given, counter included.
    pub fn get_order_hash(&self, components: &OrderComponents) -> Result<OrderHash> {
        self.hasher.order_hash(components)
    }

    #[must_use]
    pub fn get_order_status(&self, order_hash: &OrderHash) -> OrderStatus {
        self.registry.status(order_hash)
    }

    /// The EIP-712 `types` object off-chain signers need.
    #[must_use]
    pub fn typed_data_types(&self) -> serde_json::Value {
        tradeport_signing::typed_data_types()
    }

    #[must_use]
    pub fn config(&self) -> &MarketplaceConfig {
        &self.config
    }

    #[must_use]
    pub fn hasher(&self) -> &OrderHasher {
        &self.hasher
    }

    #[must_use]
    pub fn registry(&self) -> &OrderRegistry {
        &self.registry
    }

    #[must_use]
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Direct ledger access for setup (minting, approvals).
    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    /// Every event emitted so far, oldest first.
    #[must_use]
    pub fn events(&self) -> &[MarketplaceEvent] {
        &self.events
    }

    // ═══════════════════════════════════════════════════════════════
    // REGISTRY WRITES
    // ═══════════════════════════════════════════════════════════════

    /// Advance `caller`'s counter, invalidating all of its signed orders.
    pub fn increment_counter(&mut self, caller: Address) -> Result<U256> {
        let entropy = self.entropy.next_entropy();
        let new_counter = self.registry.increment_counter(caller, entropy)?;
        tracing::info!(offerer = %caller, %new_counter, "counter incremented");
        self.events.push(MarketplaceEvent::CounterIncremented {
            new_counter,
            offerer: caller,
        });
        Ok(new_counter)
    }

    /// Cancel every order in `orders`. Either all are cancelled or none.
    ///
    /// # Errors
    /// [`TradeportError::CannotCancelOrder`] if `caller` is not the offerer
    /// (or, for restricted orders, the zone) of any entry.
    pub fn cancel(&mut self, orders: &[OrderComponents], caller: Address) -> Result<Vec<OrderHash>> {
        let mut cancelled = Vec::with_capacity(orders.len());
        for components in orders {
            if !components.can_be_cancelled_by(caller) {
                return Err(TradeportError::CannotCancelOrder);
            }
            cancelled.push((self.hasher.order_hash(components)?, components));
        }

        for (order_hash, components) in &cancelled {
            self.registry.mark_cancelled(*order_hash);
            tracing::info!(order_hash = %order_hash.short(), %caller, "order cancelled");
            self.events.push(MarketplaceEvent::OrderCancelled {
                order_hash: *order_hash,
                offerer: components.offerer,
                zone: components.zone,
            });
        }
        Ok(cancelled.into_iter().map(|(hash, _)| hash).collect())
    }

    /// Mark every order in `orders` as validated so later fulfillments skip
    /// the signature check. Already-validated orders are passed over.
    /// Signatures are not checked for orders whose offerer is `caller`.
    ///
    /// # Errors
    /// The first status or signature failure; nothing is validated then.
    pub fn validate(&mut self, orders: &[Order], caller: Address) -> Result<Vec<OrderHash>> {
        let ctx = self.context();
        let mut pending: Vec<(OrderHash, Address, Address)> = Vec::new();
        let mut seen = HashSet::new();

        for order in orders {
            let params = &order.parameters;
            let order_hash = derive_order_hash(&ctx, params)?;
            let status = self.registry.ensure_fulfillable(&order_hash)?;
            if status.is_validated || !seen.insert(order_hash) {
                continue;
            }
            if caller != params.offerer {
                verify_signer(
                    self.hasher.digest(order_hash),
                    &order.signature,
                    params.offerer,
                )?;
            }
            pending.push((order_hash, params.offerer, params.zone));
        }

        for (order_hash, offerer, zone) in &pending {
            self.registry.mark_validated(*order_hash);
            tracing::info!(order_hash = %order_hash.short(), %offerer, "order validated");
            self.events.push(MarketplaceEvent::OrderValidated {
                order_hash: *order_hash,
                offerer: *offerer,
                zone: *zone,
            });
        }
        Ok(pending.into_iter().map(|(hash, _, _)| hash).collect())
    }

    // ═══════════════════════════════════════════════════════════════
    // FULFILLMENT
    // ═══════════════════════════════════════════════════════════════

    /// Fulfill a single order, paying with `supplied` native value.
    ///
    /// # Errors
    /// Any pre-transfer check failure, [`TradeportError::InsufficientNativeTokensSupplied`],
    /// or a transfer failure. Nothing changes on error.
    pub fn fulfill_order(
        &mut self,
        order: &Order,
        supplied: U256,
        caller: Address,
    ) -> Result<SettlementReceipt> {
        let prepared = prepare_order(&self.context(), order)?;
        let executions = prepared.executions(caller, self.escrow());
        let flow = self.settle(caller, supplied, prepared.native_required, &executions)?;

        let plan = BatchPlan {
            native_required: prepared.native_required,
            accepted: vec![(0, prepared)],
            skipped: Vec::new(),
        };
        Ok(self.finalize(plan, caller, flow))
    }

    /// Fulfill each order of `orders` that passes its pre-transfer checks;
    /// the others are skipped. A batch with nothing to fulfill refunds the
    /// whole supplied value without touching the ledger.
    ///
    /// # Errors
    /// [`TradeportError::InsufficientNativeTokensSupplied`] against the sum
    /// over accepted orders, or any transfer failure.
    pub fn fulfill_order_batch(
        &mut self,
        orders: &[Order],
        supplied: U256,
        caller: Address,
    ) -> Result<SettlementReceipt> {
        let plan = plan_batch(&self.context(), orders, None)?;
        if plan.is_empty() {
            tracing::info!(skipped = plan.skipped.len(), "batch has no fulfillable orders");
            return Ok(SettlementReceipt::new(
                Vec::new(),
                plan.skipped,
                U256::ZERO,
                supplied,
                Vec::new(),
            ));
        }

        let escrow = self.escrow();
        let executions: Vec<Execution> = plan
            .accepted
            .iter()
            .flat_map(|(_, prepared)| prepared.executions(caller, escrow))
            .collect();
        let flow = self.settle(caller, supplied, plan.native_required, &executions)?;
        Ok(self.finalize(plan, caller, flow))
    }

    /// Fulfill up to `max_orders` of `orders`, netting transfers according
    /// to the given fulfillments.
    ///
    /// # Errors
    /// [`TradeportError::NoSpecifiedOrdersAvailable`] if every order is
    /// skipped, any fulfillment component error, value shortfall, or
    /// transfer failure.
    pub fn fulfill_available_orders(
        &mut self,
        orders: &[Order],
        offer_fulfillments: &[Vec<FulfillmentComponent>],
        consideration_fulfillments: &[Vec<FulfillmentComponent>],
        max_orders: usize,
        supplied: U256,
        caller: Address,
    ) -> Result<SettlementReceipt> {
        let plan = plan_batch(&self.context(), orders, Some(max_orders))?;
        if plan.is_empty() {
            return Err(TradeportError::NoSpecifiedOrdersAvailable);
        }

        let executions = aggregate_fulfillments(
            orders,
            &plan,
            offer_fulfillments,
            consideration_fulfillments,
            caller,
            self.escrow(),
        )?;
        let flow = self.settle(caller, supplied, plan.native_required, &executions)?;
        Ok(self.finalize(plan, caller, flow))
    }

    // ═══════════════════════════════════════════════════════════════
    // INTERNALS
    // ═══════════════════════════════════════════════════════════════

    fn context(&self) -> SettlementContext<'_> {
        SettlementContext {
            hasher: &self.hasher,
            registry: &self.registry,
            now: self.clock.now(),
        }
    }

    fn escrow(&self) -> Address {
        self.config.verifying_contract
    }

    /// Check value, then run `executions` in one ledger transaction: pull
    /// `supplied` into escrow, transfer, refund the rest to `caller`.
    fn settle(
        &mut self,
        caller: Address,
        supplied: U256,
        required: U256,
        executions: &[Execution],
    ) -> Result<ValueFlow> {
        ensure_sufficient_value(required, supplied)?;

        self.ledger.begin();
        match Self::transfer_all(&mut self.ledger, caller, supplied, executions) {
            Ok(flow) => {
                self.ledger.commit();
                Ok(flow)
            }
            Err(err) => {
                self.ledger.rollback();
                tracing::warn!(%caller, error = %err, "settlement rolled back");
                Err(err)
            }
        }
    }

    fn transfer_all(
        ledger: &mut L,
        caller: Address,
        supplied: U256,
        executions: &[Execution],
    ) -> Result<ValueFlow> {
        if !supplied.is_zero() {
            ledger.receive_value(caller, supplied)?;
        }
        let consumed = apply_executions(ledger, executions)?;
        let refunded = supplied.checked_sub(consumed).ok_or(
            TradeportError::InsufficientNativeTokensSupplied {
                required: consumed,
                supplied,
            },
        )?;
        if !refunded.is_zero() {
            ledger.send_value(caller, refunded)?;
        }
        Ok(ValueFlow { consumed, refunded })
    }

    /// Registry writes and events for a committed settlement.
    fn finalize(&mut self, plan: BatchPlan, caller: Address, flow: ValueFlow) -> SettlementReceipt {
        let mut fulfilled = Vec::with_capacity(plan.accepted.len());
        let mut events = Vec::with_capacity(plan.accepted.len());

        for (_, prepared) in &plan.accepted {
            self.registry.mark_fulfilled(prepared.order_hash);
            tracing::info!(
                order_hash = %prepared.order_hash.short(),
                offerer = %prepared.offerer,
                recipient = %caller,
                "order fulfilled"
            );
            fulfilled.push(prepared.order_hash);
            events.push(prepared.fulfilled_event(caller));
        }
        self.events.extend(events.iter().cloned());

        SettlementReceipt::new(fulfilled, plan.skipped, flow.consumed, flow.refunded, events)
    }
}
