//! # tradeport-settlement
//!
//! **Settlement core**: order registry, per-order settlement, batch and
//! fulfill-available coordination, behind the [`Marketplace`] facade.
//!
//! ## Architecture
//!
//! A fulfillment call moves through:
//! 1. Pre-transfer checks per order ([`engine::prepare_order`]): order hash
//!    under the live counter, status, time window, signature, amounts
//! 2. Order selection for batch calls ([`batch::plan_batch`]), skipping
//!    orders that fail step 1
//! 3. Transfer planning, per order or netted across orders
//!    ([`available::aggregate_fulfillments`])
//! 4. Execution through the host's [`AssetTransfer`] inside one
//!    [`Transactional`] scope, with supplied native value held in escrow
//!    and the surplus refunded
//! 5. Registry writes and events, only once the transfers committed
//!
//! ## Host capabilities
//!
//! Balances, time and entropy belong to the host ([`host`]).
//! [`InMemoryLedger`] is a complete reference host for tests and embedders.

pub mod available;
pub mod batch;
pub mod engine;
pub mod host;
pub mod ledger;
pub mod marketplace;
pub mod registry;

pub use batch::{BatchPlan, plan_batch};
pub use engine::{Execution, PreparedOrder, SettlementContext};
pub use host::{
    AssetTransfer, Clock, EntropySource, FixedClock, FixedEntropy, RandomEntropy, SystemClock,
    Transactional,
};
pub use ledger::InMemoryLedger;
pub use marketplace::{Information, Marketplace};
pub use registry::OrderRegistry;
