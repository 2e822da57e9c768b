//! # tradeport-types
//!
//! Shared types, errors, and configuration for the **Tradeport** settlement engine.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`OrderHash`], [`ReceiptId`]
//! - **Item model**: [`ItemType`], [`OfferItem`], [`ConsiderationItem`], [`SpentItem`], [`ReceivedItem`]
//! - **Order model**: [`OrderType`], [`OrderParameters`], [`OrderComponents`], [`Order`], [`FulfillmentComponent`]
//! - **Lifecycle**: [`OrderStatus`], [`OrderState`]
//! - **Events & receipts**: [`MarketplaceEvent`], [`SettlementReceipt`], [`SkippedOrder`]
//! - **Configuration**: [`MarketplaceConfig`]
//! - **Errors**: [`TradeportError`] with `TP_ERR_` prefix codes, [`TransferError`]
//! - **Constants**: defaults and protocol-wide values

pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod ids;
pub mod item;
pub mod order;
pub mod receipt;
pub mod status;

// Re-export all primary types at crate root for ergonomic imports:
//   use tradeport_types::{Order, OrderParameters, OfferItem, ...};

pub use config::*;
pub use error::*;
pub use event::*;
pub use ids::*;
pub use item::*;
pub use order::*;
pub use receipt::*;
pub use status::*;

// Ledger primitives, re-exported so downstream crates agree on one version.
pub use alloy_primitives::{Address, B256, Bytes, U256};

// Constants are accessed via `tradeport_types::constants::FOO`
// (not re-exported to avoid name collisions).
