//! # tradeport-signing
//!
//! Order authorization for the **Tradeport** settlement engine:
//!
//! - [`typed_data`]: descriptor-driven EIP-712 encoder (type strings, type
//!   hashes, struct hashes)
//! - [`schema`]: the published record types and their type strings
//! - [`domain`]: domain separator and the `0x1901` signing digest
//! - [`order_hash`]: [`OrderHasher`], order identity under one deployment
//! - [`verifier`]: secp256k1 signer recovery for 65- and 64-byte signatures
//!
//! ## Flow
//!
//! ```text
//! OrderComponents ──hash_struct──▶ orderHash
//! domainSeparator ‖ orderHash ──0x1901──▶ digest ──recover(sig)──▶ signer
//! ```

pub mod domain;
pub mod order_hash;
pub mod schema;
pub mod typed_data;
pub mod verifier;

#[cfg(any(test, feature = "test-helpers"))]
pub mod testing;

pub use domain::{Eip712Domain, signing_digest};
pub use order_hash::OrderHasher;
pub use schema::typed_data_types;
pub use verifier::{recover, verify_signer};
