//! Deterministic secp256k1 signer for tests and fixtures.

use alloy_primitives::{Address, B256, keccak256};
use k256::ecdsa::SigningKey;
use tradeport_types::{Order, OrderParameters, U256};

use crate::order_hash::OrderHasher;
use crate::verifier::address_of;

/// A keypair derived from a one-byte seed.
#[derive(Clone)]
pub struct TestSigner {
    key: SigningKey,
    address: Address,
}

impl TestSigner {
    pub fn from_seed(seed: u8) -> Self {
        let secret = keccak256([b't', b'p', seed]);
        let key = SigningKey::from_slice(secret.as_slice()).expect("keccak output is a valid scalar");
        let address = address_of(key.verifying_key());
        Self { key, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// 65-byte `r ‖ s ‖ v` signature with `v` in {27, 28}.
    pub fn sign(&self, digest: B256) -> Vec<u8> {
        let (sig, recid) = self
            .key
            .sign_prehash_recoverable(digest.as_slice())
            .expect("prehash signing");
        let mut out = sig.to_bytes().to_vec();
        out.push(27 + recid.to_byte());
        out
    }

    /// 64-byte EIP-2098 `r ‖ vs` signature.
    pub fn sign_compact(&self, digest: B256) -> Vec<u8> {
        let mut out = self.sign(digest);
        let v = out.pop().expect("65-byte signature");
        if v == 28 {
            out[32] |= 0x80;
        }
        out
    }

    /// Sign `parameters` under `counter` and wrap them into an [`Order`].
    pub fn sign_order(
        &self,
        hasher: &OrderHasher,
        parameters: OrderParameters,
        counter: U256,
    ) -> Order {
        let components = parameters.to_components(counter).expect("original items present");
        let hash = hasher.order_hash(&components).expect("order schema");
        Order::new(parameters, self.sign(hasher.digest(hash)))
    }

    /// As [`Self::sign_order`] with a compact signature.
    pub fn sign_order_compact(
        &self,
        hasher: &OrderHasher,
        parameters: OrderParameters,
        counter: U256,
    ) -> Order {
        let components = parameters.to_components(counter).expect("original items present");
        let hash = hasher.order_hash(&components).expect("order schema");
        Order::new(parameters, self.sign_compact(hasher.digest(hash)))
    }
}

impl std::fmt::Debug for TestSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestSigner")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}
