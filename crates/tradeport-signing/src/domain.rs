//! EIP-712 domain and signing digest.

use alloy_primitives::{Address, B256, U256, keccak256};
use tradeport_types::MarketplaceConfig;

use crate::typed_data::{Record, ToRecord, Value};

/// Two-byte version marker of the structured-data signing scheme.
pub const SIGNING_PREFIX: [u8; 2] = [0x19, 0x01];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eip712Domain {
    pub name: String,
    pub version: String,
    pub chain_id: U256,
    pub verifying_contract: Address,
}

impl From<&MarketplaceConfig> for Eip712Domain {
    fn from(config: &MarketplaceConfig) -> Self {
        Self {
            name: config.name.clone(),
            version: config.version.clone(),
            chain_id: U256::from(config.chain_id),
            verifying_contract: config.verifying_contract,
        }
    }
}

impl ToRecord for Eip712Domain {
    const TYPE_NAME: &'static str = "EIP712Domain";

    fn to_record(&self) -> Record {
        Record::new(
            Self::TYPE_NAME,
            vec![
                Value::String(self.name.clone()),
                Value::String(self.version.clone()),
                Value::Uint(self.chain_id),
                Value::Address(self.verifying_contract),
            ],
        )
    }
}

/// `keccak256(0x1901 ‖ domainSeparator ‖ structHash)`.
#[must_use]
pub fn signing_digest(domain_separator: B256, struct_hash: B256) -> B256 {
    let mut buf = [0u8; 66];
    buf[..2].copy_from_slice(&SIGNING_PREFIX);
    buf[2..34].copy_from_slice(domain_separator.as_slice());
    buf[34..].copy_from_slice(struct_hash.as_slice());
    keccak256(buf)
}
