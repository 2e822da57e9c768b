//! Order hashing under a fixed marketplace domain.

use alloy_primitives::{B256, U256};
use tradeport_types::{
    ConsiderationItem, MarketplaceConfig, OfferItem, OrderComponents, OrderHash, Result,
};

use crate::domain::{Eip712Domain, signing_digest};
use crate::schema::order_registry;
use crate::typed_data::{Record, ToRecord, TypeRegistry, Value};

impl ToRecord for OfferItem {
    const TYPE_NAME: &'static str = "OfferItem";

    fn to_record(&self) -> Record {
        Record::new(
            Self::TYPE_NAME,
            vec![
                Value::Uint(U256::from(u8::from(self.item_type))),
                Value::Address(self.token),
                Value::Uint(self.identifier),
                Value::Uint(self.start_amount),
                Value::Uint(self.end_amount),
            ],
        )
    }
}

impl ToRecord for ConsiderationItem {
    const TYPE_NAME: &'static str = "ConsiderationItem";

    fn to_record(&self) -> Record {
        Record::new(
            Self::TYPE_NAME,
            vec![
                Value::Uint(U256::from(u8::from(self.item_type))),
                Value::Address(self.token),
                Value::Uint(self.identifier),
                Value::Uint(self.start_amount),
                Value::Uint(self.end_amount),
                Value::Address(self.recipient),
            ],
        )
    }
}

impl ToRecord for OrderComponents {
    const TYPE_NAME: &'static str = "OrderComponents";

    fn to_record(&self) -> Record {
        Record::new(
            Self::TYPE_NAME,
            vec![
                Value::Address(self.offerer),
                Value::Array(self.offer.iter().map(ToRecord::to_record).collect()),
                Value::Array(self.consideration.iter().map(ToRecord::to_record).collect()),
                Value::Uint(self.start_time),
                Value::Uint(self.end_time),
                Value::Uint(self.salt),
                Value::Uint(self.counter),
            ],
        )
    }
}

/// Computes order hashes and signing digests for one deployment.
#[derive(Debug, Clone)]
pub struct OrderHasher {
    registry: TypeRegistry,
    domain: Eip712Domain,
    domain_separator: B256,
}

impl OrderHasher {
    pub fn new(config: &MarketplaceConfig) -> Result<Self> {
        let registry = order_registry()?;
        let domain = Eip712Domain::from(config);
        let domain_separator = registry.hash(&domain)?;
        Ok(Self {
            registry,
            domain,
            domain_separator,
        })
    }

    #[must_use]
    pub fn domain(&self) -> &Eip712Domain {
        &self.domain
    }

    #[must_use]
    pub fn domain_separator(&self) -> B256 {
        self.domain_separator
    }

    #[must_use]
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Struct hash of the components. A pure function of its input.
    pub fn order_hash(&self, components: &OrderComponents) -> Result<OrderHash> {
        self.registry.hash(components).map(OrderHash)
    }

    /// The digest an offerer signs for `order_hash`.
    #[must_use]
    pub fn digest(&self, order_hash: OrderHash) -> B256 {
        signing_digest(self.domain_separator, order_hash.0)
    }
}
