//! The public signing schema.
//!
//! Off-chain signers must reproduce these type strings exactly. Changing a
//! field name, type or position invalidates every outstanding signature.

use serde_json::{Map, Value as Json, json};
use tradeport_types::Result;

use crate::typed_data::{FieldDef, FieldKind, TypeDef, TypeRegistry};

pub const EIP712_DOMAIN_TYPE_STRING: &str =
    "EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)";

pub const OFFER_ITEM_TYPE_STRING: &str =
    "OfferItem(uint8 itemType,address token,uint256 identifier,uint256 startAmount,uint256 endAmount)";

pub const CONSIDERATION_ITEM_TYPE_STRING: &str = "ConsiderationItem(uint8 itemType,address token,uint256 identifier,uint256 startAmount,uint256 endAmount,address recipient)";

/// Full `encodeType(OrderComponents)`, dependencies included.
///
/// Only these seven fields are signed. `zone`, `orderType`, `zoneHash` and
/// `conduitKey` travel with the order but are not part of its hash.
pub const ORDER_COMPONENTS_TYPE_STRING: &str = concat!(
    "OrderComponents(address offerer,OfferItem[] offer,ConsiderationItem[] consideration,",
    "uint256 startTime,uint256 endTime,uint256 salt,uint256 counter)",
    "ConsiderationItem(uint8 itemType,address token,uint256 identifier,uint256 startAmount,uint256 endAmount,address recipient)",
    "OfferItem(uint8 itemType,address token,uint256 identifier,uint256 startAmount,uint256 endAmount)",
);

pub static EIP712_DOMAIN: TypeDef = TypeDef {
    name: "EIP712Domain",
    fields: &[
        FieldDef::new("name", FieldKind::String),
        FieldDef::new("version", FieldKind::String),
        FieldDef::new("chainId", FieldKind::Uint256),
        FieldDef::new("verifyingContract", FieldKind::Address),
    ],
};

pub static OFFER_ITEM: TypeDef = TypeDef {
    name: "OfferItem",
    fields: &[
        FieldDef::new("itemType", FieldKind::Uint8),
        FieldDef::new("token", FieldKind::Address),
        FieldDef::new("identifier", FieldKind::Uint256),
        FieldDef::new("startAmount", FieldKind::Uint256),
        FieldDef::new("endAmount", FieldKind::Uint256),
    ],
};

pub static CONSIDERATION_ITEM: TypeDef = TypeDef {
    name: "ConsiderationItem",
    fields: &[
        FieldDef::new("itemType", FieldKind::Uint8),
        FieldDef::new("token", FieldKind::Address),
        FieldDef::new("identifier", FieldKind::Uint256),
        FieldDef::new("startAmount", FieldKind::Uint256),
        FieldDef::new("endAmount", FieldKind::Uint256),
        FieldDef::new("recipient", FieldKind::Address),
    ],
};

pub static ORDER_COMPONENTS: TypeDef = TypeDef {
    name: "OrderComponents",
    fields: &[
        FieldDef::new("offerer", FieldKind::Address),
        FieldDef::new("offer", FieldKind::StructArray("OfferItem")),
        FieldDef::new("consideration", FieldKind::StructArray("ConsiderationItem")),
        FieldDef::new("startTime", FieldKind::Uint256),
        FieldDef::new("endTime", FieldKind::Uint256),
        FieldDef::new("salt", FieldKind::Uint256),
        FieldDef::new("counter", FieldKind::Uint256),
    ],
};

/// Registry holding the domain and order record types.
pub fn order_registry() -> Result<TypeRegistry> {
    TypeRegistry::new(&[
        &EIP712_DOMAIN,
        &OFFER_ITEM,
        &CONSIDERATION_ITEM,
        &ORDER_COMPONENTS,
    ])
}

/// The `types` object of an `eth_signTypedData_v4` request.
pub fn typed_data_types() -> Json {
    let mut types = Map::new();
    for def in [
        &EIP712_DOMAIN,
        &ORDER_COMPONENTS,
        &OFFER_ITEM,
        &CONSIDERATION_ITEM,
    ] {
        let fields: Vec<Json> = def
            .fields
            .iter()
            .map(|f| json!({ "name": f.name, "type": f.kind.solidity_type() }))
            .collect();
        types.insert(def.name.to_string(), Json::Array(fields));
    }
    Json::Object(types)
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{b256, keccak256};

    use super::*;

    #[test]
    fn encoded_types_match_published_strings() {
        let reg = order_registry().unwrap();
        assert_eq!(reg.encode_type("EIP712Domain").unwrap(), EIP712_DOMAIN_TYPE_STRING);
        assert_eq!(reg.encode_type("OfferItem").unwrap(), OFFER_ITEM_TYPE_STRING);
        assert_eq!(
            reg.encode_type("ConsiderationItem").unwrap(),
            CONSIDERATION_ITEM_TYPE_STRING
        );
        assert_eq!(
            reg.encode_type("OrderComponents").unwrap(),
            ORDER_COMPONENTS_TYPE_STRING
        );
    }

    #[test]
    fn domain_type_hash_known_answer() {
        let reg = order_registry().unwrap();
        assert_eq!(
            reg.type_hash("EIP712Domain").unwrap(),
            b256!("8b73c3c69bb8fe3d512ecc4cf759cc79239f7b179b0ffacaa9a75d522b39400f")
        );
    }

    #[test]
    fn order_type_hash_covers_dependencies() {
        let reg = order_registry().unwrap();
        assert_eq!(
            reg.type_hash("OrderComponents").unwrap(),
            keccak256(ORDER_COMPONENTS_TYPE_STRING.as_bytes())
        );
    }

    #[test]
    fn typed_data_types_lists_every_record() {
        let types = typed_data_types();
        assert_eq!(types["OrderComponents"][1]["type"], "OfferItem[]");
        assert_eq!(types["OrderComponents"].as_array().unwrap().len(), 7);
        assert_eq!(types["ConsiderationItem"][5]["name"], "recipient");
        assert_eq!(types["EIP712Domain"][2]["type"], "uint256");
    }
}
