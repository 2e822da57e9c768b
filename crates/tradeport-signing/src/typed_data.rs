//! # Structured data encoder
//!
//! A small EIP-712 engine driven by static record descriptors. Each record
//! shape is a [`TypeDef`] (name plus ordered fields). A [`TypeRegistry`]
//! resolves struct references by name, builds the canonical type string,
//! and hashes [`Record`] values.
//!
//! ## Type strings
//!
//! `encodeType(T)` is `T`'s own signature followed by the signatures of every
//! record type reachable from `T`, the dependencies sorted by name:
//!
//! ```text
//! OrderComponents(...,OfferItem[] offer,ConsiderationItem[] consideration,...)
//! ConsiderationItem(...)OfferItem(...)
//! ```
//!
//! ## Field encoding
//!
//! | kind            | encoded 32-byte word                          |
//! |-----------------|-----------------------------------------------|
//! | `address`       | left-padded 20 bytes                          |
//! | `uint8/uint256` | big-endian                                    |
//! | `bytes32`       | as is                                         |
//! | `string`        | `keccak256(utf8)`                             |
//! | `T[]`           | `keccak256(hashStruct(e0) ‖ hashStruct(e1) …)` |

use std::collections::{BTreeMap, BTreeSet};

use alloy_primitives::{Address, B256, U256, keccak256};
use tradeport_types::{Result, TradeportError};

// ═══════════════════════════════════════════════════════════════════
// DESCRIPTORS
// ═══════════════════════════════════════════════════════════════════

/// The encodable kinds of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Address,
    Uint8,
    Uint256,
    Bytes32,
    String,
    /// Dynamic array of the named record type.
    StructArray(&'static str),
}

impl FieldKind {
    /// Solidity spelling of the type, as it appears in type strings.
    #[must_use]
    pub fn solidity_type(&self) -> String {
        match self {
            Self::Address => "address".to_string(),
            Self::Uint8 => "uint8".to_string(),
            Self::Uint256 => "uint256".to_string(),
            Self::Bytes32 => "bytes32".to_string(),
            Self::String => "string".to_string(),
            Self::StructArray(name) => format!("{name}[]"),
        }
    }

    fn referenced_type(&self) -> Option<&'static str> {
        match self {
            Self::StructArray(name) => Some(*name),
            _ => None,
        }
    }
}

/// One named field of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldDef {
    #[must_use]
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind }
    }
}

/// A record shape: its name and fields in declared (hashed) order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeDef {
    pub name: &'static str,
    pub fields: &'static [FieldDef],
}

impl TypeDef {
    /// `Name(type0 field0,type1 field1,...)` without dependencies.
    #[must_use]
    pub fn signature(&self) -> String {
        let fields: Vec<String> = self
            .fields
            .iter()
            .map(|f| format!("{} {}", f.kind.solidity_type(), f.name))
            .collect();
        format!("{}({})", self.name, fields.join(","))
    }
}

// ═══════════════════════════════════════════════════════════════════
// VALUES
// ═══════════════════════════════════════════════════════════════════

/// A field value. `Uint` covers both integer widths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Address(Address),
    Uint(U256),
    Bytes32(B256),
    String(String),
    Array(Vec<Record>),
}

/// An instance of a named record type, fields in declared order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub type_name: &'static str,
    pub values: Vec<Value>,
}

impl Record {
    #[must_use]
    pub fn new(type_name: &'static str, values: Vec<Value>) -> Self {
        Self { type_name, values }
    }
}

/// Conversion of a model type into an encodable [`Record`].
pub trait ToRecord {
    /// Name of the [`TypeDef`] this value encodes as.
    const TYPE_NAME: &'static str;

    fn to_record(&self) -> Record;
}

// ═══════════════════════════════════════════════════════════════════
// REGISTRY
// ═══════════════════════════════════════════════════════════════════

/// Named record descriptors with cached type hashes.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    types: BTreeMap<&'static str, &'static TypeDef>,
    type_hashes: BTreeMap<&'static str, B256>,
}

impl TypeRegistry {
    /// Build a registry. Every referenced record type must be present.
    ///
    /// # Errors
    /// [`TradeportError::Encoding`] on a duplicate name or a dangling reference.
    pub fn new(defs: &[&'static TypeDef]) -> Result<Self> {
        let mut types = BTreeMap::new();
        for def in defs {
            if types.insert(def.name, *def).is_some() {
                return Err(TradeportError::Encoding(format!(
                    "duplicate type definition: {}",
                    def.name
                )));
            }
        }

        let mut registry = Self {
            types,
            type_hashes: BTreeMap::new(),
        };
        let names: Vec<&'static str> = registry.types.keys().copied().collect();
        for name in names {
            let hash = keccak256(registry.encode_type(name)?.as_bytes());
            registry.type_hashes.insert(name, hash);
        }
        Ok(registry)
    }

    fn get(&self, name: &str) -> Result<&'static TypeDef> {
        self.types
            .get(name)
            .copied()
            .ok_or_else(|| TradeportError::Encoding(format!("unknown type: {name}")))
    }

    /// Iterate registered descriptors by name.
    pub fn definitions(&self) -> impl Iterator<Item = &'static TypeDef> + '_ {
        self.types.values().copied()
    }

    /// Every record type reachable from `root`, excluding `root` itself.
    fn dependencies(&self, root: &'static str) -> Result<BTreeSet<&'static str>> {
        let mut seen = BTreeSet::new();
        let mut stack = vec![root];
        while let Some(name) = stack.pop() {
            for field in self.get(name)?.fields {
                if let Some(dep) = field.kind.referenced_type() {
                    if dep != root && seen.insert(dep) {
                        stack.push(dep);
                    }
                }
            }
        }
        Ok(seen)
    }

    /// Canonical type string: the root signature followed by its
    /// dependencies' signatures sorted by name.
    pub fn encode_type(&self, name: &str) -> Result<String> {
        let root = self.get(name)?;
        let mut out = root.signature();
        for dep in self.dependencies(root.name)? {
            out.push_str(&self.get(dep)?.signature());
        }
        Ok(out)
    }

    /// `keccak256(encode_type(name))`.
    pub fn type_hash(&self, name: &str) -> Result<B256> {
        self.type_hashes
            .get(name)
            .copied()
            .ok_or_else(|| TradeportError::Encoding(format!("unknown type: {name}")))
    }

    /// `keccak256(typeHash ‖ enc(field0) ‖ enc(field1) ‖ ...)`.
    ///
    /// # Errors
    /// [`TradeportError::Encoding`] if the record's type is unknown, the
    /// value count differs from the field count, or a value does not fit
    /// its field's kind.
    pub fn hash_struct(&self, record: &Record) -> Result<B256> {
        let def = self.get(record.type_name)?;
        if def.fields.len() != record.values.len() {
            return Err(TradeportError::Encoding(format!(
                "{} expects {} fields, got {}",
                def.name,
                def.fields.len(),
                record.values.len()
            )));
        }

        let mut buf = Vec::with_capacity(32 * (def.fields.len() + 1));
        buf.extend_from_slice(self.type_hash(def.name)?.as_slice());
        for (field, value) in def.fields.iter().zip(&record.values) {
            buf.extend_from_slice(self.encode_value(def, field, value)?.as_slice());
        }
        Ok(keccak256(&buf))
    }

    /// Struct hash of any [`ToRecord`] value.
    pub fn hash<T: ToRecord>(&self, value: &T) -> Result<B256> {
        self.hash_struct(&value.to_record())
    }

    fn encode_value(&self, def: &TypeDef, field: &FieldDef, value: &Value) -> Result<B256> {
        match (field.kind, value) {
            (FieldKind::Address, Value::Address(addr)) => Ok(addr.into_word()),
            (FieldKind::Uint256, Value::Uint(n)) => Ok(B256::from(n.to_be_bytes::<32>())),
            (FieldKind::Uint8, Value::Uint(n)) if *n <= U256::from(u8::MAX) => Ok(B256::from(n.to_be_bytes::<32>())),
            (FieldKind::Bytes32, Value::Bytes32(word)) => Ok(*word),
            (FieldKind::String, Value::String(s)) => Ok(keccak256(s.as_bytes())),
            (FieldKind::StructArray(element), Value::Array(records)) => {
                let mut concat = Vec::with_capacity(32 * records.len());
                for record in records {
                    if record.type_name != element {
                        return Err(TradeportError::Encoding(format!(
                            "{}.{}: expected {element}, got {}",
                            def.name, field.name, record.type_name
                        )));
                    }
                    concat.extend_from_slice(self.hash_struct(record)?.as_slice());
                }
                Ok(keccak256(&concat))
            }
            _ => Err(TradeportError::Encoding(format!(
                "{}.{}: value does not fit {}",
                def.name,
                field.name,
                field.kind.solidity_type()
            ))),
        }
    }
}
