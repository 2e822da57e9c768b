//! Configuration for a marketplace deployment.

use std::path::Path;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::{Result, TradeportError, constants};

/// The EIP-712 domain parameters of one deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MarketplaceConfig {
    /// Domain `name`, also returned by `name()`.
    pub name: String,
    /// Domain `version`.
    pub version: String,
    /// Network identity bound into every signature.
    pub chain_id: u64,
    /// The verifier's own identity. Also the operator that moves assets.
    pub verifying_contract: Address,
}

impl Default for MarketplaceConfig {
    fn default() -> Self {
        Self {
            name: constants::DEFAULT_MARKETPLACE_NAME.to_string(),
            version: constants::DEFAULT_MARKETPLACE_VERSION.to_string(),
            chain_id: constants::DEFAULT_CHAIN_ID,
            verifying_contract: constants::DEFAULT_VERIFYING_CONTRACT,
        }
    }
}

impl MarketplaceConfig {
    /// Parse and validate a JSON document. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// # Errors
    /// [`TradeportError::Configuration`] on an empty name or version, a zero
    /// chain id, or a zero verifying contract.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(TradeportError::Configuration("name must not be empty".into()));
        }
        if self.version.trim().is_empty() {
            return Err(TradeportError::Configuration(
                "version must not be empty".into(),
            ));
        }
        if self.chain_id == 0 {
            return Err(TradeportError::Configuration(
                "chain_id must be non-zero".into(),
            ));
        }
        if self.verifying_contract == Address::ZERO {
            return Err(TradeportError::Configuration(
                "verifying_contract must be non-zero".into(),
            ));
        }
        Ok(())
    }
}
