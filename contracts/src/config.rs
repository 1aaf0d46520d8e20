//! # Token Configuration & Constants
//!
//! Deployment parameters for a RENEW ledger and the defaults used when an
//! operator does not override them. The defaults match the production
//! deployment: one billion RENEW at 18 decimals.
//!
//! A [`TokenConfig`] is plain data. It is loaded from TOML, validated, and
//! handed to [`Ledger::deploy`](crate::ledger::Ledger::deploy).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ledger::{Address, Amount, LedgerError};
use crate::units::pow10;

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Default token name.
pub const DEFAULT_NAME: &str = "ReNew";

/// Default ticker symbol.
pub const DEFAULT_SYMBOL: &str = "RENEW";

/// Default initial supply in whole tokens, before decimal scaling.
pub const DEFAULT_INITIAL_SUPPLY: u64 = 1_000_000_000;

/// Default decimal precision. 18, same as every ERC-20 that didn't have a
/// reason to pick something else.
pub const DEFAULT_DECIMALS: u8 = 18;

/// Largest precision whose scale factor `10^decimals` fits in `u128`.
pub const MAX_DECIMALS: u8 = 38;

/// Environment variable naming the initial owner (and controller).
pub const OWNER_ENV_VAR: &str = "RENEW_TOKEN_OWNER";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur while reading or writing a config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read or written.
    #[error("config file {path}: {source}")]
    Io {
        /// Path of the offending file.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for a [`TokenConfig`].
    #[error("malformed config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be encoded as TOML.
    #[error("failed to encode config: {0}")]
    Encode(#[from] toml::ser::Error),
}

// ---------------------------------------------------------------------------
// TokenConfig
// ---------------------------------------------------------------------------

/// Construction parameters for a ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Human-readable token name.
    pub name: String,
    /// Ticker symbol.
    pub symbol: String,
    /// Supply in whole tokens. Scaled by `10^decimals` at deployment.
    ///
    /// `u64` rather than [`Amount`] because TOML integers are 64-bit.
    pub initial_supply: u64,
    /// Decimal precision.
    pub decimals: u8,
    /// Receives the entire supply and becomes the controller.
    pub initial_owner: Address,
}

impl TokenConfig {
    /// Default parameters for the given owner.
    pub fn with_owner(initial_owner: impl Into<Address>) -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            symbol: DEFAULT_SYMBOL.to_string(),
            initial_supply: DEFAULT_INITIAL_SUPPLY,
            decimals: DEFAULT_DECIMALS,
            initial_owner: initial_owner.into(),
        }
    }

    /// Parses a config from TOML text. Does not validate.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Encodes the config as TOML text.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reads and parses a TOML config file. Does not validate.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Writes the config to `path` as TOML.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let text = self.to_toml_string()?;
        std::fs::write(path, text).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Total supply in base units: `initial_supply * 10^decimals`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidAmount`] if `decimals` exceeds
    /// [`MAX_DECIMALS`], or [`LedgerError::SupplyOverflow`] if the product
    /// does not fit in `u128`.
    pub fn total_supply(&self) -> Result<Amount, LedgerError> {
        pow10(self.decimals)?
            .checked_mul(Amount::from(self.initial_supply))
            .ok_or(LedgerError::SupplyOverflow {
                initial_supply: Amount::from(self.initial_supply),
                decimals: self.decimals,
            })
    }

    /// Checks every parameter and returns the scaled total supply.
    pub fn validate(&self) -> Result<Amount, LedgerError> {
        if self.name.trim().is_empty() {
            return Err(LedgerError::InvalidConfig("name must not be empty".into()));
        }
        if self.symbol.trim().is_empty() {
            return Err(LedgerError::InvalidConfig("symbol must not be empty".into()));
        }
        if self.initial_owner.as_str().trim().is_empty() {
            return Err(LedgerError::InvalidConfig(
                "initial owner must not be empty".into(),
            ));
        }
        self.total_supply()
    }
}
