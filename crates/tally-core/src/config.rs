//! Deployment configuration.
//!
//! One TOML file describes a token deployment:
//!
//! ```toml
//! [token]
//! name = "Tally"
//! symbol = "TLY"
//! admin = "0x…"
//! initial_mint = "1000000000000000000000"
//!
//! [fees]
//! basis_points = 100
//! enabled = true
//! exempt = ["0x…"]
//!
//! [lock_pool]
//! pool_size = "20000000"
//! num_beneficiaries = 80
//! sweep_recipient = "0x…"
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::address::Address;
use crate::amount_str;
use crate::{MAX_FEE_BPS, MAX_SUPPLY};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),

    #[error("Environment variable {var}: {reason}")]
    Env { var: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentConfig {
    pub token: TokenSection,
    #[serde(default)]
    pub fees: FeesSection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock_pool: Option<LockPoolConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSection {
    pub name: String,
    pub symbol: String,
    /// Ledger address; derived from the symbol when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    pub admin: Address,
    /// Minted to `admin` at deployment
    #[serde(with = "amount_str", default)]
    pub initial_mint: u128,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeesSection {
    #[serde(default)]
    pub basis_points: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<Address>,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub exempt: Vec<Address>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockPoolConfig {
    #[serde(with = "amount_str")]
    pub pool_size: u128,
    pub num_beneficiaries: u64,
    pub sweep_recipient: Address,
}

impl DeploymentConfig {
    /// Minimal config: no fee, no initial mint, no lock pool.
    pub fn new(name: &str, symbol: &str, admin: Address) -> Self {
        Self {
            token: TokenSection {
                name: name.to_string(),
                symbol: symbol.to_string(),
                address: None,
                admin,
                initial_mint: 0,
            },
            fees: FeesSection::default(),
            lock_pool: None,
        }
    }

    /// Load deployment config from TOML file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: DeploymentConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save deployment config to TOML file
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Build config from environment variables.
    /// `TALLY_ADMIN` is required; `TALLY_FEE_BPS`, `TALLY_FEE_RECIPIENT`,
    /// `TALLY_TOKEN_NAME`, `TALLY_TOKEN_SYMBOL` and `TALLY_INITIAL_MINT`
    /// are optional.
    pub fn load_from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Apply environment overrides on top of a file-loaded config. The
    /// result is validated; on error the config is left as it was.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|var| std::env::var(var).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let admin = lookup("TALLY_ADMIN").ok_or(ConfigError::Env {
            var: "TALLY_ADMIN",
            reason: "not set".to_string(),
        })?;
        let admin = parse_var("TALLY_ADMIN", &admin)?;
        let name = lookup("TALLY_TOKEN_NAME").unwrap_or_else(|| "Tally".to_string());
        let symbol = lookup("TALLY_TOKEN_SYMBOL").unwrap_or_else(|| "TLY".to_string());

        let mut config = Self::new(&name, &symbol, admin);
        config.apply_overrides(lookup)?;
        Ok(config)
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut next = self.clone();
        if let Some(v) = lookup("TALLY_ADMIN") {
            next.token.admin = parse_var("TALLY_ADMIN", &v)?;
        }
        if let Some(v) = lookup("TALLY_FEE_BPS") {
            next.fees.basis_points = parse_var("TALLY_FEE_BPS", &v)?;
            next.fees.enabled = next.fees.basis_points > 0;
        }
        if let Some(v) = lookup("TALLY_FEE_RECIPIENT") {
            next.fees.recipient = if v.is_empty() || v == "burn" {
                None
            } else {
                Some(parse_var("TALLY_FEE_RECIPIENT", &v)?)
            };
        }
        if let Some(v) = lookup("TALLY_INITIAL_MINT") {
            next.token.initial_mint = parse_var("TALLY_INITIAL_MINT", &v.replace('_', ""))?;
        }
        next.validate()?;
        *self = next;
        Ok(())
    }

    /// Ledger address: explicit, or derived from the symbol.
    pub fn token_address(&self) -> Address {
        self.token
            .address
            .unwrap_or_else(|| Address::derive(&format!("token:{}", self.token.symbol)))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        if self.token.name.trim().is_empty() {
            return invalid("token name cannot be empty");
        }
        if self.token.symbol.trim().is_empty() {
            return invalid("token symbol cannot be empty");
        }
        if self.token.admin.is_zero() {
            return invalid("admin cannot be the zero address");
        }
        if self.token.address.is_some_and(|a| a.is_zero()) {
            return invalid("token address cannot be the zero address");
        }
        if self.token.initial_mint > MAX_SUPPLY {
            return Err(ConfigError::Invalid(format!(
                "initial mint {} exceeds max supply {}",
                self.token.initial_mint, MAX_SUPPLY
            )));
        }
        if self.fees.basis_points > MAX_FEE_BPS {
            return Err(ConfigError::Invalid(format!(
                "fee {} bp exceeds maximum {} bp",
                self.fees.basis_points, MAX_FEE_BPS
            )));
        }
        if let Some(recipient) = self.fees.recipient {
            if recipient.is_zero() {
                return invalid("fee recipient cannot be the zero address");
            }
            if recipient == self.token_address() {
                return invalid("fee recipient cannot be the token itself");
            }
        }
        if self.fees.exempt.iter().any(|a| a.is_zero()) {
            return invalid("exempt list contains the zero address");
        }
        if let Some(pool) = &self.lock_pool {
            if pool.num_beneficiaries == 0 {
                return invalid("lock pool needs at least one beneficiary");
            }
            if pool.pool_size / pool.num_beneficiaries as u128 == 0 {
                return invalid("lock pool share per beneficiary rounds to zero");
            }
            if pool.sweep_recipient.is_zero() {
                return invalid("lock pool sweep recipient cannot be the zero address");
            }
        }
        Ok(())
    }
}

fn parse_var<T>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Env {
        var,
        reason: e.to_string(),
    })
}
