//! Domain types and validators for devenv configuration.
//!
//! Pure functions only; no I/O, no async, no filesystem access.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::domain::error::ConfigError;
use crate::domain::product::{DEFAULT_PORTFOLIO, DEFAULT_PRODUCT};
use crate::domain::store::DEFAULT_BUCKET_BASE;

// ── Constants ────────────────────────────────────────────────────────────────

pub const VALID_CONFIG_KEYS: &[&str] = &[
    "aws.region",
    "deploy.artifact_bucket",
    "deploy.infrastructure_dir",
    "deploy.staging_dir",
    "catalog.portfolio",
    "catalog.product",
    "provision.poll_interval_secs",
    "provision.timeout_secs",
];

// ── Config schema ────────────────────────────────────────────────────────────

/// Top-level configuration stored in `~/.devenv/config.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct DevenvConfig {
    pub aws: AwsConfig,
    pub deploy: DeployConfig,
    pub catalog: CatalogConfig,
    pub provision: ProvisionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct AwsConfig {
    /// Region used when `--region` is not given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

/// Administrator deployment settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DeployConfig {
    /// Bucket base name; the account id is appended.
    pub artifact_bucket: String,
    /// Directory holding the infrastructure templates.
    pub infrastructure_dir: PathBuf,
    /// Directory resolved templates are written to.
    pub staging_dir: PathBuf,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            artifact_bucket: DEFAULT_BUCKET_BASE.to_string(),
            infrastructure_dir: PathBuf::from("infrastructure"),
            staging_dir: PathBuf::from(".devenv/staging"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CatalogConfig {
    pub portfolio: String,
    pub product: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            portfolio: DEFAULT_PORTFOLIO.to_string(),
            product: DEFAULT_PRODUCT.to_string(),
        }
    }
}

/// Provisioning poll settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProvisionConfig {
    pub poll_interval_secs: u64,
    /// Upper bound on a provisioning wait; `0` waits forever.
    pub timeout_secs: u64,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 5,
            timeout_secs: 3600,
        }
    }
}

impl ProvisionConfig {
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

// ── Validators ───────────────────────────────────────────────────────────────

/// Validates a configuration key against the whitelist.
///
/// # Errors
///
/// Returns an error if the key is not in the allowed list.
pub fn validate_config_key(key: &str) -> Result<()> {
    if !VALID_CONFIG_KEYS.contains(&key) {
        return Err(ConfigError::UnknownKey {
            key: key.to_string(),
            valid: VALID_CONFIG_KEYS.join(", "),
        }
        .into());
    }
    Ok(())
}

/// Validates a configuration value for the given key.
///
/// # Errors
///
/// Returns an error if the value is not valid for the key.
pub fn validate_config_value(key: &str, value: &str) -> Result<()> {
    let invalid = |valid: &str| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        valid: valid.to_string(),
    };
    match key {
        "provision.poll_interval_secs" => {
            if !value.parse::<u64>().is_ok_and(|n| n > 0) {
                return Err(invalid("a positive number of seconds").into());
            }
        }
        "provision.timeout_secs" => {
            if value.parse::<u64>().is_err() {
                return Err(invalid("a number of seconds (0 disables the timeout)").into());
            }
        }
        "deploy.artifact_bucket" => {
            let ok = !value.is_empty()
                && value
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.');
            if !ok {
                return Err(invalid("lowercase letters, digits, '-' and '.'").into());
            }
        }
        _ => {
            if value.trim().is_empty() {
                return Err(invalid("a non-empty string").into());
            }
        }
    }
    Ok(())
}

/// Apply a validated `key = value` to `config`.
///
/// # Errors
///
/// Returns an error if the key or value fails validation.
pub fn apply_config_value(config: &mut DevenvConfig, key: &str, value: &str) -> Result<()> {
    validate_config_key(key)?;
    validate_config_value(key, value)?;
    match key {
        "aws.region" => config.aws.region = Some(value.to_string()),
        "deploy.artifact_bucket" => config.deploy.artifact_bucket = value.to_string(),
        "deploy.infrastructure_dir" => config.deploy.infrastructure_dir = PathBuf::from(value),
        "deploy.staging_dir" => config.deploy.staging_dir = PathBuf::from(value),
        "catalog.portfolio" => config.catalog.portfolio = value.to_string(),
        "catalog.product" => config.catalog.product = value.to_string(),
        "provision.poll_interval_secs" => config.provision.poll_interval_secs = value.parse()?,
        "provision.timeout_secs" => config.provision.timeout_secs = value.parse()?,
        _ => anyhow::bail!("Unknown setting: {key}"),
    }
    Ok(())
}

// ── Unit tests ───────────────────────────────────────────────────────────────
