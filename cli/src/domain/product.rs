//! Catalog product and provisioned-product domain types.
//!
//! Pure functions only; no I/O, no async, no filesystem access.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

/// Display name of the portfolio holding development environment products.
pub const DEFAULT_PORTFOLIO: &str = "Development Environment Portfolio";

/// Name of the unified development environment product.
pub const DEFAULT_PRODUCT: &str = "Development Environment";

// ── Environment types ─────────────────────────────────────────────────────────

/// Instance size class offered to developers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentType {
    Standard,
    High,
    Extra,
}

impl EnvironmentType {
    pub const ALL: [Self; 3] = [Self::Standard, Self::High, Self::Extra];

    /// Instance type launched for this class.
    #[must_use]
    pub fn instance_type(self) -> &'static str {
        match self {
            Self::Standard => "t3.medium",
            Self::High => "t3.large",
            Self::Extra => "t3.xlarge",
        }
    }

    /// One-line description shown in the interactive picker.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Standard => "Standard Development Environment (4GB RAM, 2 vCPU - t3.medium)",
            Self::High => "High Performance Development Environment (8GB RAM, 2 vCPU - t3.large)",
            Self::Extra => "Extra Performance Development Environment (16GB RAM, 4 vCPU - t3.xlarge)",
        }
    }
}

impl fmt::Display for EnvironmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Standard => "standard",
            Self::High => "high",
            Self::Extra => "extra",
        })
    }
}

impl FromStr for EnvironmentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(Self::Standard),
            "high" => Ok(Self::High),
            "extra" => Ok(Self::Extra),
            other => Err(format!("unknown environment type '{other}'")),
        }
    }
}

// ── Catalog listings ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Portfolio {
    pub id: String,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductSummary {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
}

/// A version of a catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisioningArtifact {
    pub id: String,
    pub name: Option<String>,
    pub created_time: Option<DateTime<Utc>>,
}

/// Pick the newest provisioning artifact.
///
/// When every artifact carries a creation time the newest one wins. Otherwise
/// the first entry is used, relying on the remote listing order.
#[must_use]
pub fn select_latest_artifact(artifacts: &[ProvisioningArtifact]) -> Option<&ProvisioningArtifact> {
    if !artifacts.is_empty() && artifacts.iter().all(|a| a.created_time.is_some()) {
        return artifacts.iter().max_by_key(|a| a.created_time);
    }
    artifacts.first()
}

// ── Provisioned products ──────────────────────────────────────────────────────

/// Status of a provisioned product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ProvisionStatus {
    UnderChange,
    Available,
    Error,
    Tainted,
    /// Any status string this tool does not know; treated as non-terminal.
    Other(String),
}

impl ProvisionStatus {
    #[must_use]
    pub fn from_remote(raw: &str) -> Self {
        match raw {
            "UNDER_CHANGE" => Self::UnderChange,
            "AVAILABLE" => Self::Available,
            "ERROR" => Self::Error,
            "TAINTED" => Self::Tainted,
            other => Self::Other(other.to_string()),
        }
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Available | Self::Error | Self::Tainted)
    }

    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Error | Self::Tainted)
    }
}

impl fmt::Display for ProvisionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnderChange => f.write_str("UNDER_CHANGE"),
            Self::Available => f.write_str("AVAILABLE"),
            Self::Error => f.write_str("ERROR"),
            Self::Tainted => f.write_str("TAINTED"),
            Self::Other(s) => f.write_str(s),
        }
    }
}

/// Detail record for one provisioned product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisionedProduct {
    pub id: String,
    pub name: String,
    #[serde(serialize_with = "serialize_display")]
    pub status: ProvisionStatus,
    pub status_message: Option<String>,
    pub product_type: Option<String>,
    pub created_time: Option<DateTime<Utc>>,
}

fn serialize_display<S: serde::Serializer>(
    status: &ProvisionStatus,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(status)
}

/// One output of a provisioned product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductOutput {
    pub key: String,
    pub value: String,
    pub description: Option<String>,
}

/// Values of outputs that name an instance (`InstanceId` or any key
/// containing "instance").
#[must_use]
pub fn instance_ids(outputs: &[ProductOutput]) -> Vec<&str> {
    outputs
        .iter()
        .filter(|o| o.key == "InstanceId" || o.key.to_lowercase().contains("instance"))
        .map(|o| o.value.as_str())
        .collect()
}

// ── Launch requests ───────────────────────────────────────────────────────────

/// Lowercase, hyphen-separated form of a product name.
#[must_use]
pub fn slug(name: &str) -> String {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

/// Unique provisioned-product name: `<user>-<product-name>-<timestamp>`.
#[must_use]
pub fn provisioned_product_name(user: &str, product_name: &str, at: NaiveDateTime) -> String {
    format!(
        "{}-{}-{}",
        slug(user),
        slug(product_name),
        at.format("%Y%m%d%H%M%S")
    )
}

/// Export carrying the connection command for a launch's correlation id.
#[must_use]
pub fn connect_command_export_name(command_id: &str) -> String {
    format!("DevEnv-ConnectCommand-{command_id}")
}

/// Launch parameters sent with a provisioning request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchParameters {
    pub environment: EnvironmentType,
    pub user: String,
    pub key_name: String,
    pub command_id: String,
}

impl LaunchParameters {
    /// Flatten into the `(Key, Value)` list the catalog expects.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        vec![
            (
                "InstanceType".to_string(),
                self.environment.instance_type().to_string(),
            ),
            ("UserName".to_string(), self.user.clone()),
            ("KeyName".to_string(), self.key_name.clone()),
            ("CommandId".to_string(), self.command_id.clone()),
        ]
    }
}
