//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use thiserror::Error;

// ── Authentication errors ─────────────────────────────────────────────────────

/// Errors raised before any remote call is attempted.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Not authenticated with AWS. Please run 'aws sso login' first.")]
    NotAuthenticated,
}

// ── Stack errors ──────────────────────────────────────────────────────────────

/// Errors related to stack deployment.
#[derive(Debug, Error)]
pub enum StackError {
    #[error("Stack '{name}' failed: {reason}")]
    Failed { name: String, reason: String },

    #[error("Stack '{name}' is still {status} after waiting for completion")]
    NotTerminal { name: String, status: String },
}

// ── Template errors ───────────────────────────────────────────────────────────

/// Errors raised while resolving template placeholders.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Unresolved placeholder(s) in template: {}", .tokens.join(", "))]
    UnresolvedPlaceholder { tokens: Vec<String> },

    #[error("Export '{name}' not found. Was the stack that publishes it deployed?")]
    MissingExport { name: String },
}

// ── Artifact store errors ─────────────────────────────────────────────────────

/// Errors related to the artifact store and object keys.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Cannot derive an object key for {path}: not under {root}")]
    OutsideRoot { path: String, root: String },

    #[error("Object key for {0} is not valid UTF-8")]
    NonUtf8Key(String),
}

// ── Provisioning errors ───────────────────────────────────────────────────────

/// Errors related to catalog provisioning.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error(
        "No portfolio found with name '{0}'.\n\
         Please check with your administrator that the environment is properly set up."
    )]
    PortfolioNotFound(String),

    #[error("Could not find product with name '{0}'.")]
    ProductNotFound(String),

    #[error("No provisioning artifacts found for product '{0}'.")]
    NoProvisioningArtifacts(String),

    #[error("Could not find provisioned product with name: {0}")]
    ProvisionedProductNotFound(String),

    #[error("Provisioning of '{name}' ended in {status}: {message}")]
    Failed {
        name: String,
        status: String,
        message: String,
    },

    #[error("Provisioning of '{name}' did not finish within {waited_secs}s (last status {status})")]
    TimedOut {
        name: String,
        status: String,
        waited_secs: u64,
    },

    #[error(
        "Stopped waiting for '{0}'; provisioning continues remotely.\n\
         Check progress with: devenv developer status --name {0}"
    )]
    Interrupted(String),

    #[error("An environment type is required in non-interactive mode (--type standard|high|extra)")]
    TypeRequired,
}

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors related to configuration key/value validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown setting: {key}\n\nValid settings: {valid}")]
    UnknownKey { key: String, valid: String },

    #[error("Invalid value for {key}: {value}\n\nValid values: {valid}")]
    InvalidValue {
        key: String,
        value: String,
        valid: String,
    },
}
