//! JSON output helpers.
//!
//! Every `--json` command prints exactly one pretty-printed object on stdout;
//! failures print the error object from [`format_error`].

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::json;

use crate::application::services::deploy_pipeline::DeployReport;
use crate::application::services::provision::{LaunchSummary, TerminateOutcome};
use crate::domain::config::DevenvConfig;
use crate::domain::product::{ProductOutput, ProvisionedProduct, instance_ids};
use crate::domain::{AuthError, ConfigError, ProvisionError, StackError, StoreError, TemplateError};

/// Format a JSON error object.
///
/// Output (pretty-printed):
/// ```json
/// {
///   "error": true,
///   "message": "...",
///   "code": "..."
/// }
/// ```
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_error(message: &str, code: &str) -> Result<String> {
    let obj = json!({
        "error": true,
        "message": message,
        "code": code,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

/// Machine-readable code for the outermost typed error in `err`'s chain.
#[must_use]
pub fn error_code(err: &anyhow::Error) -> &'static str {
    for cause in err.chain() {
        if cause.is::<AuthError>() {
            return "NOT_AUTHENTICATED";
        }
        if cause.is::<StackError>() {
            return "STACK_FAILED";
        }
        if cause.is::<TemplateError>() {
            return "TEMPLATE_UNRESOLVED";
        }
        if cause.is::<StoreError>() {
            return "STORE_ERROR";
        }
        if let Some(e) = cause.downcast_ref::<ProvisionError>() {
            return match e {
                ProvisionError::TimedOut { .. } => "PROVISION_TIMEOUT",
                ProvisionError::Failed { .. } => "PROVISION_FAILED",
                ProvisionError::TypeRequired => "TYPE_REQUIRED",
                ProvisionError::Interrupted(_) => "INTERRUPTED",
                _ => "NOT_FOUND",
            };
        }
        if cause.is::<ConfigError>() {
            return "INVALID_CONFIG";
        }
    }
    "ERROR"
}

/// Renders results as JSON on stdout.
pub struct JsonRenderer;

impl JsonRenderer {
    fn print(value: &impl Serialize) -> Result<()> {
        println!(
            "{}",
            serde_json::to_string_pretty(value).context("JSON serialization failed")?
        );
        Ok(())
    }

    pub fn render_version(&self, version: &str) -> Result<()> {
        Self::print(&json!({ "version": version }))
    }

    pub fn render_config(&self, config: &DevenvConfig, path: &Path) -> Result<()> {
        Self::print(&json!({ "path": path, "config": config }))
    }

    pub fn render_config_set(&self, key: &str, value: &str) -> Result<()> {
        Self::print(&json!({ "key": key, "value": value }))
    }

    pub fn render_deploy_report(&self, report: &DeployReport) -> Result<()> {
        Self::print(report)
    }

    pub fn render_launch(&self, summary: &LaunchSummary) -> Result<()> {
        Self::print(summary)
    }

    pub fn render_status(&self, product: &ProvisionedProduct) -> Result<()> {
        Self::print(product)
    }

    pub fn render_outputs(&self, name: &str, outputs: &[ProductOutput]) -> Result<()> {
        let connect: Vec<String> = instance_ids(outputs)
            .into_iter()
            .map(ssm_connect_command)
            .collect();
        Self::print(&json!({
            "name": name,
            "outputs": outputs,
            "connect_commands": connect,
        }))
    }

    pub fn render_provisioned_list(&self, products: &[ProvisionedProduct]) -> Result<()> {
        Self::print(&json!({ "provisioned_products": products }))
    }

    pub fn render_terminate(&self, outcome: &TerminateOutcome) -> Result<()> {
        Self::print(outcome)
    }
}

/// Session Manager command for an instance id.
#[must_use]
pub fn ssm_connect_command(instance_id: &str) -> String {
    format!("aws ssm start-session --target {instance_id}")
}
