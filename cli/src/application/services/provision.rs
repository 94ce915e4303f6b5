//! Application service: developer environment provisioning.
//!
//! Launch a catalog product, poll its status until terminal, inspect outputs,
//! list and terminate provisioned products.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use serde::Serialize;

use crate::application::ports::{
    CatalogApi, ExportsApi, ProgressReporter, ProvisionRequest, ProvisionedRef,
};
use crate::application::services::template_resolve::{collect_exports, lookup_export};
use crate::domain::ProvisionError;
use crate::domain::config::ProvisionConfig;
use crate::domain::product::{
    self, LaunchParameters, Portfolio, ProductOutput, ProductSummary, ProvisionedProduct,
};

/// How often and for how long to poll a provisioned product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    /// `None` polls until a terminal state, however long that takes.
    pub timeout: Option<Duration>,
}

impl From<&ProvisionConfig> for PollPolicy {
    fn from(config: &ProvisionConfig) -> Self {
        Self {
            interval: config.poll_interval(),
            timeout: config.timeout(),
        }
    }
}

/// Inputs to [`launch`].
#[derive(Debug, Clone)]
pub struct LaunchRequest<'a> {
    pub portfolio: &'a str,
    pub product: &'a str,
    pub parameters: LaunchParameters,
    /// Timestamp baked into the generated provisioned-product name.
    pub requested_at: NaiveDateTime,
}

/// What [`launch`] submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaunchReceipt {
    pub provisioned_product_id: String,
    pub name: String,
    pub product_id: String,
    pub artifact_id: String,
    pub environment: String,
    pub instance_type: String,
    pub command_id: String,
}

/// A launch as reported to the user: the receipt plus, when the caller
/// waited, the final product and its connection command.
#[derive(Debug, Clone, Serialize)]
pub struct LaunchSummary {
    #[serde(flatten)]
    pub receipt: LaunchReceipt,
    pub product: Option<ProvisionedProduct>,
    pub connect_command: Option<String>,
}

/// Outcome of [`terminate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "lowercase")]
pub enum TerminateOutcome {
    /// The user declined the confirmation.
    Cancelled,
    Terminated { id: String, name: String },
}

/// Find a portfolio by display name.
///
/// # Errors
///
/// Returns [`ProvisionError::PortfolioNotFound`] if no portfolio matches, or
/// an error if the listing fails.
pub async fn find_portfolio(catalog: &impl CatalogApi, name: &str) -> Result<Portfolio> {
    let portfolios = catalog
        .list_portfolios()
        .await
        .context("listing portfolios")?;
    portfolios
        .into_iter()
        .find(|p| p.display_name == name)
        .ok_or_else(|| ProvisionError::PortfolioNotFound(name.to_string()).into())
}

/// Products available in the named portfolio.
///
/// # Errors
///
/// Returns an error if the portfolio does not exist or a catalog call fails.
pub async fn list_products(
    catalog: &impl CatalogApi,
    portfolio_name: &str,
) -> Result<Vec<ProductSummary>> {
    let portfolio = find_portfolio(catalog, portfolio_name).await?;
    tracing::debug!(portfolio = %portfolio.id, "searching products");
    catalog
        .search_products(&portfolio.id)
        .await
        .with_context(|| format!("searching products in {portfolio_name}"))
}

/// Submit a provisioning request for `req.product` using its latest
/// provisioning artifact.
///
/// # Errors
///
/// Returns an error if the portfolio, product or artifacts cannot be found,
/// or the provisioning call is rejected.
pub async fn launch(
    catalog: &impl CatalogApi,
    reporter: &impl ProgressReporter,
    req: &LaunchRequest<'_>,
) -> Result<LaunchReceipt> {
    let products = list_products(catalog, req.portfolio).await?;
    let product = products
        .into_iter()
        .find(|p| p.name == req.product)
        .ok_or_else(|| ProvisionError::ProductNotFound(req.product.to_string()))?;

    let artifacts = catalog
        .describe_product(&product.id)
        .await
        .with_context(|| format!("describing product {}", product.name))?;
    let artifact = product::select_latest_artifact(&artifacts)
        .ok_or_else(|| ProvisionError::NoProvisioningArtifacts(product.name.clone()))?;

    let name = product::provisioned_product_name(
        &req.parameters.user,
        &product.name,
        req.requested_at,
    );
    let request = ProvisionRequest {
        product_id: product.id.clone(),
        artifact_id: artifact.id.clone(),
        name: name.clone(),
        parameters: req.parameters.to_pairs(),
    };

    reporter.step(&format!("provisioning {name}..."));
    tracing::info!(
        product = %product.id,
        artifact = %artifact.id,
        name,
        environment = %req.parameters.environment,
        "submitting provisioning request"
    );
    let provisioned_product_id = catalog
        .provision(&request)
        .await
        .with_context(|| format!("provisioning {name}"))?;
    reporter.success(&format!("provisioning request submitted for {name}"));

    Ok(LaunchReceipt {
        provisioned_product_id,
        name,
        product_id: product.id,
        artifact_id: artifact.id.clone(),
        environment: req.parameters.environment.to_string(),
        instance_type: req.parameters.environment.instance_type().to_string(),
        command_id: req.parameters.command_id.clone(),
    })
}

/// Describe a provisioned product once.
///
/// # Errors
///
/// Returns [`ProvisionError::ProvisionedProductNotFound`] if it does not
/// exist, or an error if the describe call fails.
pub async fn check_status(
    catalog: &impl CatalogApi,
    target: ProvisionedRef<'_>,
) -> Result<ProvisionedProduct> {
    let label = match target {
        ProvisionedRef::Id(s) | ProvisionedRef::Name(s) => s,
    };
    catalog
        .describe_provisioned(target)
        .await
        .with_context(|| format!("describing provisioned product {label}"))?
        .ok_or_else(|| ProvisionError::ProvisionedProductNotFound(label.to_string()).into())
}

/// Poll until the provisioned product reaches a terminal status.
///
/// A product that is already terminal returns after a single describe call.
///
/// # Errors
///
/// Returns [`ProvisionError::Failed`] for `ERROR`/`TAINTED`,
/// [`ProvisionError::TimedOut`] when the policy's timeout elapses first, or
/// any describe error.
pub async fn wait_until_terminal(
    catalog: &impl CatalogApi,
    reporter: &impl ProgressReporter,
    target: ProvisionedRef<'_>,
    policy: &PollPolicy,
) -> Result<ProvisionedProduct> {
    let started = tokio::time::Instant::now();
    let mut polls = 0_u32;
    loop {
        let current = check_status(catalog, target).await?;
        polls += 1;
        tracing::debug!(name = %current.name, status = %current.status, polls, "polled provisioned product");

        if current.status.is_failure() {
            return Err(ProvisionError::Failed {
                name: current.name,
                status: current.status.to_string(),
                message: current.status_message.unwrap_or_default(),
            }
            .into());
        }
        if current.status.is_terminal() {
            reporter.success(&format!("{} is {}", current.name, current.status));
            return Ok(current);
        }

        let waited = started.elapsed();
        if let Some(limit) = policy.timeout
            && waited >= limit
        {
            return Err(ProvisionError::TimedOut {
                name: current.name,
                status: current.status.to_string(),
                waited_secs: waited.as_secs(),
            }
            .into());
        }
        reporter.step(&format!(
            "{} is {}, checking again in {}s...",
            current.name,
            current.status,
            policy.interval.as_secs()
        ));
        tokio::time::sleep(policy.interval).await;
    }
}

/// Outputs of the named provisioned product.
///
/// # Errors
///
/// Returns an error if the product does not exist or the call fails.
pub async fn outputs(catalog: &impl CatalogApi, name: &str) -> Result<Vec<ProductOutput>> {
    check_status(catalog, ProvisionedRef::Name(name)).await?;
    catalog
        .provisioned_outputs(name)
        .await
        .with_context(|| format!("fetching outputs of {name}"))
}

/// Every provisioned product visible to the caller.
///
/// # Errors
///
/// Returns an error if the search call fails.
pub async fn list_provisioned(catalog: &impl CatalogApi) -> Result<Vec<ProvisionedProduct>> {
    catalog
        .search_provisioned()
        .await
        .context("searching provisioned products")
}

/// Terminate the named provisioned product after `confirm` approves it.
///
/// # Errors
///
/// Returns an error if the product does not exist, `confirm` fails, or the
/// terminate call is rejected.
pub async fn terminate(
    catalog: &impl CatalogApi,
    reporter: &impl ProgressReporter,
    name: &str,
    confirm: impl FnOnce(&ProvisionedProduct) -> Result<bool>,
) -> Result<TerminateOutcome> {
    let target = check_status(catalog, ProvisionedRef::Name(name)).await?;
    if !confirm(&target)? {
        tracing::info!(name, "termination declined");
        return Ok(TerminateOutcome::Cancelled);
    }
    reporter.step(&format!("terminating {name}..."));
    catalog
        .terminate(&target.id)
        .await
        .with_context(|| format!("terminating {name}"))?;
    reporter.success(&format!("termination of {name} initiated"));
    Ok(TerminateOutcome::Terminated {
        id: target.id,
        name: target.name,
    })
}

/// Connection command published for a launch, if its export exists yet.
///
/// # Errors
///
/// Returns an error if listing exports fails.
pub async fn connection_command(
    exports: &impl ExportsApi,
    command_id: &str,
) -> Result<Option<String>> {
    let all = collect_exports(exports).await?;
    let name = product::connect_command_export_name(command_id);
    Ok(lookup_export(&all, &name).map(str::to_string))
}
