//! Application service: the administrator deployment pipeline.
//!
//! Phases run strictly in order and each one only sees what earlier phases
//! handed it:
//!
//! 1. artifact store (plus verbatim infrastructure templates)
//! 2. base stack
//! 3. per-environment launch-template stacks → staged product templates
//! 4. product templates published
//! 5. per-environment product-service stacks
//!
//! Any error aborts the run. Nothing is rolled back; every phase is keyed by
//! stack name, so re-running converges.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::application::ports::{DeployBackend, ProgressReporter, TemplateFs};
use crate::application::services::artifact_publish::{self, StoreOutcome};
use crate::application::services::stack_deploy::deploy_stack_or_abort;
use crate::application::services::template_resolve::{
    collect_exports, render_and_stage, require_exports,
};
use crate::domain::TemplateError;
use crate::domain::layout::{self, DeploymentLayout};
use crate::domain::stack::{
    self, BASE_STACK_NAME, DeployOutcome, StackParameters,
};
use crate::domain::store::object_key;
use crate::domain::template::{
    self, Bindings, LAUNCH_TEMPLATE_EXPORTS, TOKEN_ARTIFACT_BUCKET, TOKEN_ENVIRONMENT_NAME,
    TOKEN_REGION,
};

/// Token bound to the product template's object key in the product-service template.
pub const TOKEN_PRODUCT_TEMPLATE_KEY: &str = "ProductTemplateKey";

/// Inputs to a pipeline run.
pub struct DeployRequest<'a> {
    pub bucket: &'a str,
    pub region: &'a str,
    pub layout: &'a DeploymentLayout,
}

// ── Stage outputs ─────────────────────────────────────────────────────────────

/// Phase 1 output: the store plus the bindings every later phase starts from.
#[derive(Debug, Clone)]
pub struct StoreStage {
    pub outcome: StoreOutcome,
    pub infrastructure_uploads: usize,
    pub bindings: Bindings,
}

/// One environment after phase 3.
#[derive(Debug, Clone, Serialize)]
pub struct EnvironmentStage {
    pub name: String,
    pub launch_template: DeployOutcome,
    /// Store bindings plus this environment's exports and name.
    #[serde(skip)]
    pub bindings: Bindings,
    #[serde(skip)]
    pub staged_product: PathBuf,
    pub product_template_key: String,
}

/// Phase 3 output.
#[derive(Debug, Clone, Default)]
pub struct LaunchStage {
    pub environments: Vec<EnvironmentStage>,
}

/// Per-environment summary in the final report.
#[derive(Debug, Clone, Serialize)]
pub struct EnvironmentReport {
    pub name: String,
    pub launch_template: DeployOutcome,
    pub product_template_key: String,
    pub product_service: DeployOutcome,
}

/// Everything a completed run did.
#[derive(Debug, Clone, Serialize)]
pub struct DeployReport {
    pub bucket: String,
    pub region: String,
    pub store: StoreOutcome,
    pub infrastructure_uploads: usize,
    pub base: DeployOutcome,
    pub product_uploads: usize,
    pub environments: Vec<EnvironmentReport>,
}

// ── Pipeline ──────────────────────────────────────────────────────────────────

/// Run every phase in order.
///
/// # Errors
///
/// Returns the first error raised by any phase; later phases do not run.
pub async fn run_pipeline(
    backend: &impl DeployBackend,
    fs: &impl TemplateFs,
    reporter: &impl ProgressReporter,
    req: &DeployRequest<'_>,
) -> Result<DeployReport> {
    tracing::info!(bucket = req.bucket, region = req.region, "phase 1: artifact store");
    let store = store_stage(backend, fs, reporter, req).await?;

    tracing::info!("phase 2: base stack");
    let base = base_stage(backend, fs, reporter, req).await?;

    tracing::info!("phase 3: launch templates");
    let launch = launch_template_stage(backend, fs, reporter, req, &store.bindings).await?;

    tracing::info!(environments = launch.environments.len(), "phase 4: product templates");
    // Only this run's environments; the staging dir may hold stale products.
    let staged: Vec<PathBuf> = launch
        .environments
        .iter()
        .map(|env| env.staged_product.clone())
        .collect();
    let product_uploads = artifact_publish::publish_files(
        backend,
        reporter,
        &req.layout.staged_product_dir(),
        &staged,
        req.bucket,
    )
    .await
    .context("publishing product templates")?;

    tracing::info!("phase 5: product services");
    let environments = product_service_stage(backend, fs, reporter, req, &launch).await?;

    Ok(DeployReport {
        bucket: req.bucket.to_string(),
        region: req.region.to_string(),
        store: store.outcome,
        infrastructure_uploads: store.infrastructure_uploads,
        base,
        product_uploads,
        environments,
    })
}

/// Phase 1: ensure the store and publish the verbatim infrastructure templates.
///
/// # Errors
///
/// Returns an error if the store cannot be ensured, a verbatim template still
/// carries placeholders, or an upload fails.
pub async fn store_stage(
    backend: &impl DeployBackend,
    fs: &impl TemplateFs,
    reporter: &impl ProgressReporter,
    req: &DeployRequest<'_>,
) -> Result<StoreStage> {
    let outcome = artifact_publish::ensure_store(backend, reporter, req.bucket, req.region).await?;

    let infra = &req.layout.infrastructure_dir;
    let files: Vec<PathBuf> = fs
        .list_templates(infra)
        .with_context(|| format!("listing templates in {}", infra.display()))?
        .into_iter()
        .filter(|f| req.layout.is_published_verbatim(f))
        .collect();
    for file in &files {
        let text = fs.read_template(file)?;
        let tokens: Vec<String> = template::placeholders(&text).into_iter().collect();
        if !tokens.is_empty() {
            return Err(anyhow::Error::new(TemplateError::UnresolvedPlaceholder { tokens })
                .context(format!("{} would be uploaded unresolved", file.display())));
        }
    }
    let infrastructure_uploads =
        artifact_publish::publish_files(backend, reporter, infra, &files, req.bucket)
            .await
            .context("publishing infrastructure templates")?;

    let mut bindings = Bindings::new();
    bindings.insert(TOKEN_ARTIFACT_BUCKET.to_string(), req.bucket.to_string());
    bindings.insert(TOKEN_REGION.to_string(), req.region.to_string());

    Ok(StoreStage {
        outcome,
        infrastructure_uploads,
        bindings,
    })
}

/// Phase 2: deploy the base stack with the artifact bucket as parameter.
///
/// # Errors
///
/// Returns an error if the template cannot be read or the stack fails.
pub async fn base_stage(
    backend: &impl DeployBackend,
    fs: &impl TemplateFs,
    reporter: &impl ProgressReporter,
    req: &DeployRequest<'_>,
) -> Result<DeployOutcome> {
    let path = req.layout.base_template();
    let body = fs
        .read_template(&path)
        .with_context(|| format!("reading base template {}", path.display()))?;
    deploy_stack_or_abort(backend, reporter, BASE_STACK_NAME, &body, &bucket_parameter(req)).await
}

/// Phase 3: deploy each environment's launch template, then stage its
/// product template from the stack's exports.
///
/// # Errors
///
/// Returns an error if a stack fails, an export is missing, or a template
/// cannot be resolved or staged.
pub async fn launch_template_stage(
    backend: &impl DeployBackend,
    fs: &impl TemplateFs,
    reporter: &impl ProgressReporter,
    req: &DeployRequest<'_>,
    store_bindings: &Bindings,
) -> Result<LaunchStage> {
    let dir = req.layout.launch_template_dir();
    let templates = fs
        .list_templates(&dir)
        .with_context(|| format!("listing launch templates in {}", dir.display()))?;
    if templates.is_empty() {
        reporter.warn(&format!("no launch templates found in {}", dir.display()));
    }

    let mut environments = Vec::with_capacity(templates.len());
    for path in templates {
        let Some(name) = layout::environment_name(&path) else {
            continue;
        };
        reporter.step(&format!("environment {name}"));

        let mut env_bindings = store_bindings.clone();
        env_bindings.insert(TOKEN_ENVIRONMENT_NAME.to_string(), name.clone());

        let text = fs.read_template(&path)?;
        let body = template::resolve(&text, &env_bindings)
            .with_context(|| format!("resolving {}", path.display()))?;
        let stack_name = stack::launch_template_stack_name(&name);
        let launch_template =
            deploy_stack_or_abort(backend, reporter, &stack_name, &body, &StackParameters::new())
                .await?;

        let exports = collect_exports(backend).await?;
        let exported = require_exports(&exports, &stack_name, LAUNCH_TEMPLATE_EXPORTS)?;
        env_bindings.extend(exported);

        let staged_product = req.layout.staged_product(&name);
        render_and_stage(
            fs,
            &req.layout.product_template(),
            &env_bindings,
            &staged_product,
        )?;
        let product_template_key = object_key(&req.layout.staged_product_dir(), &staged_product)?;

        environments.push(EnvironmentStage {
            name,
            launch_template,
            bindings: env_bindings,
            staged_product,
            product_template_key,
        });
    }
    Ok(LaunchStage { environments })
}

/// Phase 5: stage and deploy each environment's product-service stack.
///
/// # Errors
///
/// Returns an error if a template cannot be resolved or a stack fails.
pub async fn product_service_stage(
    backend: &impl DeployBackend,
    fs: &impl TemplateFs,
    reporter: &impl ProgressReporter,
    req: &DeployRequest<'_>,
    launch: &LaunchStage,
) -> Result<Vec<EnvironmentReport>> {
    let mut reports = Vec::with_capacity(launch.environments.len());
    for env in &launch.environments {
        let mut bindings = env.bindings.clone();
        bindings.insert(
            TOKEN_PRODUCT_TEMPLATE_KEY.to_string(),
            env.product_template_key.clone(),
        );
        let staged = req.layout.staged_product_service(&env.name);
        let body = render_and_stage(fs, &req.layout.product_service_template(), &bindings, &staged)?;

        let stack_name = stack::product_service_stack_name(&env.name);
        let product_service =
            deploy_stack_or_abort(backend, reporter, &stack_name, &body, &bucket_parameter(req))
                .await?;

        reports.push(EnvironmentReport {
            name: env.name.clone(),
            launch_template: env.launch_template.clone(),
            product_template_key: env.product_template_key.clone(),
            product_service,
        });
    }
    Ok(reports)
}

fn bucket_parameter(req: &DeployRequest<'_>) -> StackParameters {
    let mut params = StackParameters::new();
    params.insert(TOKEN_ARTIFACT_BUCKET.to_string(), req.bucket.to_string());
    params
}
