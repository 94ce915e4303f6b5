//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain`; never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::path::{Path, PathBuf};
use std::process::Output;

use anyhow::Result;

use crate::domain::config::DevenvConfig;
use crate::domain::product::{
    Portfolio, ProductOutput, ProductSummary, ProvisionedProduct, ProvisioningArtifact,
};
use crate::domain::stack::{StackAction, StackDescription, StackSpec};
use crate::domain::store::{CreateBucketRequest, StoreProbe};

// ── Value Types ───────────────────────────────────────────────────────────────

/// A single published export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    pub name: String,
    pub value: String,
}

/// One page of a paginated export listing.
#[derive(Debug, Clone, Default)]
pub struct ExportPage {
    pub exports: Vec<Export>,
    /// Present while more pages remain.
    pub next_token: Option<String>,
}

/// Identity of the authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub account_id: String,
    pub arn: String,
}

/// Reference to a provisioned product by id or by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionedRef<'a> {
    Id(&'a str),
    Name(&'a str),
}

/// A provisioning request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionRequest {
    pub product_id: String,
    pub artifact_id: String,
    pub name: String,
    pub parameters: Vec<(String, String)>,
}

// ── Identity Port ─────────────────────────────────────────────────────────────

/// Credential verification and region discovery.
#[allow(async_fn_in_trait)]
pub trait IdentityProvider {
    /// Resolve the caller identity.
    ///
    /// # Errors
    ///
    /// Returns an error if no valid credentials are available.
    async fn caller_identity(&self) -> Result<CallerIdentity>;

    /// `true` when credentials are present and accepted.
    async fn verify(&self) -> bool {
        self.caller_identity().await.is_ok()
    }

    /// Region configured in the provider's own settings, if any.
    async fn configured_region(&self) -> Result<Option<String>>;
}

// ── Stack Ports ───────────────────────────────────────────────────────────────

/// Infrastructure stack operations.
#[allow(async_fn_in_trait)]
pub trait StackApi {
    /// Describe a stack; `Ok(None)` when it does not exist.
    async fn describe_stack(&self, name: &str) -> Result<Option<StackDescription>>;
    /// Create a new stack.
    async fn create_stack(&self, spec: &StackSpec) -> Result<()>;
    /// Update an existing stack in place.
    async fn update_stack(&self, spec: &StackSpec) -> Result<()>;
    /// Block until the stack reaches a terminal state and return it.
    ///
    /// Must not return while the stack is still in progress.
    async fn wait_until_terminal(&self, name: &str, action: StackAction)
    -> Result<StackDescription>;
}

/// Cross-stack export listing.
#[allow(async_fn_in_trait)]
pub trait ExportsApi {
    /// Fetch one page of exports, starting at `next_token` when given.
    async fn list_exports_page(&self, next_token: Option<&str>) -> Result<ExportPage>;
}

// ── Artifact Store Port ───────────────────────────────────────────────────────

/// Object storage for published templates.
#[allow(async_fn_in_trait)]
pub trait ArtifactStoreApi {
    /// HEAD-style probe: `Absent` for a 404, error for anything else.
    async fn probe_bucket(&self, bucket: &str) -> Result<StoreProbe>;
    async fn create_bucket(&self, request: &CreateBucketRequest) -> Result<()>;
    async fn enable_versioning(&self, bucket: &str) -> Result<()>;
    async fn enable_encryption(&self, bucket: &str) -> Result<()>;
    /// Upload a local file under `key`.
    async fn upload(&self, local: &Path, bucket: &str, key: &str) -> Result<()>;
}

// ── Catalog Port ──────────────────────────────────────────────────────────────

/// Service-catalog operations used by developer commands.
#[allow(async_fn_in_trait)]
pub trait CatalogApi {
    async fn list_portfolios(&self) -> Result<Vec<Portfolio>>;
    async fn search_products(&self, portfolio_id: &str) -> Result<Vec<ProductSummary>>;
    async fn describe_product(&self, product_id: &str) -> Result<Vec<ProvisioningArtifact>>;
    /// Submit a provisioning request; returns the provisioned product id.
    async fn provision(&self, request: &ProvisionRequest) -> Result<String>;
    /// Describe a provisioned product; `Ok(None)` when it does not exist.
    async fn describe_provisioned(
        &self,
        target: ProvisionedRef<'_>,
    ) -> Result<Option<ProvisionedProduct>>;
    async fn provisioned_outputs(&self, name: &str) -> Result<Vec<ProductOutput>>;
    async fn search_provisioned(&self) -> Result<Vec<ProvisionedProduct>>;
    async fn terminate(&self, provisioned_product_id: &str) -> Result<()>;
}

/// Composite trait; everything the administrator pipeline talks to.
pub trait DeployBackend: StackApi + ExportsApi + ArtifactStoreApi {}

/// Blanket implementation: any type implementing the three sub-traits is a `DeployBackend`.
impl<T> DeployBackend for T where T: StackApi + ExportsApi + ArtifactStoreApi {}

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output.
    ///
    /// Implementations should delegate to `run_with_timeout` using the
    /// instance's configured default timeout.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
    /// Run a program with a custom timeout override.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: std::time::Duration,
    ) -> Result<Output>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait; no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}

// ── Filesystem and Config Ports ───────────────────────────────────────────────

/// Local template source and staging area.
pub trait TemplateFs {
    fn read_template(&self, path: &Path) -> Result<String>;
    /// Write `contents` to `path`, creating parent directories.
    fn write_staged(&self, path: &Path, contents: &str) -> Result<()>;
    /// Template files under `dir`, recursively, in sorted order.
    /// A missing directory yields an empty list.
    fn list_templates(&self, dir: &Path) -> Result<Vec<PathBuf>>;
}

/// Abstracts configuration persistence.
pub trait ConfigStore {
    fn load(&self) -> Result<DevenvConfig>;
    fn save(&self, config: &DevenvConfig) -> Result<()>;
    fn path(&self) -> Result<PathBuf>;
}
