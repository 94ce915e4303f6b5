//! Shared fakes for unit tests.
//!
//! [`FakeCloud`] implements every remote port over in-memory state so service
//! tests can drive whole scenarios and then inspect what was called.

#![allow(clippy::expect_used, dead_code)]

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Result;
use devenv_cli::application::ports::{
    ArtifactStoreApi, CallerIdentity, CatalogApi, Export, ExportPage, ExportsApi,
    IdentityProvider, ProgressReporter, ProvisionRequest, ProvisionedRef, StackApi, TemplateFs,
};
use devenv_cli::domain::RemoteError;
use devenv_cli::domain::product::{
    Portfolio, ProductOutput, ProductSummary, ProvisionStatus, ProvisionedProduct,
    ProvisioningArtifact,
};
use devenv_cli::domain::stack::{StackAction, StackDescription, StackSpec};
use devenv_cli::domain::store::{CreateBucketRequest, StoreProbe, is_template_file};
use devenv_cli::domain::template::{LAUNCH_TEMPLATE_EXPORTS, export_name};

// ── Fake cloud ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct FakeStack {
    pub template_body: String,
    pub parameters: Vec<(String, String)>,
    pub raw_status: String,
    pub reason: Option<String>,
}

#[derive(Debug, Default)]
pub struct CloudState {
    // identity
    pub identity: Option<CallerIdentity>,
    pub configured_region: Option<String>,
    pub identity_calls: u32,

    // stacks
    pub stacks: BTreeMap<String, FakeStack>,
    /// Stacks whose create/update ends in a rollback.
    pub failing_stacks: BTreeSet<String>,
    /// Launch-template stacks publish their exports when created.
    pub auto_exports: bool,
    pub describe_stack_calls: u32,
    pub create_calls: Vec<String>,
    pub update_calls: Vec<String>,
    pub wait_calls: Vec<(String, StackAction)>,
    /// Every describe fails with this remote error code.
    pub describe_stack_error: Option<String>,
    /// Updates of these stacks are rejected (for a reason other than no-op).
    pub rejected_updates: BTreeSet<String>,
    /// Waits on these stacks fail after the mutation was accepted.
    pub failing_waits: BTreeSet<String>,

    // exports
    pub exports: Vec<Export>,
    /// Exports per page; `0` puts everything on one page.
    pub export_page_size: usize,
    pub export_page_calls: u32,

    // artifact store
    pub buckets: BTreeSet<String>,
    pub create_bucket_requests: Vec<CreateBucketRequest>,
    pub versioned: Vec<String>,
    pub encrypted: Vec<String>,
    pub versioning_fails: bool,
    pub encryption_fails: bool,
    pub uploads: Vec<(PathBuf, String, String)>,
    /// Uploads of this object key fail.
    pub failing_key: Option<String>,

    // catalog
    pub portfolios: Vec<Portfolio>,
    pub products: BTreeMap<String, Vec<ProductSummary>>,
    pub artifacts: BTreeMap<String, Vec<ProvisioningArtifact>>,
    pub provision_requests: Vec<ProvisionRequest>,
    pub provisioned: Vec<ProvisionedProduct>,
    /// Status applied on each successive describe; the last one sticks.
    pub status_script: VecDeque<ProvisionStatus>,
    pub describe_provisioned_calls: u32,
    pub outputs: BTreeMap<String, Vec<ProductOutput>>,
    pub terminated: Vec<String>,
}

#[derive(Debug, Default)]
pub struct FakeCloud {
    pub state: Mutex<CloudState>,
}

impl FakeCloud {
    pub fn new() -> Self {
        let cloud = Self::default();
        {
            let mut s = cloud.state();
            s.identity = Some(CallerIdentity {
                account_id: "123456789012".to_string(),
                arn: "arn:aws:iam::123456789012:user/alice".to_string(),
            });
            s.auto_exports = true;
        }
        cloud
    }

    /// A cloud with one portfolio holding the development product.
    pub fn with_catalog() -> Self {
        let cloud = Self::new();
        {
            let mut s = cloud.state();
            s.portfolios.push(Portfolio {
                id: "port-1".to_string(),
                display_name: "Development Environment Portfolio".to_string(),
            });
            s.products.insert(
                "port-1".to_string(),
                vec![ProductSummary {
                    id: "prod-1".to_string(),
                    name: "Development Environment".to_string(),
                    description: Some("Cloud dev box".to_string()),
                }],
            );
            s.artifacts.insert(
                "prod-1".to_string(),
                vec![ProvisioningArtifact {
                    id: "pa-1".to_string(),
                    name: Some("v1".to_string()),
                    created_time: None,
                }],
            );
        }
        cloud
    }

    pub fn state(&self) -> std::sync::MutexGuard<'_, CloudState> {
        self.state.lock().expect("lock")
    }

    pub fn add_stack(&self, name: &str, body: &str, raw_status: &str) {
        self.state().stacks.insert(
            name.to_string(),
            FakeStack {
                template_body: body.to_string(),
                parameters: Vec::new(),
                raw_status: raw_status.to_string(),
                reason: None,
            },
        );
    }

    pub fn add_export(&self, name: &str, value: &str) {
        self.state().exports.push(Export {
            name: name.to_string(),
            value: value.to_string(),
        });
    }

    pub fn add_provisioned(&self, id: &str, name: &str, status: ProvisionStatus) {
        self.state().provisioned.push(ProvisionedProduct {
            id: id.to_string(),
            name: name.to_string(),
            status,
            status_message: None,
            product_type: Some("CLOUD_FORMATION_TEMPLATE".to_string()),
            created_time: None,
        });
    }

    pub fn upload_keys(&self) -> Vec<String> {
        self.state()
            .uploads
            .iter()
            .map(|(_, _, key)| key.clone())
            .collect()
    }
}

fn remote(code: &str, operation: &str, message: &str) -> anyhow::Error {
    anyhow::Error::new(RemoteError {
        code: code.to_string(),
        operation: operation.to_string(),
        message: message.to_string(),
    })
}

fn finish_status(s: &CloudState, name: &str, action: StackAction) -> (String, Option<String>) {
    if s.failing_stacks.contains(name) {
        let status = match action {
            StackAction::Create => "ROLLBACK_COMPLETE",
            StackAction::Update => "UPDATE_ROLLBACK_COMPLETE",
        };
        return (status.to_string(), Some("Resource creation cancelled".to_string()));
    }
    let status = match action {
        StackAction::Create => "CREATE_COMPLETE",
        StackAction::Update => "UPDATE_COMPLETE",
    };
    (status.to_string(), None)
}

impl IdentityProvider for FakeCloud {
    async fn caller_identity(&self) -> Result<CallerIdentity> {
        let mut s = self.state();
        s.identity_calls += 1;
        s.identity.clone().ok_or_else(|| {
            remote(
                "ExpiredToken",
                "GetCallerIdentity",
                "The security token included in the request is expired",
            )
        })
    }

    async fn configured_region(&self) -> Result<Option<String>> {
        Ok(self.state().configured_region.clone())
    }
}

impl StackApi for FakeCloud {
    async fn describe_stack(&self, name: &str) -> Result<Option<StackDescription>> {
        let mut s = self.state();
        s.describe_stack_calls += 1;
        if let Some(code) = &s.describe_stack_error {
            return Err(remote(code, "DescribeStacks", "User is not authorized to perform: cloudformation:DescribeStacks"));
        }
        Ok(s.stacks.get(name).map(|st| StackDescription {
            name: name.to_string(),
            raw_status: st.raw_status.clone(),
            reason: st.reason.clone(),
        }))
    }

    async fn create_stack(&self, spec: &StackSpec) -> Result<()> {
        let mut s = self.state();
        s.create_calls.push(spec.name.clone());
        if s.stacks.contains_key(&spec.name) {
            return Err(remote(
                "AlreadyExistsException",
                "CreateStack",
                &format!("Stack [{}] already exists", spec.name),
            ));
        }
        s.stacks.insert(
            spec.name.clone(),
            FakeStack {
                template_body: spec.template_body.clone(),
                parameters: spec.parameters.clone(),
                raw_status: "CREATE_IN_PROGRESS".to_string(),
                reason: None,
            },
        );
        if s.auto_exports && spec.name.starts_with("AgentDevEnv-LaunchTemplate-") {
            for key in LAUNCH_TEMPLATE_EXPORTS {
                let name = export_name(&spec.name, key);
                let value = format!("{}-value", key.to_lowercase());
                s.exports.push(Export { name, value });
            }
        }
        Ok(())
    }

    async fn update_stack(&self, spec: &StackSpec) -> Result<()> {
        let mut s = self.state();
        s.update_calls.push(spec.name.clone());
        if s.rejected_updates.contains(&spec.name) {
            return Err(remote(
                "InsufficientCapabilitiesException",
                "UpdateStack",
                "Requires capabilities : [CAPABILITY_NAMED_IAM]",
            ));
        }
        let Some(stack) = s.stacks.get_mut(&spec.name) else {
            return Err(remote(
                "ValidationError",
                "UpdateStack",
                &format!("Stack with id {} does not exist", spec.name),
            ));
        };
        if stack.template_body == spec.template_body && stack.parameters == spec.parameters {
            return Err(remote(
                "ValidationError",
                "UpdateStack",
                "No updates are to be performed.",
            ));
        }
        stack.template_body = spec.template_body.clone();
        stack.parameters = spec.parameters.clone();
        stack.raw_status = "UPDATE_IN_PROGRESS".to_string();
        Ok(())
    }

    async fn wait_until_terminal(
        &self,
        name: &str,
        action: StackAction,
    ) -> Result<StackDescription> {
        let mut s = self.state();
        s.wait_calls.push((name.to_string(), action));
        if s.failing_waits.contains(name) {
            anyhow::bail!("Waiter StackCreateComplete failed: Max attempts exceeded");
        }
        let (raw_status, reason) = finish_status(&s, name, action);
        let Some(stack) = s.stacks.get_mut(name) else {
            anyhow::bail!("stack {name} disappeared while waiting");
        };
        stack.raw_status = raw_status.clone();
        stack.reason = reason.clone();
        Ok(StackDescription {
            name: name.to_string(),
            raw_status,
            reason,
        })
    }
}

impl ExportsApi for FakeCloud {
    async fn list_exports_page(&self, next_token: Option<&str>) -> Result<ExportPage> {
        let mut s = self.state();
        s.export_page_calls += 1;
        let start: usize = match next_token {
            Some(t) => t.parse()?,
            None => 0,
        };
        let size = if s.export_page_size == 0 {
            s.exports.len().max(1)
        } else {
            s.export_page_size
        };
        let end = (start + size).min(s.exports.len());
        let exports = s.exports.get(start..end).unwrap_or_default().to_vec();
        let next_token = (end < s.exports.len()).then(|| end.to_string());
        Ok(ExportPage {
            exports,
            next_token,
        })
    }
}

impl ArtifactStoreApi for FakeCloud {
    async fn probe_bucket(&self, bucket: &str) -> Result<StoreProbe> {
        Ok(if self.state().buckets.contains(bucket) {
            StoreProbe::Exists
        } else {
            StoreProbe::Absent
        })
    }

    async fn create_bucket(&self, request: &CreateBucketRequest) -> Result<()> {
        let mut s = self.state();
        s.create_bucket_requests.push(request.clone());
        s.buckets.insert(request.bucket.clone());
        Ok(())
    }

    async fn enable_versioning(&self, bucket: &str) -> Result<()> {
        let mut s = self.state();
        if s.versioning_fails {
            return Err(remote("AccessDenied", "PutBucketVersioning", "Access Denied"));
        }
        s.versioned.push(bucket.to_string());
        Ok(())
    }

    async fn enable_encryption(&self, bucket: &str) -> Result<()> {
        let mut s = self.state();
        if s.encryption_fails {
            return Err(remote("AccessDenied", "PutBucketEncryption", "Access Denied"));
        }
        s.encrypted.push(bucket.to_string());
        Ok(())
    }

    async fn upload(&self, local: &Path, bucket: &str, key: &str) -> Result<()> {
        let mut s = self.state();
        if s.failing_key.as_deref() == Some(key) {
            return Err(remote("AccessDenied", "PutObject", "Access Denied"));
        }
        s.uploads
            .push((local.to_path_buf(), bucket.to_string(), key.to_string()));
        Ok(())
    }
}

impl CatalogApi for FakeCloud {
    async fn list_portfolios(&self) -> Result<Vec<Portfolio>> {
        Ok(self.state().portfolios.clone())
    }

    async fn search_products(&self, portfolio_id: &str) -> Result<Vec<ProductSummary>> {
        Ok(self
            .state()
            .products
            .get(portfolio_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn describe_product(&self, product_id: &str) -> Result<Vec<ProvisioningArtifact>> {
        Ok(self
            .state()
            .artifacts
            .get(product_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn provision(&self, request: &ProvisionRequest) -> Result<String> {
        let mut s = self.state();
        s.provision_requests.push(request.clone());
        let id = format!("pp-{}", s.provision_requests.len());
        s.provisioned.push(ProvisionedProduct {
            id: id.clone(),
            name: request.name.clone(),
            status: ProvisionStatus::UnderChange,
            status_message: None,
            product_type: Some("CLOUD_FORMATION_TEMPLATE".to_string()),
            created_time: None,
        });
        Ok(id)
    }

    async fn describe_provisioned(
        &self,
        target: ProvisionedRef<'_>,
    ) -> Result<Option<ProvisionedProduct>> {
        let mut s = self.state();
        s.describe_provisioned_calls += 1;
        let next = if s.status_script.len() > 1 {
            s.status_script.pop_front()
        } else {
            s.status_script.front().cloned()
        };
        let found = s.provisioned.iter_mut().find(|p| match target {
            ProvisionedRef::Id(id) => p.id == id,
            ProvisionedRef::Name(name) => p.name == name,
        });
        Ok(found.map(|p| {
            if let Some(status) = next {
                p.status = status;
            }
            p.clone()
        }))
    }

    async fn provisioned_outputs(&self, name: &str) -> Result<Vec<ProductOutput>> {
        Ok(self.state().outputs.get(name).cloned().unwrap_or_default())
    }

    async fn search_provisioned(&self) -> Result<Vec<ProvisionedProduct>> {
        Ok(self.state().provisioned.clone())
    }

    async fn terminate(&self, provisioned_product_id: &str) -> Result<()> {
        self.state().terminated.push(provisioned_product_id.to_string());
        Ok(())
    }
}

// ── Recording reporter ────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingReporter {
    pub events: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().expect("lock").clone()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| e.strip_prefix("warn: ").map(str::to_string))
            .collect()
    }
}

impl ProgressReporter for RecordingReporter {
    fn step(&self, message: &str) {
        self.events.lock().expect("lock").push(format!("step: {message}"));
    }
    fn success(&self, message: &str) {
        self.events
            .lock()
            .expect("lock")
            .push(format!("success: {message}"));
    }
    fn warn(&self, message: &str) {
        self.events.lock().expect("lock").push(format!("warn: {message}"));
    }
}

pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn step(&self, _: &str) {}
    fn success(&self, _: &str) {}
    fn warn(&self, _: &str) {}
}

// ── In-memory template filesystem ─────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryFs {
    pub files: Mutex<BTreeMap<PathBuf, String>>,
}

impl MemoryFs {
    pub fn with(files: &[(&str, &str)]) -> Self {
        let fs = Self::default();
        for (path, text) in files {
            fs.put(path, text);
        }
        fs
    }

    pub fn put(&self, path: &str, text: &str) {
        self.files
            .lock()
            .expect("lock")
            .insert(PathBuf::from(path), text.to_string());
    }

    pub fn get(&self, path: &str) -> Option<String> {
        self.files.lock().expect("lock").get(Path::new(path)).cloned()
    }
}

impl TemplateFs for MemoryFs {
    fn read_template(&self, path: &Path) -> Result<String> {
        self.files
            .lock()
            .expect("lock")
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no such file: {}", path.display()))
    }

    fn write_staged(&self, path: &Path, contents: &str) -> Result<()> {
        self.files
            .lock()
            .expect("lock")
            .insert(path.to_path_buf(), contents.to_string());
        Ok(())
    }

    fn list_templates(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        Ok(self
            .files
            .lock()
            .expect("lock")
            .keys()
            .filter(|p| p.starts_with(dir) && is_template_file(p))
            .cloned()
            .collect())
    }
}
