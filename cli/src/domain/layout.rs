//! On-disk layout of the infrastructure tree and the staging area.
//!
//! ```text
//! <infrastructure>/00-admin-deployment.yaml           base stack
//! <infrastructure>/launch-template/<env>.yaml          one stack per environment
//! <infrastructure>/product/product-template.yaml       resolved per environment
//! <infrastructure>/product-service/product-service-template.yaml
//! <staging>/product/<env>-product.yaml
//! <staging>/product-service/<env>-product-service.yaml
//! ```

use std::path::{Path, PathBuf};

pub const BASE_TEMPLATE: &str = "00-admin-deployment.yaml";
pub const LAUNCH_TEMPLATE_DIR: &str = "launch-template";
pub const PRODUCT_DIR: &str = "product";
pub const PRODUCT_TEMPLATE: &str = "product-template.yaml";
pub const PRODUCT_SERVICE_DIR: &str = "product-service";
pub const PRODUCT_SERVICE_TEMPLATE: &str = "product-service-template.yaml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentLayout {
    pub infrastructure_dir: PathBuf,
    pub staging_dir: PathBuf,
}

impl DeploymentLayout {
    #[must_use]
    pub fn new(infrastructure_dir: impl Into<PathBuf>, staging_dir: impl Into<PathBuf>) -> Self {
        Self {
            infrastructure_dir: infrastructure_dir.into(),
            staging_dir: staging_dir.into(),
        }
    }

    #[must_use]
    pub fn base_template(&self) -> PathBuf {
        self.infrastructure_dir.join(BASE_TEMPLATE)
    }

    #[must_use]
    pub fn launch_template_dir(&self) -> PathBuf {
        self.infrastructure_dir.join(LAUNCH_TEMPLATE_DIR)
    }

    #[must_use]
    pub fn product_template(&self) -> PathBuf {
        self.infrastructure_dir.join(PRODUCT_DIR).join(PRODUCT_TEMPLATE)
    }

    #[must_use]
    pub fn product_service_template(&self) -> PathBuf {
        self.infrastructure_dir
            .join(PRODUCT_SERVICE_DIR)
            .join(PRODUCT_SERVICE_TEMPLATE)
    }

    #[must_use]
    pub fn staged_product_dir(&self) -> PathBuf {
        self.staging_dir.join(PRODUCT_DIR)
    }

    #[must_use]
    pub fn staged_product(&self, environment: &str) -> PathBuf {
        self.staged_product_dir()
            .join(format!("{environment}-product.yaml"))
    }

    #[must_use]
    pub fn staged_product_service(&self, environment: &str) -> PathBuf {
        self.staging_dir
            .join(PRODUCT_SERVICE_DIR)
            .join(format!("{environment}-product-service.yaml"))
    }

    /// `true` for infrastructure files published verbatim: everything except
    /// the per-environment phase templates and anything inside the staging
    /// area.
    #[must_use]
    pub fn is_published_verbatim(&self, file: &Path) -> bool {
        !(file.starts_with(self.launch_template_dir())
            || file.starts_with(self.infrastructure_dir.join(PRODUCT_DIR))
            || file.starts_with(self.infrastructure_dir.join(PRODUCT_SERVICE_DIR))
            || file.starts_with(&self.staging_dir))
    }
}

/// Environment name for a launch-template file: its file stem.
#[must_use]
pub fn environment_name(template: &Path) -> Option<String> {
    template
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
