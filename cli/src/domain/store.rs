//! Artifact store naming, creation request shape and object keys.
//!
//! Pure functions only; no I/O, no async, no filesystem access.

use std::path::{Component, Path};

use crate::domain::error::StoreError;

/// Region whose bucket-creation API rejects an explicit location constraint.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Default base name for the artifact bucket (suffixed with the account id).
pub const DEFAULT_BUCKET_BASE: &str = "agent-devenv-artifacts";

/// Server-side encryption algorithm applied to the store.
pub const SSE_ALGORITHM: &str = "AES256";

/// File extensions treated as templates when publishing.
pub const TEMPLATE_EXTENSIONS: &[&str] = &["yaml", "yml", "json"];

/// Globally unique store name: `<base-name>-<account-id>`.
#[must_use]
pub fn bucket_name(base: &str, account_id: &str) -> String {
    format!("{base}-{account_id}")
}

/// Shape of a bucket-creation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateBucketRequest {
    pub bucket: String,
    pub region: String,
    /// `None` in the default region, `Some(region)` everywhere else.
    pub location_constraint: Option<String>,
}

impl CreateBucketRequest {
    /// Build the request for `region`, honouring the default-region asymmetry.
    #[must_use]
    pub fn for_region(bucket: &str, region: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            region: region.to_string(),
            location_constraint: (region != DEFAULT_REGION).then(|| region.to_string()),
        }
    }
}

/// Whether a store probe found the bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreProbe {
    Exists,
    Absent,
}

/// `true` when `path` has one of [`TEMPLATE_EXTENSIONS`].
#[must_use]
pub fn is_template_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| TEMPLATE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}

/// Object key for `file`, relative to the parent of `root`.
///
/// Publishing `…/infrastructure` keys `…/infrastructure/a/b.yaml` as
/// `infrastructure/a/b.yaml`. Separators are always `/`.
///
/// # Errors
///
/// Returns [`StoreError`] if `file` is not under `root` or a component is not
/// valid UTF-8.
pub fn object_key(root: &Path, file: &Path) -> Result<String, StoreError> {
    let base = root.parent().unwrap_or_else(|| Path::new(""));
    let relative = file
        .strip_prefix(base)
        .ok()
        .filter(|_| file.starts_with(root))
        .ok_or_else(|| StoreError::OutsideRoot {
            path: file.display().to_string(),
            root: root.display().to_string(),
        })?;

    let mut parts = Vec::new();
    for component in relative.components() {
        if let Component::Normal(part) = component {
            let part = part
                .to_str()
                .ok_or_else(|| StoreError::NonUtf8Key(file.display().to_string()))?;
            parts.push(part);
        }
    }
    Ok(parts.join("/"))
}
