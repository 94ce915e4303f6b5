//! Application service: artifact store provisioning and template upload.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::application::ports::{ArtifactStoreApi, ProgressReporter, TemplateFs};
use crate::domain::store::{CreateBucketRequest, StoreProbe, object_key};

/// Outcome of [`ensure_store`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreOutcome {
    /// The bucket was already there and was reused.
    Existing,
    /// The bucket was created, versioned and encrypted.
    Created,
}

/// Make sure the artifact bucket exists with versioning and encryption on.
///
/// # Errors
///
/// Returns an error if the probe fails with anything other than "not found",
/// or if creation, versioning or encryption fails.
pub async fn ensure_store(
    store: &impl ArtifactStoreApi,
    reporter: &impl ProgressReporter,
    bucket: &str,
    region: &str,
) -> Result<StoreOutcome> {
    let probe = store
        .probe_bucket(bucket)
        .await
        .with_context(|| format!("checking bucket {bucket}"))?;
    if probe == StoreProbe::Exists {
        reporter.success(&format!("S3 bucket {bucket} already exists"));
        return Ok(StoreOutcome::Existing);
    }

    reporter.step(&format!("creating S3 bucket {bucket}..."));
    let request = CreateBucketRequest::for_region(bucket, region);
    tracing::info!(
        bucket,
        region,
        location_constraint = ?request.location_constraint,
        "creating artifact bucket"
    );
    store
        .create_bucket(&request)
        .await
        .with_context(|| format!("creating bucket {bucket}"))?;
    store
        .enable_versioning(bucket)
        .await
        .with_context(|| format!("enabling versioning on {bucket}"))?;
    store
        .enable_encryption(bucket)
        .await
        .with_context(|| format!("enabling encryption on {bucket}"))?;
    reporter.success(&format!("S3 bucket {bucket} created"));
    Ok(StoreOutcome::Created)
}

/// Upload every template under `root`, keyed relative to `root`'s parent.
///
/// Returns the number of files uploaded. Stops at the first failed upload.
///
/// # Errors
///
/// Returns an error if listing fails, a key cannot be derived, or any upload
/// fails.
pub async fn publish(
    store: &impl ArtifactStoreApi,
    fs: &impl TemplateFs,
    reporter: &impl ProgressReporter,
    root: &Path,
    bucket: &str,
) -> Result<usize> {
    let files = fs
        .list_templates(root)
        .with_context(|| format!("listing templates in {}", root.display()))?;
    publish_files(store, reporter, root, &files, bucket).await
}

/// Upload an explicit file list under `root`. Shared by [`publish`] and the
/// pipeline, which filters the staging area out of the infrastructure tree.
///
/// # Errors
///
/// Returns an error if a key cannot be derived or any upload fails.
pub async fn publish_files(
    store: &impl ArtifactStoreApi,
    reporter: &impl ProgressReporter,
    root: &Path,
    files: &[PathBuf],
    bucket: &str,
) -> Result<usize> {
    if files.is_empty() {
        tracing::info!(root = %root.display(), "no templates to upload");
        reporter.warn(&format!("no templates found in {}", root.display()));
        return Ok(0);
    }

    for file in files {
        let key = object_key(root, file)?;
        reporter.step(&format!("uploading {} to s3://{bucket}/{key}", file.display()));
        store
            .upload(file, bucket, &key)
            .await
            .with_context(|| format!("uploading {}", file.display()))?;
        tracing::debug!(file = %file.display(), key, "uploaded");
    }
    reporter.success(&format!("{} template(s) uploaded", files.len()));
    Ok(files.len())
}
