//! `ArtifactStoreApi` over `aws s3api`.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::json;

use super::AwsCli;
use crate::application::ports::{ArtifactStoreApi, CommandRunner};
use crate::domain::remote;
use crate::domain::store::{CreateBucketRequest, SSE_ALGORITHM, StoreProbe};

const SERVICE: &str = "s3api";

impl<R: CommandRunner> ArtifactStoreApi for AwsCli<R> {
    async fn probe_bucket(&self, bucket: &str) -> Result<StoreProbe> {
        match self.call(SERVICE, "head-bucket", &["--bucket", bucket]).await {
            Ok(_) => Ok(StoreProbe::Exists),
            Err(e) if remote::is_not_found(&e) => Ok(StoreProbe::Absent),
            Err(e) => Err(e),
        }
    }

    async fn create_bucket(&self, request: &CreateBucketRequest) -> Result<()> {
        let configuration = request
            .location_constraint
            .as_deref()
            .map(|region| format!("LocationConstraint={region}"));
        let mut args = vec!["--bucket", request.bucket.as_str()];
        if let Some(configuration) = configuration.as_deref() {
            args.extend_from_slice(&["--create-bucket-configuration", configuration]);
        }
        self.call(SERVICE, "create-bucket", &args).await?;
        Ok(())
    }

    async fn enable_versioning(&self, bucket: &str) -> Result<()> {
        self.call(
            SERVICE,
            "put-bucket-versioning",
            &[
                "--bucket",
                bucket,
                "--versioning-configuration",
                "Status=Enabled",
            ],
        )
        .await?;
        Ok(())
    }

    async fn enable_encryption(&self, bucket: &str) -> Result<()> {
        let configuration = json!({
            "Rules": [{
                "ApplyServerSideEncryptionByDefault": { "SSEAlgorithm": SSE_ALGORITHM }
            }]
        })
        .to_string();
        self.call(
            SERVICE,
            "put-bucket-encryption",
            &[
                "--bucket",
                bucket,
                "--server-side-encryption-configuration",
                &configuration,
            ],
        )
        .await?;
        Ok(())
    }

    async fn upload(&self, local: &Path, bucket: &str, key: &str) -> Result<()> {
        let body = local
            .to_str()
            .with_context(|| format!("non-UTF-8 path {}", local.display()))?;
        self.call(
            SERVICE,
            "put-object",
            &["--bucket", bucket, "--key", key, "--body", body],
        )
        .await?;
        Ok(())
    }
}
