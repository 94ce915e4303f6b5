//! `IdentityProvider` over `aws sts` and `aws configure`.

use anyhow::{Context, Result};
use serde::Deserialize;

use super::{AWS, AwsCli};
use crate::application::ports::{CallerIdentity, CommandRunner, IdentityProvider};

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CallerIdentityResponse {
    account: String,
    arn: String,
}

impl<R: CommandRunner> IdentityProvider for AwsCli<R> {
    async fn caller_identity(&self) -> Result<CallerIdentity> {
        let response: CallerIdentityResponse =
            self.call_json("sts", "get-caller-identity", &[]).await?;
        Ok(CallerIdentity {
            account_id: response.account,
            arn: response.arn,
        })
    }

    async fn configured_region(&self) -> Result<Option<String>> {
        // Exits 1 with empty output when no region is configured.
        let output = self
            .runner
            .run(AWS, &["configure", "get", "region"])
            .await
            .context("aws configure get region")?;
        if !output.status.success() {
            return Ok(None);
        }
        let region = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok((!region.is_empty()).then_some(region))
    }
}
