//! AWS CLI adapter: implements every remote port by shelling out to `aws`.
//!
//! `AwsCli<R>` routes all calls through a `CommandRunner`, always requests
//! `--output json` and pins `--region` when one was resolved. A non-zero exit
//! is turned into a [`RemoteError`] when stderr carries a service error line,
//! so services can classify failures by code.

mod catalog;
mod cloudformation;
mod s3;
mod sts;

use std::process::Output;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

use crate::application::ports::CommandRunner;
use crate::domain::RemoteError;
use crate::infra::command_runner::{STACK_WAIT_TIMEOUT, TokioCommandRunner};

/// Program name of the AWS CLI.
pub const AWS: &str = "aws";

/// Adapter over the AWS CLI.
///
/// Generic over `R: CommandRunner` so that tests can inject a recording
/// runner without spawning real processes.
pub struct AwsCli<R: CommandRunner> {
    runner: R,
    region: Option<String>,
    wait_timeout: Duration,
    /// Pause between `describe` checks when a stack wait returns early.
    settle_interval: Duration,
}

impl<R: CommandRunner> AwsCli<R> {
    pub fn new(runner: R, region: Option<String>) -> Self {
        Self {
            runner,
            region,
            wait_timeout: STACK_WAIT_TIMEOUT,
            settle_interval: Duration::from_secs(5),
        }
    }

    /// Override the pause between stack checks. Tests use zero.
    #[must_use]
    pub fn with_settle_interval(mut self, interval: Duration) -> Self {
        self.settle_interval = interval;
        self
    }

    /// Full argument list for `aws <service> <operation> <args…>`.
    fn argv<'a>(&'a self, service: &'a str, operation: &'a str, args: &[&'a str]) -> Vec<&'a str> {
        let mut argv = Vec::with_capacity(args.len() + 6);
        argv.push(service);
        argv.push(operation);
        argv.extend_from_slice(args);
        argv.extend_from_slice(&["--output", "json"]);
        if let Some(region) = self.region.as_deref() {
            argv.extend_from_slice(&["--region", region]);
        }
        argv
    }

    /// Run a call and fail on a non-zero exit.
    async fn call(&self, service: &str, operation: &str, args: &[&str]) -> Result<Output> {
        let argv = self.argv(service, operation, args);
        tracing::debug!(service, operation, "aws call");
        let output = self
            .runner
            .run(AWS, &argv)
            .await
            .with_context(|| format!("aws {service} {operation}"))?;
        check_status(output, service, operation)
    }

    /// Run a call and decode its JSON stdout.
    async fn call_json<T: DeserializeOwned>(
        &self,
        service: &str,
        operation: &str,
        args: &[&str],
    ) -> Result<T> {
        let output = self.call(service, operation, args).await?;
        parse_json(&output.stdout)
            .with_context(|| format!("parsing aws {service} {operation} output"))
    }
}

impl AwsCli<TokioCommandRunner> {
    /// Convenience constructor for production use.
    #[must_use]
    pub fn default_runner(region: Option<String>) -> Self {
        Self::new(TokioCommandRunner::default(), region)
    }
}

/// Map a non-zero exit onto an error, preferring the structured form.
fn check_status(output: Output, service: &str, operation: &str) -> Result<Output> {
    if output.status.success() {
        return Ok(output);
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    if let Some(remote) = RemoteError::parse(&stderr) {
        tracing::debug!(code = %remote.code, operation = %remote.operation, "aws service error");
        return Err(anyhow::Error::new(remote).context(format!("aws {service} {operation}")));
    }
    anyhow::bail!("aws {service} {operation} failed: {}", stderr.trim())
}

/// Decode CLI JSON output. Empty stdout decodes as JSON `null`.
fn parse_json<T: DeserializeOwned>(stdout: &[u8]) -> Result<T> {
    let text = String::from_utf8_lossy(stdout);
    let text = text.trim();
    let text = if text.is_empty() { "null" } else { text };
    Ok(serde_json::from_str(text)?)
}
