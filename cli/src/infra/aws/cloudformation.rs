//! `StackApi` and `ExportsApi` over `aws cloudformation`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::{AWS, AwsCli};
use crate::application::ports::{CommandRunner, Export, ExportPage, ExportsApi, StackApi};
use crate::domain::remote;
use crate::domain::stack::{STACK_CAPABILITY, StackAction, StackDescription, StackSpec};

const SERVICE: &str = "cloudformation";

/// Page size requested from `list-exports`.
const EXPORTS_PAGE_SIZE: &str = "100";

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeStacksResponse {
    #[serde(default)]
    stacks: Vec<StackDto>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StackDto {
    stack_name: String,
    stack_status: String,
    stack_status_reason: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct ParameterDto<'a> {
    parameter_key: &'a str,
    parameter_value: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct TagDto<'a> {
    key: &'a str,
    value: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListExportsResponse {
    #[serde(default)]
    exports: Vec<ExportDto>,
    next_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ExportDto {
    name: String,
    value: String,
}

/// Shared argument list for `create-stack` and `update-stack`.
fn mutation_args(spec: &StackSpec) -> Result<Vec<String>> {
    let mut args = vec![
        "--stack-name".to_string(),
        spec.name.clone(),
        "--template-body".to_string(),
        spec.template_body.clone(),
        "--capabilities".to_string(),
        STACK_CAPABILITY.to_string(),
    ];
    if !spec.parameters.is_empty() {
        let params: Vec<ParameterDto<'_>> = spec
            .parameters
            .iter()
            .map(|(k, v)| ParameterDto {
                parameter_key: k,
                parameter_value: v,
            })
            .collect();
        args.push("--parameters".to_string());
        args.push(serde_json::to_string(&params).context("encoding stack parameters")?);
    }
    if !spec.tags.is_empty() {
        let tags: Vec<TagDto<'_>> = spec
            .tags
            .iter()
            .map(|(k, v)| TagDto { key: k, value: v })
            .collect();
        args.push("--tags".to_string());
        args.push(serde_json::to_string(&tags).context("encoding stack tags")?);
    }
    Ok(args)
}

impl<R: CommandRunner> AwsCli<R> {
    async fn mutate_stack(&self, operation: &str, spec: &StackSpec) -> Result<()> {
        let owned = mutation_args(spec)?;
        let args: Vec<&str> = owned.iter().map(String::as_str).collect();
        self.call(SERVICE, operation, &args).await?;
        Ok(())
    }
}

impl<R: CommandRunner> StackApi for AwsCli<R> {
    async fn describe_stack(&self, name: &str) -> Result<Option<StackDescription>> {
        let response: DescribeStacksResponse = match self
            .call_json(SERVICE, "describe-stacks", &["--stack-name", name])
            .await
        {
            Ok(r) => r,
            Err(e) if remote::is_not_found(&e) => return Ok(None),
            Err(e) => return Err(e),
        };
        Ok(response.stacks.into_iter().next().map(|s| StackDescription {
            name: s.stack_name,
            raw_status: s.stack_status,
            reason: s.stack_status_reason,
        }))
    }

    async fn create_stack(&self, spec: &StackSpec) -> Result<()> {
        self.mutate_stack("create-stack", spec).await
    }

    async fn update_stack(&self, spec: &StackSpec) -> Result<()> {
        self.mutate_stack("update-stack", spec).await
    }

    async fn wait_until_terminal(
        &self,
        name: &str,
        action: StackAction,
    ) -> Result<StackDescription> {
        let waiter = match action {
            StackAction::Create => "stack-create-complete",
            StackAction::Update => "stack-update-complete",
        };
        loop {
            // The waiter exits non-zero on failure states and after its own
            // attempt limit; the describe below decides either way.
            let argv = self.argv(SERVICE, "wait", &[waiter, "--stack-name", name]);
            let output = self
                .runner
                .run_with_timeout(AWS, &argv, self.wait_timeout)
                .await
                .with_context(|| format!("waiting for stack {name}"))?;
            tracing::debug!(stack = name, waiter, success = output.status.success(), "waiter returned");

            let description = self
                .describe_stack(name)
                .await?
                .with_context(|| format!("stack {name} disappeared while waiting"))?;
            if description.status().is_terminal() {
                return Ok(description);
            }
            tracing::debug!(stack = name, status = %description.raw_status, "stack still in progress");
            tokio::time::sleep(self.settle_interval).await;
        }
    }
}

impl<R: CommandRunner> ExportsApi for AwsCli<R> {
    async fn list_exports_page(&self, next_token: Option<&str>) -> Result<ExportPage> {
        let mut args = vec!["--max-items", EXPORTS_PAGE_SIZE];
        if let Some(token) = next_token {
            args.extend_from_slice(&["--starting-token", token]);
        }
        let response: ListExportsResponse = self.call_json(SERVICE, "list-exports", &args).await?;
        Ok(ExportPage {
            exports: response
                .exports
                .into_iter()
                .map(|e| Export {
                    name: e.name,
                    value: e.value,
                })
                .collect(),
            next_token: response.next_token,
        })
    }
}
