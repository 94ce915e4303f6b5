//! Application service: idempotent create-or-update of a single stack.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use anyhow::{Context, Result};

use crate::application::ports::{ProgressReporter, StackApi};
use crate::domain::remote;
use crate::domain::stack::{
    DeployOutcome, NO_OP_REASON, StackAction, StackParameters, StackSpec, StackStatus,
};
use crate::domain::StackError;

/// Deploy `template_body` as stack `name` and block until it is terminal.
///
/// Chooses `create` when the stack is absent and `update` otherwise. An update
/// rejected as "no updates to perform" is reported as `Available` with reason
/// `no-op`. A failure while waiting is reported as `Failed` with the
/// underlying message.
///
/// # Errors
///
/// Returns an error if the describe call fails for any reason other than the
/// stack being absent, or if the create/update call is rejected.
pub async fn deploy_stack(
    stacks: &impl StackApi,
    reporter: &impl ProgressReporter,
    name: &str,
    template_body: &str,
    parameters: &StackParameters,
) -> Result<DeployOutcome> {
    let existing = stacks
        .describe_stack(name)
        .await
        .with_context(|| format!("checking stack {name}"))?;

    let action = if existing.is_some() {
        StackAction::Update
    } else {
        StackAction::Create
    };
    tracing::info!(stack = name, %action, "deploying stack");

    let spec = StackSpec::new(name, template_body, parameters);
    match action {
        StackAction::Create => {
            reporter.step(&format!("creating stack {name}..."));
            stacks
                .create_stack(&spec)
                .await
                .with_context(|| format!("creating stack {name}"))?;
        }
        StackAction::Update => {
            reporter.step(&format!("updating stack {name}..."));
            if let Err(e) = stacks.update_stack(&spec).await {
                if remote::is_no_changes(&e) {
                    tracing::debug!(stack = name, "update rejected as no-op");
                    reporter.success(&format!("no updates needed for stack {name}"));
                    return Ok(DeployOutcome::available(name, action, NO_OP_REASON));
                }
                return Err(e.context(format!("updating stack {name}")));
            }
        }
    }

    reporter.step(&format!("waiting for {name} deployment to complete..."));
    let finished = match stacks.wait_until_terminal(name, action).await {
        Ok(description) => description,
        Err(e) => {
            tracing::warn!(stack = name, error = %e, "wait for stack failed");
            return Ok(DeployOutcome::failed(name, action, &format!("{e:#}")));
        }
    };

    match finished.status() {
        StackStatus::Available => {
            reporter.success(&format!("stack {name} {}", finished.raw_status));
            Ok(DeployOutcome::available(name, action, &finished.raw_status))
        }
        StackStatus::Failed => {
            let reason = finished
                .reason
                .clone()
                .unwrap_or_else(|| finished.raw_status.clone());
            Ok(DeployOutcome::failed(name, action, &format!("{}: {reason}", finished.raw_status)))
        }
        status => Err(StackError::NotTerminal {
            name: name.to_string(),
            status: status.to_string(),
        }
        .into()),
    }
}

/// Deploy a stack and turn a `Failed` outcome into an error.
///
/// Used by the pipeline, where any failed stack aborts the remaining phases.
///
/// # Errors
///
/// Returns an error if deployment fails or the stack ends in `Failed`.
pub async fn deploy_stack_or_abort(
    stacks: &impl StackApi,
    reporter: &impl ProgressReporter,
    name: &str,
    template_body: &str,
    parameters: &StackParameters,
) -> Result<DeployOutcome> {
    let outcome = deploy_stack(stacks, reporter, name, template_body, parameters).await?;
    if outcome.status == StackStatus::Failed {
        return Err(StackError::Failed {
            name: outcome.stack_name,
            reason: outcome.reason,
        }
        .into());
    }
    Ok(outcome)
}
