//! `devenv admin`: administrator deployment of the environment stacks.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::app::AppContext;
use crate::application::services::deploy_pipeline::{self, DeployRequest};
use crate::domain::layout::DeploymentLayout;
use crate::domain::store::bucket_name;
use crate::infra::fs::LocalTemplateFs;

/// Admin subcommands.
#[derive(Subcommand)]
pub enum AdminCommand {
    /// Deploy the artifact store, base stack and every environment
    Deploy(DeployArgs),
}

/// Arguments for `devenv admin deploy`.
#[derive(Args, Default)]
pub struct DeployArgs {
    /// AWS region to deploy to
    #[arg(long)]
    pub region: Option<String>,

    /// Artifact bucket base name (the account id is appended)
    #[arg(long)]
    pub artifact_bucket_name: Option<String>,

    /// Directory holding the infrastructure templates
    #[arg(long)]
    pub infrastructure_dir: Option<PathBuf>,

    /// Directory resolved templates are written to
    #[arg(long)]
    pub staging_dir: Option<PathBuf>,
}

/// Run the admin command.
///
/// # Errors
///
/// Returns an error if authentication fails or any deployment phase fails.
pub async fn run(app: &AppContext, cmd: AdminCommand) -> Result<ExitCode> {
    match cmd {
        AdminCommand::Deploy(args) => deploy(app, args).await,
    }
}

async fn deploy(app: &AppContext, args: DeployArgs) -> Result<ExitCode> {
    let session = app.connect(args.region.as_deref()).await?;
    let deploy = &app.config.deploy;

    let base = args
        .artifact_bucket_name
        .as_deref()
        .unwrap_or(&deploy.artifact_bucket);
    let bucket = bucket_name(base, &session.caller.account_id);
    let layout = DeploymentLayout::new(
        args.infrastructure_dir
            .unwrap_or_else(|| deploy.infrastructure_dir.clone()),
        args.staging_dir.unwrap_or_else(|| deploy.staging_dir.clone()),
    );

    app.output.header(&format!(
        "Deploying to {} (account {})",
        session.region.region, session.caller.account_id
    ));
    let report = deploy_pipeline::run_pipeline(
        &session.aws,
        &LocalTemplateFs,
        &app.reporter(),
        &DeployRequest {
            bucket: &bucket,
            region: &session.region.region,
            layout: &layout,
        },
    )
    .await?;

    app.renderer().render_deploy_report(&report)?;
    Ok(ExitCode::SUCCESS)
}
