//! `devenv developer`: launch and manage provisioned development environments.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use crate::app::AppContext;
use crate::application::ports::{CatalogApi, ProgressReporter, ProvisionedRef};
use crate::application::services::provision::{
    self, LaunchRequest, LaunchSummary, PollPolicy,
};
use crate::domain::ProvisionError;
use crate::domain::product::{EnvironmentType, LaunchParameters, ProvisionedProduct};
use crate::infra::user::current_user;
use crate::output::SpinnerReporter;

/// Developer subcommands.
#[derive(Subcommand)]
pub enum DeveloperCommand {
    /// Provision a new development environment
    Launch(LaunchArgs),
    /// Show the status of a provisioned environment
    Status(StatusArgs),
    /// Show the outputs of a provisioned environment
    Outputs(NameArgs),
    /// List provisioned environments
    List(RegionArgs),
    /// Terminate a provisioned environment
    Terminate(TerminateArgs),
}

#[derive(Args, Default)]
pub struct RegionArgs {
    /// AWS region
    #[arg(long)]
    pub region: Option<String>,
}

#[derive(Args)]
pub struct NameArgs {
    /// Provisioned product name
    #[arg(long)]
    pub name: String,

    #[command(flatten)]
    pub region: RegionArgs,
}

/// Arguments for `devenv developer launch`.
#[derive(Args)]
pub struct LaunchArgs {
    /// EC2 key pair name for the instance
    #[arg(long)]
    pub key: String,

    /// Environment size (standard, high, extra); prompted for when omitted
    #[arg(long = "type")]
    pub environment: Option<EnvironmentType>,

    /// Product to launch (defaults to `catalog.product`)
    #[arg(long)]
    pub product: Option<String>,

    /// Return once the request is submitted
    #[arg(long)]
    pub no_wait: bool,

    #[command(flatten)]
    pub region: RegionArgs,
}

#[derive(Args)]
pub struct StatusArgs {
    #[command(flatten)]
    pub target: NameArgs,

    /// Poll until the environment reaches a terminal state
    #[arg(long)]
    pub wait: bool,
}

#[derive(Args)]
pub struct TerminateArgs {
    #[command(flatten)]
    pub target: NameArgs,

    /// Terminate without asking for confirmation
    #[arg(long)]
    pub force: bool,
}

/// Run the developer command.
///
/// # Errors
///
/// Returns an error if authentication or any catalog call fails.
pub async fn run(app: &AppContext, cmd: DeveloperCommand) -> Result<ExitCode> {
    match cmd {
        DeveloperCommand::Launch(args) => launch(app, args).await,
        DeveloperCommand::Status(args) => status(app, args).await,
        DeveloperCommand::Outputs(args) => outputs(app, args).await,
        DeveloperCommand::List(args) => list(app, args).await,
        DeveloperCommand::Terminate(args) => terminate(app, args).await,
    }
}

async fn launch(app: &AppContext, args: LaunchArgs) -> Result<ExitCode> {
    let session = app.connect(args.region.region.as_deref()).await?;
    let catalog = &app.config.catalog;

    let products = provision::list_products(&session.aws, &catalog.portfolio).await?;
    app.renderer().render_products(&products);

    let environment = match args.environment {
        Some(environment) => environment,
        None if app.non_interactive => return Err(ProvisionError::TypeRequired.into()),
        None => prompt_environment()?,
    };
    let parameters = LaunchParameters {
        environment,
        user: current_user(),
        key_name: args.key,
        command_id: uuid::Uuid::new_v4().to_string(),
    };
    let request = LaunchRequest {
        portfolio: &catalog.portfolio,
        product: args.product.as_deref().unwrap_or(&catalog.product),
        parameters,
        requested_at: chrono::Local::now().naive_local(),
    };
    let receipt = provision::launch(&session.aws, &app.reporter(), &request).await?;

    let mut summary = LaunchSummary {
        receipt,
        product: None,
        connect_command: None,
    };
    if !args.no_wait {
        let target = ProvisionedRef::Id(&summary.receipt.provisioned_product_id);
        let product = wait(app, &session.aws, target).await?;
        summary.product = Some(product);
        summary.connect_command =
            match provision::connection_command(&session.aws, &summary.receipt.command_id).await {
                Ok(command) => command,
                Err(e) => {
                    tracing::warn!(error = %format!("{e:#}"), "connection command lookup failed");
                    None
                }
            };
    }

    app.renderer().render_launch(&summary)?;
    Ok(ExitCode::SUCCESS)
}

async fn status(app: &AppContext, args: StatusArgs) -> Result<ExitCode> {
    let session = app.connect(args.target.region.region.as_deref()).await?;
    let target = ProvisionedRef::Name(&args.target.name);
    let product = if args.wait {
        wait(app, &session.aws, target).await?
    } else {
        provision::check_status(&session.aws, target).await?
    };
    app.renderer().render_status(&product)?;
    Ok(ExitCode::SUCCESS)
}

async fn outputs(app: &AppContext, args: NameArgs) -> Result<ExitCode> {
    let session = app.connect(args.region.region.as_deref()).await?;
    let outputs = provision::outputs(&session.aws, &args.name).await?;
    app.renderer().render_outputs(&args.name, &outputs)?;
    Ok(ExitCode::SUCCESS)
}

async fn list(app: &AppContext, args: RegionArgs) -> Result<ExitCode> {
    let session = app.connect(args.region.as_deref()).await?;
    let products = provision::list_provisioned(&session.aws).await?;
    app.renderer().render_provisioned_list(&products)?;
    Ok(ExitCode::SUCCESS)
}

async fn terminate(app: &AppContext, args: TerminateArgs) -> Result<ExitCode> {
    let session = app.connect(args.target.region.region.as_deref()).await?;
    let outcome = provision::terminate(
        &session.aws,
        &app.reporter(),
        &args.target.name,
        |product| {
            app.confirm_destructive(
                &format!(
                    "Terminate '{}' ({})? This cannot be undone",
                    product.name, product.status
                ),
                args.force,
            )
        },
    )
    .await?;
    app.renderer().render_terminate(&outcome)?;
    Ok(ExitCode::SUCCESS)
}

/// Wait for a terminal status, with a spinner on a TTY.
async fn wait(
    app: &AppContext,
    catalog: &impl CatalogApi,
    target: ProvisionedRef<'_>,
) -> Result<ProvisionedProduct> {
    let policy = PollPolicy::from(&app.config.provision);
    if app.output.show_progress() {
        let spinner = SpinnerReporter::new("waiting for provisioning...");
        let result = wait_cancellable(catalog, &spinner, target, &policy).await;
        if let Err(e) = &result {
            spinner.fail(&e.to_string());
        }
        result
    } else {
        wait_cancellable(catalog, &app.reporter(), target, &policy).await
    }
}

/// Poll until terminal; Ctrl-C stops waiting without touching the product.
async fn wait_cancellable(
    catalog: &impl CatalogApi,
    reporter: &impl ProgressReporter,
    target: ProvisionedRef<'_>,
    policy: &PollPolicy,
) -> Result<ProvisionedProduct> {
    tokio::select! {
        result = provision::wait_until_terminal(catalog, reporter, target, policy) => result,
        _ = tokio::signal::ctrl_c() => {
            let label = match target {
                ProvisionedRef::Id(s) | ProvisionedRef::Name(s) => s,
            };
            tracing::info!(product = label, "wait interrupted");
            Err(ProvisionError::Interrupted(label.to_string()).into())
        }
    }
}

fn prompt_environment() -> Result<EnvironmentType> {
    use dialoguer::Select;
    let items: Vec<&str> = EnvironmentType::ALL
        .iter()
        .map(|e| e.description())
        .collect();
    let idx = Select::new()
        .with_prompt("Select environment type")
        .items(&items)
        .default(0)
        .interact()
        .context("environment selection")?;
    EnvironmentType::ALL
        .get(idx)
        .copied()
        .context("environment selection out of range")
}
