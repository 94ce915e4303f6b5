//! Human-readable terminal renderer.

use std::path::Path;

use chrono::{DateTime, Utc};
use owo_colors::OwoColorize as _;

use crate::application::services::artifact_publish::StoreOutcome;
use crate::application::services::deploy_pipeline::DeployReport;
use crate::application::services::provision::{LaunchSummary, TerminateOutcome};
use crate::domain::config::DevenvConfig;
use crate::domain::product::{ProductOutput, ProductSummary, ProvisionedProduct, instance_ids};
use crate::output::OutputContext;
use crate::output::json::ssm_connect_command;

/// Renders domain types as human-readable terminal output using `OutputContext`.
pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

impl<'a> HumanRenderer<'a> {
    /// Create a new `HumanRenderer` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    /// Render the CLI version information.
    pub fn render_version(&self, version: &str) {
        if self.ctx.quiet {
            return;
        }
        println!("devenv {version}");
    }

    /// Render the current configuration.
    pub fn render_config(&self, config: &DevenvConfig, path: &Path) {
        println!();
        println!(
            "  {}",
            format!("Configuration ({})", path.display()).style(self.ctx.styles.header)
        );
        println!();
        println!(
            "  {:<30} {}",
            "aws.region:",
            config.aws.region.as_deref().unwrap_or("(auto)")
        );
        println!("  {:<30} {}", "deploy.artifact_bucket:", config.deploy.artifact_bucket);
        println!(
            "  {:<30} {}",
            "deploy.infrastructure_dir:",
            config.deploy.infrastructure_dir.display()
        );
        println!("  {:<30} {}", "deploy.staging_dir:", config.deploy.staging_dir.display());
        println!("  {:<30} {}", "catalog.portfolio:", config.catalog.portfolio);
        println!("  {:<30} {}", "catalog.product:", config.catalog.product);
        println!(
            "  {:<30} {}",
            "provision.poll_interval_secs:", config.provision.poll_interval_secs
        );
        println!("  {:<30} {}", "provision.timeout_secs:", config.provision.timeout_secs);
        println!();
        println!("  {}", "Environment:".style(self.ctx.styles.bold));
        for var in ["DEVENV_CONFIG", "DEVENV_LOG", "NO_COLOR"] {
            println!(
                "    {:<18} {}",
                format!("{var}:"),
                std::env::var(var).unwrap_or_else(|_| "(not set)".to_string())
            );
        }
        println!();
    }

    pub fn render_config_set(&self, key: &str, value: &str) {
        self.ctx.success(&format!("Set {key} = {value}"));
    }

    /// Render the summary of a completed deployment.
    pub fn render_deploy_report(&self, report: &DeployReport) {
        if self.ctx.quiet {
            return;
        }
        println!();
        self.ctx.header("Deployment complete");
        self.ctx.kv("Region:     ", &report.region);
        self.ctx.kv(
            "Bucket:     ",
            &format!("{} ({})", report.bucket, store_label(report)),
        );
        self.ctx.kv(
            "Uploaded:   ",
            &format!(
                "{} infrastructure, {} product template(s)",
                report.infrastructure_uploads, report.product_uploads
            ),
        );
        self.ctx.kv(
            "Base stack: ",
            &format!("{} ({})", report.base.stack_name, report.base.reason),
        );
        if report.environments.is_empty() {
            self.ctx.warn("No environments deployed");
            return;
        }
        println!();
        println!("  {}", "Environments:".style(self.ctx.styles.bold));
        for env in &report.environments {
            println!(
                "    {:<12} {}  {}",
                env.name,
                env.launch_template.reason.style(self.ctx.styles.dim),
                env.product_service.reason.style(self.ctx.styles.dim)
            );
        }
    }

    /// Render the products offered in the portfolio.
    pub fn render_products(&self, products: &[ProductSummary]) {
        if self.ctx.quiet {
            return;
        }
        println!("Available development environment templates:");
        println!(
            "  {}",
            format!("{:<24} {:<32} {}", "ID", "Name", "Description").style(self.ctx.styles.info)
        );
        for p in products {
            println!(
                "  {:<24} {:<32} {}",
                p.id,
                p.name,
                p.description.as_deref().unwrap_or("No description available")
            );
        }
        println!();
    }

    /// Render a submitted launch, its final state and next steps.
    pub fn render_launch(&self, summary: &LaunchSummary) {
        if self.ctx.quiet {
            return;
        }
        let r = &summary.receipt;
        println!();
        self.ctx.kv("Environment:      ", &r.environment);
        self.ctx.kv("Instance Type:    ", &r.instance_type);
        self.ctx.kv("Provisioned Name: ", &r.name);
        self.ctx.kv("Provisioned ID:   ", &r.provisioned_product_id);

        if let Some(product) = &summary.product {
            println!();
            self.render_status(product);
        }
        if let Some(command) = &summary.connect_command {
            println!();
            println!("  {}", "Connect with:".style(self.ctx.styles.success));
            println!("    {command}");
        }

        println!();
        println!(
            "  {}",
            "To check the status of your environment:".style(self.ctx.styles.warning)
        );
        println!("    devenv developer status --name {}", r.name);
        println!(
            "  {}",
            "Once provisioning is complete, find your instance ID in the outputs:"
                .style(self.ctx.styles.warning)
        );
        println!("    devenv developer outputs --name {}", r.name);
    }

    /// Render one provisioned product's status.
    pub fn render_status(&self, product: &ProvisionedProduct) {
        let status = product.status.to_string();
        self.ctx.kv("Provisioned Product:", &product.name);
        println!(
            "  {}  {}",
            "Status:".style(self.ctx.styles.dim),
            status.style(self.ctx.styles.for_status(&product.status))
        );
        self.ctx.kv(
            "Status Message:",
            product
                .status_message
                .as_deref()
                .unwrap_or("No status message available"),
        );
        self.ctx.kv("Created:", &format_created(product.created_time));
        if product.status.is_failure() {
            self.ctx.error(
                "Provisioning failed. Check the AWS Service Catalog console for more details.",
            );
        } else if product.status.is_terminal() {
            self.ctx.success("Provisioning completed successfully!");
        }
    }

    /// Render a provisioned product's outputs and connect hints.
    pub fn render_outputs(&self, name: &str, outputs: &[ProductOutput]) {
        if outputs.is_empty() {
            self.ctx.info("No outputs found for this provisioned product.");
            return;
        }
        self.ctx.header(&format!("Outputs for {name}:"));
        for o in outputs {
            println!("  {}: {}", o.key, o.value);
            println!(
                "    {}",
                format!(
                    "Description: {}",
                    o.description.as_deref().unwrap_or("No description")
                )
                .style(self.ctx.styles.dim)
            );
        }
        let ids = instance_ids(outputs);
        if !ids.is_empty() {
            println!();
            println!(
                "  {}",
                "To connect to your instance using Session Manager:".style(self.ctx.styles.success)
            );
            for id in ids {
                println!("    {}", ssm_connect_command(id));
            }
        }
    }

    /// Render the provisioned-product table.
    pub fn render_provisioned_list(&self, products: &[ProvisionedProduct]) {
        if products.is_empty() {
            self.ctx.info("No provisioned products found.");
            return;
        }
        self.ctx.header("Provisioned Development Environments:");
        println!("  {:<40} {:<15} {:<30} Created", "Name", "Status", "Type");
        println!("  {}", "-".repeat(100));
        for p in products {
            let status = format!("{:<15}", p.status.to_string());
            println!(
                "  {:<40} {} {:<30} {}",
                p.name,
                status.style(self.ctx.styles.for_status(&p.status)),
                p.product_type.as_deref().unwrap_or("-"),
                format_created(p.created_time)
            );
        }
    }

    pub fn render_terminate(&self, outcome: &TerminateOutcome) {
        match outcome {
            TerminateOutcome::Cancelled => self.ctx.info("Termination cancelled."),
            TerminateOutcome::Terminated { name, .. } => {
                self.ctx
                    .success(&format!("Termination of '{name}' initiated."));
                self.ctx.info(&format!(
                    "Run: devenv developer status --name {name} to follow progress"
                ));
            }
        }
    }
}

fn store_label(report: &DeployReport) -> &'static str {
    match report.store {
        StoreOutcome::Existing => "existing",
        StoreOutcome::Created => "created",
    }
}

/// `YYYY-MM-DD HH:MM:SS`, or `Unknown` when absent.
#[must_use]
pub fn format_created(created: Option<DateTime<Utc>>) -> String {
    created.map_or_else(
        || "Unknown".to_string(),
        |t| t.format("%Y-%m-%d %H:%M:%S").to_string(),
    )
}
