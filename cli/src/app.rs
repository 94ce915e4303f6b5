//! Application context: unified state passed to every command handler.
//!
//! Adding a new cross-cutting concern requires only one field change here;
//! no command signature changes.

use anyhow::Result;

use crate::application::ports::CallerIdentity;
use crate::application::services::config_service;
use crate::application::services::session::{self, RegionSource, ResolvedRegion};
use crate::domain::config::DevenvConfig;
use crate::infra::aws::AwsCli;
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::config::YamlConfigStore;
use crate::output::{HumanRenderer, JsonRenderer, OutputContext, Renderer, TerminalReporter};

/// Environment variable that, like `CI`, disables interactive prompts.
pub const YES_ENV: &str = "DEVENV_YES";

/// Output rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable terminal output (default).
    Human,
    /// Machine-readable JSON output.
    Json,
}

/// Output rendering flags.
pub struct OutputFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
    /// Enable JSON output mode.
    pub json: bool,
}

/// Behaviour flags.
pub struct BehaviourFlags {
    /// Explicit `--yes`. `CI` / `DEVENV_YES` only disable prompting.
    pub yes: bool,
}

/// Flags passed from the top-level CLI to `AppContext::new`.
pub struct AppFlags {
    /// Output rendering options.
    pub output: OutputFlags,
    /// Behaviour options.
    pub behaviour: BehaviourFlags,
}

/// An authenticated connection to one region.
pub struct Session {
    pub region: ResolvedRegion,
    pub caller: CallerIdentity,
    pub aws: AwsCli<TokioCommandRunner>,
}

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    ///
    /// Quiet in JSON mode so progress never mixes with the JSON document.
    pub output: OutputContext,
    /// Output rendering mode (human vs JSON).
    pub mode: OutputMode,
    /// Configuration persistence.
    pub config_store: YamlConfigStore,
    /// Configuration loaded at startup.
    pub config: DevenvConfig,
    /// When `true`, skip interactive prompts and use defaults.
    ///
    /// Set when `--yes` / `-y` is passed, or when the `CI` or `DEVENV_YES`
    /// environment variables are present.
    pub non_interactive: bool,
    /// `--yes` was passed explicitly. Environment variables never set this,
    /// so destructive prompts still default to "no" under CI.
    pub assume_yes: bool,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read.
    pub fn new(flags: &AppFlags) -> Result<Self> {
        let ci_env = std::env::var("CI").is_ok() || std::env::var(YES_ENV).is_ok();
        let non_interactive = flags.behaviour.yes || ci_env;

        let mode = if flags.output.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        };

        let config_store = YamlConfigStore;
        let config = config_service::load_config(&config_store)?;

        Ok(Self {
            output: OutputContext::new(
                flags.output.no_color,
                flags.output.quiet || flags.output.json,
            ),
            mode,
            config_store,
            config,
            non_interactive,
            assume_yes: flags.behaviour.yes,
        })
    }

    /// Returns the appropriate `Renderer` variant for the current output mode.
    #[must_use]
    pub fn renderer(&self) -> Renderer<'_> {
        match self.mode {
            OutputMode::Human => Renderer::Human(HumanRenderer::new(&self.output)),
            OutputMode::Json => Renderer::Json(JsonRenderer),
        }
    }

    /// Progress reporter bound to this context's output settings.
    #[must_use]
    pub fn reporter(&self) -> TerminalReporter<'_> {
        TerminalReporter::new(&self.output)
    }

    /// AWS adapter pinned to `region`.
    #[must_use]
    pub fn aws(&self, region: &str) -> AwsCli<TokioCommandRunner> {
        AwsCli::default_runner(Some(region.to_string()))
    }

    /// Resolve the target region and check credentials against it.
    ///
    /// # Errors
    ///
    /// Returns an error if credentials are missing or invalid.
    pub async fn connect(&self, region_flag: Option<&str>) -> Result<Session> {
        let unpinned = AwsCli::default_runner(None);
        let region =
            session::resolve_region(&unpinned, region_flag, self.config.aws.region.as_deref())
                .await?;
        if region.source == RegionSource::Default {
            self.output.warn(&format!(
                "No AWS region configured, using {}",
                region.region
            ));
        }
        let aws = self.aws(&region.region);
        let caller = session::require_authenticated(&aws).await?;
        Ok(Session {
            region,
            caller,
            aws,
        })
    }

    /// Ask the user for confirmation.
    ///
    /// When `non_interactive` is `true` (CI, `--yes` flag, or `DEVENV_YES` env),
    /// returns `default` immediately without prompting.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal prompt fails (e.g. no TTY available).
    pub fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        if self.non_interactive {
            return Ok(default);
        }
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(default)
            .interact()?;
        Ok(confirmed)
    }

    /// Confirm a destructive action.
    ///
    /// `force` or an explicit `--yes` approves without asking. Otherwise the
    /// user is prompted, and non-interactive runs decline.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal prompt fails.
    pub fn confirm_destructive(&self, prompt: &str, force: bool) -> Result<bool> {
        if force || self.assume_yes {
            return Ok(true);
        }
        self.confirm(prompt, false)
    }
}
