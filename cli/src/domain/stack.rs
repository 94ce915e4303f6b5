//! Stack domain types: lifecycle status, deploy requests and outcomes.
//!
//! Pure functions only; no I/O, no async, no filesystem access.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Name of the base infrastructure stack.
pub const BASE_STACK_NAME: &str = "AgentDevEnv-Infrastructure-Master";

/// Tag pair attached to every stack this tool manages.
pub const MANAGEMENT_TAGS: &[(&str, &str)] = &[
    ("ManagedBy", "Administrator"),
    ("Environment", "Development"),
];

/// IAM capability acknowledged on every create/update.
pub const STACK_CAPABILITY: &str = "CAPABILITY_NAMED_IAM";

/// Reason recorded when an update turned out to change nothing.
pub const NO_OP_REASON: &str = "no-op";

/// Stack parameters keyed by name. Keys are unique by construction and
/// iterate in a stable order.
pub type StackParameters = BTreeMap<String, String>;

/// Lifecycle status of a stack as seen by the deployment engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StackStatus {
    Absent,
    CreateInProgress,
    UpdateInProgress,
    Available,
    Failed,
}

impl StackStatus {
    /// Map a raw CloudFormation status string onto the lifecycle model.
    ///
    /// `*_COMPLETE` states that represent a successful apply are `Available`;
    /// rollbacks, `*_FAILED` and deletions are `Failed`; everything still
    /// moving is in progress.
    #[must_use]
    pub fn from_remote(raw: &str) -> Self {
        match raw {
            "CREATE_COMPLETE" | "UPDATE_COMPLETE" | "IMPORT_COMPLETE" => Self::Available,
            "CREATE_IN_PROGRESS" | "REVIEW_IN_PROGRESS" => Self::CreateInProgress,
            s if s.ends_with("_IN_PROGRESS") => Self::UpdateInProgress,
            _ => Self::Failed,
        }
    }

    /// `true` for the two states a deploy may end in.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Available | Self::Failed)
    }
}

impl fmt::Display for StackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Absent => "ABSENT",
            Self::CreateInProgress => "CREATE_IN_PROGRESS",
            Self::UpdateInProgress => "UPDATE_IN_PROGRESS",
            Self::Available => "AVAILABLE",
            Self::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

/// Snapshot of a stack returned by a describe call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackDescription {
    pub name: String,
    /// Raw provider status, e.g. `UPDATE_ROLLBACK_COMPLETE`.
    pub raw_status: String,
    /// Provider status reason, if any.
    pub reason: Option<String>,
}

impl StackDescription {
    #[must_use]
    pub fn status(&self) -> StackStatus {
        StackStatus::from_remote(&self.raw_status)
    }
}

/// Which mutating call the engine chose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StackAction {
    Create,
    Update,
}

impl fmt::Display for StackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "create",
            Self::Update => "update",
        })
    }
}

/// Everything a create/update call needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackSpec {
    pub name: String,
    pub template_body: String,
    /// Flattened, ordered `(key, value)` pairs.
    pub parameters: Vec<(String, String)>,
    pub tags: Vec<(String, String)>,
}

impl StackSpec {
    /// Build a spec with the management tags attached.
    #[must_use]
    pub fn new(name: &str, template_body: &str, parameters: &StackParameters) -> Self {
        Self {
            name: name.to_string(),
            template_body: template_body.to_string(),
            parameters: parameters
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            tags: MANAGEMENT_TAGS
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        }
    }
}

/// Result of a single `deploy` invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeployOutcome {
    pub stack_name: String,
    pub action: StackAction,
    /// Always `Available` or `Failed`.
    pub status: StackStatus,
    pub reason: String,
}

impl DeployOutcome {
    #[must_use]
    pub fn available(stack_name: &str, action: StackAction, reason: &str) -> Self {
        Self {
            stack_name: stack_name.to_string(),
            action,
            status: StackStatus::Available,
            reason: reason.to_string(),
        }
    }

    #[must_use]
    pub fn failed(stack_name: &str, action: StackAction, reason: &str) -> Self {
        Self {
            stack_name: stack_name.to_string(),
            action,
            status: StackStatus::Failed,
            reason: reason.to_string(),
        }
    }

    /// `true` when the update was rejected as having nothing to change.
    #[must_use]
    pub fn is_no_op(&self) -> bool {
        self.status == StackStatus::Available && self.reason == NO_OP_REASON
    }
}

// ── Per-environment naming ────────────────────────────────────────────────────

/// Stack holding the launch template for one environment.
#[must_use]
pub fn launch_template_stack_name(environment: &str) -> String {
    format!("AgentDevEnv-LaunchTemplate-{environment}")
}

/// Stack registering the catalog product for one environment.
#[must_use]
pub fn product_service_stack_name(environment: &str) -> String {
    format!("AgentDevEnv-ProductService-{environment}")
}
