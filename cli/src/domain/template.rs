//! Placeholder resolution for templates.
//!
//! A placeholder is `{{Name}}` where `Name` is an identifier. Other
//! double-brace text, such as CloudFormation dynamic references
//! (`{{resolve:ssm:…}}`), is not a placeholder and passes through untouched.
//! Resolution is a single literal pass: values are never rescanned, so a value
//! that itself contains `{{…}}` is inserted verbatim rather than expanded.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::domain::error::TemplateError;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)] // Pattern is a compile-time constant
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("valid regex")
});

/// Token → value map handed from one pipeline stage to the next.
pub type Bindings = BTreeMap<String, String>;

// ── Well-known tokens ─────────────────────────────────────────────────────────

pub const TOKEN_ENVIRONMENT_NAME: &str = "EnvironmentName";
pub const TOKEN_ARTIFACT_BUCKET: &str = "ArtifactBucketName";
pub const TOKEN_REGION: &str = "Region";
pub const TOKEN_LAUNCH_TEMPLATE_ID: &str = "LaunchTemplateId";
pub const TOKEN_LAUNCH_TEMPLATE_VERSION: &str = "LaunchTemplateVersion";
pub const TOKEN_SUBNET_ID: &str = "SubnetId";

/// Exports every launch-template stack must publish. Each key doubles as the
/// token it binds in the product template.
pub const LAUNCH_TEMPLATE_EXPORTS: &[&str] = &[
    TOKEN_LAUNCH_TEMPLATE_ID,
    TOKEN_LAUNCH_TEMPLATE_VERSION,
    TOKEN_SUBNET_ID,
];

/// Export name a stack publishes for `key`: `<stack-name>-<key>`.
#[must_use]
pub fn export_name(stack_name: &str, key: &str) -> String {
    format!("{stack_name}-{key}")
}

/// Distinct placeholder names in `text`, trimmed and sorted.
#[must_use]
pub fn placeholders(text: &str) -> BTreeSet<String> {
    PLACEHOLDER
        .captures_iter(text)
        .map(|c| c[1].trim().to_string())
        .collect()
}

/// Substitute every placeholder in `text` from `bindings`.
///
/// # Errors
///
/// Returns [`TemplateError::UnresolvedPlaceholder`] listing every token that
/// has no binding. No partially-resolved text is returned.
pub fn resolve(text: &str, bindings: &Bindings) -> Result<String, TemplateError> {
    let missing: Vec<String> = placeholders(text)
        .into_iter()
        .filter(|token| !bindings.contains_key(token))
        .collect();
    if !missing.is_empty() {
        return Err(TemplateError::UnresolvedPlaceholder { tokens: missing });
    }

    let resolved = PLACEHOLDER.replace_all(text, |caps: &Captures<'_>| {
        // Every token was checked above; the fallback keeps the closure total.
        bindings
            .get(caps[1].trim())
            .cloned()
            .unwrap_or_default()
    });
    Ok(resolved.into_owned())
}
