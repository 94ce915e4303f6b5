//! Remote error payloads and their classification.
//!
//! The AWS CLI reports service failures on stderr as
//! `An error occurred (<Code>) when calling the <Operation> operation: <message>`.
//! [`RemoteError::parse`] lifts that line into a structured value so callers
//! can branch on the error code instead of the whole text.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

static ERROR_LINE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)] // Pattern is a compile-time constant
    Regex::new(r"An error occurred \(([^)]+)\) when calling the (\w+) operation(?: \([^)]*\))?: (.*)")
        .expect("valid regex")
});

/// Codes that mean "the named resource does not exist".
const NOT_FOUND_CODES: &[&str] = &[
    "404",
    "NotFound",
    "NoSuchBucket",
    "ResourceNotFoundException",
];

/// Compatibility shim: CloudFormation reports both of these conditions under
/// the generic `ValidationError` code, so the message text is the only signal.
const STACK_MISSING_PHRASE: &str = "does not exist";
const NO_UPDATES_PHRASE: &str = "No updates are to be performed";

/// A failed remote call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{operation} failed ({code}): {message}")]
pub struct RemoteError {
    /// Service error code, e.g. `ValidationError` or `404`.
    pub code: String,
    /// Remote operation name, e.g. `UpdateStack`.
    pub operation: String,
    /// Human-readable message from the service.
    pub message: String,
}

impl RemoteError {
    /// Parse the first structured error line out of CLI stderr.
    ///
    /// Returns `None` when the text does not carry a service error
    /// (e.g. a local usage error or a crashed process).
    #[must_use]
    pub fn parse(stderr: &str) -> Option<Self> {
        let caps = ERROR_LINE.captures(stderr)?;
        Some(Self {
            code: caps[1].to_string(),
            operation: caps[2].to_string(),
            message: caps[3].trim().to_string(),
        })
    }

    /// The resource addressed by the call is absent.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        NOT_FOUND_CODES.contains(&self.code.as_str())
            || (self.code == "ValidationError" && self.message.contains(STACK_MISSING_PHRASE))
    }

    /// An update was rejected because it would change nothing.
    #[must_use]
    pub fn is_no_changes(&self) -> bool {
        self.code == "ValidationError" && self.message.contains(NO_UPDATES_PHRASE)
    }
}

/// Classify an arbitrary error as "no updates to perform".
///
/// Prefers the structured [`RemoteError`] anywhere in the chain; falls back to
/// a plain substring check on the rendered message for errors that never went
/// through the parser.
#[must_use]
pub fn is_no_changes(err: &anyhow::Error) -> bool {
    if let Some(remote) = err.chain().find_map(|e| e.downcast_ref::<RemoteError>()) {
        return remote.is_no_changes();
    }
    format!("{err:#}").contains(NO_UPDATES_PHRASE)
}

/// Classify an arbitrary error as "resource not found".
#[must_use]
pub fn is_not_found(err: &anyhow::Error) -> bool {
    if let Some(remote) = err.chain().find_map(|e| e.downcast_ref::<RemoteError>()) {
        return remote.is_not_found();
    }
    format!("{err:#}").contains(STACK_MISSING_PHRASE)
}
