//! Local login name, used to prefix provisioned-product names.

/// Fallback when no login name is available from the environment.
const FALLBACK_USER: &str = "developer";

/// The current login name from `USER`, `USERNAME` or `LOGNAME`.
#[must_use]
pub fn current_user() -> String {
    ["USER", "USERNAME", "LOGNAME"]
        .iter()
        .find_map(|var| std::env::var(var).ok().filter(|v| !v.trim().is_empty()))
        .unwrap_or_else(|| FALLBACK_USER.to_string())
}
