//! Application service: credential check and region resolution shared by
//! every remote command.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use anyhow::Result;

use crate::application::ports::{CallerIdentity, IdentityProvider};
use crate::domain::AuthError;
use crate::domain::store::DEFAULT_REGION;

/// Where the resolved region came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionSource {
    Flag,
    Config,
    Provider,
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRegion {
    pub region: String,
    pub source: RegionSource,
}

/// Resolve the target region: explicit flag, then config, then the
/// provider's own settings, then the default region.
///
/// # Errors
///
/// Returns an error only if querying the provider fails outright.
pub async fn resolve_region(
    identity: &impl IdentityProvider,
    flag: Option<&str>,
    configured: Option<&str>,
) -> Result<ResolvedRegion> {
    let pick = |region: &str, source| ResolvedRegion {
        region: region.to_string(),
        source,
    };
    if let Some(region) = flag.filter(|r| !r.is_empty()) {
        return Ok(pick(region, RegionSource::Flag));
    }
    if let Some(region) = configured.filter(|r| !r.is_empty()) {
        return Ok(pick(region, RegionSource::Config));
    }
    if let Some(region) = identity.configured_region().await? {
        return Ok(pick(&region, RegionSource::Provider));
    }
    tracing::info!(region = DEFAULT_REGION, "no region configured, using default");
    Ok(pick(DEFAULT_REGION, RegionSource::Default))
}

/// Confirm the caller holds valid credentials.
///
/// # Errors
///
/// Returns [`AuthError::NotAuthenticated`] when the identity call fails.
pub async fn require_authenticated(identity: &impl IdentityProvider) -> Result<CallerIdentity> {
    match identity.caller_identity().await {
        Ok(caller) => {
            tracing::debug!(account = %caller.account_id, arn = %caller.arn, "authenticated");
            Ok(caller)
        }
        Err(e) => {
            tracing::debug!(error = %format!("{e:#}"), "identity check failed");
            Err(AuthError::NotAuthenticated.into())
        }
    }
}
