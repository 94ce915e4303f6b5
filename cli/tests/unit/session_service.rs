//! Tests for credential checks and region resolution.

#![allow(clippy::expect_used)]

use devenv_cli::application::ports::IdentityProvider;
use devenv_cli::application::services::session::{
    RegionSource, require_authenticated, resolve_region,
};
use devenv_cli::domain::AuthError;

use crate::mocks::FakeCloud;

#[tokio::test]
async fn test_flag_wins_over_config_and_provider() {
    let cloud = FakeCloud::new();
    cloud.state().configured_region = Some("ap-south-1".to_string());

    let region = resolve_region(&cloud, Some("eu-west-1"), Some("us-west-2"))
        .await
        .expect("resolve");

    assert_eq!(region.region, "eu-west-1");
    assert_eq!(region.source, RegionSource::Flag);
}

#[tokio::test]
async fn test_config_wins_over_provider() {
    let cloud = FakeCloud::new();
    cloud.state().configured_region = Some("ap-south-1".to_string());

    let region = resolve_region(&cloud, None, Some("us-west-2"))
        .await
        .expect("resolve");

    assert_eq!(region.region, "us-west-2");
    assert_eq!(region.source, RegionSource::Config);
}

#[tokio::test]
async fn test_provider_region_used_when_nothing_configured() {
    let cloud = FakeCloud::new();
    cloud.state().configured_region = Some("ap-south-1".to_string());

    let region = resolve_region(&cloud, Some(""), None).await.expect("resolve");

    assert_eq!(region.region, "ap-south-1");
    assert_eq!(region.source, RegionSource::Provider);
}

#[tokio::test]
async fn test_default_region_is_last_resort() {
    let cloud = FakeCloud::new();

    let region = resolve_region(&cloud, None, None).await.expect("resolve");

    assert_eq!(region.region, "us-east-1");
    assert_eq!(region.source, RegionSource::Default);
}

#[tokio::test]
async fn test_require_authenticated_returns_caller() {
    let cloud = FakeCloud::new();

    let caller = require_authenticated(&cloud).await.expect("authenticated");

    assert_eq!(caller.account_id, "123456789012");
    assert!(cloud.verify().await);
}

#[tokio::test]
async fn test_expired_credentials_map_to_not_authenticated() {
    let cloud = FakeCloud::new();
    cloud.state().identity = None;

    let err = require_authenticated(&cloud).await.expect_err("expired");

    assert!(matches!(
        err.downcast_ref::<AuthError>(),
        Some(AuthError::NotAuthenticated)
    ));
    assert!(!cloud.verify().await);
}
