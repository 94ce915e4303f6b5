//! Scenario tests for developer provisioning.

#![allow(clippy::expect_used)]

use std::time::Duration;

use chrono::NaiveDate;
use devenv_cli::application::ports::ProvisionedRef;
use devenv_cli::application::services::provision::{
    self, LaunchRequest, PollPolicy, TerminateOutcome,
};
use devenv_cli::domain::ProvisionError;
use devenv_cli::domain::product::{
    EnvironmentType, LaunchParameters, ProductOutput, ProvisionStatus, ProvisioningArtifact,
};

use crate::mocks::{FakeCloud, NoopReporter, RecordingReporter};

const PORTFOLIO: &str = "Development Environment Portfolio";
const PRODUCT: &str = "Development Environment";

fn fast() -> PollPolicy {
    PollPolicy {
        interval: Duration::ZERO,
        timeout: None,
    }
}

fn launch_request(environment: EnvironmentType) -> LaunchRequest<'static> {
    LaunchRequest {
        portfolio: PORTFOLIO,
        product: PRODUCT,
        parameters: LaunchParameters {
            environment,
            user: "alice".to_string(),
            key_name: "alice-key".to_string(),
            command_id: "cmd-1".to_string(),
        },
        requested_at: NaiveDate::from_ymd_opt(2026, 3, 4)
            .and_then(|d| d.and_hms_opt(5, 6, 7))
            .expect("valid timestamp"),
    }
}

#[tokio::test]
async fn test_launch_submits_latest_artifact_with_parameters() {
    let cloud = FakeCloud::with_catalog();

    let receipt = provision::launch(&cloud, &NoopReporter, &launch_request(EnvironmentType::High))
        .await
        .expect("launch");

    assert_eq!(receipt.provisioned_product_id, "pp-1");
    assert_eq!(receipt.product_id, "prod-1");
    assert_eq!(receipt.artifact_id, "pa-1");
    assert_eq!(receipt.instance_type, "t3.large");
    assert!(receipt.name.starts_with("alice-"), "{}", receipt.name);

    let s = cloud.state();
    let sent = &s.provision_requests[0];
    assert_eq!(sent.name, receipt.name);
    assert!(
        sent.parameters
            .contains(&("InstanceType".to_string(), "t3.large".to_string()))
    );
    assert!(
        sent.parameters
            .contains(&("KeyName".to_string(), "alice-key".to_string()))
    );
    assert!(
        sent.parameters
            .contains(&("CommandId".to_string(), "cmd-1".to_string()))
    );
}

#[tokio::test]
async fn test_launch_prefers_newest_artifact_by_creation_time() {
    let cloud = FakeCloud::with_catalog();
    let at = |secs| chrono::DateTime::from_timestamp(secs, 0);
    cloud.state().artifacts.insert(
        "prod-1".to_string(),
        vec![
            ProvisioningArtifact {
                id: "pa-old".to_string(),
                name: None,
                created_time: at(1_000),
            },
            ProvisioningArtifact {
                id: "pa-new".to_string(),
                name: None,
                created_time: at(2_000),
            },
        ],
    );

    let receipt = provision::launch(&cloud, &NoopReporter, &launch_request(EnvironmentType::Standard))
        .await
        .expect("launch");

    assert_eq!(receipt.artifact_id, "pa-new");
}

#[tokio::test]
async fn test_launch_with_unknown_portfolio_fails() {
    let cloud = FakeCloud::new();

    let err = provision::launch(&cloud, &NoopReporter, &launch_request(EnvironmentType::Standard))
        .await
        .expect_err("no portfolio");

    assert!(matches!(
        err.downcast_ref::<ProvisionError>(),
        Some(ProvisionError::PortfolioNotFound(name)) if name == PORTFOLIO
    ));
    assert!(cloud.state().provision_requests.is_empty());
}

#[tokio::test]
async fn test_launch_without_artifacts_fails() {
    let cloud = FakeCloud::with_catalog();
    cloud.state().artifacts.clear();

    let err = provision::launch(&cloud, &NoopReporter, &launch_request(EnvironmentType::Extra))
        .await
        .expect_err("no artifacts");

    assert!(matches!(
        err.downcast_ref::<ProvisionError>(),
        Some(ProvisionError::NoProvisioningArtifacts(_))
    ));
}

#[tokio::test]
async fn test_launch_with_unknown_product_fails() {
    let cloud = FakeCloud::with_catalog();
    let mut req = launch_request(EnvironmentType::Standard);
    req.product = "Nonexistent";

    let err = provision::launch(&cloud, &NoopReporter, &req)
        .await
        .expect_err("no product");

    assert!(matches!(
        err.downcast_ref::<ProvisionError>(),
        Some(ProvisionError::ProductNotFound(name)) if name == "Nonexistent"
    ));
}

#[tokio::test]
async fn test_already_available_product_needs_one_describe() {
    let cloud = FakeCloud::new();
    cloud.add_provisioned("pp-9", "alice-dev", ProvisionStatus::Available);
    let reporter = RecordingReporter::default();

    let product = provision::wait_until_terminal(
        &cloud,
        &reporter,
        ProvisionedRef::Name("alice-dev"),
        &fast(),
    )
    .await
    .expect("wait");

    assert_eq!(product.status, ProvisionStatus::Available);
    assert_eq!(cloud.state().describe_provisioned_calls, 1);
    assert!(!reporter.events().iter().any(|e| e.starts_with("step: ")));
}

#[tokio::test]
async fn test_wait_polls_until_available() {
    let cloud = FakeCloud::new();
    cloud.add_provisioned("pp-1", "alice-dev", ProvisionStatus::UnderChange);
    cloud.state().status_script.extend([
        ProvisionStatus::UnderChange,
        ProvisionStatus::UnderChange,
        ProvisionStatus::Available,
    ]);

    let product = provision::wait_until_terminal(
        &cloud,
        &NoopReporter,
        ProvisionedRef::Id("pp-1"),
        &fast(),
    )
    .await
    .expect("wait");

    assert_eq!(product.status, ProvisionStatus::Available);
    assert_eq!(cloud.state().describe_provisioned_calls, 3);
}

#[tokio::test]
async fn test_wait_reports_error_status_as_failure() {
    let cloud = FakeCloud::new();
    cloud.add_provisioned("pp-1", "alice-dev", ProvisionStatus::Error);

    let err = provision::wait_until_terminal(
        &cloud,
        &NoopReporter,
        ProvisionedRef::Id("pp-1"),
        &fast(),
    )
    .await
    .expect_err("error status");

    assert!(matches!(
        err.downcast_ref::<ProvisionError>(),
        Some(ProvisionError::Failed { status, .. }) if status == "ERROR"
    ));
}

#[tokio::test]
async fn test_wait_times_out() {
    let cloud = FakeCloud::new();
    cloud.add_provisioned("pp-1", "alice-dev", ProvisionStatus::UnderChange);
    let policy = PollPolicy {
        interval: Duration::ZERO,
        timeout: Some(Duration::ZERO),
    };

    let err = provision::wait_until_terminal(
        &cloud,
        &NoopReporter,
        ProvisionedRef::Id("pp-1"),
        &policy,
    )
    .await
    .expect_err("timeout");

    assert!(matches!(
        err.downcast_ref::<ProvisionError>(),
        Some(ProvisionError::TimedOut { status, .. }) if status == "UNDER_CHANGE"
    ));
}

#[tokio::test]
async fn test_status_of_unknown_product_is_not_found() {
    let cloud = FakeCloud::new();

    let err = provision::check_status(&cloud, ProvisionedRef::Name("ghost"))
        .await
        .expect_err("unknown");

    assert!(matches!(
        err.downcast_ref::<ProvisionError>(),
        Some(ProvisionError::ProvisionedProductNotFound(name)) if name == "ghost"
    ));
}

#[tokio::test]
async fn test_outputs_are_returned_for_known_product() {
    let cloud = FakeCloud::new();
    cloud.add_provisioned("pp-1", "alice-dev", ProvisionStatus::Available);
    cloud.state().outputs.insert(
        "alice-dev".to_string(),
        vec![ProductOutput {
            key: "InstanceId".to_string(),
            value: "i-0abc".to_string(),
            description: None,
        }],
    );

    let outputs = provision::outputs(&cloud, "alice-dev").await.expect("outputs");

    assert_eq!(outputs.len(), 1);
    assert_eq!(outputs[0].value, "i-0abc");
}

#[tokio::test]
async fn test_terminate_declined_leaves_product() {
    let cloud = FakeCloud::new();
    cloud.add_provisioned("pp-1", "alice-dev", ProvisionStatus::Available);

    let outcome = provision::terminate(&cloud, &NoopReporter, "alice-dev", |_| Ok(false))
        .await
        .expect("terminate");

    assert_eq!(outcome, TerminateOutcome::Cancelled);
    assert!(cloud.state().terminated.is_empty());
}

#[tokio::test]
async fn test_terminate_confirmed_uses_resolved_id() {
    let cloud = FakeCloud::new();
    cloud.add_provisioned("pp-7", "alice-dev", ProvisionStatus::Available);

    let outcome = provision::terminate(&cloud, &NoopReporter, "alice-dev", |p| {
        assert_eq!(p.name, "alice-dev");
        Ok(true)
    })
    .await
    .expect("terminate");

    assert_eq!(
        outcome,
        TerminateOutcome::Terminated {
            id: "pp-7".to_string(),
            name: "alice-dev".to_string(),
        }
    );
    assert_eq!(cloud.state().terminated, vec!["pp-7".to_string()]);
}

#[tokio::test]
async fn test_terminate_unknown_product_never_asks() {
    let cloud = FakeCloud::new();

    let err = provision::terminate(&cloud, &NoopReporter, "ghost", |_| {
        panic!("confirmation must not be requested")
    })
    .await
    .expect_err("unknown");

    assert!(err.downcast_ref::<ProvisionError>().is_some());
}

#[tokio::test]
async fn test_connection_command_is_read_from_exports() {
    let cloud = FakeCloud::new();
    cloud.add_export("DevEnv-ConnectCommand-cmd-1", "aws ssm start-session --target i-1");

    let found = provision::connection_command(&cloud, "cmd-1")
        .await
        .expect("lookup");
    let missing = provision::connection_command(&cloud, "cmd-2")
        .await
        .expect("lookup");

    assert_eq!(found.as_deref(), Some("aws ssm start-session --target i-1"));
    assert_eq!(missing, None);
}

#[tokio::test]
async fn test_list_provisioned_returns_everything() {
    let cloud = FakeCloud::new();
    cloud.add_provisioned("pp-1", "a", ProvisionStatus::Available);
    cloud.add_provisioned("pp-2", "b", ProvisionStatus::UnderChange);

    let all = provision::list_provisioned(&cloud).await.expect("list");

    assert_eq!(all.len(), 2);
}
