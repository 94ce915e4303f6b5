//! Scenario tests for the administrator deployment pipeline.

#![allow(clippy::expect_used)]

use devenv_cli::application::services::artifact_publish::StoreOutcome;
use devenv_cli::application::services::deploy_pipeline::{DeployRequest, run_pipeline};
use devenv_cli::domain::layout::DeploymentLayout;
use devenv_cli::domain::stack::BASE_STACK_NAME;
use devenv_cli::domain::{StackError, TemplateError};

use crate::mocks::{FakeCloud, MemoryFs, RecordingReporter};

const LT_DEV: &str = "AgentDevEnv-LaunchTemplate-dev";
const LT_GPU: &str = "AgentDevEnv-LaunchTemplate-gpu";
const PS_DEV: &str = "AgentDevEnv-ProductService-dev";
const PS_GPU: &str = "AgentDevEnv-ProductService-gpu";

fn layout() -> DeploymentLayout {
    DeploymentLayout::new("infra", "stage")
}

fn tree() -> MemoryFs {
    MemoryFs::with(&[
        ("infra/00-admin-deployment.yaml", "Parameters: {ArtifactBucketName: {}}"),
        ("infra/nested/network.yaml", "Resources: {Vpc: {}}"),
        ("infra/launch-template/dev.yaml", "Name: {{EnvironmentName}}-{{Region}}"),
        ("infra/launch-template/gpu.yaml", "Name: {{EnvironmentName}}-{{Region}}"),
        (
            "infra/product/product-template.yaml",
            "Id: {{LaunchTemplateId}} Version: {{LaunchTemplateVersion}} Subnet: {{SubnetId}} Env: {{EnvironmentName}}",
        ),
        (
            "infra/product-service/product-service-template.yaml",
            "Url: https://{{ArtifactBucketName}}.s3.{{Region}}.amazonaws.com/{{ProductTemplateKey}}",
        ),
    ])
}

fn request(layout: &DeploymentLayout) -> DeployRequest<'_> {
    DeployRequest {
        bucket: "agent-devenv-artifacts-123456789012",
        region: "eu-west-1",
        layout,
    }
}

#[tokio::test]
async fn test_full_run_deploys_every_phase_in_order() {
    let cloud = FakeCloud::new();
    let fs = tree();
    let layout = layout();

    let report = run_pipeline(&cloud, &fs, &RecordingReporter::default(), &request(&layout))
        .await
        .expect("pipeline");

    assert_eq!(report.store, StoreOutcome::Created);
    assert_eq!(report.infrastructure_uploads, 2);
    assert_eq!(report.product_uploads, 2);
    assert_eq!(report.base.stack_name, BASE_STACK_NAME);
    assert_eq!(report.environments.len(), 2);
    assert_eq!(report.environments[0].name, "dev");
    assert_eq!(report.environments[0].product_template_key, "product/dev-product.yaml");

    let s = cloud.state();
    assert_eq!(
        s.create_calls,
        vec![BASE_STACK_NAME, LT_DEV, LT_GPU, PS_DEV, PS_GPU]
    );
    assert_eq!(
        s.create_bucket_requests[0].location_constraint.as_deref(),
        Some("eu-west-1")
    );
    assert_eq!(
        s.stacks[BASE_STACK_NAME].parameters,
        vec![(
            "ArtifactBucketName".to_string(),
            "agent-devenv-artifacts-123456789012".to_string()
        )]
    );
    assert_eq!(s.stacks[LT_DEV].template_body, "Name: dev-eu-west-1");
    assert!(s.stacks[LT_DEV].parameters.is_empty());
    assert_eq!(
        s.stacks[PS_GPU].template_body,
        "Url: https://agent-devenv-artifacts-123456789012.s3.eu-west-1.amazonaws.com/product/gpu-product.yaml"
    );
}

#[tokio::test]
async fn test_infrastructure_is_published_before_base_stack() {
    let cloud = FakeCloud::new();
    let layout = layout();

    run_pipeline(&cloud, &tree(), &RecordingReporter::default(), &request(&layout))
        .await
        .expect("pipeline");

    let keys = cloud.upload_keys();
    assert_eq!(
        keys,
        vec![
            "infra/00-admin-deployment.yaml",
            "infra/nested/network.yaml",
            "product/dev-product.yaml",
            "product/gpu-product.yaml",
        ]
    );
}

#[tokio::test]
async fn test_product_templates_are_staged_from_exports() {
    let cloud = FakeCloud::new();
    let fs = tree();
    let layout = layout();

    run_pipeline(&cloud, &fs, &RecordingReporter::default(), &request(&layout))
        .await
        .expect("pipeline");

    assert_eq!(
        fs.get("stage/product/dev-product.yaml").as_deref(),
        Some(
            "Id: launchtemplateid-value Version: launchtemplateversion-value Subnet: subnetid-value Env: dev"
        )
    );
    assert!(fs.get("stage/product-service/gpu-product-service.yaml").is_some());
}

#[tokio::test]
async fn test_second_run_converges_without_creating() {
    let cloud = FakeCloud::new();
    let fs = tree();
    let layout = layout();
    let reporter = RecordingReporter::default();

    run_pipeline(&cloud, &fs, &reporter, &request(&layout))
        .await
        .expect("first run");
    let report = run_pipeline(&cloud, &fs, &reporter, &request(&layout))
        .await
        .expect("second run");

    assert_eq!(report.store, StoreOutcome::Existing);
    assert!(report.base.is_no_op());
    assert!(report.environments.iter().all(|e| e.launch_template.is_no_op()
        && e.product_service.is_no_op()));
    let s = cloud.state();
    assert_eq!(s.create_calls.len(), 5);
    assert_eq!(s.create_bucket_requests.len(), 1);
}

#[tokio::test]
async fn test_missing_export_aborts_before_product_services() {
    let cloud = FakeCloud::new();
    cloud.state().auto_exports = false;
    let layout = layout();

    let err = run_pipeline(&cloud, &tree(), &RecordingReporter::default(), &request(&layout))
        .await
        .expect_err("exports are missing");

    assert_eq!(
        err.downcast_ref::<TemplateError>(),
        Some(&TemplateError::MissingExport {
            name: format!("{LT_DEV}-LaunchTemplateId")
        })
    );
    let s = cloud.state();
    assert_eq!(s.create_calls, vec![BASE_STACK_NAME, LT_DEV]);
    assert!(!s.uploads.iter().any(|(_, _, k)| k.starts_with("product/")));
}

#[tokio::test]
async fn test_placeholder_in_verbatim_template_is_rejected_before_upload() {
    let cloud = FakeCloud::new();
    let fs = tree();
    fs.put("infra/nested/network.yaml", "Bucket: {{ArtifactBucketName}}");
    let layout = layout();

    let err = run_pipeline(&cloud, &fs, &RecordingReporter::default(), &request(&layout))
        .await
        .expect_err("unresolved verbatim template");

    assert!(matches!(
        err.downcast_ref::<TemplateError>(),
        Some(TemplateError::UnresolvedPlaceholder { .. })
    ));
    let s = cloud.state();
    assert!(s.uploads.is_empty());
    assert!(s.create_calls.is_empty());
}

#[tokio::test]
async fn test_failed_base_stack_stops_the_pipeline() {
    let cloud = FakeCloud::new();
    cloud.state().failing_stacks.insert(BASE_STACK_NAME.to_string());
    let layout = layout();

    let err = run_pipeline(&cloud, &tree(), &RecordingReporter::default(), &request(&layout))
        .await
        .expect_err("base stack fails");

    assert!(matches!(
        err.downcast_ref::<StackError>(),
        Some(StackError::Failed { name, .. }) if name == BASE_STACK_NAME
    ));
    assert_eq!(cloud.state().create_calls, vec![BASE_STACK_NAME]);
}

#[tokio::test]
async fn test_no_launch_templates_warns_and_deploys_base_only() {
    let cloud = FakeCloud::new();
    let fs = MemoryFs::with(&[
        ("infra/00-admin-deployment.yaml", "Resources: {}"),
        ("infra/product/product-template.yaml", "{{LaunchTemplateId}}"),
    ]);
    let layout = layout();
    let reporter = RecordingReporter::default();

    let report = run_pipeline(&cloud, &fs, &reporter, &request(&layout))
        .await
        .expect("pipeline");

    assert!(report.environments.is_empty());
    assert_eq!(report.product_uploads, 0);
    assert!(
        reporter
            .warnings()
            .iter()
            .any(|w| w.contains("no launch templates"))
    );
    assert_eq!(cloud.state().create_calls, vec![BASE_STACK_NAME]);
}

#[tokio::test]
async fn test_dynamic_references_pass_through_untouched() {
    let cloud = FakeCloud::new();
    let fs = tree();
    let ami = "{{resolve:ssm:/aws/service/ami-amazon-linux-latest/al2023-ami-kernel-default-x86_64}}";
    fs.put("infra/nested/network.yaml", &format!("ImageId: '{ami}'"));
    fs.put(
        "infra/launch-template/dev.yaml",
        &format!("Name: {{{{EnvironmentName}}}}\nImageId: '{ami}'"),
    );
    let layout = layout();

    run_pipeline(&cloud, &fs, &RecordingReporter::default(), &request(&layout))
        .await
        .expect("dynamic references are not placeholders");

    let s = cloud.state();
    assert!(
        s.uploads
            .iter()
            .any(|(_, _, key)| key == "infra/nested/network.yaml")
    );
    assert_eq!(
        s.stacks[LT_DEV].template_body,
        format!("Name: dev\nImageId: '{ami}'")
    );
}

#[tokio::test]
async fn test_stale_staged_products_are_not_published() {
    let cloud = FakeCloud::new();
    let fs = tree();
    fs.put("stage/product/retired-product.yaml", "Id: lt-old");
    let layout = layout();

    let report = run_pipeline(&cloud, &fs, &RecordingReporter::default(), &request(&layout))
        .await
        .expect("pipeline");

    assert_eq!(report.product_uploads, 2);
    let keys = cloud.upload_keys();
    assert!(keys.contains(&"product/dev-product.yaml".to_string()));
    assert!(!keys.iter().any(|k| k.contains("retired")));
}
