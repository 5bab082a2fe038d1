use std::path::Path;
use whisk_deploy::compile::compile;
use whisk_deploy::deploy::{CliBindingTool, Deployer};
use whisk_deploy::info::info;
use whisk_deploy::manifest::Manifest;
use whisk_deploy::remove::{RemovalPlan, Remover};
use whisk_deploy::runtime::archive::ActionArchive;
use whisk_platform::{Exec, LocalPlatform, ResourceId};

const SERVICE: &str = r#"
service: svc
provider:
  apihost: openwhisk.example.com
package:
  artifact: artifact.zip
functions:
  hello:
    handler: handler.main
    name: utils/hello
    events:
      - http: GET /hello
      - schedule: cron(*/5 * * * *)
  chain:
    sequence:
      - hello
"#;

fn write_service(dir: &Path) -> std::path::PathBuf {
    let mut archive = ActionArchive::default();
    archive.insert("handler.js", b"exports.main = () => ({ ok: true })".to_vec());
    std::fs::write(
        dir.join("artifact.zip"),
        archive.to_bytes().expect("Failed to build artifact"),
    )
    .expect("Failed to write artifact");

    let manifest = dir.join("serverless.yml");
    std::fs::write(&manifest, SERVICE).expect("Failed to write manifest");
    manifest
}

/// Full end-to-end run against the local platform: deploy, report, remove.
/// Every referential check of the platform stores is exercised.
#[tokio::test]
async fn test_full_service_lifecycle_on_local_platform() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let manifest = Manifest::from_path(write_service(dir.path())).expect("Failed to load manifest");

    let platform = LocalPlatform::new("guest");
    let binder = CliBindingTool::new();

    // Deploy everything
    let resources = compile(&manifest).expect("Failed to compile");
    Deployer::new(&platform, &binder)
        .deploy(&resources)
        .await
        .expect("Deployment failed");

    // The packaged action exists, runs on the default node runtime
    let action = platform
        .get_action(&ResourceId::new(None, "utils/hello"))
        .await
        .expect("Failed to get action")
        .expect("Action not found");
    assert_eq!(action.action.exec.kind(), "nodejs:default");

    // The sequence points at the packaged action
    let chain = platform
        .get_action(&ResourceId::new(None, "svc_chain"))
        .await
        .expect("Failed to get sequence")
        .expect("Sequence not found");
    assert!(chain.action.exec.is_sequence());
    match &chain.action.exec {
        Exec::Sequence { components, .. } => assert_eq!(components, &vec!["/_/utils/hello".to_string()]),
        other => panic!("unexpected exec {:?}", other),
    }

    // The schedule trigger got its feed and an enabled rule
    let trigger_id = ResourceId::new(None, "svc_hello_schedule_trigger");
    let trigger = platform
        .get_trigger(&trigger_id)
        .await
        .expect("Failed to get trigger")
        .expect("Trigger not found");
    assert_eq!(trigger.feed, None);
    let feed = platform
        .get_feed(&trigger_id)
        .await
        .expect("Failed to get feed")
        .expect("Feed not found");
    assert_eq!(feed.feed_name, "alarms/alarm");

    let rule = platform
        .get_rule(&ResourceId::new(None, "svc_hello_schedule_rule"))
        .await
        .expect("Failed to get rule")
        .expect("Rule not found");
    assert!(rule.active);

    // The route was sent with the placeholder namespace resolved
    let route = platform
        .get_route("/svc")
        .await
        .expect("Failed to get route")
        .expect("Route not found");
    let target = &route.swagger["paths"]["/hello"]["get"]["x-openwhisk"];
    assert_eq!(target["namespace"], platform.namespace());
    assert_eq!(target["package"], "utils");
    assert_eq!(target["action"], "hello");

    // Report
    let report = info(&platform, &manifest).await.expect("Failed to build report");
    assert!(report.contains("svc_hello_schedule_trigger"));
    assert!(report.contains("svc_hello_schedule_rule"));
    assert!(report.contains("/hello GET -> hello"));

    // Remove everything again
    let plan = RemovalPlan::from_manifest(&manifest).expect("Failed to plan removal");
    let removal = Remover::new(&platform).remove(&plan).await;
    assert!(removal.is_clean(), "removal failures: {:?}", removal.failures);

    assert!(platform
        .get_action(&ResourceId::new(None, "utils/hello"))
        .await
        .expect("Failed to get action")
        .is_none());
    assert!(platform
        .get_route("/svc")
        .await
        .expect("Failed to get route")
        .is_none());
    assert!(platform
        .get_feed(&trigger_id)
        .await
        .expect("Failed to get feed")
        .is_none());

    platform.shutdown().await.expect("Failed to shut down");
}

/// Packaging reads the artifact at compile time, so nothing reaches a platform.
#[test]
fn test_missing_artifact_fails_compile() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let manifest_path = dir.path().join("serverless.yml");
    std::fs::write(&manifest_path, SERVICE).expect("Failed to write manifest");
    let manifest = Manifest::from_path(&manifest_path).expect("Failed to load manifest");

    let err = compile(&manifest).expect_err("Compile should fail without an artifact");
    assert!(matches!(err, whisk_deploy::DeployError::Packaging(_)), "{:?}", err);
}
