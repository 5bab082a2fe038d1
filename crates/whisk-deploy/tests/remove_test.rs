use whisk_deploy::manifest::Manifest;
use whisk_deploy::remove::{RemovalPlan, Remover};
use whisk_platform::mock::{Call, MockPlatform};
use whisk_platform::PlatformError;

/// One packaged function fired by a declared trigger.
const SERVICE: &str = r#"
service: svc
functions:
  hello:
    handler: handler.main
    name: utils/hello
    events:
      - trigger: tick
resources:
  triggers:
    tick:
"#;

/// Integration test: a rejected rule delete is reported but does not stop
/// the function, package and trigger deletes that follow it.
#[tokio::test]
async fn test_remove_continues_after_failed_rule_delete() {
    let manifest = Manifest::from_yaml_str(SERVICE).expect("Failed to parse manifest");
    let plan = RemovalPlan::from_manifest(&manifest).expect("Failed to plan removal");

    let mock = MockPlatform::new();
    mock.expect_call(Call::DeleteRule("svc_tick_to_hello".into()))
        .return_err(PlatformError::rejected("rule is still active"));

    let report = Remover::new(&mock).remove(&plan).await;

    // Exactly one failure, naming the rule
    assert_eq!(report.failures.len(), 1);
    assert!(!report.is_clean());
    let failure = &report.failures[0];
    assert_eq!(failure.resource, "svc_tick_to_hello");
    assert_eq!(failure.message, "rule is still active");

    // Later stages still ran, in removal order
    assert_eq!(
        mock.calls(),
        vec![
            Call::DisableRule("svc_tick_to_hello".into()),
            Call::DeleteRule("svc_tick_to_hello".into()),
            Call::DeleteAction("utils/hello".into()),
            Call::DeletePackage("utils".into()),
            Call::DeleteTrigger("tick".into()),
        ]
    );
    mock.verify();
}

#[tokio::test]
async fn test_remove_of_clean_service_reports_nothing() {
    let manifest = Manifest::from_yaml_str(SERVICE).expect("Failed to parse manifest");
    let plan = RemovalPlan::from_manifest(&manifest).expect("Failed to plan removal");

    let mock = MockPlatform::new();
    let report = Remover::new(&mock).remove(&plan).await;

    assert!(report.is_clean());
    assert!(!mock.calls().iter().any(Call::is_create));
    assert_eq!(mock.count(&Call::DeleteAction("utils/hello".into())), 1);
}

#[test]
fn test_removal_plan_rejects_malformed_schedule() {
    let manifest = Manifest::from_yaml_str(
        "service: svc\nfunctions:\n  hello:\n    handler: h.main\n    events:\n      - schedule: ron(* * * * *)\n",
    )
    .expect("Failed to parse manifest");

    let err = RemovalPlan::from_manifest(&manifest).expect_err("Plan should fail");
    assert!(err.to_string().contains("rate property value is invalid"), "{}", err);
}

/// Credentials are only needed to bind a feed, not to find its name.
#[tokio::test]
async fn test_remove_without_feed_credentials() {
    let manifest = Manifest::from_yaml_str(
        r#"
service: svc
functions:
  hello:
    handler: handler.main
    events:
      - cloudant:
          db: orders
"#,
    )
    .expect("Failed to parse manifest");
    let plan = RemovalPlan::from_manifest(&manifest).expect("Failed to plan removal");

    let mock = MockPlatform::new();
    let report = Remover::new(&mock).remove(&plan).await;

    assert!(report.is_clean());
    assert_eq!(
        mock.calls(),
        vec![
            Call::DisableRule("svc_hello_cloudant_orders_rule".into()),
            Call::DeleteRule("svc_hello_cloudant_orders_rule".into()),
            Call::DeleteAction("svc_hello".into()),
            Call::DeleteTrigger("svc_hello_cloudant_orders".into()),
            Call::DeleteFeed("/_/svc_hello_cloudant_orders".into()),
        ]
    );
}
