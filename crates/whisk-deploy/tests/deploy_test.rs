use whisk_deploy::compile::compile;
use whisk_deploy::deploy::{CliBindingTool, Deployer};
use whisk_deploy::manifest::Manifest;
use whisk_platform::mock::{Call, MockPlatform};
use whisk_platform::{PlatformError, Summary};

/// Two container functions, one of them behind an HTTP route and fired by a
/// declared trigger. No packages, no sequences, no feeds.
const SERVICE: &str = r#"
service: svc
provider:
  apihost: https://openwhisk.example.com
functions:
  hello:
    handler: me/hello
    runtime: docker
    events:
      - http: GET /hello
      - trigger: tick
  goodbye:
    handler: me/goodbye
    runtime: docker
resources:
  triggers:
    tick:
"#;

/// Integration test: compiled resources deployed against the recording mock.
/// Checks the exact call sequence, stage by stage.
#[tokio::test]
async fn test_deploy_issues_calls_in_stage_order() {
    let manifest = Manifest::from_yaml_str(SERVICE).expect("Failed to parse manifest");
    let resources = compile(&manifest).expect("Failed to compile");

    // The route targets `_`, resolved from the one listing call
    let mock = MockPlatform::new();
    mock.expect_list_actions()
        .return_ok(vec![Summary::new("guest", "svc_hello")]);

    let binder = CliBindingTool::new();
    Deployer::new(&mock, &binder)
        .deploy(&resources)
        .await
        .expect("Deployment failed");

    let calls = mock.calls();
    assert_eq!(calls.len(), 7, "unexpected calls: {:?}", calls);

    // Functions stage: both creates, in any order
    let mut created: Vec<Call> = calls[..2].to_vec();
    created.sort_by_key(|call| format!("{:?}", call));
    assert_eq!(
        created,
        vec![
            Call::CreateAction("svc_goodbye".into()),
            Call::CreateAction("svc_hello".into()),
        ]
    );

    // Then routes, triggers and rules
    assert_eq!(
        calls[2..].to_vec(),
        vec![
            Call::ListActions,
            Call::CreateRoute("/svc".into()),
            Call::CreateTrigger("tick".into()),
            Call::CreateRule("svc_tick_to_hello".into()),
            Call::EnableRule("svc_tick_to_hello".into()),
        ]
    );

    // The route went out with the placeholder replaced
    let routes = mock.routes();
    let target = &routes[0].swagger["paths"]["/hello"]["get"]["x-openwhisk"];
    assert_eq!(target["namespace"], "guest");
    assert_eq!(target["action"], "svc_hello");

    mock.verify();
}

#[tokio::test]
async fn test_action_create_failure_stops_later_stages() {
    let manifest = Manifest::from_yaml_str(SERVICE).expect("Failed to parse manifest");
    let resources = compile(&manifest).expect("Failed to compile");

    let mock = MockPlatform::new();
    mock.expect_call(Call::CreateAction("svc_hello".into()))
        .return_err(PlatformError::rejected("quota exceeded"));

    let binder = CliBindingTool::new();
    let err = Deployer::new(&mock, &binder)
        .deploy(&resources)
        .await
        .expect_err("Deployment should fail");

    assert_eq!(
        err.to_string(),
        "Failed to deploy function (svc_hello) due to error: quota exceeded"
    );

    // Nothing past the functions stage was attempted
    let calls = mock.calls();
    assert!(
        calls.iter().all(|call| matches!(call, Call::CreateAction(_))),
        "later stage ran: {:?}",
        calls
    );
    assert_eq!(mock.count(&Call::ListActions), 0);
    assert!(mock.triggers().is_empty());
    assert!(mock.rules().is_empty());
}

#[tokio::test]
async fn test_route_with_unknown_action_fails_deploy() {
    let manifest = Manifest::from_yaml_str(SERVICE).expect("Failed to parse manifest");
    let resources = compile(&manifest).expect("Failed to compile");

    // Listing does not contain svc_hello
    let mock = MockPlatform::new();
    mock.expect_list_actions()
        .return_ok(vec![Summary::new("guest", "svc_goodbye")]);

    let binder = CliBindingTool::new();
    let err = Deployer::new(&mock, &binder)
        .deploy(&resources)
        .await
        .expect_err("Deployment should fail");

    assert!(err.to_string().contains("API Gateway definition"), "{}", err);
    assert_eq!(mock.count(&Call::CreateRoute("/svc".into())), 0);
    assert_eq!(mock.count(&Call::CreateTrigger("tick".into())), 0);
}
