use serde_json::json;
use whisk_platform::{
    Action, ActionBody, Exec, Feed, Limits, LocalPlatform, Package, PackageBody, PlatformClient,
    PlatformError, ResourceId, Route, Rule, Summary, Trigger,
};

// --- Fixtures ---

fn action(name: &str) -> Action {
    Action {
        name: name.to_string(),
        namespace: None,
        overwrite: true,
        action: ActionBody {
            exec: Exec::image("openwhisk/dockerskeleton"),
            limits: Limits {
                timeout: 60_000,
                memory: 256,
                concurrency: 1,
            },
            parameters: vec![],
            annotations: vec![],
        },
    }
}

fn package(name: &str, overwrite: bool) -> Package {
    Package {
        name: name.to_string(),
        namespace: None,
        overwrite,
        package: PackageBody::default(),
    }
}

fn trigger(name: &str) -> Trigger {
    Trigger {
        name: name.to_string(),
        namespace: None,
        overwrite: true,
        parameters: vec![],
        feed: None,
    }
}

fn rule(name: &str, trigger: &str, action: &str) -> Rule {
    Rule {
        name: name.to_string(),
        namespace: None,
        overwrite: true,
        trigger: format!("/_/{}", trigger),
        action: format!("/_/{}", action),
    }
}

fn route(namespace: &str, action: &str) -> Route {
    Route {
        base_path: "/svc".to_string(),
        swagger: json!({
            "swagger": "2.0",
            "basePath": "/svc",
            "paths": {
                "/hello": {
                    "get": {
                        "operationId": "get-/hello",
                        "x-openwhisk": {
                            "namespace": namespace,
                            "package": "default",
                            "action": action,
                            "url": format!("https://host/api/v1/web/{}/default/{}.json", namespace, action)
                        }
                    }
                }
            }
        }),
    }
}

// --- Tests ---

#[tokio::test]
async fn test_local_platform_rule_lifecycle() {
    let platform = LocalPlatform::new("guest");

    platform.create_action(&action("svc_hello")).await.unwrap();
    platform.create_trigger(&trigger("svc_tick")).await.unwrap();
    platform
        .create_rule(&rule("svc_tick_to_hello", "svc_tick", "svc_hello"))
        .await
        .unwrap();

    let id = ResourceId::new(None, "svc_tick_to_hello");
    let record = platform.get_rule(&id).await.unwrap().unwrap();
    assert!(!record.active);

    platform.enable_rule(&id).await.unwrap();
    assert!(platform.get_rule(&id).await.unwrap().unwrap().active);

    platform.disable_rule(&id).await.unwrap();
    assert!(!platform.get_rule(&id).await.unwrap().unwrap().active);

    assert_eq!(
        platform.list_rules().await.unwrap(),
        vec![Summary::new("guest", "svc_tick_to_hello")]
    );

    platform.delete_rule(&id).await.unwrap();
    assert!(platform.list_rules().await.unwrap().is_empty());

    platform.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_local_platform_enforces_references() {
    let platform = LocalPlatform::new("guest");

    // rule without trigger or action
    let err = platform
        .create_rule(&rule("r", "missing", "svc_hello"))
        .await
        .unwrap_err();
    assert!(matches!(err, PlatformError::NotFound(_)));

    // packaged action without package
    let err = platform
        .create_action(&action("utils/echo"))
        .await
        .unwrap_err();
    assert!(matches!(err, PlatformError::NotFound(_)));

    platform.create_package(&package("utils", true)).await.unwrap();
    platform.create_action(&action("utils/echo")).await.unwrap();

    // feed without trigger
    let feed = Feed {
        trigger: "/guest/svc_tick".to_string(),
        feed_name: "alarms/alarm".to_string(),
        namespace: "whisk.system".to_string(),
        params: Default::default(),
    };
    assert!(platform.create_feed(&feed).await.is_err());
    platform.create_trigger(&trigger("svc_tick")).await.unwrap();
    platform.create_feed(&feed).await.unwrap();
    assert!(platform
        .get_feed(&ResourceId::parse("/guest/svc_tick"))
        .await
        .unwrap()
        .is_some());

    // deleting what is not there
    let err = platform
        .delete_trigger(&ResourceId::new(None, "nope"))
        .await
        .unwrap_err();
    assert_eq!(err, PlatformError::NotFound("/guest/nope".into()));

    platform.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_local_platform_package_overwrite_and_listing() {
    let platform = LocalPlatform::new("guest");

    platform.create_package(&package("utils", false)).await.unwrap();
    let err = platform
        .create_package(&package("utils", false))
        .await
        .unwrap_err();
    assert!(matches!(err, PlatformError::Conflict(_)));

    platform.create_action(&action("utils/echo")).await.unwrap();
    platform.create_action(&action("svc_hello")).await.unwrap();

    let mut listed = platform.list_actions().await.unwrap();
    listed.sort_by(|a, b| a.name.cmp(&b.name));
    assert_eq!(
        listed,
        vec![
            Summary::new("guest/utils", "echo"),
            Summary::new("guest", "svc_hello"),
        ]
    );

    platform.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_local_platform_routes_need_resolved_existing_actions() {
    let platform = LocalPlatform::new("guest");

    let err = platform
        .create_route(&route("_", "svc_hello"))
        .await
        .unwrap_err();
    assert!(matches!(err, PlatformError::Invalid(_)));

    let err = platform
        .create_route(&route("guest", "svc_hello"))
        .await
        .unwrap_err();
    assert!(matches!(err, PlatformError::NotFound(_)));

    platform.create_action(&action("svc_hello")).await.unwrap();
    platform
        .create_route(&route("guest", "svc_hello"))
        .await
        .unwrap();
    assert_eq!(platform.list_routes().await.unwrap().len(), 1);

    platform.delete_route("/svc").await.unwrap();
    assert!(platform.get_route("/svc").await.unwrap().is_none());

    platform.shutdown().await.unwrap();
}
