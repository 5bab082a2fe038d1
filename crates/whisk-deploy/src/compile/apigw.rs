//! # API Gateway
//!
//! `http` events compile into a single OpenAPI 2.0 document per service.
//! Each event contributes one `paths` entry and one branch of the
//! `x-ibm-configuration` operation switch, both keyed by the same
//! operation id (`<method>-<path>`, lower-cased).
//!
//! Actions without a namespace keep the `_` placeholder in their
//! `x-openwhisk` block and web URL until deployment resolves it.

use super::functions::merged_annotations;
use crate::error::DeployError;
use crate::manifest::{ApiGwOptions, EventBinding, FunctionDef, Manifest};
use crate::naming;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashSet};
use whisk_platform::DEFAULT_NAMESPACE;

pub const DEFAULT_PACKAGE: &str = "default";
const DEFAULT_RESPONSE_TYPE: &str = "json";
const WHISK_AUTH_ANNOTATION: &str = "require-whisk-auth";
const WHISK_AUTH_HEADER: &str = "message.headers.X-Require-Whisk-Auth";
const OAUTH_PROVIDERS: [&str; 4] = ["app-id", "google", "facebook", "github"];
const RATE_LIMIT_UNITS: [&str; 4] = ["minute", "second", "hour", "day"];

/// One `http` event, resolved against its function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpEvent {
    pub relpath: String,
    pub operation: String,
    /// Package of the action, or `default`.
    pub pkge: String,
    pub namespace: String,
    pub action: String,
    pub responsetype: String,
    pub secure_key: Option<String>,
}

impl HttpEvent {
    pub fn operation_id(&self) -> String {
        format!("{}-{}", self.operation, self.relpath).to_lowercase()
    }

    pub fn web_url(&self, host: &str) -> String {
        format!(
            "https://{}/api/v1/web/{}/{}/{}.{}",
            host, self.namespace, self.pkge, self.action, self.responsetype
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwaggerDocument {
    pub swagger: String,
    #[serde(rename = "basePath")]
    pub base_path: String,
    pub info: SwaggerInfo,
    /// Path, then lower-case verb.
    pub paths: BTreeMap<String, BTreeMap<String, SwaggerOperation>>,
    #[serde(rename = "x-ibm-configuration")]
    pub configuration: IbmConfiguration,
    #[serde(
        rename = "securityDefinitions",
        default,
        skip_serializing_if = "Map::is_empty"
    )]
    pub security_definitions: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security: Vec<Map<String, Value>>,
    #[serde(
        rename = "x-ibm-rate-limit",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub rate_limit: Vec<RateLimit>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwaggerInfo {
    pub title: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwaggerOperation {
    #[serde(rename = "operationId")]
    pub operation_id: String,
    pub responses: Map<String, Value>,
    #[serde(rename = "x-openwhisk")]
    pub openwhisk: OpenWhiskTarget,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenWhiskTarget {
    pub action: String,
    pub namespace: String,
    pub package: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IbmConfiguration {
    pub assembly: Assembly,
    pub cors: Cors,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assembly {
    pub execute: Vec<OperationSwitchStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationSwitchStep {
    #[serde(rename = "operation-switch")]
    pub operation_switch: OperationSwitch,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationSwitch {
    pub case: Vec<SwitchCase>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchCase {
    pub operations: Vec<String>,
    pub execute: Vec<AssemblyStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssemblyStep {
    SetVariable {
        actions: Vec<SetVariable>,
    },
    Invoke {
        #[serde(rename = "target-url")]
        target_url: String,
        verb: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetVariable {
    pub set: String,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cors {
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimit {
    pub rate: u64,
    pub unit: String,
    pub units: u64,
}

impl SwaggerDocument {
    /// All operations with their path and verb.
    pub fn operations(&self) -> impl Iterator<Item = (&str, &str, &SwaggerOperation)> {
        self.paths.iter().flat_map(|(path, verbs)| {
            verbs
                .iter()
                .map(move |(verb, operation)| (path.as_str(), verb.as_str(), operation))
        })
    }

    pub fn operations_mut(&mut self) -> impl Iterator<Item = &mut SwaggerOperation> {
        self.paths.values_mut().flat_map(|verbs| verbs.values_mut())
    }

    /// Points the invoke step of the switch branch for `operation_id` at `url`.
    pub fn set_target_url(&mut self, operation_id: &str, url: &str) {
        let cases = self
            .configuration
            .assembly
            .execute
            .iter_mut()
            .flat_map(|step| step.operation_switch.case.iter_mut())
            .filter(|case| case.operations.iter().any(|id| id == operation_id));
        for case in cases {
            for step in &mut case.execute {
                if let AssemblyStep::Invoke { target_url, .. } = step {
                    *target_url = url.to_string();
                }
            }
        }
    }
}

/// Parses one `http` event of function `key`.
pub fn compile_http_event(
    manifest: &Manifest,
    key: &str,
    function: &FunctionDef,
    http: &Value,
) -> Result<HttpEvent, DeployError> {
    let (method, path, resp) = parse_http(http).ok_or_else(|| {
        let shown = match http {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        };
        DeployError::validation(format!(
            "Incorrect HTTP event parameter value ({}), must be string in form: HTTP_METHOD API_PATH e.g. GET /api/foo",
            shown
        ))
    })?;

    let name = naming::function_name(&manifest.service, key, function);
    let (pkge, action) = match name.split_once('/') {
        Some((package, action)) => (package.to_string(), action.to_string()),
        None => (DEFAULT_PACKAGE.to_string(), name),
    };
    let namespace = naming::function_namespace(manifest, function)
        .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());
    let secure_key = merged_annotations(manifest, function)
        .get(WHISK_AUTH_ANNOTATION)
        .and_then(|value| match value {
            Value::String(key) => Some(key.clone()),
            Value::Number(key) => Some(key.to_string()),
            _ => None,
        });

    Ok(HttpEvent {
        relpath: path,
        operation: method.to_uppercase(),
        pkge,
        namespace,
        action,
        responsetype: resp.unwrap_or_else(|| DEFAULT_RESPONSE_TYPE.to_string()),
        secure_key,
    })
}

/// `"METHOD /path"` or `{method, path, resp}`.
fn parse_http(http: &Value) -> Option<(String, String, Option<String>)> {
    match http {
        Value::String(text) => {
            let parts: Vec<&str> = text.split_whitespace().collect();
            match parts.as_slice() {
                [method, path] => Some((method.to_string(), path.to_string(), None)),
                _ => None,
            }
        }
        Value::Object(object) => {
            let method = object.get("method")?.as_str()?;
            let path = object.get("path")?.as_str()?;
            let resp = object
                .get("resp")
                .and_then(Value::as_str)
                .map(str::to_string);
            Some((method.to_string(), path.to_string(), resp))
        }
        _ => None,
    }
}

/// All `http` events, in manifest order.
pub fn compile_http_events(manifest: &Manifest) -> Result<Vec<HttpEvent>, DeployError> {
    let mut events = Vec::new();
    for (key, function) in &manifest.functions {
        for event in &function.events {
            if let EventBinding::Http(http) = event {
                events.push(compile_http_event(manifest, key, function, http)?);
            }
        }
    }
    Ok(events)
}

/// The service's swagger document, or `None` when no function has an
/// `http` event.
pub fn compile_swagger(manifest: &Manifest) -> Result<Option<SwaggerDocument>, DeployError> {
    let events = compile_http_events(manifest)?;
    if events.is_empty() {
        return Ok(None);
    }

    let host = api_host(manifest)?;
    let options = manifest.resources.apigw.clone().unwrap_or_default();

    let mut paths: BTreeMap<String, BTreeMap<String, SwaggerOperation>> = BTreeMap::new();
    let mut cases = Vec::new();
    let mut operation_ids = HashSet::new();
    for event in &events {
        let operation_id = event.operation_id();
        // Ids are lower-cased, so paths differing only in case collide too.
        if !operation_ids.insert(operation_id.clone()) {
            return Err(DeployError::validation(format!(
                "Duplicate HTTP event ({} {}), operation ids must be unique",
                event.operation, event.relpath
            )));
        }
        let url = event.web_url(&host);
        let verbs = paths.entry(event.relpath.clone()).or_default();
        verbs.insert(
            event.operation.to_lowercase(),
            SwaggerOperation {
                operation_id: operation_id.clone(),
                responses: json!({"200": {"description": "A successful invocation response"}})
                    .as_object()
                    .cloned()
                    .unwrap_or_default(),
                openwhisk: OpenWhiskTarget {
                    action: event.action.clone(),
                    namespace: event.namespace.clone(),
                    package: event.pkge.clone(),
                    url: url.clone(),
                },
            },
        );
        cases.push(switch_case(operation_id, url, event.secure_key.as_deref()));
    }

    let mut swagger = SwaggerDocument {
        swagger: "2.0".to_string(),
        base_path: naming::base_path(manifest),
        info: SwaggerInfo {
            title: options
                .name
                .clone()
                .unwrap_or_else(|| manifest.service.clone()),
            version: "1.0".to_string(),
        },
        paths,
        configuration: IbmConfiguration {
            assembly: Assembly {
                execute: vec![OperationSwitchStep {
                    operation_switch: OperationSwitch { case: cases },
                }],
            },
            cors: Cors {
                enabled: options.cors.unwrap_or(true),
            },
        },
        security_definitions: Map::new(),
        security: Vec::new(),
        rate_limit: Vec::new(),
    };
    apply_security(&mut swagger, &options)?;
    apply_rate_limit(&mut swagger, &options)?;
    Ok(Some(swagger))
}

fn switch_case(operation_id: String, url: String, secure_key: Option<&str>) -> SwitchCase {
    let mut execute = Vec::new();
    if let Some(key) = secure_key {
        execute.push(AssemblyStep::SetVariable {
            actions: vec![SetVariable {
                set: WHISK_AUTH_HEADER.to_string(),
                value: key.to_string(),
            }],
        });
    }
    execute.push(AssemblyStep::Invoke {
        target_url: url,
        verb: "keep".to_string(),
    });
    SwitchCase {
        operations: vec![operation_id],
        execute,
    }
}

/// `provider.apihost` without scheme or trailing slash.
fn api_host(manifest: &Manifest) -> Result<String, DeployError> {
    let host = manifest
        .provider
        .apihost
        .as_deref()
        .filter(|host| !host.is_empty())
        .ok_or_else(|| {
            DeployError::validation(
                "Missing mandatory provider property (apihost) needed for API Gateway definitions",
            )
        })?;
    let host = host
        .strip_prefix("https://")
        .or_else(|| host.strip_prefix("http://"))
        .unwrap_or(host);
    Ok(host.trim_end_matches('/').to_string())
}

fn apply_security(swagger: &mut SwaggerDocument, options: &ApiGwOptions) -> Result<(), DeployError> {
    let mut requirement = Map::new();

    if let Some(auth) = &options.auth {
        let key = auth.key.as_deref().ok_or_else(|| {
            DeployError::validation("Missing mandatory resources.apigw.auth.key parameter.")
        })?;
        swagger.security_definitions.insert(
            "client_id".into(),
            json!({"type": "apiKey", "in": "header", "name": key, "x-key-type": "clientId"}),
        );
        requirement.insert("client_id".into(), json!([]));

        if let Some(secret) = &auth.secret {
            swagger.security_definitions.insert(
                "client_secret".into(),
                json!({"type": "apiKey", "in": "header", "name": secret, "x-key-type": "clientSecret"}),
            );
            requirement.insert("client_secret".into(), json!([]));
        }
    }

    if let Some(oauth) = &options.oauth {
        let provider = oauth.provider.as_deref().ok_or_else(|| {
            DeployError::validation("Missing mandatory resources.apigw.oauth.provider parameter.")
        })?;
        if !OAUTH_PROVIDERS.contains(&provider) {
            return Err(DeployError::validation(format!(
                "Invalid resources.apigw.oauth.provider parameter ({}), must be one of: {}",
                provider,
                OAUTH_PROVIDERS.join(", ")
            )));
        }

        let mut x_provider = json!({"name": provider});
        if provider == "app-id" {
            let tenant = oauth.tenant.as_deref().ok_or_else(|| {
                DeployError::validation(
                    "Missing mandatory resources.apigw.oauth.tenant parameter for app-id provider.",
                )
            })?;
            x_provider["params"] = json!({"tenantId": tenant});
        }
        swagger.security_definitions.insert(
            provider.to_string(),
            json!({"type": "oauth2", "flow": "application", "tokenUrl": "", "x-provider": x_provider}),
        );
        requirement.insert(provider.to_string(), json!([]));
    }

    if !requirement.is_empty() {
        swagger.security.push(requirement);
    }
    Ok(())
}

fn apply_rate_limit(
    swagger: &mut SwaggerDocument,
    options: &ApiGwOptions,
) -> Result<(), DeployError> {
    let Some(limit) = &options.rate_limit else {
        return Ok(());
    };
    let rate = limit.rate.ok_or_else(|| {
        DeployError::validation("Missing mandatory resources.apigw.rate_limit.rate parameter.")
    })?;
    let unit = limit.unit.as_deref().ok_or_else(|| {
        DeployError::validation("Missing mandatory resources.apigw.rate_limit.unit parameter.")
    })?;
    if !RATE_LIMIT_UNITS.contains(&unit) {
        return Err(DeployError::validation(format!(
            "Invalid resources.apigw.rate_limit.unit parameter ({}), must be one of: {}",
            unit,
            RATE_LIMIT_UNITS.join(", ")
        )));
    }
    swagger.rate_limit.push(RateLimit {
        rate,
        unit: unit.to_string(),
        units: 1,
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest(yaml: &str) -> Manifest {
        Manifest::from_yaml_str(yaml).unwrap()
    }

    const SERVICE: &str = r#"
service: my-service
provider:
  namespace: sample_ns
  apihost: https://openwhisk.example.com/
functions:
  hello:
    handler: handler.main
    events:
      - http: GET /api/hello
  secured:
    handler: handler.main
    name: pkg/secured
    namespace: other_ns
    annotations:
      require-whisk-auth: s3cret
    events:
      - http:
          method: post
          path: /api/secured
          resp: http
"#;

    #[test]
    fn test_compile_http_event_from_string() {
        let manifest = manifest(SERVICE);
        let event = compile_http_event(
            &manifest,
            "action-name",
            &FunctionDef::default(),
            &json!("GET /api/foo/bar"),
        )
        .unwrap();

        assert_eq!(
            event,
            HttpEvent {
                relpath: "/api/foo/bar".into(),
                operation: "GET".into(),
                pkge: "default".into(),
                namespace: "sample_ns".into(),
                action: "my-service_action-name".into(),
                responsetype: "json".into(),
                secure_key: None,
            }
        );
    }

    #[test]
    fn test_incorrect_http_event_values() {
        let manifest = manifest(SERVICE);
        for bad in [json!("GET"), json!("GET /a /b"), json!(42), json!({"method": "GET"})] {
            let err = compile_http_event(&manifest, "hello", &FunctionDef::default(), &bad)
                .unwrap_err();
            assert!(
                err.to_string().starts_with("Incorrect HTTP event parameter value"),
                "{}",
                bad
            );
        }
    }

    #[test]
    fn test_swagger_document_shape() {
        let swagger = compile_swagger(&manifest(SERVICE)).unwrap().unwrap();
        assert_eq!(swagger.base_path, "/my-service");
        assert_eq!(swagger.info.title, "my-service");
        assert!(swagger.configuration.cors.enabled);

        let hello = &swagger.paths["/api/hello"]["get"];
        assert_eq!(hello.operation_id, "get-/api/hello");
        assert_eq!(
            hello.openwhisk.url,
            "https://openwhisk.example.com/api/v1/web/sample_ns/default/my-service_hello.json"
        );

        let secured = &swagger.paths["/api/secured"]["post"];
        assert_eq!(secured.openwhisk.package, "pkg");
        assert_eq!(secured.openwhisk.action, "secured");
        assert_eq!(
            secured.openwhisk.url,
            "https://openwhisk.example.com/api/v1/web/other_ns/pkg/secured.http"
        );

        let cases = &swagger.configuration.assembly.execute[0].operation_switch.case;
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[1].operations, vec!["post-/api/secured".to_string()]);
        assert_eq!(
            cases[1].execute[0],
            AssemblyStep::SetVariable {
                actions: vec![SetVariable {
                    set: WHISK_AUTH_HEADER.into(),
                    value: "s3cret".into()
                }]
            }
        );

        let value = serde_json::to_value(&swagger).unwrap();
        assert_eq!(value["swagger"], json!("2.0"));
        assert_eq!(
            value["x-ibm-configuration"]["assembly"]["execute"][0]["operation-switch"]["case"][0]
                ["execute"][0]["invoke"]["verb"],
            json!("keep")
        );
        assert!(value.get("securityDefinitions").is_none());
    }

    #[test]
    fn test_no_http_events_means_no_document() {
        let manifest = manifest("service: svc\nfunctions:\n  hello:\n    handler: handler.main\n");
        assert_eq!(compile_swagger(&manifest).unwrap(), None);
    }

    #[test]
    fn test_apihost_required_with_http_events() {
        let mut manifest = manifest(SERVICE);
        manifest.provider.apihost = None;
        let err = compile_swagger(&manifest).unwrap_err();
        assert!(err.to_string().contains("apihost"));
    }

    #[test]
    fn test_duplicate_operation_is_rejected() {
        let manifest = manifest(
            r#"
service: svc
provider:
  apihost: host
functions:
  a:
    handler: a.main
    events:
      - http: GET /same
  b:
    handler: b.main
    events:
      - http: get /same
"#,
        );
        let err = compile_swagger(&manifest).unwrap_err();
        assert!(matches!(err, DeployError::Validation(_)));
    }

    #[test]
    fn test_paths_differing_only_in_case_are_rejected() {
        let manifest = manifest(
            r#"
service: svc
provider:
  apihost: host
functions:
  a:
    handler: a.main
    events:
      - http: GET /Hello
  b:
    handler: b.main
    namespace: other
    events:
      - http: GET /hello
"#,
        );
        let err = compile_swagger(&manifest).unwrap_err();
        assert!(matches!(err, DeployError::Validation(_)));
        assert_eq!(
            err.to_string(),
            "Duplicate HTTP event (GET /hello), operation ids must be unique"
        );
    }

    #[test]
    fn test_auth_oauth_and_rate_limit_options() {
        let mut manifest = manifest(SERVICE);
        manifest.resources.apigw = Some(
            serde_yaml::from_str(
                r#"
basepath: /api-root
name: My API
cors: false
auth:
  key: API-Key
  secret: API-Secret
oauth:
  provider: app-id
  tenant: tenant-uuid
rate_limit:
  rate: 100
  unit: minute
"#,
            )
            .unwrap(),
        );

        let swagger = compile_swagger(&manifest).unwrap().unwrap();
        assert_eq!(swagger.base_path, "/api-root");
        assert_eq!(swagger.info.title, "My API");
        assert!(!swagger.configuration.cors.enabled);
        assert_eq!(swagger.security_definitions["client_id"]["name"], json!("API-Key"));
        assert_eq!(
            swagger.security_definitions["client_secret"]["x-key-type"],
            json!("clientSecret")
        );
        assert_eq!(
            swagger.security_definitions["app-id"]["x-provider"]["params"]["tenantId"],
            json!("tenant-uuid")
        );
        assert_eq!(swagger.security.len(), 1);
        assert_eq!(swagger.security[0].len(), 3);
        assert_eq!(
            swagger.rate_limit,
            vec![RateLimit {
                rate: 100,
                unit: "minute".into(),
                units: 1
            }]
        );
    }

    #[test]
    fn test_invalid_gateway_options() {
        let cases = [
            ("auth:\n  secret: only-secret\n", "auth.key"),
            ("oauth:\n  provider: twitter\n", "oauth.provider parameter (twitter)"),
            ("oauth:\n  provider: app-id\n", "oauth.tenant"),
            ("rate_limit:\n  unit: minute\n", "rate_limit.rate"),
            ("rate_limit:\n  rate: 5\n  unit: week\n", "rate_limit.unit parameter (week)"),
        ];
        for (options, expected) in cases {
            let mut manifest = manifest(SERVICE);
            manifest.resources.apigw = Some(serde_yaml::from_str(options).unwrap());
            let err = compile_swagger(&manifest).unwrap_err();
            assert!(err.to_string().contains(expected), "{} gave {}", expected, err);
        }
    }

    #[test]
    fn test_set_target_url_updates_matching_case() {
        let mut swagger = compile_swagger(&manifest(SERVICE)).unwrap().unwrap();
        swagger.set_target_url("get-/api/hello", "https://elsewhere/hello.json");
        let cases = &swagger.configuration.assembly.execute[0].operation_switch.case;
        assert_eq!(
            cases[0].execute[0],
            AssemblyStep::Invoke {
                target_url: "https://elsewhere/hello.json".into(),
                verb: "keep".into()
            }
        );
        assert_ne!(
            cases[1].execute[1],
            AssemblyStep::Invoke {
                target_url: "https://elsewhere/hello.json".into(),
                verb: "keep".into()
            }
        );
    }
}
