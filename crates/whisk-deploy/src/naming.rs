//! Deterministic resource names.
//!
//! Deploy and remove both derive names from the manifest through these
//! functions, so a removal run finds what a deploy run created without any
//! stored state. Every name depends only on its arguments.

use crate::manifest::{FunctionDef, Manifest};
use whisk_platform::DEFAULT_NAMESPACE;

/// Action name: explicit `name`, else `<service>_<function>`.
pub fn function_name(service: &str, key: &str, function: &FunctionDef) -> String {
    function
        .name
        .clone()
        .unwrap_or_else(|| format!("{}_{}", service, key))
}

/// Explicit namespace, else the provider's. `None` lets the platform pick.
pub fn function_namespace(manifest: &Manifest, function: &FunctionDef) -> Option<String> {
    function
        .namespace
        .clone()
        .or_else(|| manifest.provider.namespace.clone())
}

/// Namespace used inside fully qualified identifiers (`/ns/name`).
pub fn qualifying_namespace(namespace: Option<&str>) -> &str {
    namespace.unwrap_or(DEFAULT_NAMESPACE)
}

pub fn qualified(namespace: Option<&str>, name: &str) -> String {
    format!("/{}/{}", qualifying_namespace(namespace), name)
}

pub fn trigger_rule(service: &str, trigger: &str, function_key: &str) -> String {
    format!("{}_{}_to_{}", service, trigger, function_key)
}

pub fn schedule_trigger(service: &str, function_key: &str) -> String {
    format!("{}_{}_schedule_trigger", service, function_key)
}

pub fn schedule_rule(service: &str, function_key: &str) -> String {
    format!("{}_{}_schedule_rule", service, function_key)
}

pub fn cloudant_trigger(service: &str, function_key: &str, db: &str) -> String {
    format!("{}_{}_cloudant_{}", service, function_key, db)
}

pub fn cloudant_rule(service: &str, function_key: &str, db: &str) -> String {
    format!("{}_rule", cloudant_trigger(service, function_key, db))
}

pub fn message_hub_trigger(service: &str, function_key: &str, topic: &str) -> String {
    format!("{}_{}_messagehub_{}", service, function_key, topic)
}

pub fn message_hub_rule(service: &str, function_key: &str, topic: &str) -> String {
    format!("{}_rule", message_hub_trigger(service, function_key, topic))
}

/// API gateway base path: `resources.apigw.basepath`, else `/<service>`.
pub fn base_path(manifest: &Manifest) -> String {
    manifest
        .resources
        .apigw
        .as_ref()
        .and_then(|options| options.basepath.clone())
        .unwrap_or_else(|| format!("/{}", manifest.service))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_names() {
        assert_eq!(trigger_rule("svc", "tick", "hello"), "svc_tick_to_hello");
        assert_eq!(schedule_trigger("svc", "hello"), "svc_hello_schedule_trigger");
        assert_eq!(schedule_rule("svc", "hello"), "svc_hello_schedule_rule");
        assert_eq!(cloudant_trigger("svc", "hello", "db"), "svc_hello_cloudant_db");
        assert_eq!(cloudant_rule("svc", "hello", "db"), "svc_hello_cloudant_db_rule");
        assert_eq!(
            message_hub_trigger("svc", "hello", "news"),
            "svc_hello_messagehub_news"
        );
        assert_eq!(
            message_hub_rule("svc", "hello", "news"),
            "svc_hello_messagehub_news_rule"
        );
    }

    #[test]
    fn test_function_name_and_namespace_precedence() {
        let mut manifest = Manifest {
            service: "svc".into(),
            ..Default::default()
        };
        let mut function = FunctionDef::default();
        assert_eq!(function_name("svc", "hello", &function), "svc_hello");
        assert_eq!(function_namespace(&manifest, &function), None);
        assert_eq!(qualified(None, "svc_hello"), "/_/svc_hello");

        manifest.provider.namespace = Some("provider_ns".into());
        assert_eq!(
            function_namespace(&manifest, &function).as_deref(),
            Some("provider_ns")
        );

        function.namespace = Some("fn_ns".into());
        function.name = Some("custom".into());
        assert_eq!(function_name("svc", "hello", &function), "custom");
        assert_eq!(function_namespace(&manifest, &function).as_deref(), Some("fn_ns"));
    }

    #[test]
    fn test_base_path_defaults_to_service() {
        let manifest = Manifest {
            service: "svc".into(),
            ..Default::default()
        };
        assert_eq!(base_path(&manifest), "/svc");
    }
}
