//! Plain-text report of what is deployed.

use crate::error::DeployError;
use crate::manifest::Manifest;
use serde_json::Value;
use whisk_platform::{PlatformClient, Route, Summary, DEFAULT_NAMESPACE};

const SEPARATOR: &str = "    ";

/// Lists deployed actions, triggers, rules and endpoints.
pub async fn info(client: &dyn PlatformClient, manifest: &Manifest) -> Result<String, DeployError> {
    let mut report = String::from("Service Information\n");
    report.push_str(&format!(
        "platform:\t{}\n",
        manifest.provider.apihost.as_deref().unwrap_or("local")
    ));
    report.push_str(&format!(
        "namespace:\t{}\n",
        manifest
            .provider
            .namespace
            .as_deref()
            .unwrap_or(DEFAULT_NAMESPACE)
    ));
    report.push_str(&format!("service:\t{}\n\n", manifest.service));

    report.push_str(&section("actions", &client.list_actions().await?));
    report.push_str(&section("triggers", &client.list_triggers().await?));
    report.push_str(&section("rules", &client.list_rules().await?));
    report.push_str(&endpoints(&client.list_routes().await?));
    Ok(report)
}

fn section(title: &str, listed: &[Summary]) -> String {
    if listed.is_empty() {
        return format!("{}:\n**no {} deployed**\n\n", title, title);
    }
    let names: Vec<&str> = listed.iter().map(|summary| summary.name.as_str()).collect();
    format!("{}:\n{}\n\n", title, names.join(SEPARATOR))
}

fn endpoints(routes: &[Route]) -> String {
    if routes.is_empty() {
        return "endpoints:\n**no routes deployed**\n".to_string();
    }
    let mut text = String::from("endpoints:\n");
    for route in routes {
        text.push_str(&format!(
            "{}\n{}\n",
            route.base_path,
            route_lines(&route.swagger).join(SEPARATOR)
        ));
    }
    text
}

/// `<path> <VERB> -> <action>` for every operation of a swagger document.
fn route_lines(swagger: &Value) -> Vec<String> {
    let Some(paths) = swagger.get("paths").and_then(Value::as_object) else {
        return Vec::new();
    };
    paths
        .iter()
        .flat_map(|(path, verbs)| {
            verbs
                .as_object()
                .into_iter()
                .flatten()
                .map(move |(verb, operation)| {
                    let action = operation
                        .pointer("/x-openwhisk/action")
                        .and_then(Value::as_str)
                        .unwrap_or("?");
                    format!("{} {} -> {}", path, verb.to_uppercase(), action)
                })
        })
        .collect()
}
