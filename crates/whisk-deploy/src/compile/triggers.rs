//! Trigger registry and feed compilation.

use super::events::EventIntent;
use crate::error::DeployError;
use crate::manifest::{Manifest, TriggerDef};
use crate::naming;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use whisk_platform::{Feed, KeyValue, Trigger};

/// Every trigger the service owns: declared triggers, triggers named by
/// `trigger` events, and triggers generated for feed-backed events. A
/// feed-backed event replaces a declared trigger of the same name.
pub fn registry(manifest: &Manifest, intents: &[EventIntent]) -> BTreeMap<String, TriggerDef> {
    let mut registry = manifest.resources.triggers.clone();
    for intent in intents {
        match &intent.feed {
            Some(feed) => {
                registry.insert(
                    intent.trigger.clone(),
                    TriggerDef {
                        feed: Some(feed.path.clone()),
                        feed_parameters: feed.params.clone(),
                        ..Default::default()
                    },
                );
            }
            None => {
                registry.entry(intent.trigger.clone()).or_default();
            }
        }
    }
    registry
}

/// Declared namespace, else the provider's.
pub fn trigger_namespace(manifest: &Manifest, trigger: &TriggerDef) -> Option<String> {
    trigger
        .namespace
        .clone()
        .or_else(|| manifest.provider.namespace.clone())
}

pub fn compile_triggers(
    manifest: &Manifest,
    registry: &BTreeMap<String, TriggerDef>,
) -> Result<Vec<Trigger>, DeployError> {
    registry
        .iter()
        .map(|(name, trigger)| compile_trigger(manifest, name, trigger))
        .collect()
}

pub fn compile_trigger(
    manifest: &Manifest,
    name: &str,
    trigger: &TriggerDef,
) -> Result<Trigger, DeployError> {
    let namespace = trigger_namespace(manifest, trigger);
    let feed = trigger
        .feed
        .as_deref()
        .map(|path| compile_feed(name, namespace.as_deref(), path, &trigger.feed_parameters))
        .transpose()?;

    Ok(Trigger {
        name: name.to_string(),
        namespace,
        overwrite: trigger
            .overwrite
            .or(manifest.provider.overwrite)
            .unwrap_or(true),
        parameters: KeyValue::from_map(&trigger.parameters),
        feed,
    })
}

/// Splits `/namespace/package/feed` into the feed's namespace and name.
pub fn split_feed_path(path: &str) -> Option<(String, String)> {
    let mut groups = super::capture_groups(r"^/([^/]+)/(.+)$", path)?.into_iter();
    Some((groups.next()?, groups.next()?))
}

fn compile_feed(
    trigger: &str,
    trigger_namespace: Option<&str>,
    path: &str,
    params: &Map<String, Value>,
) -> Result<Feed, DeployError> {
    let (namespace, feed_name) = split_feed_path(path).ok_or_else(|| {
        DeployError::validation(format!(
            "Invalid Trigger Feed ({}). Must be in form: /namespace/package/feed",
            path
        ))
    })?;
    Ok(Feed {
        trigger: naming::qualified(trigger_namespace, trigger),
        feed_name,
        namespace,
        params: params.clone(),
    })
}
