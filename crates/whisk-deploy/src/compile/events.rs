//! Event expansion.
//!
//! Every `trigger`, `schedule`, `cloudant` and `message_hub` event becomes one
//! [`EventIntent`]: a trigger name, the rule binding it to the function, and
//! for sugar events the feed that drives the trigger. Triggers and rules are
//! both built from this list, so sugar-derived and declared triggers are
//! handled the same way and nothing in the manifest is rewritten.

use crate::error::DeployError;
use crate::manifest::{
    CloudantEvent, EventBinding, Manifest, MessageHubEvent, ScheduleEvent, TriggerEvent,
};
use crate::naming;
use serde_json::{json, Map, Value};

const ALARM_FEED: &str = "/whisk.system/alarms/alarm";
const CLOUDANT_PACKAGE: &str = "/whisk.system/cloudant";
const MESSAGING_PACKAGE: &str = "/whisk.system/messaging";

#[derive(Debug, Clone, PartialEq)]
pub struct EventIntent {
    /// Manifest key of the owning function.
    pub function: String,
    pub trigger: String,
    pub rule: String,
    pub overwrite: bool,
    pub feed: Option<FeedIntent>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedIntent {
    /// Fully qualified feed action (`/namespace/package/feed`).
    pub path: String,
    pub params: Map<String, Value>,
}

/// Whether feed credentials of sugar events are checked and passed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Credentials {
    Required,
    Ignored,
}

/// Expands all function events, in manifest order.
pub fn expand(manifest: &Manifest) -> Result<Vec<EventIntent>, DeployError> {
    expand_with(manifest, Credentials::Required)
}

/// Like [`expand`], but only derives trigger, rule and feed names. Feed
/// credentials are neither required nor copied into the feed parameters, so
/// a manifest stripped of them still yields the names a deploy used.
pub fn expand_names(manifest: &Manifest) -> Result<Vec<EventIntent>, DeployError> {
    expand_with(manifest, Credentials::Ignored)
}

fn expand_with(
    manifest: &Manifest,
    credentials: Credentials,
) -> Result<Vec<EventIntent>, DeployError> {
    let mut intents = Vec::new();
    for (key, function) in &manifest.functions {
        for event in &function.events {
            let intent = match event {
                EventBinding::Http(_) => continue,
                EventBinding::Trigger(trigger) => trigger_intent(&manifest.service, key, trigger)?,
                EventBinding::Schedule(schedule) => {
                    schedule_intent(&manifest.service, key, schedule)?
                }
                EventBinding::Cloudant(cloudant) => {
                    cloudant_intent(&manifest.service, key, cloudant, credentials)?
                }
                EventBinding::MessageHub(message_hub) => {
                    message_hub_intent(&manifest.service, key, message_hub, credentials)?
                }
            };
            intents.push(intent);
        }
    }
    Ok(intents)
}

fn trigger_intent(
    service: &str,
    function: &str,
    trigger: &TriggerEvent,
) -> Result<EventIntent, DeployError> {
    match trigger {
        TriggerEvent::Name(name) => Ok(EventIntent {
            function: function.to_string(),
            trigger: name.clone(),
            rule: naming::trigger_rule(service, name, function),
            overwrite: true,
            feed: None,
        }),
        TriggerEvent::Object(object) => {
            let rule = object.rule.as_ref().ok_or_else(|| {
                DeployError::validation(format!(
                    "Missing mandatory rule property from Event Trigger definition for Function: {}",
                    function
                ))
            })?;
            let name = object.name.as_ref().ok_or_else(|| {
                DeployError::validation(format!(
                    "Missing mandatory name property from Event Trigger definition for Function: {}",
                    function
                ))
            })?;
            let rule = rule
                .clone()
                .filter(|rule| !rule.is_empty())
                .unwrap_or_else(|| naming::trigger_rule(service, name, function));

            Ok(EventIntent {
                function: function.to_string(),
                trigger: name.clone(),
                rule,
                overwrite: object.overwrite.unwrap_or(true),
                feed: None,
            })
        }
    }
}

/// Cron expression inside `cron(...)`, which must have exactly five fields.
pub fn parse_schedule_rate(rate: &str) -> Result<String, DeployError> {
    super::capture_groups(r"^cron\((.*)\)$", rate)
        .and_then(|groups| groups.into_iter().next())
        .filter(|cron| !cron.is_empty() && cron.split(' ').count() == 5)
        .ok_or_else(|| {
            DeployError::validation(format!(
                "Schedule event rate property value is invalid: {}\nThe correct syntax should be \"cron(_ _ _ _ _)\"",
                rate
            ))
        })
}

fn schedule_intent(
    service: &str,
    function: &str,
    schedule: &ScheduleEvent,
) -> Result<EventIntent, DeployError> {
    let cron = parse_schedule_rate(schedule.rate().unwrap_or_default())?;

    let mut params = Map::new();
    params.insert("cron".into(), Value::String(cron));
    let payload = match schedule {
        ScheduleEvent::Object(object) => object.params.clone().unwrap_or_default(),
        ScheduleEvent::Rate(_) => Map::new(),
    };
    params.insert(
        "trigger_payload".into(),
        Value::String(Value::Object(payload).to_string()),
    );
    if let ScheduleEvent::Object(object) = schedule {
        if let Some(max) = object.max {
            params.insert("maxTriggers".into(), json!(max));
        }
    }

    Ok(EventIntent {
        function: function.to_string(),
        trigger: schedule
            .trigger()
            .map(str::to_string)
            .unwrap_or_else(|| naming::schedule_trigger(service, function)),
        rule: schedule
            .rule()
            .map(str::to_string)
            .unwrap_or_else(|| naming::schedule_rule(service, function)),
        overwrite: true,
        feed: Some(FeedIntent {
            path: ALARM_FEED.to_string(),
            params,
        }),
    })
}

fn missing(source: &str, property: &str, function: &str) -> DeployError {
    DeployError::validation(format!(
        "{} event property ({}) missing on function: {}",
        source, property, function
    ))
}

fn cloudant_intent(
    service: &str,
    function: &str,
    cloudant: &CloudantEvent,
    credentials: Credentials,
) -> Result<EventIntent, DeployError> {
    let db = non_empty(&cloudant.db).ok_or_else(|| missing("Cloudant", "db", function))?;

    let mut params = Map::new();
    params.insert("dbname".into(), json!(db));

    if cloudant.package.is_none() && credentials == Credentials::Required {
        let host = non_empty(&cloudant.host).ok_or_else(|| missing("Cloudant", "host", function))?;
        match (
            non_empty(&cloudant.iam_api_key),
            non_empty(&cloudant.username),
            non_empty(&cloudant.password),
        ) {
            (Some(key), _, _) => {
                params.insert("iamApiKey".into(), json!(key));
            }
            (None, Some(username), Some(password)) => {
                params.insert("username".into(), json!(username));
                params.insert("password".into(), json!(password));
            }
            _ => {
                return Err(DeployError::validation(format!(
                    "Cloudant event authentication property (username & password or iam_api_key) missing on function: {}",
                    function
                )))
            }
        }
        params.insert("host".into(), json!(host));
    }
    if let Some(max) = cloudant.max {
        params.insert("maxTriggers".into(), json!(max));
    }
    if let Some(query) = &cloudant.query {
        params.insert("query_params".into(), query.clone());
    }
    if let Some(filter) = &cloudant.filter {
        params.insert("filter".into(), json!(filter));
    }

    let package = cloudant.package.as_deref().unwrap_or(CLOUDANT_PACKAGE);
    Ok(EventIntent {
        function: function.to_string(),
        trigger: cloudant
            .trigger
            .clone()
            .unwrap_or_else(|| naming::cloudant_trigger(service, function, db)),
        rule: cloudant
            .rule
            .clone()
            .unwrap_or_else(|| naming::cloudant_rule(service, function, db)),
        overwrite: true,
        feed: Some(FeedIntent {
            path: format!("{}/changes", package),
            params,
        }),
    })
}

fn message_hub_intent(
    service: &str,
    function: &str,
    message_hub: &MessageHubEvent,
    credentials: Credentials,
) -> Result<EventIntent, DeployError> {
    let topic =
        non_empty(&message_hub.topic).ok_or_else(|| missing("Message Hub", "topic", function))?;

    let mut params = Map::new();
    params.insert("topic".into(), json!(topic));
    params.insert("isJSONData".into(), json!(message_hub.json.unwrap_or(false)));
    params.insert(
        "isBinaryKey".into(),
        json!(message_hub.binary_key.unwrap_or(false)),
    );
    params.insert(
        "isBinaryValue".into(),
        json!(message_hub.binary_value.unwrap_or(false)),
    );

    if message_hub.package.is_none() && credentials == Credentials::Required {
        let user =
            non_empty(&message_hub.user).ok_or_else(|| missing("Message Hub", "user", function))?;
        let password = non_empty(&message_hub.password)
            .ok_or_else(|| missing("Message Hub", "password", function))?;
        let brokers = brokers(message_hub.brokers.as_ref())
            .ok_or_else(|| missing("Message Hub", "brokers", function))?;
        let admin_url = non_empty(&message_hub.admin_url)
            .ok_or_else(|| missing("Message Hub", "admin_url", function))?;

        params.insert("user".into(), json!(user));
        params.insert("password".into(), json!(password));
        params.insert("kafka_brokers_sasl".into(), json!(brokers));
        params.insert("kafka_admin_url".into(), json!(admin_url));
    }

    let package = message_hub.package.as_deref().unwrap_or(MESSAGING_PACKAGE);
    Ok(EventIntent {
        function: function.to_string(),
        trigger: message_hub
            .trigger
            .clone()
            .unwrap_or_else(|| naming::message_hub_trigger(service, function, topic)),
        rule: message_hub
            .rule
            .clone()
            .unwrap_or_else(|| naming::message_hub_rule(service, function, topic)),
        overwrite: true,
        feed: Some(FeedIntent {
            path: format!("{}/messageHubFeed", package),
            params,
        }),
    })
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|value| !value.is_empty())
}

/// Broker list joined with `,`; a single string is used as given.
fn brokers(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(broker) if !broker.is_empty() => Some(broker.clone()),
        Value::Array(list) if !list.is_empty() => Some(
            list.iter()
                .map(|broker| match broker {
                    Value::String(broker) => broker.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(","),
        ),
        _ => None,
    }
}
