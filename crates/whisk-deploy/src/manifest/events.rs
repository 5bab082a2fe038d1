//! Function event bindings.
//!
//! Each `events:` entry is a single-key map naming the event kind. Values are
//! kept loose here (`Option` fields, raw JSON for `http`) so that missing or
//! malformed properties surface as validation errors naming the manifest key,
//! not as parse errors.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawEvent", into = "RawEvent")]
pub enum EventBinding {
    /// `"<METHOD> <path>"` or `{method, path, resp}`.
    Http(Value),
    Trigger(TriggerEvent),
    Schedule(ScheduleEvent),
    Cloudant(CloudantEvent),
    MessageHub(MessageHubEvent),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TriggerEvent {
    Name(String),
    Object(TriggerEventObject),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriggerEventObject {
    pub name: Option<String>,
    /// Absent: `None`. Present but null: `Some(None)`, the default name.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub rule: Option<Option<String>>,
    pub overwrite: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScheduleEvent {
    Rate(String),
    Object(ScheduleObject),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleObject {
    pub rate: Option<String>,
    pub trigger: Option<String>,
    pub rule: Option<String>,
    pub params: Option<Map<String, Value>>,
    pub max: Option<u64>,
}

impl ScheduleEvent {
    pub fn rate(&self) -> Option<&str> {
        match self {
            ScheduleEvent::Rate(rate) => Some(rate),
            ScheduleEvent::Object(object) => object.rate.as_deref(),
        }
    }

    pub fn trigger(&self) -> Option<&str> {
        match self {
            ScheduleEvent::Rate(_) => None,
            ScheduleEvent::Object(object) => object.trigger.as_deref(),
        }
    }

    pub fn rule(&self) -> Option<&str> {
        match self {
            ScheduleEvent::Rate(_) => None,
            ScheduleEvent::Object(object) => object.rule.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CloudantEvent {
    pub db: Option<String>,
    pub package: Option<String>,
    pub host: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub iam_api_key: Option<String>,
    pub max: Option<u64>,
    pub query: Option<Value>,
    pub filter: Option<String>,
    pub trigger: Option<String>,
    pub rule: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageHubEvent {
    pub topic: Option<String>,
    pub package: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    /// A single broker string or a list of them.
    pub brokers: Option<Value>,
    pub admin_url: Option<String>,
    pub json: Option<bool>,
    pub binary_key: Option<bool>,
    pub binary_value: Option<bool>,
    pub trigger: Option<String>,
    pub rule: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    http: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    trigger: Option<TriggerEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    schedule: Option<ScheduleEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cloudant: Option<CloudantEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    message_hub: Option<MessageHubEvent>,
}

impl TryFrom<RawEvent> for EventBinding {
    type Error = String;

    fn try_from(raw: RawEvent) -> Result<Self, Self::Error> {
        let mut found = Vec::new();
        if let Some(http) = raw.http {
            found.push(EventBinding::Http(http));
        }
        if let Some(trigger) = raw.trigger {
            found.push(EventBinding::Trigger(trigger));
        }
        if let Some(schedule) = raw.schedule {
            found.push(EventBinding::Schedule(schedule));
        }
        if let Some(cloudant) = raw.cloudant {
            found.push(EventBinding::Cloudant(cloudant));
        }
        if let Some(message_hub) = raw.message_hub {
            found.push(EventBinding::MessageHub(message_hub));
        }

        match found.len() {
            1 => Ok(found.remove(0)),
            0 => Err(
                "event must be one of: http, trigger, schedule, cloudant, message_hub".to_string(),
            ),
            _ => Err("event declares more than one event kind".to_string()),
        }
    }
}

impl From<EventBinding> for RawEvent {
    fn from(event: EventBinding) -> Self {
        let mut raw = RawEvent::default();
        match event {
            EventBinding::Http(http) => raw.http = Some(http),
            EventBinding::Trigger(trigger) => raw.trigger = Some(trigger),
            EventBinding::Schedule(schedule) => raw.schedule = Some(schedule),
            EventBinding::Cloudant(cloudant) => raw.cloudant = Some(cloudant),
            EventBinding::MessageHub(message_hub) => raw.message_hub = Some(message_hub),
        }
        raw
    }
}

/// Deserializes a field that was present in the input, null included.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn events(yaml: &str) -> Vec<EventBinding> {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_event_kinds_parse_from_single_key_maps() {
        let parsed = events(
            r#"
- http: GET /hello
- trigger: my_trigger
- schedule: cron(* * * * *)
- cloudant:
    db: mydb
    package: /ns/cloudant
- message_hub:
    topic: news
    package: /ns/kafka
"#,
        );
        assert_eq!(parsed[0], EventBinding::Http(Value::String("GET /hello".into())));
        assert_eq!(
            parsed[1],
            EventBinding::Trigger(TriggerEvent::Name("my_trigger".into()))
        );
        assert!(matches!(&parsed[2], EventBinding::Schedule(s) if s.rate() == Some("cron(* * * * *)")));
        assert!(matches!(&parsed[3], EventBinding::Cloudant(c) if c.db.as_deref() == Some("mydb")));
        assert!(matches!(&parsed[4], EventBinding::MessageHub(m) if m.topic.as_deref() == Some("news")));
    }

    #[test]
    fn test_trigger_object_distinguishes_null_rule_from_missing() {
        let parsed = events(
            r#"
- trigger:
    name: a
    rule:
- trigger:
    name: b
- trigger:
    name: c
    rule: custom
"#,
        );
        let rules: Vec<_> = parsed
            .iter()
            .map(|event| match event {
                EventBinding::Trigger(TriggerEvent::Object(object)) => object.rule.clone(),
                other => panic!("unexpected event {:?}", other),
            })
            .collect();
        assert_eq!(rules, vec![Some(None), None, Some(Some("custom".into()))]);
    }

    #[test]
    fn test_unknown_event_kind_is_rejected() {
        let result: Result<Vec<EventBinding>, _> = serde_yaml::from_str("- sns: topic");
        assert!(result.is_err());
    }
}
