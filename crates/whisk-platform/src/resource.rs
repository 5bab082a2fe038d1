//! # Platform Resources
//!
//! Wire shapes for everything the platform stores: actions, packages,
//! triggers, feeds, rules and API gateway routes. Field names follow the
//! platform's JSON (`actionName`, `triggerName`, `feedName`, ...), so a
//! compiled resource can be handed to any client unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// Namespace placeholder meaning "whatever namespace the credentials own".
pub const DEFAULT_NAMESPACE: &str = "_";

/// Identity of a stored resource: optional namespace plus name.
///
/// Names may contain one `/` for actions living inside a package
/// (`pkg/action`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceId {
    pub namespace: Option<String>,
    pub name: String,
}

impl ResourceId {
    pub fn new(namespace: Option<String>, name: impl Into<String>) -> Self {
        Self {
            namespace,
            name: name.into(),
        }
    }

    /// Parses a fully qualified identifier (`/ns/name` or `/ns/pkg/name`).
    ///
    /// Identifiers without a leading `/` are treated as unqualified names.
    pub fn parse(qualified: &str) -> Self {
        match qualified.strip_prefix('/') {
            Some(rest) => match rest.split_once('/') {
                Some((namespace, name)) => Self::new(Some(namespace.to_string()), name),
                None => Self::new(None, rest),
            },
            None => Self::new(None, qualified),
        }
    }

    /// Namespace with the placeholder (or absence) resolved to `default_namespace`.
    pub fn namespace_or<'a>(&'a self, default_namespace: &'a str) -> &'a str {
        match self.namespace.as_deref() {
            None | Some(DEFAULT_NAMESPACE) | Some("") => default_namespace,
            Some(namespace) => namespace,
        }
    }

    /// Store key with the placeholder namespace resolved to `default_namespace`.
    pub fn key(&self, default_namespace: &str) -> String {
        format!("/{}/{}", self.namespace_or(default_namespace), self.name)
    }
}

impl Display for ResourceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.namespace {
            Some(namespace) => write!(f, "/{}/{}", namespace, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// A single `{key, value}` entry of a parameter or annotation list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    pub value: Value,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Converts a key-ordered map into the platform's list form.
    pub fn from_map(map: &BTreeMap<String, Value>) -> Vec<KeyValue> {
        map.iter()
            .map(|(key, value)| KeyValue::new(key.clone(), value.clone()))
            .collect()
    }
}

/// How an action runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Exec {
    /// Source or binary archive executed by a language runtime.
    Code {
        kind: String,
        code: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        main: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        image: Option<String>,
    },
    /// Ordered chain of fully qualified action names.
    Sequence {
        kind: String,
        components: Vec<String>,
    },
    /// Container image run as-is.
    Image { kind: String, image: String },
}

impl Exec {
    pub const SEQUENCE_KIND: &'static str = "sequence";
    pub const BLACKBOX_KIND: &'static str = "blackbox";

    pub fn sequence(components: Vec<String>) -> Self {
        Exec::Sequence {
            kind: Self::SEQUENCE_KIND.to_string(),
            components,
        }
    }

    pub fn image(image: impl Into<String>) -> Self {
        Exec::Image {
            kind: Self::BLACKBOX_KIND.to_string(),
            image: image.into(),
        }
    }

    pub fn kind(&self) -> &str {
        match self {
            Exec::Code { kind, .. } | Exec::Sequence { kind, .. } | Exec::Image { kind, .. } => {
                kind
            }
        }
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self, Exec::Sequence { .. })
    }

    /// Copy with any archive payload replaced by `<hidden>`, for logging.
    pub fn redacted(&self) -> Self {
        match self {
            Exec::Code {
                kind, main, image, ..
            } => Exec::Code {
                kind: kind.clone(),
                code: "<hidden>".to_string(),
                main: main.clone(),
                image: image.clone(),
            },
            other => other.clone(),
        }
    }
}

/// Resource limits attached to an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    /// Milliseconds.
    pub timeout: u64,
    /// Megabytes.
    pub memory: u64,
    pub concurrency: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionBody {
    pub exec: Exec,
    pub limits: Limits,
    #[serde(default)]
    pub parameters: Vec<KeyValue>,
    #[serde(default)]
    pub annotations: Vec<KeyValue>,
}

/// A deployable action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    #[serde(rename = "actionName")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub overwrite: bool,
    pub action: ActionBody,
}

impl Action {
    pub fn id(&self) -> ResourceId {
        ResourceId::new(self.namespace.clone(), self.name.clone())
    }

    /// Package segment of a `pkg/action` name.
    pub fn package(&self) -> Option<&str> {
        self.name.split_once('/').map(|(package, _)| package)
    }
}

/// Target of a package binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageBinding {
    pub namespace: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<KeyValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<KeyValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binding: Option<PackageBinding>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub overwrite: bool,
    pub package: PackageBody,
}

impl Package {
    pub fn id(&self) -> ResourceId {
        ResourceId::new(self.namespace.clone(), self.name.clone())
    }
}

/// Feed activation binding an external event source to a trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feed {
    /// Fully qualified trigger identifier (`/ns/trigger`).
    pub trigger: String,
    /// Feed action path relative to `namespace` (`package/feed`).
    #[serde(rename = "feedName")]
    pub feed_name: String,
    pub namespace: String,
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl Feed {
    pub fn trigger_id(&self) -> ResourceId {
        ResourceId::parse(&self.trigger)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    #[serde(rename = "triggerName")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub overwrite: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<KeyValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feed: Option<Feed>,
}

impl Trigger {
    pub fn id(&self) -> ResourceId {
        ResourceId::new(self.namespace.clone(), self.name.clone())
    }

    /// The trigger as sent on create: feeds are bound in a later step.
    pub fn without_feed(&self) -> Self {
        Self {
            feed: None,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(rename = "ruleName")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub overwrite: bool,
    /// Fully qualified trigger identifier.
    pub trigger: String,
    /// Fully qualified action identifier.
    pub action: String,
}

impl Rule {
    pub fn id(&self) -> ResourceId {
        ResourceId::new(self.namespace.clone(), self.name.clone())
    }
}

/// An API gateway definition: one swagger document per base path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    #[serde(rename = "basepath")]
    pub base_path: String,
    pub swagger: Value,
}

impl Route {
    pub fn id(&self) -> ResourceId {
        ResourceId::new(None, self.base_path.clone())
    }
}

/// One entry of a list response.
///
/// For actions inside a package, `namespace` reads `ns/pkg`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub name: String,
    pub namespace: String,
}

impl Summary {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
        }
    }

    /// Namespace without any package suffix.
    pub fn base_namespace(&self) -> &str {
        self.namespace
            .split_once('/')
            .map(|(namespace, _)| namespace)
            .unwrap_or(&self.namespace)
    }

    /// Package segment of the listed namespace, if any.
    pub fn package(&self) -> Option<&str> {
        self.namespace.split_once('/').map(|(_, package)| package)
    }
}
