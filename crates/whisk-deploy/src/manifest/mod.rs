//! # Manifest
//!
//! Typed view of the service manifest (`serverless.yml`). Every field the
//! compiler reads is declared here; unknown keys are ignored so manifests
//! written for other providers still load.
//!
//! ```yaml
//! service: my-service
//! provider:
//!   namespace: guest
//!   apihost: openwhisk.example.com
//! package:
//!   artifact: build/my-service.zip
//! functions:
//!   hello:
//!     handler: handler.main
//!     events:
//!       - http: GET /hello
//!       - schedule: cron(* * * * *)
//! ```
//!
//! A manifest is immutable input: compilation and removal only read it.

mod events;

pub use events::{
    CloudantEvent, EventBinding, MessageHubEvent, ScheduleEvent, ScheduleObject, TriggerEvent, TriggerEventObject,
};

use crate::error::DeployError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_RUNTIME: &str = "nodejs:default";
pub const DEFAULT_MEMORY: u64 = 256;
pub const DEFAULT_TIMEOUT: u64 = 60;
pub const DEFAULT_CONCURRENCY: u64 = 1;

pub const NAMESPACE_ENV: &str = "OW_NAMESPACE";
pub const APIHOST_ENV: &str = "OW_APIHOST";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    pub service: String,
    #[serde(default)]
    pub provider: Provider,
    #[serde(default)]
    pub package: Packaging,
    #[serde(default)]
    pub functions: BTreeMap<String, FunctionDef>,
    #[serde(default)]
    pub resources: Resources,
    /// Directory relative artifact paths are resolved against.
    #[serde(skip)]
    pub service_dir: PathBuf,
}

/// Service-wide defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Provider {
    pub namespace: Option<String>,
    pub apihost: Option<String>,
    pub runtime: Option<String>,
    pub memory: Option<u64>,
    pub timeout: Option<u64>,
    pub concurrency: Option<u64>,
    pub overwrite: Option<bool>,
    #[serde(default)]
    pub parameters: BTreeMap<String, Value>,
    #[serde(default)]
    pub annotations: BTreeMap<String, Value>,
}

/// Where packaged code lives.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Packaging {
    /// One archive per function instead of a shared one.
    #[serde(default)]
    pub individually: bool,
    pub artifact: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FunctionDef {
    pub handler: Option<String>,
    pub sequence: Option<Vec<String>>,
    pub runtime: Option<String>,
    pub image: Option<String>,
    pub memory: Option<u64>,
    pub timeout: Option<u64>,
    pub concurrency: Option<u64>,
    pub namespace: Option<String>,
    pub name: Option<String>,
    pub overwrite: Option<bool>,
    #[serde(default)]
    pub parameters: BTreeMap<String, Value>,
    #[serde(default)]
    pub annotations: BTreeMap<String, Value>,
    #[serde(default)]
    pub events: Vec<EventBinding>,
    /// Per-function artifact, used when packaging individually.
    pub package: Option<Packaging>,
    #[serde(default)]
    pub bind: Vec<BindingDef>,
}

impl FunctionDef {
    pub fn is_sequence(&self) -> bool {
        self.sequence.is_some()
    }

    pub fn has_http_events(&self) -> bool {
        self.events
            .iter()
            .any(|event| matches!(event, EventBinding::Http(_)))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Resources {
    #[serde(default, deserialize_with = "map_with_empty_entries")]
    pub packages: BTreeMap<String, PackageDef>,
    #[serde(default, deserialize_with = "map_with_empty_entries")]
    pub triggers: BTreeMap<String, TriggerDef>,
    pub apigw: Option<ApiGwOptions>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageDef {
    pub name: Option<String>,
    pub namespace: Option<String>,
    pub overwrite: Option<bool>,
    pub shared: Option<bool>,
    /// Fully qualified package to bind to (`/namespace/package`).
    pub binding: Option<String>,
    #[serde(default)]
    pub parameters: BTreeMap<String, Value>,
    #[serde(default)]
    pub annotations: BTreeMap<String, Value>,
    #[serde(default)]
    pub bind: Vec<BindingDef>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriggerDef {
    pub namespace: Option<String>,
    pub overwrite: Option<bool>,
    #[serde(default)]
    pub parameters: BTreeMap<String, Value>,
    /// Fully qualified feed action (`/namespace/package/feed`).
    pub feed: Option<String>,
    #[serde(default)]
    pub feed_parameters: Map<String, Value>,
}

/// `resources.apigw` options.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiGwOptions {
    pub basepath: Option<String>,
    pub name: Option<String>,
    pub cors: Option<bool>,
    pub auth: Option<AuthOptions>,
    pub oauth: Option<OAuthOptions>,
    pub rate_limit: Option<RateLimitOptions>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthOptions {
    pub key: Option<String>,
    pub secret: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OAuthOptions {
    pub provider: Option<String>,
    pub tenant: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RateLimitOptions {
    pub rate: Option<u64>,
    pub unit: Option<String>,
}

/// One entry of a `bind:` list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BindingDef {
    pub service: Option<ServiceRef>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceRef {
    pub name: Option<String>,
    pub instance: Option<String>,
    pub key: Option<String>,
}

impl Manifest {
    /// Reads and parses a manifest file. Relative artifact paths resolve
    /// against the file's directory.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, DeployError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            DeployError::Config(format!("Unable to read manifest {}: {}", path.display(), e))
        })?;
        let mut manifest = Self::from_yaml_str(&text)?;
        manifest.service_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(manifest)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, DeployError> {
        let manifest: Manifest = serde_yaml::from_str(text)
            .map_err(|e| DeployError::Config(format!("Invalid manifest: {}", e)))?;
        if manifest.service.trim().is_empty() {
            return Err(DeployError::Config(
                "Invalid manifest: missing service name".to_string(),
            ));
        }
        debug!(
            service = %manifest.service,
            functions = manifest.functions.len(),
            "Manifest loaded"
        );
        Ok(manifest)
    }

    /// Fills provider namespace and apihost from `lookup` where the manifest
    /// leaves them empty.
    pub fn fill_provider_defaults(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.provider.namespace.is_none() {
            self.provider.namespace = lookup(NAMESPACE_ENV).filter(|v| !v.is_empty());
        }
        if self.provider.apihost.is_none() {
            self.provider.apihost = lookup(APIHOST_ENV).filter(|v| !v.is_empty());
        }
    }

    pub fn function(&self, key: &str) -> Option<&FunctionDef> {
        self.functions.get(key)
    }

    pub fn has_http_events(&self) -> bool {
        self.functions.values().any(FunctionDef::has_http_events)
    }

    /// Resolves a manifest-relative path.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.service_dir.join(path)
        }
    }
}

/// Accepts entries written as bare keys (`my_trigger:` with no body).
fn map_with_empty_entries<'de, D, T>(deserializer: D) -> Result<BTreeMap<String, T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    let entries: Option<BTreeMap<String, Option<T>>> = Option::deserialize(deserializer)?;
    Ok(entries
        .unwrap_or_default()
        .into_iter()
        .map(|(key, value)| (key, value.unwrap_or_default()))
        .collect())
}
