//! # Resource Compiler
//!
//! Turns a [`Manifest`] into the platform resources a deployment creates.
//! Compilation is synchronous and finishes before any remote call, so a
//! validation or packaging error never leaves a half-deployed service.
//!
//! Events are compiled in two phases: [`events::expand`] normalises every
//! trigger-producing event into an intent, then triggers and rules are both
//! built from that one list.

pub mod apigw;
pub mod bindings;
pub mod events;
pub mod functions;
pub mod packages;
pub mod rules;
pub mod triggers;

pub use apigw::{HttpEvent, SwaggerDocument};
pub use bindings::{ServiceBinding, ServiceBindings};

use crate::error::DeployError;
use crate::manifest::Manifest;
use crate::runtime::RuntimeResolver;
use regex::Regex;
use serde::Serialize;
use tracing::info;
use whisk_platform::{Action, Feed, Package, Rule, Trigger};

/// Everything one deployment creates.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CompiledResources {
    pub service: String,
    pub packages: Vec<Package>,
    pub actions: Vec<Action>,
    pub sequences: Vec<Action>,
    pub triggers: Vec<Trigger>,
    pub rules: Vec<Rule>,
    pub swagger: Option<SwaggerDocument>,
    pub bindings: ServiceBindings,
}

impl CompiledResources {
    /// Feed bindings carried by the compiled triggers.
    pub fn feeds(&self) -> impl Iterator<Item = &Feed> {
        self.triggers.iter().filter_map(|trigger| trigger.feed.as_ref())
    }

    /// Pretty JSON of all resources with action code hidden.
    pub fn to_pretty_json(&self) -> Result<String, DeployError> {
        let mut redacted = self.clone();
        for action in redacted.actions.iter_mut().chain(redacted.sequences.iter_mut()) {
            action.action.exec = action.action.exec.redacted();
        }
        serde_json::to_string_pretty(&redacted)
            .map_err(|e| DeployError::packaging(format!("Unable to serialize resources: {}", e)))
    }
}

pub fn compile(manifest: &Manifest) -> Result<CompiledResources, DeployError> {
    info!("Compiling Functions...");
    let (actions, sequences) = functions::compile_functions(manifest)?;

    info!("Compiling Packages...");
    let packages = packages::compile_packages(manifest)?;

    info!("Compiling Triggers & Rules...");
    let intents = events::expand(manifest)?;
    let registry = triggers::registry(manifest, &intents);
    let triggers = triggers::compile_triggers(manifest, &registry)?;
    let rules = rules::compile_rules(manifest, &registry, &intents)?;

    info!("Compiling API Gateway definitions...");
    let swagger = apigw::compile_swagger(manifest)?;

    info!("Compiling Service Bindings...");
    let bindings = bindings::compile_bindings(manifest)?;

    info!(
        packages = packages.len(),
        actions = actions.len(),
        sequences = sequences.len(),
        triggers = triggers.len(),
        rules = rules.len(),
        routes = swagger.as_ref().map_or(0, |s| s.paths.len()),
        "Compiled service"
    );

    Ok(CompiledResources {
        service: manifest.service.clone(),
        packages,
        actions,
        sequences,
        triggers,
        rules,
        swagger,
        bindings,
    })
}

/// Compiles the single function `key`.
pub fn compile_function(manifest: &Manifest, key: &str) -> Result<Action, DeployError> {
    let function = manifest.function(key).ok_or_else(|| {
        DeployError::validation(format!("Function \"{}\" doesn't exist in this Service", key))
    })?;
    functions::compile_function(manifest, &RuntimeResolver::new(manifest), key, function)
}

/// Owned capture groups of `pattern` in `text`; unmatched groups are empty.
pub(crate) fn capture_groups(pattern: &str, text: &str) -> Option<Vec<String>> {
    let regex = Regex::new(pattern).ok()?;
    let captures = regex.captures(text)?;
    Some(
        captures
            .iter()
            .skip(1)
            .map(|group| group.map(|m| m.as_str().to_string()).unwrap_or_default())
            .collect(),
    )
}
