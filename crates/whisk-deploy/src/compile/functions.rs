//! Function compilation: manifest functions into platform actions.

use crate::error::DeployError;
use crate::manifest::{FunctionDef, Manifest, DEFAULT_CONCURRENCY, DEFAULT_MEMORY, DEFAULT_TIMEOUT};
use crate::naming;
use crate::runtime::RuntimeResolver;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;
use whisk_platform::{Action, ActionBody, KeyValue, Limits};

/// Compiles every function, split into plain actions and sequences.
pub fn compile_functions(manifest: &Manifest) -> Result<(Vec<Action>, Vec<Action>), DeployError> {
    let resolver = RuntimeResolver::new(manifest);
    let mut actions = Vec::new();
    let mut sequences = Vec::new();
    for (key, function) in &manifest.functions {
        let action = compile_function(manifest, &resolver, key, function)?;
        if action.action.exec.is_sequence() {
            sequences.push(action);
        } else {
            actions.push(action);
        }
    }
    Ok((actions, sequences))
}

pub fn compile_function(
    manifest: &Manifest,
    resolver: &RuntimeResolver<'_>,
    key: &str,
    function: &FunctionDef,
) -> Result<Action, DeployError> {
    match (&function.handler, &function.sequence) {
        (None, None) => {
            return Err(DeployError::validation(format!(
                "Missing \"handler\" or \"sequence\" property in function {}",
                key
            )))
        }
        (Some(_), Some(_)) => {
            return Err(DeployError::validation(format!(
                "Found both \"handler\" and \"sequence\" properties in function {}, please choose one.",
                key
            )))
        }
        _ => {}
    }

    let provider = &manifest.provider;
    let exec = resolver.resolve(key, function)?;

    let mut parameters = provider.parameters.clone();
    parameters.extend(function.parameters.clone());

    let mut annotations = merged_annotations(manifest, function);
    if annotations.get("web-export").is_some_and(is_truthy) {
        annotations.insert("final".to_string(), Value::Bool(true));
    }

    let action = Action {
        name: naming::function_name(&manifest.service, key, function),
        namespace: naming::function_namespace(manifest, function),
        overwrite: function.overwrite.or(provider.overwrite).unwrap_or(true),
        action: ActionBody {
            exec,
            limits: Limits {
                timeout: function
                    .timeout
                    .or(provider.timeout)
                    .unwrap_or(DEFAULT_TIMEOUT)
                    * 1000,
                memory: function.memory.or(provider.memory).unwrap_or(DEFAULT_MEMORY),
                concurrency: function
                    .concurrency
                    .or(provider.concurrency)
                    .unwrap_or(DEFAULT_CONCURRENCY),
            },
            parameters: KeyValue::from_map(&parameters),
            annotations: KeyValue::from_map(&annotations),
        },
    };

    debug!(
        function = key,
        name = %action.name,
        exec = ?action.action.exec.redacted(),
        limits = ?action.action.limits,
        "Compiled function"
    );
    Ok(action)
}

/// Whether an annotation value switches a flag on.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Merged provider and function annotations, as the compiled action has them.
pub fn merged_annotations(manifest: &Manifest, function: &FunctionDef) -> BTreeMap<String, Value> {
    let mut annotations = manifest.provider.annotations.clone();
    annotations.extend(function.annotations.clone());
    annotations
}
