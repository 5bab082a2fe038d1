//! Rule compilation.

use super::events::EventIntent;
use super::triggers::trigger_namespace;
use crate::error::DeployError;
use crate::manifest::{Manifest, TriggerDef};
use crate::naming;
use std::collections::{BTreeMap, HashSet};
use whisk_platform::Rule;

/// One rule per event intent. Rule names must be unique in the service.
pub fn compile_rules(
    manifest: &Manifest,
    registry: &BTreeMap<String, TriggerDef>,
    intents: &[EventIntent],
) -> Result<Vec<Rule>, DeployError> {
    let mut seen = HashSet::new();
    intents
        .iter()
        .map(|intent| {
            if !seen.insert(intent.rule.as_str()) {
                return Err(DeployError::validation(format!(
                    "Duplicate rule name ({}) in function {}",
                    intent.rule, intent.function
                )));
            }
            compile_rule(manifest, registry, intent)
        })
        .collect()
}

fn compile_rule(
    manifest: &Manifest,
    registry: &BTreeMap<String, TriggerDef>,
    intent: &EventIntent,
) -> Result<Rule, DeployError> {
    let function = manifest.function(&intent.function).ok_or_else(|| {
        DeployError::validation(format!("Unknown function {}", intent.function))
    })?;
    let namespace = naming::function_namespace(manifest, function);
    let action = naming::function_name(&manifest.service, &intent.function, function);
    let trigger_ns = registry
        .get(&intent.trigger)
        .and_then(|trigger| trigger_namespace(manifest, trigger));

    Ok(Rule {
        name: intent.rule.clone(),
        trigger: naming::qualified(trigger_ns.as_deref(), &intent.trigger),
        action: naming::qualified(namespace.as_deref(), &action),
        namespace,
        overwrite: intent.overwrite,
    })
}
