//! Service binding compilation.

use crate::error::DeployError;
use crate::manifest::{BindingDef, Manifest};
use crate::naming;
use serde::Serialize;
use std::collections::HashSet;

/// One `service bind` invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceBinding {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Action or package receiving the credentials.
    pub action: String,
}

/// Bindings grouped per target resource. Groups are independent; bindings
/// within one group run one after another.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ServiceBindings {
    pub packages: Vec<Vec<ServiceBinding>>,
    pub functions: Vec<Vec<ServiceBinding>>,
}

impl ServiceBindings {
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty() && self.functions.is_empty()
    }
}

pub fn compile_bindings(manifest: &Manifest) -> Result<ServiceBindings, DeployError> {
    let mut bindings = ServiceBindings::default();

    for (key, package) in &manifest.resources.packages {
        let name = package.name.as_deref().unwrap_or(key);
        let group = parse_bindings(name, &package.bind)?;
        if !group.is_empty() {
            bindings.packages.push(group);
        }
    }
    for (key, function) in &manifest.functions {
        let name = naming::function_name(&manifest.service, key, function);
        let group = parse_bindings(&name, &function.bind)?;
        if !group.is_empty() {
            bindings.functions.push(group);
        }
    }
    Ok(bindings)
}

fn parse_bindings(target: &str, defs: &[BindingDef]) -> Result<Vec<ServiceBinding>, DeployError> {
    let mut names = HashSet::new();
    defs.iter()
        .filter_map(|def| def.service.as_ref())
        .map(|service| {
            let name = service.name.clone().ok_or_else(|| {
                DeployError::validation(format!(
                    "service binding missing name parameter: {}",
                    serde_json::to_string(service).unwrap_or_default()
                ))
            })?;
            if !names.insert(name.clone()) {
                return Err(DeployError::validation(format!(
                    "multiple bindings for same service not supported: {}",
                    name
                )));
            }
            Ok(ServiceBinding {
                name,
                instance: service.instance.clone(),
                key: service.key.clone(),
                action: target.to_string(),
            })
        })
        .collect()
}
