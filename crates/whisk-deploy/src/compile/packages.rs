//! Package compilation.

use crate::error::DeployError;
use crate::manifest::{Manifest, PackageDef};
use std::collections::BTreeMap;
use whisk_platform::{KeyValue, Package, PackageBinding, PackageBody};

/// Declared packages keyed by their effective name, plus an empty entry for
/// every package referenced by a `pkg/action` function name.
pub fn package_defs(manifest: &Manifest) -> BTreeMap<String, PackageDef> {
    let mut packages: BTreeMap<String, PackageDef> = manifest
        .resources
        .packages
        .iter()
        .map(|(key, package)| (package.name.clone().unwrap_or_else(|| key.clone()), package.clone()))
        .collect();

    for name in action_packages(manifest) {
        packages.entry(name).or_default();
    }
    packages
}

/// Packages named by explicit `pkg/action` function names.
pub fn action_packages(manifest: &Manifest) -> Vec<String> {
    let mut names: Vec<String> = manifest
        .functions
        .values()
        .filter_map(|function| function.name.as_deref())
        .filter_map(|name| super::capture_groups(r"^(.+)/.+$", name))
        .filter_map(|groups| groups.into_iter().next())
        .collect();
    names.sort();
    names.dedup();
    names
}

pub fn compile_packages(manifest: &Manifest) -> Result<Vec<Package>, DeployError> {
    package_defs(manifest)
        .iter()
        .map(|(name, package)| compile_package(manifest, name, package))
        .collect()
}

pub fn compile_package(
    manifest: &Manifest,
    name: &str,
    package: &PackageDef,
) -> Result<Package, DeployError> {
    let binding = package
        .binding
        .as_deref()
        .map(parse_binding)
        .transpose()?;

    Ok(Package {
        name: name.to_string(),
        namespace: package
            .namespace
            .clone()
            .or_else(|| manifest.provider.namespace.clone()),
        overwrite: package
            .overwrite
            .or(manifest.provider.overwrite)
            .unwrap_or(true),
        package: PackageBody {
            publish: package.shared,
            parameters: KeyValue::from_map(&package.parameters),
            annotations: KeyValue::from_map(&package.annotations),
            binding,
        },
    })
}

/// `/namespace/package` into its parts.
fn parse_binding(binding: &str) -> Result<PackageBinding, DeployError> {
    super::capture_groups(r"^/(.+)/(.+)$", binding)
        .and_then(|groups| {
            let mut groups = groups.into_iter();
            Some(PackageBinding {
                namespace: groups.next()?,
                name: groups.next()?,
            })
        })
        .ok_or_else(|| {
            DeployError::validation(format!(
                "Invalid Package Binding ({}). Must be in form: /namespace/package",
                binding
            ))
        })
}

/// Removal-side view: the names of every package the service owns.
pub fn package_names(manifest: &Manifest) -> Vec<(String, Option<String>)> {
    package_defs(manifest)
        .into_iter()
        .map(|(name, package)| {
            let namespace = package
                .namespace
                .or_else(|| manifest.provider.namespace.clone());
            (name, namespace)
        })
        .collect()
}
