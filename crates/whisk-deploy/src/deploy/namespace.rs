//! Placeholder namespace resolution for API gateway documents.
//!
//! Actions compiled without a namespace carry `_` in their `x-openwhisk`
//! block. Before the document is sent, each such action is looked up in the
//! platform's action listing and the real namespace is written back into
//! the block, its web URL and the matching switch branch.
//!
//! The listing is a point-in-time view: a concurrent deploy of the same
//! action names into another namespace can make the match ambiguous.

use crate::compile::apigw::DEFAULT_PACKAGE;
use crate::compile::SwaggerDocument;
use crate::error::DeployError;
use tracing::debug;
use whisk_platform::{PlatformClient, PlatformError, Summary, DEFAULT_NAMESPACE};

const ROUTE_KIND: &str = "API Gateway definition";

/// Resolves every `_` namespace in `swagger`. Lists actions at most once.
pub async fn resolve_placeholders(
    client: &dyn PlatformClient,
    mut swagger: SwaggerDocument,
) -> Result<SwaggerDocument, DeployError> {
    let pending = swagger
        .operations()
        .any(|(_, _, operation)| operation.openwhisk.namespace == DEFAULT_NAMESPACE);
    if !pending {
        return Ok(swagger);
    }

    let base_path = swagger.base_path.clone();
    let listed = client
        .list_actions()
        .await
        .map_err(|e| DeployError::deployment(ROUTE_KIND, &base_path, &e))?;

    let mut retargets = Vec::new();
    for operation in swagger.operations_mut() {
        let target = &mut operation.openwhisk;
        if target.namespace != DEFAULT_NAMESPACE {
            continue;
        }
        let summary = find_action(&listed, &target.package, &target.action).ok_or_else(|| {
            DeployError::deployment(
                ROUTE_KIND,
                &base_path,
                &PlatformError::NotFound(format!(
                    "unable to resolve namespace for action {}/{}",
                    target.package, target.action
                )),
            )
        })?;

        let namespace = summary.base_namespace().to_string();
        target.url = target
            .url
            .replacen("web/_", &format!("web/{}", namespace), 1);
        debug!(action = %target.action, namespace = %namespace, "Resolved route namespace");
        target.namespace = namespace;
        retargets.push((operation.operation_id.clone(), operation.openwhisk.url.clone()));
    }

    for (operation_id, url) in retargets {
        swagger.set_target_url(&operation_id, &url);
    }
    Ok(swagger)
}

/// Listed action matching by name and package (`default` means none).
fn find_action<'a>(listed: &'a [Summary], package: &str, action: &str) -> Option<&'a Summary> {
    let package = (package != DEFAULT_PACKAGE).then_some(package);
    listed
        .iter()
        .find(|summary| summary.name == action && summary.package() == package)
}
