//! # Removal Orchestrator
//!
//! Deletes everything a deployment of the same manifest created, stage by
//! stage in [`RemovalStage::ORDER`]. Names are recomputed from the manifest
//! with the same naming rules deploy uses; nothing is read back from a
//! previous run.
//!
//! Removal never aborts. Each rejected delete is logged and collected in
//! the returned [`RemovalReport`], and the next stage still runs.

use crate::compile::{events, packages, triggers};
use crate::error::{DeployError, RemovalError, RemovalReport};
use crate::manifest::Manifest;
use crate::naming;
use crate::ordering::RemovalStage;
use futures::future::join_all;
use std::future::Future;
use tracing::{debug, info, instrument, warn};
use whisk_platform::{Feed, PlatformClient, PlatformError, ResourceId};

/// Identifiers of every resource a manifest deploys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemovalPlan {
    pub service: String,
    /// API gateway base paths.
    pub routes: Vec<String>,
    pub rules: Vec<ResourceId>,
    pub functions: Vec<ResourceId>,
    pub packages: Vec<ResourceId>,
    pub triggers: Vec<ResourceId>,
    pub feeds: Vec<Feed>,
}

impl RemovalPlan {
    /// Derives resource names without packaging any code. Feed credentials
    /// are not required.
    pub fn from_manifest(manifest: &Manifest) -> Result<Self, DeployError> {
        let intents = events::expand_names(manifest)?;
        let registry = triggers::registry(manifest, &intents);

        let routes = if manifest.has_http_events() {
            vec![naming::base_path(manifest)]
        } else {
            Vec::new()
        };

        let rules = intents
            .iter()
            .filter_map(|intent| {
                let function = manifest.function(&intent.function)?;
                Some(ResourceId::new(
                    naming::function_namespace(manifest, function),
                    intent.rule.clone(),
                ))
            })
            .collect();

        let functions = manifest
            .functions
            .iter()
            .map(|(key, function)| {
                ResourceId::new(
                    naming::function_namespace(manifest, function),
                    naming::function_name(&manifest.service, key, function),
                )
            })
            .collect();

        let packages = packages::package_names(manifest)
            .into_iter()
            .map(|(name, namespace)| ResourceId::new(namespace, name))
            .collect();

        let mut trigger_ids = Vec::new();
        let mut feeds = Vec::new();
        for (name, def) in &registry {
            let trigger = triggers::compile_trigger(manifest, name, def)?;
            trigger_ids.push(trigger.id());
            feeds.extend(trigger.feed);
        }

        Ok(Self {
            service: manifest.service.clone(),
            routes,
            rules,
            functions,
            packages,
            triggers: trigger_ids,
            feeds,
        })
    }
}

pub struct Remover<'a> {
    client: &'a dyn PlatformClient,
}

impl<'a> Remover<'a> {
    pub fn new(client: &'a dyn PlatformClient) -> Self {
        Self { client }
    }

    #[instrument(skip_all, fields(service = %plan.service))]
    pub async fn remove(&self, plan: &RemovalPlan) -> RemovalReport {
        let mut report = RemovalReport::default();
        for stage in RemovalStage::ORDER {
            report.failures.extend(self.remove_stage(stage, plan).await);
        }
        info!(failures = report.failures.len(), "Resource removal successful!");
        report
    }

    async fn remove_stage(&self, stage: RemovalStage, plan: &RemovalPlan) -> Vec<RemovalError> {
        let client = self.client;
        match stage {
            RemovalStage::Routes => {
                run_stage(
                    stage,
                    plan.routes
                        .iter()
                        .map(|base_path| (base_path.clone(), client.delete_route(base_path)))
                        .collect(),
                )
                .await
            }
            RemovalStage::Rules => {
                run_stage(
                    stage,
                    plan.rules
                        .iter()
                        .map(|id| {
                            let call = async move {
                                // An active rule cannot always be deleted directly.
                                if let Err(err) = client.disable_rule(id).await {
                                    debug!(rule = %id.name, error = %err, "Unable to disable rule");
                                }
                                client.delete_rule(id).await
                            };
                            (id.name.clone(), call)
                        })
                        .collect(),
                )
                .await
            }
            RemovalStage::Functions => {
                run_stage(
                    stage,
                    plan.functions
                        .iter()
                        .map(|id| (id.name.clone(), client.delete_action(id)))
                        .collect(),
                )
                .await
            }
            RemovalStage::Packages => {
                run_stage(
                    stage,
                    plan.packages
                        .iter()
                        .map(|id| (id.name.clone(), client.delete_package(id)))
                        .collect(),
                )
                .await
            }
            RemovalStage::Triggers => {
                run_stage(
                    stage,
                    plan.triggers
                        .iter()
                        .map(|id| (id.name.clone(), client.delete_trigger(id)))
                        .collect(),
                )
                .await
            }
            RemovalStage::Feeds => {
                run_stage(
                    stage,
                    plan.feeds
                        .iter()
                        .map(|feed| (feed.trigger.clone(), client.delete_feed(feed)))
                        .collect(),
                )
                .await
            }
        }
    }
}

/// Runs one stage's deletes concurrently and turns every rejection into a
/// logged [`RemovalError`].
async fn run_stage<F>(stage: RemovalStage, calls: Vec<(String, F)>) -> Vec<RemovalError>
where
    F: Future<Output = Result<(), PlatformError>>,
{
    if calls.is_empty() {
        return Vec::new();
    }
    info!(stage = %stage, count = calls.len(), "{}", stage.progress());

    let outcomes = join_all(
        calls
            .into_iter()
            .map(|(resource, call)| async move { call.await.map_err(|err| (resource, err)) }),
    )
    .await;

    outcomes
        .into_iter()
        .filter_map(Result::err)
        .map(|(resource, err)| {
            let failure = RemovalError {
                operation: stage.operation(),
                resource,
                message: err.message(),
            };
            warn!("{}", failure);
            failure
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SERVICE: &str = r#"
service: svc
provider:
  namespace: guest
functions:
  hello:
    handler: handler.main
    name: utils/hello
    events:
      - http: GET /hello
      - trigger: tick
      - schedule: cron(* * * * *)
resources:
  triggers:
    tick:
  packages:
    extra:
"#;

    #[test]
    fn test_plan_recomputes_deployed_names() {
        let manifest = Manifest::from_yaml_str(SERVICE).unwrap();
        let plan = RemovalPlan::from_manifest(&manifest).unwrap();
        let guest = || Some("guest".to_string());

        assert_eq!(plan.routes, vec!["/svc".to_string()]);
        assert_eq!(
            plan.rules,
            vec![
                ResourceId::new(guest(), "svc_tick_to_hello"),
                ResourceId::new(guest(), "svc_hello_schedule_rule"),
            ]
        );
        assert_eq!(plan.functions, vec![ResourceId::new(guest(), "utils/hello")]);
        assert_eq!(
            plan.packages,
            vec![
                ResourceId::new(guest(), "extra"),
                ResourceId::new(guest(), "utils"),
            ]
        );
        assert_eq!(
            plan.triggers,
            vec![
                ResourceId::new(guest(), "svc_hello_schedule_trigger"),
                ResourceId::new(guest(), "tick"),
            ]
        );
        assert_eq!(plan.feeds.len(), 1);
        assert_eq!(plan.feeds[0].namespace, "whisk.system");
        assert_eq!(plan.feeds[0].feed_name, "alarms/alarm");
    }

    #[test]
    fn test_plan_without_http_events_has_no_routes() {
        let manifest =
            Manifest::from_yaml_str("service: svc\nfunctions:\n  hello:\n    handler: h.main\n")
                .unwrap();
        let plan = RemovalPlan::from_manifest(&manifest).unwrap();
        assert!(plan.routes.is_empty());
        assert!(plan.feeds.is_empty());
    }
}
