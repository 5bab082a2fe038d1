//! # Deployment Orchestrator
//!
//! Creates compiled resources stage by stage in [`DeployStage::ORDER`].
//! Resources within a stage are created concurrently; the first rejection
//! aborts the run and no later stage starts. Nothing already created is
//! rolled back.

pub mod bindings;
pub mod namespace;

pub use bindings::{BindingTool, CliBindingTool};

use crate::compile::{CompiledResources, ServiceBinding, ServiceBindings, SwaggerDocument};
use crate::error::DeployError;
use crate::ordering::DeployStage;
use futures::future::try_join_all;
use tracing::{debug, info, instrument};
use whisk_platform::{Action, Feed, Package, PlatformClient, PlatformError, Route, Rule, Trigger};

pub struct Deployer<'a> {
    client: &'a dyn PlatformClient,
    binder: &'a dyn BindingTool,
}

impl<'a> Deployer<'a> {
    pub fn new(client: &'a dyn PlatformClient, binder: &'a dyn BindingTool) -> Self {
        Self { client, binder }
    }

    #[instrument(skip_all, fields(service = %resources.service))]
    pub async fn deploy(&self, resources: &CompiledResources) -> Result<(), DeployError> {
        for stage in DeployStage::ORDER {
            self.deploy_stage(stage, resources).await?;
        }
        info!("Deployment successful!");
        Ok(())
    }

    /// Creates one already compiled function.
    #[instrument(skip_all, fields(name = %action.name))]
    pub async fn deploy_function(&self, action: &Action) -> Result<(), DeployError> {
        info!("Deploying function: {}...", action.name);
        self.deploy_action(action).await?;
        info!("Successfully deployed function: {}", action.name);
        Ok(())
    }

    async fn deploy_stage(
        &self,
        stage: DeployStage,
        resources: &CompiledResources,
    ) -> Result<(), DeployError> {
        match stage {
            DeployStage::Packages => self.deploy_packages(&resources.packages).await,
            DeployStage::Functions => self.deploy_actions(stage, &resources.actions).await,
            DeployStage::Sequences => self.deploy_actions(stage, &resources.sequences).await,
            DeployStage::Routes => match &resources.swagger {
                Some(swagger) => self.deploy_routes(swagger).await,
                None => Ok(()),
            },
            DeployStage::Triggers => self.deploy_triggers(&resources.triggers).await,
            DeployStage::Feeds => {
                let feeds: Vec<&Feed> = resources.feeds().collect();
                self.deploy_feeds(&feeds).await
            }
            DeployStage::Rules => self.deploy_rules(&resources.rules).await,
            DeployStage::ServiceBindings => self.configure_bindings(&resources.bindings).await,
        }
    }

    async fn deploy_packages(&self, packages: &[Package]) -> Result<(), DeployError> {
        if !announce(DeployStage::Packages, packages.len()) {
            return Ok(());
        }
        try_join_all(packages.iter().map(|package| async move {
            self.client
                .create_package(package)
                .await
                .map_err(|e| DeployError::deployment("package", &package.name, &e))
        }))
        .await?;
        Ok(())
    }

    async fn deploy_actions(&self, stage: DeployStage, actions: &[Action]) -> Result<(), DeployError> {
        if !announce(stage, actions.len()) {
            return Ok(());
        }
        try_join_all(actions.iter().map(|action| self.deploy_action(action))).await?;
        Ok(())
    }

    async fn deploy_action(&self, action: &Action) -> Result<(), DeployError> {
        debug!(
            name = %action.name,
            kind = action.action.exec.kind(),
            "Creating action"
        );
        self.client
            .create_action(action)
            .await
            .map_err(|e| DeployError::deployment("function", &action.name, &e))
    }

    async fn deploy_routes(&self, swagger: &SwaggerDocument) -> Result<(), DeployError> {
        announce(DeployStage::Routes, swagger.paths.len());
        let swagger = namespace::resolve_placeholders(self.client, swagger.clone()).await?;
        let base_path = swagger.base_path.clone();
        let document = serde_json::to_value(&swagger).map_err(|e| {
            DeployError::deployment(
                "API Gateway definition",
                &base_path,
                &PlatformError::Invalid(e.to_string()),
            )
        })?;

        self.client
            .create_route(&Route {
                base_path: base_path.clone(),
                swagger: document,
            })
            .await
            .map_err(|e| DeployError::deployment("API Gateway definition", &base_path, &e))
    }

    async fn deploy_triggers(&self, triggers: &[Trigger]) -> Result<(), DeployError> {
        if !announce(DeployStage::Triggers, triggers.len()) {
            return Ok(());
        }
        try_join_all(triggers.iter().map(|trigger| async move {
            self.client
                .create_trigger(&trigger.without_feed())
                .await
                .map_err(|e| DeployError::deployment("trigger", &trigger.name, &e))
        }))
        .await?;
        Ok(())
    }

    /// Feeds are re-bound: any existing binding is removed first, ignoring
    /// failures, then the new one is created.
    async fn deploy_feeds(&self, feeds: &[&Feed]) -> Result<(), DeployError> {
        if !announce(DeployStage::Feeds, feeds.len()) {
            return Ok(());
        }
        try_join_all(feeds.iter().map(|feed| async move {
            if let Err(err) = self.client.delete_feed(feed).await {
                debug!(trigger = %feed.trigger, error = %err, "No existing feed to remove");
            }
            self.client
                .create_feed(feed)
                .await
                .map_err(|e| DeployError::deployment("feed", &feed.trigger, &e))
        }))
        .await?;
        Ok(())
    }

    /// Two calls per rule: create, then enable.
    async fn deploy_rules(&self, rules: &[Rule]) -> Result<(), DeployError> {
        if !announce(DeployStage::Rules, rules.len()) {
            return Ok(());
        }
        try_join_all(rules.iter().map(|rule| async move {
            self.client
                .create_rule(rule)
                .await
                .map_err(|e| DeployError::deployment("rule", &rule.name, &e))?;
            self.client
                .enable_rule(&rule.id())
                .await
                .map_err(|e| DeployError::deployment("rule", &rule.name, &e))
        }))
        .await?;
        Ok(())
    }

    /// Package groups before function groups. Bindings inside a group run
    /// in series.
    async fn configure_bindings(&self, bindings: &ServiceBindings) -> Result<(), DeployError> {
        if !announce(
            DeployStage::ServiceBindings,
            bindings.packages.len() + bindings.functions.len(),
        ) {
            return Ok(());
        }
        try_join_all(bindings.packages.iter().map(|group| self.configure_group(group))).await?;
        try_join_all(bindings.functions.iter().map(|group| self.configure_group(group))).await?;
        Ok(())
    }

    async fn configure_group(&self, group: &[ServiceBinding]) -> Result<(), DeployError> {
        for binding in group {
            self.binder.bind(binding).await?;
        }
        Ok(())
    }
}

/// Logs the stage banner. Returns false for an empty stage.
fn announce(stage: DeployStage, count: usize) -> bool {
    if count == 0 {
        return false;
    }
    info!(stage = %stage, count, "{}", stage.progress());
    true
}
