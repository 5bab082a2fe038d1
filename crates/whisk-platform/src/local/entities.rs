//! `StoredEntity` implementations for every platform resource kind.
//!
//! Referential checks live in `on_create`, with the stores they consult
//! injected as context. The dependency graph is acyclic, so dropping the
//! outer clients shuts every store down:
//!
//! ```text
//! package <- action <- rule -> trigger <- feed
//!              ^
//!            route
//! ```

use crate::client::StoreClient;
use crate::entity::StoredEntity;
use crate::error::PlatformError;
use crate::resource::{Action, Feed, Package, ResourceId, Route, Rule, Trigger, DEFAULT_NAMESPACE};
use async_trait::async_trait;
use serde_json::Value;
use std::convert::Infallible;

#[async_trait]
impl StoredEntity for Package {
    const KIND: &'static str = "package";
    type Context = ();
    type Action = Infallible;
    type ActionResult = ();

    fn id(&self) -> ResourceId {
        Package::id(self)
    }

    fn overwrite(&self) -> bool {
        self.overwrite
    }

    async fn on_create(&mut self, _ctx: &()) -> Result<(), PlatformError> {
        if let Some(binding) = &self.package.binding {
            if binding.namespace.is_empty() || binding.name.is_empty() {
                return Err(PlatformError::Invalid(format!(
                    "package {} has an incomplete binding",
                    self.name
                )));
            }
        }
        Ok(())
    }

    async fn handle_action(&mut self, action: Infallible, _ctx: &()) -> Result<(), PlatformError> {
        match action {}
    }
}

#[async_trait]
impl StoredEntity for Action {
    const KIND: &'static str = "action";
    type Context = StoreClient<Package>;
    type Action = Infallible;
    type ActionResult = ();

    fn id(&self) -> ResourceId {
        Action::id(self)
    }

    fn overwrite(&self) -> bool {
        self.overwrite
    }

    async fn on_create(&mut self, packages: &StoreClient<Package>) -> Result<(), PlatformError> {
        if let Some(package) = self.package() {
            packages
                .require(ResourceId::new(self.namespace.clone(), package))
                .await?;
        }
        Ok(())
    }

    async fn handle_action(
        &mut self,
        action: Infallible,
        _ctx: &StoreClient<Package>,
    ) -> Result<(), PlatformError> {
        match action {}
    }
}

#[async_trait]
impl StoredEntity for Trigger {
    const KIND: &'static str = "trigger";
    type Context = ();
    type Action = Infallible;
    type ActionResult = ();

    fn id(&self) -> ResourceId {
        Trigger::id(self)
    }

    fn overwrite(&self) -> bool {
        self.overwrite
    }

    async fn handle_action(&mut self, action: Infallible, _ctx: &()) -> Result<(), PlatformError> {
        match action {}
    }
}

/// Feeds are keyed by the trigger they activate: one feed per trigger.
#[async_trait]
impl StoredEntity for Feed {
    const KIND: &'static str = "feed";
    type Context = StoreClient<Trigger>;
    type Action = Infallible;
    type ActionResult = ();

    fn id(&self) -> ResourceId {
        self.trigger_id()
    }

    fn overwrite(&self) -> bool {
        false
    }

    async fn on_create(&mut self, triggers: &StoreClient<Trigger>) -> Result<(), PlatformError> {
        if self.feed_name.is_empty() || self.namespace.is_empty() {
            return Err(PlatformError::Invalid(format!(
                "feed for {} is missing its feed action",
                self.trigger
            )));
        }
        triggers.require(self.trigger_id()).await?;
        Ok(())
    }

    async fn handle_action(
        &mut self,
        action: Infallible,
        _ctx: &StoreClient<Trigger>,
    ) -> Result<(), PlatformError> {
        match action {}
    }
}

/// A rule as the platform holds it: the definition plus its activation state.
/// Rules are created inactive.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleRecord {
    pub rule: Rule,
    pub active: bool,
}

#[derive(Debug)]
pub enum RuleCommand {
    Enable,
    Disable,
}

#[async_trait]
impl StoredEntity for RuleRecord {
    const KIND: &'static str = "rule";
    type Context = (StoreClient<Trigger>, StoreClient<Action>);
    type Action = RuleCommand;
    type ActionResult = ();

    fn id(&self) -> ResourceId {
        self.rule.id()
    }

    fn overwrite(&self) -> bool {
        self.rule.overwrite
    }

    async fn on_create(&mut self, ctx: &Self::Context) -> Result<(), PlatformError> {
        let (triggers, actions) = ctx;
        triggers.require(ResourceId::parse(&self.rule.trigger)).await?;
        actions.require(ResourceId::parse(&self.rule.action)).await?;
        self.active = false;
        Ok(())
    }

    async fn handle_action(
        &mut self,
        action: RuleCommand,
        _ctx: &Self::Context,
    ) -> Result<(), PlatformError> {
        self.active = matches!(action, RuleCommand::Enable);
        Ok(())
    }
}

#[async_trait]
impl StoredEntity for Route {
    const KIND: &'static str = "route";
    type Context = StoreClient<Action>;
    type Action = Infallible;
    type ActionResult = ();

    fn id(&self) -> ResourceId {
        Route::id(self)
    }

    /// Each operation's `x-openwhisk` target must name an existing action
    /// in a concrete namespace.
    async fn on_create(&mut self, actions: &StoreClient<Action>) -> Result<(), PlatformError> {
        for target in route_targets(&self.swagger)? {
            if matches!(target.namespace.as_deref(), None | Some("") | Some(DEFAULT_NAMESPACE)) {
                return Err(PlatformError::Invalid(format!(
                    "route {} targets {} with an unresolved namespace",
                    self.base_path, target.name
                )));
            }
            actions.require(target).await?;
        }
        Ok(())
    }

    async fn handle_action(
        &mut self,
        action: Infallible,
        _ctx: &StoreClient<Action>,
    ) -> Result<(), PlatformError> {
        match action {}
    }
}

/// Action identifiers referenced by the `x-openwhisk` blocks of a swagger document.
fn route_targets(swagger: &Value) -> Result<Vec<ResourceId>, PlatformError> {
    let paths = swagger
        .get("paths")
        .and_then(Value::as_object)
        .ok_or_else(|| PlatformError::Invalid("swagger document has no paths".to_string()))?;

    let mut targets = Vec::new();
    for operations in paths.values().filter_map(Value::as_object) {
        for operation in operations.values() {
            let Some(openwhisk) = operation.get("x-openwhisk") else {
                continue;
            };
            let field = |key: &str| {
                openwhisk
                    .get(key)
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .ok_or_else(|| {
                        PlatformError::Invalid(format!("x-openwhisk block is missing {}", key))
                    })
            };
            let action = field("action")?;
            let namespace = field("namespace")?;
            let name = match field("package")?.as_str() {
                "default" => action,
                package => format!("{}/{}", package, action),
            };
            targets.push(ResourceId::new(Some(namespace), name));
        }
    }
    Ok(targets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_route_targets_resolve_default_package() {
        let swagger = json!({
            "paths": {
                "/hello": {
                    "get": {"x-openwhisk": {"namespace": "guest", "package": "default", "action": "svc_hello"}},
                    "post": {"x-openwhisk": {"namespace": "guest", "package": "utils", "action": "echo"}}
                }
            }
        });
        let mut targets = route_targets(&swagger).unwrap();
        targets.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(targets[0], ResourceId::new(Some("guest".into()), "svc_hello"));
        assert_eq!(targets[1], ResourceId::new(Some("guest".into()), "utils/echo"));
    }

    #[test]
    fn test_route_targets_require_openwhisk_fields() {
        let swagger = json!({"paths": {"/a": {"get": {"x-openwhisk": {"namespace": "guest"}}}}});
        assert!(matches!(
            route_targets(&swagger),
            Err(PlatformError::Invalid(_))
        ));
        assert!(route_targets(&json!({})).is_err());
    }
}
