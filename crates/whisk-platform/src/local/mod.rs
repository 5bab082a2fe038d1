//! # Local Platform
//!
//! An in-process platform: one [`ResourceStore`] per resource kind, wired
//! together through store context so that referential rules hold the way a
//! remote platform enforces them.
//!
//! ## Wiring
//!
//! Stores are created first, without dependencies, and receive the clients
//! they consult when they start running:
//!
//! | Store   | Context                 | Checks on create                    |
//! |---------|-------------------------|-------------------------------------|
//! | package | `()`                    | binding complete                    |
//! | action  | package client          | `pkg/action` needs `pkg`            |
//! | trigger | `()`                    |                                     |
//! | feed    | trigger client          | trigger exists                      |
//! | rule    | trigger + action client | trigger and action exist            |
//! | route   | action client           | every target resolved and existing  |
//!
//! ## Shutdown
//!
//! [`LocalPlatform::shutdown`] drops the outer clients and awaits every store.
//! Stores holding clients of other stores stop first, releasing those in turn.

mod entities;

pub use entities::{RuleCommand, RuleRecord};

use crate::actor::ResourceStore;
use crate::client::StoreClient;
use crate::client_trait::PlatformClient;
use crate::error::PlatformError;
use crate::resource::{Action, Feed, Package, ResourceId, Route, Rule, Summary, Trigger};
use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{info, instrument};

const STORE_BUFFER: usize = 64;

pub struct LocalPlatform {
    namespace: String,
    actions: StoreClient<Action>,
    packages: StoreClient<Package>,
    triggers: StoreClient<Trigger>,
    feeds: StoreClient<Feed>,
    rules: StoreClient<RuleRecord>,
    routes: StoreClient<Route>,
    handles: Vec<JoinHandle<()>>,
}

impl LocalPlatform {
    /// Starts every store. Resources addressed with `_` or without a
    /// namespace live in `namespace`.
    pub fn new(namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();

        let (package_store, packages) = ResourceStore::<Package>::new(STORE_BUFFER, &namespace);
        let (action_store, actions) = ResourceStore::<Action>::new(STORE_BUFFER, &namespace);
        let (trigger_store, triggers) = ResourceStore::<Trigger>::new(STORE_BUFFER, &namespace);
        let (feed_store, feeds) = ResourceStore::<Feed>::new(STORE_BUFFER, &namespace);
        let (rule_store, rules) = ResourceStore::<RuleRecord>::new(STORE_BUFFER, &namespace);
        let (route_store, routes) = ResourceStore::<Route>::new(STORE_BUFFER, &namespace);

        let handles = vec![
            tokio::spawn(package_store.run(())),
            tokio::spawn(action_store.run(packages.clone())),
            tokio::spawn(trigger_store.run(())),
            tokio::spawn(feed_store.run(triggers.clone())),
            tokio::spawn(rule_store.run((triggers.clone(), actions.clone()))),
            tokio::spawn(route_store.run(actions.clone())),
        ];

        info!(namespace = %namespace, "Local platform started");

        Self {
            namespace,
            actions,
            packages,
            triggers,
            feeds,
            rules,
            routes,
            handles,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Looks up a stored action.
    pub async fn get_action(&self, id: &ResourceId) -> Result<Option<Action>, PlatformError> {
        self.actions.get(id.clone()).await
    }

    /// Looks up a stored trigger.
    pub async fn get_trigger(&self, id: &ResourceId) -> Result<Option<Trigger>, PlatformError> {
        self.triggers.get(id.clone()).await
    }

    /// Looks up the feed bound to a trigger.
    pub async fn get_feed(&self, trigger: &ResourceId) -> Result<Option<Feed>, PlatformError> {
        self.feeds.get(trigger.clone()).await
    }

    /// Looks up a stored rule together with its activation state.
    pub async fn get_rule(&self, id: &ResourceId) -> Result<Option<RuleRecord>, PlatformError> {
        self.rules.get(id.clone()).await
    }

    /// Looks up a route by base path.
    pub async fn get_route(&self, base_path: &str) -> Result<Option<Route>, PlatformError> {
        self.routes.get(ResourceId::new(None, base_path)).await
    }

    /// Drops every client and waits for the stores to drain.
    pub async fn shutdown(self) -> Result<(), String> {
        let Self {
            actions,
            packages,
            triggers,
            feeds,
            rules,
            routes,
            handles,
            ..
        } = self;
        drop(actions);
        drop(packages);
        drop(triggers);
        drop(feeds);
        drop(rules);
        drop(routes);

        for handle in handles {
            handle
                .await
                .map_err(|e| format!("store task failed: {}", e))?;
        }
        info!("Local platform stopped");
        Ok(())
    }

    fn summary(&self, id: &ResourceId) -> Summary {
        Summary::new(id.namespace_or(&self.namespace), id.name.clone())
    }
}

#[async_trait]
impl PlatformClient for LocalPlatform {
    #[instrument(skip_all, fields(name = %action.name))]
    async fn create_action(&self, action: &Action) -> Result<(), PlatformError> {
        self.actions.put(action.clone()).await
    }

    async fn delete_action(&self, id: &ResourceId) -> Result<(), PlatformError> {
        self.actions.delete(id.clone()).await
    }

    /// Actions inside a package are listed with namespace `ns/pkg`.
    async fn list_actions(&self) -> Result<Vec<Summary>, PlatformError> {
        let actions = self.actions.list().await?;
        Ok(actions
            .iter()
            .map(|action| {
                let id = action.id();
                let namespace = id.namespace_or(&self.namespace);
                match action.name.split_once('/') {
                    Some((package, name)) => {
                        Summary::new(format!("{}/{}", namespace, package), name)
                    }
                    None => Summary::new(namespace, action.name.clone()),
                }
            })
            .collect())
    }

    #[instrument(skip_all, fields(name = %package.name))]
    async fn create_package(&self, package: &Package) -> Result<(), PlatformError> {
        self.packages.put(package.clone()).await
    }

    async fn delete_package(&self, id: &ResourceId) -> Result<(), PlatformError> {
        self.packages.delete(id.clone()).await
    }

    async fn list_packages(&self) -> Result<Vec<Summary>, PlatformError> {
        let packages = self.packages.list().await?;
        Ok(packages.iter().map(|p| self.summary(&p.id())).collect())
    }

    #[instrument(skip_all, fields(name = %trigger.name))]
    async fn create_trigger(&self, trigger: &Trigger) -> Result<(), PlatformError> {
        self.triggers.put(trigger.clone()).await
    }

    async fn delete_trigger(&self, id: &ResourceId) -> Result<(), PlatformError> {
        self.triggers.delete(id.clone()).await
    }

    async fn list_triggers(&self) -> Result<Vec<Summary>, PlatformError> {
        let triggers = self.triggers.list().await?;
        Ok(triggers.iter().map(|t| self.summary(&t.id())).collect())
    }

    #[instrument(skip_all, fields(trigger = %feed.trigger))]
    async fn create_feed(&self, feed: &Feed) -> Result<(), PlatformError> {
        self.feeds.put(feed.clone()).await
    }

    async fn delete_feed(&self, feed: &Feed) -> Result<(), PlatformError> {
        self.feeds.delete(feed.trigger_id()).await
    }

    #[instrument(skip_all, fields(name = %rule.name))]
    async fn create_rule(&self, rule: &Rule) -> Result<(), PlatformError> {
        self.rules
            .put(RuleRecord {
                rule: rule.clone(),
                active: false,
            })
            .await
    }

    async fn enable_rule(&self, id: &ResourceId) -> Result<(), PlatformError> {
        self.rules
            .perform_action(id.clone(), RuleCommand::Enable)
            .await
    }

    async fn disable_rule(&self, id: &ResourceId) -> Result<(), PlatformError> {
        self.rules
            .perform_action(id.clone(), RuleCommand::Disable)
            .await
    }

    async fn delete_rule(&self, id: &ResourceId) -> Result<(), PlatformError> {
        self.rules.delete(id.clone()).await
    }

    async fn list_rules(&self) -> Result<Vec<Summary>, PlatformError> {
        let rules = self.rules.list().await?;
        Ok(rules.iter().map(|r| self.summary(&r.rule.id())).collect())
    }

    #[instrument(skip_all, fields(basepath = %route.base_path))]
    async fn create_route(&self, route: &Route) -> Result<(), PlatformError> {
        self.routes.put(route.clone()).await
    }

    async fn delete_route(&self, base_path: &str) -> Result<(), PlatformError> {
        self.routes.delete(ResourceId::new(None, base_path)).await
    }

    async fn list_routes(&self) -> Result<Vec<Route>, PlatformError> {
        self.routes.list().await
    }
}
