//! # Mock Platform & Testing Guide
//!
//! [`MockPlatform`] implements [`PlatformClient`] entirely in memory. Every
//! call is recorded in order, every created payload is kept, and failures or
//! list responses can be armed up front with a fluent expectation API.
//!
//! ## When to use Mock vs Local
//!
//! | Feature | MockPlatform | LocalPlatform |
//! |---------|--------------|---------------|
//! | **State** | None, calls are recorded | Real keyed stores |
//! | **Referential checks** | None | Rule needs trigger and action, ... |
//! | **Error injection** | Easy (`return_err`) | Only through real conflicts |
//! | **Use case** | Call order and counts of an orchestrator | End-to-end runs |
//!
//! ## Example
//!
//! ```rust
//! use whisk_platform::mock::{Call, MockPlatform};
//! use whisk_platform::{PlatformClient, PlatformError, ResourceId};
//!
//! #[tokio::main]
//! async fn main() {
//!     let mock = MockPlatform::new();
//!     mock.expect_call(Call::DeleteRule("svc_rule".into()))
//!         .return_err(PlatformError::rejected("rule is active"));
//!
//!     let err = mock
//!         .delete_rule(&ResourceId::new(None, "svc_rule"))
//!         .await
//!         .unwrap_err();
//!     assert_eq!(err.message(), "rule is active");
//!     assert_eq!(mock.calls(), vec![Call::DeleteRule("svc_rule".into())]);
//!     mock.verify();
//! }
//! ```

use crate::client_trait::PlatformClient;
use crate::error::PlatformError;
use crate::resource::{Action, Feed, Package, ResourceId, Route, Rule, Summary, Trigger};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

/// One recorded platform call, identified by the resource it touched.
///
/// Names are the resource names as sent (`actionName`, `triggerName`, ...);
/// feeds are identified by their trigger, routes by base path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Call {
    CreateAction(String),
    DeleteAction(String),
    ListActions,
    CreatePackage(String),
    DeletePackage(String),
    ListPackages,
    CreateTrigger(String),
    DeleteTrigger(String),
    ListTriggers,
    CreateFeed(String),
    DeleteFeed(String),
    CreateRule(String),
    EnableRule(String),
    DisableRule(String),
    DeleteRule(String),
    ListRules,
    CreateRoute(String),
    DeleteRoute(String),
    ListRoutes,
}

impl Call {
    /// True for the create verbs of every kind.
    pub fn is_create(&self) -> bool {
        matches!(
            self,
            Call::CreateAction(_)
                | Call::CreatePackage(_)
                | Call::CreateTrigger(_)
                | Call::CreateFeed(_)
                | Call::CreateRule(_)
                | Call::CreateRoute(_)
        )
    }
}

#[derive(Default)]
struct MockState {
    calls: Vec<Call>,
    failures: HashMap<Call, VecDeque<PlatformError>>,
    action_listings: VecDeque<Vec<Summary>>,
    actions: Vec<Action>,
    packages: Vec<Package>,
    triggers: Vec<Trigger>,
    feeds: Vec<Feed>,
    rules: Vec<Rule>,
    routes: Vec<Route>,
}

/// Recording [`PlatformClient`] for tests.
///
/// Clones share state, so a clone handed to the code under test can be
/// inspected through the original.
#[derive(Clone, Default)]
pub struct MockPlatform {
    state: Arc<Mutex<MockState>>,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms a failure for the next matching call.
    pub fn expect_call(&self, call: Call) -> CallExpectationBuilder {
        CallExpectationBuilder {
            call,
            state: self.state.clone(),
        }
    }

    /// Arms the response of the next `list_actions` call. Unarmed calls
    /// return an empty list.
    pub fn expect_list_actions(&self) -> ListActionsExpectationBuilder {
        ListActionsExpectationBuilder {
            state: self.state.clone(),
        }
    }

    /// Every call so far, in the order it was made.
    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    /// Number of recorded calls equal to `call`.
    pub fn count(&self, call: &Call) -> usize {
        self.lock().calls.iter().filter(|c| *c == call).count()
    }

    pub fn actions(&self) -> Vec<Action> {
        self.lock().actions.clone()
    }

    pub fn packages(&self) -> Vec<Package> {
        self.lock().packages.clone()
    }

    pub fn triggers(&self) -> Vec<Trigger> {
        self.lock().triggers.clone()
    }

    pub fn feeds(&self) -> Vec<Feed> {
        self.lock().feeds.clone()
    }

    pub fn rules(&self) -> Vec<Rule> {
        self.lock().rules.clone()
    }

    pub fn routes(&self) -> Vec<Route> {
        self.lock().routes.clone()
    }

    /// Panics if an armed failure or listing was never consumed.
    pub fn verify(&self) {
        let state = self.lock();
        let pending: usize = state.failures.values().map(VecDeque::len).sum();
        if pending > 0 || !state.action_listings.is_empty() {
            panic!(
                "Not all expectations were met. {} failures and {} listings remaining",
                pending,
                state.action_listings.len()
            );
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        // A test that panicked while holding the lock already failed.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Records `call` and returns the armed failure, if any.
    fn record(&self, call: Call) -> Result<(), PlatformError> {
        let mut state = self.lock();
        state.calls.push(call.clone());
        match state.failures.get_mut(&call).and_then(VecDeque::pop_front) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Builder for a single armed failure.
pub struct CallExpectationBuilder {
    call: Call,
    state: Arc<Mutex<MockState>>,
}

impl CallExpectationBuilder {
    /// The matching call fails with `error`.
    pub fn return_err(self, error: PlatformError) {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        state.failures.entry(self.call).or_default().push_back(error);
    }
}

/// Builder for an armed `list_actions` response.
pub struct ListActionsExpectationBuilder {
    state: Arc<Mutex<MockState>>,
}

impl ListActionsExpectationBuilder {
    pub fn return_ok(self, listing: Vec<Summary>) {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        state.action_listings.push_back(listing);
    }

    pub fn return_err(self, error: PlatformError) {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        state
            .failures
            .entry(Call::ListActions)
            .or_default()
            .push_back(error);
    }
}

#[async_trait]
impl PlatformClient for MockPlatform {
    async fn create_action(&self, action: &Action) -> Result<(), PlatformError> {
        self.record(Call::CreateAction(action.name.clone()))?;
        self.lock().actions.push(action.clone());
        Ok(())
    }

    async fn delete_action(&self, id: &ResourceId) -> Result<(), PlatformError> {
        self.record(Call::DeleteAction(id.name.clone()))
    }

    async fn list_actions(&self) -> Result<Vec<Summary>, PlatformError> {
        self.record(Call::ListActions)?;
        Ok(self.lock().action_listings.pop_front().unwrap_or_default())
    }

    async fn create_package(&self, package: &Package) -> Result<(), PlatformError> {
        self.record(Call::CreatePackage(package.name.clone()))?;
        self.lock().packages.push(package.clone());
        Ok(())
    }

    async fn delete_package(&self, id: &ResourceId) -> Result<(), PlatformError> {
        self.record(Call::DeletePackage(id.name.clone()))
    }

    async fn list_packages(&self) -> Result<Vec<Summary>, PlatformError> {
        self.record(Call::ListPackages)?;
        Ok(Vec::new())
    }

    async fn create_trigger(&self, trigger: &Trigger) -> Result<(), PlatformError> {
        self.record(Call::CreateTrigger(trigger.name.clone()))?;
        self.lock().triggers.push(trigger.clone());
        Ok(())
    }

    async fn delete_trigger(&self, id: &ResourceId) -> Result<(), PlatformError> {
        self.record(Call::DeleteTrigger(id.name.clone()))
    }

    async fn list_triggers(&self) -> Result<Vec<Summary>, PlatformError> {
        self.record(Call::ListTriggers)?;
        Ok(Vec::new())
    }

    async fn create_feed(&self, feed: &Feed) -> Result<(), PlatformError> {
        self.record(Call::CreateFeed(feed.trigger.clone()))?;
        self.lock().feeds.push(feed.clone());
        Ok(())
    }

    async fn delete_feed(&self, feed: &Feed) -> Result<(), PlatformError> {
        self.record(Call::DeleteFeed(feed.trigger.clone()))
    }

    async fn create_rule(&self, rule: &Rule) -> Result<(), PlatformError> {
        self.record(Call::CreateRule(rule.name.clone()))?;
        self.lock().rules.push(rule.clone());
        Ok(())
    }

    async fn enable_rule(&self, id: &ResourceId) -> Result<(), PlatformError> {
        self.record(Call::EnableRule(id.name.clone()))
    }

    async fn disable_rule(&self, id: &ResourceId) -> Result<(), PlatformError> {
        self.record(Call::DisableRule(id.name.clone()))
    }

    async fn delete_rule(&self, id: &ResourceId) -> Result<(), PlatformError> {
        self.record(Call::DeleteRule(id.name.clone()))
    }

    async fn list_rules(&self) -> Result<Vec<Summary>, PlatformError> {
        self.record(Call::ListRules)?;
        Ok(Vec::new())
    }

    async fn create_route(&self, route: &Route) -> Result<(), PlatformError> {
        self.record(Call::CreateRoute(route.base_path.clone()))?;
        self.lock().routes.push(route.clone());
        Ok(())
    }

    async fn delete_route(&self, base_path: &str) -> Result<(), PlatformError> {
        self.record(Call::DeleteRoute(base_path.to_string()))
    }

    async fn list_routes(&self) -> Result<Vec<Route>, PlatformError> {
        self.record(Call::ListRoutes)?;
        Ok(self.lock().routes.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::PackageBody;

    fn package(name: &str) -> Package {
        Package {
            name: name.to_string(),
            namespace: None,
            overwrite: true,
            package: PackageBody::default(),
        }
    }

    #[tokio::test]
    async fn test_mock_records_calls_and_payloads() {
        let mock = MockPlatform::new();
        let client: &dyn PlatformClient = &mock;

        client.create_package(&package("utils")).await.unwrap();
        client
            .delete_package(&ResourceId::new(None, "utils"))
            .await
            .unwrap();

        assert_eq!(
            mock.calls(),
            vec![
                Call::CreatePackage("utils".into()),
                Call::DeletePackage("utils".into())
            ]
        );
        assert_eq!(mock.packages()[0].name, "utils");
        mock.verify();
    }

    #[tokio::test]
    async fn test_mock_armed_failure_fires_once() {
        let mock = MockPlatform::new();
        mock.expect_call(Call::CreatePackage("utils".into()))
            .return_err(PlatformError::rejected("boom"));

        let err = mock.create_package(&package("utils")).await.unwrap_err();
        assert_eq!(err, PlatformError::Rejected("boom".into()));
        assert!(mock.packages().is_empty());

        mock.create_package(&package("utils")).await.unwrap();
        assert_eq!(mock.count(&Call::CreatePackage("utils".into())), 2);
        mock.verify();
    }

    #[tokio::test]
    async fn test_mock_list_actions_returns_armed_listing() {
        let mock = MockPlatform::new();
        mock.expect_list_actions()
            .return_ok(vec![Summary::new("guest", "svc_hello")]);

        let listed = mock.list_actions().await.unwrap();
        assert_eq!(listed, vec![Summary::new("guest", "svc_hello")]);
        assert!(mock.list_actions().await.unwrap().is_empty());
        mock.verify();
    }

    #[tokio::test]
    #[should_panic(expected = "Not all expectations were met")]
    async fn test_mock_verify_reports_unused_failures() {
        let mock = MockPlatform::new();
        mock.expect_call(Call::ListRules)
            .return_err(PlatformError::rejected("unused"));
        mock.verify();
    }
}
