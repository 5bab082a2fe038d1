//! # PlatformClient Trait
//!
//! The remote compute platform as seen by the orchestrators: create, delete
//! and list verbs per resource kind, plus enable/disable for rules. Every verb
//! is an independent future; callers decide how to compose them.
use crate::error::PlatformError;
use crate::resource::{Action, Feed, Package, ResourceId, Route, Rule, Summary, Trigger};
use async_trait::async_trait;

/// Remote CRUD surface of the platform.
///
/// Implementations must be shareable across concurrently running calls
/// (`&self` everywhere). [`LocalPlatform`](crate::LocalPlatform) keeps state
/// in-process and [`MockPlatform`](crate::mock::MockPlatform) records calls for
/// tests.
#[async_trait]
pub trait PlatformClient: Send + Sync {
    async fn create_action(&self, action: &Action) -> Result<(), PlatformError>;
    async fn delete_action(&self, id: &ResourceId) -> Result<(), PlatformError>;
    async fn list_actions(&self) -> Result<Vec<Summary>, PlatformError>;

    async fn create_package(&self, package: &Package) -> Result<(), PlatformError>;
    async fn delete_package(&self, id: &ResourceId) -> Result<(), PlatformError>;
    async fn list_packages(&self) -> Result<Vec<Summary>, PlatformError>;

    async fn create_trigger(&self, trigger: &Trigger) -> Result<(), PlatformError>;
    async fn delete_trigger(&self, id: &ResourceId) -> Result<(), PlatformError>;
    async fn list_triggers(&self) -> Result<Vec<Summary>, PlatformError>;

    async fn create_feed(&self, feed: &Feed) -> Result<(), PlatformError>;
    async fn delete_feed(&self, feed: &Feed) -> Result<(), PlatformError>;

    async fn create_rule(&self, rule: &Rule) -> Result<(), PlatformError>;
    async fn enable_rule(&self, id: &ResourceId) -> Result<(), PlatformError>;
    async fn disable_rule(&self, id: &ResourceId) -> Result<(), PlatformError>;
    async fn delete_rule(&self, id: &ResourceId) -> Result<(), PlatformError>;
    async fn list_rules(&self) -> Result<Vec<Summary>, PlatformError>;

    async fn create_route(&self, route: &Route) -> Result<(), PlatformError>;
    async fn delete_route(&self, base_path: &str) -> Result<(), PlatformError>;
    async fn list_routes(&self) -> Result<Vec<Route>, PlatformError>;
}
