//! # Whisk Platform
//!
//! The remote compute platform as a Rust seam, plus two in-process
//! implementations of it.
//!
//! ## Layers
//!
//! 1. **Wire resources** ([`resource`]) - actions, packages, triggers, feeds,
//!    rules and API gateway routes, serialized with the platform's field names.
//! 2. **Client seam** ([`PlatformClient`]) - create, delete and list per kind,
//!    plus enable/disable for rules. Orchestrators only ever see this trait.
//! 3. **Implementations**
//!    - [`LocalPlatform`]: one [`ResourceStore`] per kind, each running in its
//!      own tokio task and processing requests sequentially. Cross-kind checks
//!      (a rule needs its trigger and action) go through store context.
//!    - [`mock::MockPlatform`]: records calls, keeps created payloads and
//!      returns armed failures.
//!
//! ## Store model
//!
//! A store owns a keyed map and the receiving half of an mpsc channel.
//! [`StoreClient`] is the cloneable sending half; every request carries a
//! oneshot channel for its reply. Entities describe their identity and their
//! referential checks through [`StoredEntity`]:
//!
//! ```rust
//! use whisk_platform::{LocalPlatform, PlatformClient, Trigger};
//!
//! #[tokio::main]
//! async fn main() {
//!     let platform = LocalPlatform::new("guest");
//!     let trigger = Trigger {
//!         name: "svc_hourly".into(),
//!         namespace: None,
//!         overwrite: true,
//!         parameters: vec![],
//!         feed: None,
//!     };
//!     platform.create_trigger(&trigger).await.unwrap();
//!
//!     let listed = platform.list_triggers().await.unwrap();
//!     assert_eq!(listed[0].namespace, "guest");
//!     platform.shutdown().await.unwrap();
//! }
//! ```
//!
//! ## Concurrency
//!
//! Stores run in parallel with each other; requests to one store are
//! processed one at a time, so no store needs a lock. Shutdown is driven by
//! dropping clients, which requires the context graph to stay acyclic.

pub mod actor;
pub mod client;
pub mod client_trait;
pub mod entity;
pub mod error;
pub mod local;
pub mod message;
pub mod mock;
pub mod resource;
pub mod tracing;

pub use actor::ResourceStore;
pub use client::StoreClient;
pub use client_trait::PlatformClient;
pub use entity::StoredEntity;
pub use error::PlatformError;
pub use local::{LocalPlatform, RuleRecord};
pub use message::{Response, StoreRequest};
pub use resource::{
    Action, ActionBody, Exec, Feed, KeyValue, Limits, Package, PackageBinding, PackageBody,
    ResourceId, Route, Rule, Summary, Trigger, DEFAULT_NAMESPACE,
};
