//! # StoredEntity Trait
//!
//! Contract every resource kind satisfies to live in a [`ResourceStore`](crate::actor::ResourceStore).
//! The store owns the keyed map and the message loop; the entity supplies its
//! identity, its overwrite policy and the referential checks it needs before
//! it may be stored.
//!
//! Checks that span kinds (a rule needs its trigger and action) go through
//! the `Context`, which is injected when the store starts running. That keeps
//! construction order free of dependencies.

use crate::error::PlatformError;
use crate::resource::ResourceId;
use async_trait::async_trait;
use std::fmt::Debug;

#[async_trait]
pub trait StoredEntity: Clone + Send + Sync + Debug + 'static {
    /// Kind label used in logs and error messages.
    const KIND: &'static str;

    /// Other stores this kind needs to consult. Use `()` when none.
    type Context: Send + Sync;

    /// Kind-specific operations beyond put/get/delete/list.
    type Action: Send + Sync + Debug;

    type ActionResult: Send + Sync + Debug;

    fn id(&self) -> ResourceId;

    /// Whether a put may replace an existing entry with the same key.
    fn overwrite(&self) -> bool {
        true
    }

    /// Runs before the entity is inserted. An error rejects the put.
    async fn on_create(&mut self, _ctx: &Self::Context) -> Result<(), PlatformError> {
        Ok(())
    }

    /// Runs before the entity is removed. An error rejects the delete.
    async fn on_delete(&self, _ctx: &Self::Context) -> Result<(), PlatformError> {
        Ok(())
    }

    async fn handle_action(
        &mut self,
        action: Self::Action,
        _ctx: &Self::Context,
    ) -> Result<Self::ActionResult, PlatformError>;
}
