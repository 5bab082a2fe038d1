//! # Store Client
//!
//! Cloneable handle for talking to one [`ResourceStore`](crate::actor::ResourceStore).

use crate::entity::StoredEntity;
use crate::error::PlatformError;
use crate::message::StoreRequest;
use crate::resource::ResourceId;
use tokio::sync::{mpsc, oneshot};

/// Forwards requests over the store's channel and awaits the oneshot reply.
///
/// Holds only a sender, so cloning is cheap. The store shuts down once every
/// clone has been dropped.
pub struct StoreClient<T: StoredEntity> {
    sender: mpsc::Sender<StoreRequest<T>>,
}

impl<T: StoredEntity> Clone for StoreClient<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<T: StoredEntity> StoreClient<T> {
    pub fn new(sender: mpsc::Sender<StoreRequest<T>>) -> Self {
        Self { sender }
    }

    pub async fn put(&self, item: T) -> Result<(), PlatformError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(StoreRequest::Put { item, respond_to })
            .await
            .map_err(|_| PlatformError::Closed)?;
        response.await.map_err(|_| PlatformError::Dropped)?
    }

    pub async fn get(&self, id: ResourceId) -> Result<Option<T>, PlatformError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(StoreRequest::Get { id, respond_to })
            .await
            .map_err(|_| PlatformError::Closed)?;
        response.await.map_err(|_| PlatformError::Dropped)?
    }

    /// Like [`get`](Self::get) but a missing entry is an error.
    pub async fn require(&self, id: ResourceId) -> Result<T, PlatformError> {
        let label = id.to_string();
        self.get(id)
            .await?
            .ok_or_else(|| PlatformError::NotFound(format!("{} {}", T::KIND, label)))
    }

    pub async fn delete(&self, id: ResourceId) -> Result<(), PlatformError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(StoreRequest::Delete { id, respond_to })
            .await
            .map_err(|_| PlatformError::Closed)?;
        response.await.map_err(|_| PlatformError::Dropped)?
    }

    pub async fn list(&self) -> Result<Vec<T>, PlatformError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(StoreRequest::List { respond_to })
            .await
            .map_err(|_| PlatformError::Closed)?;
        response.await.map_err(|_| PlatformError::Dropped)?
    }

    pub async fn perform_action(
        &self,
        id: ResourceId,
        action: T::Action,
    ) -> Result<T::ActionResult, PlatformError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(StoreRequest::Action {
                id,
                action,
                respond_to,
            })
            .await
            .map_err(|_| PlatformError::Closed)?;
        response.await.map_err(|_| PlatformError::Dropped)?
    }
}
