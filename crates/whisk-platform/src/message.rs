//! # Store Messages
//!
//! Requests sent from a [`StoreClient`](crate::client::StoreClient) to its
//! [`ResourceStore`](crate::actor::ResourceStore), each carrying a oneshot
//! channel for the reply.

use crate::entity::StoredEntity;
use crate::error::PlatformError;
use crate::resource::ResourceId;
use tokio::sync::oneshot;

/// One-shot reply channel used by stores.
pub type Response<T> = oneshot::Sender<Result<T, PlatformError>>;

#[derive(Debug)]
pub enum StoreRequest<T: StoredEntity> {
    Put {
        item: T,
        respond_to: Response<()>,
    },
    Get {
        id: ResourceId,
        respond_to: Response<Option<T>>,
    },
    Delete {
        id: ResourceId,
        respond_to: Response<()>,
    },
    List {
        respond_to: Response<Vec<T>>,
    },
    Action {
        id: ResourceId,
        action: T::Action,
        respond_to: Response<T::ActionResult>,
    },
}
