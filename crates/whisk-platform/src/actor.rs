//! # Resource Store
//!
//! The server half of one resource kind inside [`LocalPlatform`](crate::LocalPlatform).
//! A store owns a keyed map and the receiving end of its channel, and
//! processes requests one at a time in its own task, so the map needs no lock.

use crate::client::StoreClient;
use crate::entity::StoredEntity;
use crate::error::PlatformError;
use crate::message::StoreRequest;
use std::collections::BTreeMap;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Keyed, single-writer store for entities of kind `T`.
///
/// Keys are fully qualified (`/namespace/name`); entities addressed with the
/// `_` placeholder or without a namespace land in `default_namespace`.
///
/// # Usage Pattern
///
/// 1. **Create**: [`ResourceStore::new`] returns the store and its client.
/// 2. **Wire**: pass clients of other stores as the context to [`run`](Self::run).
/// 3. **Run**: spawn `run` on the runtime.
///
/// ## Operations
///
/// * **Put**: rejects with `Conflict` when the key exists and the entity
///   does not allow overwrite; runs `on_create`, then inserts.
/// * **Get**: clone of the stored entity, or `None`.
/// * **Delete**: `NotFound` when absent; runs `on_delete`, then removes.
/// * **List**: every stored entity in key order.
/// * **Action**: kind-specific operation on an existing entity.
pub struct ResourceStore<T: StoredEntity> {
    receiver: mpsc::Receiver<StoreRequest<T>>,
    store: BTreeMap<String, T>,
    default_namespace: String,
}

impl<T: StoredEntity> ResourceStore<T> {
    /// Creates a store and its client.
    ///
    /// `buffer_size` bounds the channel; senders wait when it is full.
    pub fn new(buffer_size: usize, default_namespace: impl Into<String>) -> (Self, StoreClient<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let store = Self {
            receiver,
            store: BTreeMap::new(),
            default_namespace: default_namespace.into(),
        };
        (store, StoreClient::new(sender))
    }

    /// Processes requests until every client has been dropped.
    pub async fn run(mut self, context: T::Context) {
        let kind = T::KIND;
        info!(kind, "Store started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                StoreRequest::Put {
                    mut item,
                    respond_to,
                } => {
                    let key = item.id().key(&self.default_namespace);
                    debug!(kind, %key, "Put");
                    if self.store.contains_key(&key) && !item.overwrite() {
                        warn!(kind, %key, "Already exists");
                        let _ = respond_to.send(Err(PlatformError::Conflict(key)));
                        continue;
                    }
                    if let Err(e) = item.on_create(&context).await {
                        warn!(kind, %key, error = %e, "on_create failed");
                        let _ = respond_to.send(Err(e));
                        continue;
                    }
                    self.store.insert(key.clone(), item);
                    info!(kind, %key, size = self.store.len(), "Stored");
                    let _ = respond_to.send(Ok(()));
                }
                StoreRequest::Get { id, respond_to } => {
                    let key = id.key(&self.default_namespace);
                    let item = self.store.get(&key).cloned();
                    debug!(kind, %key, found = item.is_some(), "Get");
                    let _ = respond_to.send(Ok(item));
                }
                StoreRequest::Delete { id, respond_to } => {
                    let key = id.key(&self.default_namespace);
                    debug!(kind, %key, "Delete");
                    let Some(item) = self.store.get(&key) else {
                        warn!(kind, %key, "Not found");
                        let _ = respond_to.send(Err(PlatformError::NotFound(key)));
                        continue;
                    };
                    if let Err(e) = item.on_delete(&context).await {
                        warn!(kind, %key, error = %e, "on_delete failed");
                        let _ = respond_to.send(Err(e));
                        continue;
                    }
                    self.store.remove(&key);
                    info!(kind, %key, size = self.store.len(), "Deleted");
                    let _ = respond_to.send(Ok(()));
                }
                StoreRequest::List { respond_to } => {
                    debug!(kind, size = self.store.len(), "List");
                    let _ = respond_to.send(Ok(self.store.values().cloned().collect()));
                }
                StoreRequest::Action {
                    id,
                    action,
                    respond_to,
                } => {
                    let key = id.key(&self.default_namespace);
                    debug!(kind, %key, ?action, "Action");
                    let Some(item) = self.store.get_mut(&key) else {
                        warn!(kind, %key, "Not found");
                        let _ = respond_to.send(Err(PlatformError::NotFound(key)));
                        continue;
                    };
                    let result = item.handle_action(action, &context).await;
                    match &result {
                        Ok(_) => info!(kind, %key, "Action ok"),
                        Err(e) => warn!(kind, %key, error = %e, "Action failed"),
                    }
                    let _ = respond_to.send(result);
                }
            }
        }

        info!(kind, size = self.store.len(), "Shutdown");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResourceId;
    use async_trait::async_trait;

    #[derive(Clone, Debug, PartialEq)]
    struct Counter {
        name: String,
        value: u32,
        overwrite: bool,
    }

    #[derive(Debug)]
    enum CounterAction {
        Bump,
    }

    #[async_trait]
    impl StoredEntity for Counter {
        const KIND: &'static str = "counter";
        type Context = ();
        type Action = CounterAction;
        type ActionResult = u32;

        fn id(&self) -> ResourceId {
            ResourceId::new(None, self.name.clone())
        }

        fn overwrite(&self) -> bool {
            self.overwrite
        }

        async fn handle_action(
            &mut self,
            action: CounterAction,
            _ctx: &(),
        ) -> Result<u32, PlatformError> {
            match action {
                CounterAction::Bump => {
                    self.value += 1;
                    Ok(self.value)
                }
            }
        }
    }

    fn counter(name: &str, overwrite: bool) -> Counter {
        Counter {
            name: name.to_string(),
            value: 0,
            overwrite,
        }
    }

    #[tokio::test]
    async fn test_put_get_and_placeholder_namespace() {
        let (store, client) = ResourceStore::<Counter>::new(8, "guest");
        let handle = tokio::spawn(store.run(()));

        client.put(counter("a", true)).await.unwrap();
        let by_placeholder = client
            .get(ResourceId::parse("/_/a"))
            .await
            .unwrap()
            .expect("stored under default namespace");
        assert_eq!(by_placeholder.name, "a");

        let by_namespace = client.get(ResourceId::parse("/guest/a")).await.unwrap();
        assert!(by_namespace.is_some());

        drop(client);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_put_without_overwrite_conflicts() {
        let (store, client) = ResourceStore::<Counter>::new(8, "guest");
        let handle = tokio::spawn(store.run(()));

        client.put(counter("a", false)).await.unwrap();
        let err = client.put(counter("a", false)).await.unwrap_err();
        assert_eq!(err, PlatformError::Conflict("/guest/a".into()));

        client.put(counter("a", true)).await.unwrap();

        drop(client);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_missing_and_action() {
        let (store, client) = ResourceStore::<Counter>::new(8, "guest");
        let handle = tokio::spawn(store.run(()));

        let err = client.delete(ResourceId::parse("/guest/x")).await.unwrap_err();
        assert!(matches!(err, PlatformError::NotFound(_)));

        client.put(counter("a", true)).await.unwrap();
        let id = ResourceId::new(None, "a");
        assert_eq!(
            client.perform_action(id.clone(), CounterAction::Bump).await.unwrap(),
            1
        );
        assert_eq!(client.list().await.unwrap()[0].value, 1);
        client.delete(id).await.unwrap();
        assert!(client.list().await.unwrap().is_empty());

        drop(client);
        handle.await.unwrap();
    }
}
