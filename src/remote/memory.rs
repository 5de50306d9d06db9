//! In-Memory Remote Store
//!
//! Process-local stand-in for a server, with optional latency, failure
//! injection and a log of every call received.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use super::{resource_url, RemoteResult, RemoteStore};
use crate::error::RemoteError;
use crate::models::Item;

/// How an injected failure is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Transport,
    NotFound,
    Status(u16),
}

/// A call as received by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    FetchAll,
    Create(Item),
    Update(Item),
    Delete(Vec<u32>),
}

#[derive(Default)]
struct MemoryState {
    items: Vec<Item>,
    calls: Vec<RemoteCall>,
    fail_next: Option<FailureKind>,
    fail_always: Option<FailureKind>,
    failing_updates: Vec<u32>,
}

pub struct MemoryStore {
    endpoint: String,
    latency: Duration,
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            latency: Duration::ZERO,
            state: Mutex::new(MemoryState::default()),
        }
    }

    pub fn with_items(self, items: Vec<Item>) -> Self {
        self.lock().items = items;
        self
    }

    /// Every call waits this long before answering
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Fail only the next call
    pub fn fail_next(&self, kind: FailureKind) {
        self.lock().fail_next = Some(kind);
    }

    /// Fail every call until reset with `None`
    pub fn fail_always(&self, kind: Option<FailureKind>) {
        self.lock().fail_always = kind;
    }

    /// Fail every update of `id` with a transport error
    pub fn fail_updates_of(&self, id: u32) {
        self.lock().failing_updates.push(id);
    }

    /// Calls received so far, oldest first
    pub fn calls(&self) -> Vec<RemoteCall> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Server-side view of the collection
    pub fn items(&self) -> Vec<Item> {
        self.lock().items.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Log the call and decide up front whether it fails
    async fn receive(&self, call: RemoteCall, url: String) -> RemoteResult<()> {
        let failure = {
            let mut state = self.lock();
            let targeted = matches!(
                &call,
                RemoteCall::Update(item) if state.failing_updates.contains(&item.id)
            );
            state.calls.push(call);
            if targeted {
                Some(FailureKind::Transport)
            } else {
                state.fail_next.take().or(state.fail_always)
            }
        };
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        match failure {
            None => Ok(()),
            Some(FailureKind::Transport) => {
                Err(RemoteError::Transport("connection reset".to_string()))
            }
            Some(FailureKind::NotFound) => Err(RemoteError::NotFound { endpoint: url }),
            Some(FailureKind::Status(code)) => Err(RemoteError::Status {
                code,
                body: "Internal Server Error".to_string(),
            }),
        }
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn fetch_all(&self) -> RemoteResult<Vec<Item>> {
        self.receive(RemoteCall::FetchAll, self.endpoint.clone()).await?;
        Ok(self.items())
    }

    async fn create(&self, item: &Item) -> RemoteResult<Item> {
        let url = resource_url(&self.endpoint, &[item.id]);
        self.receive(RemoteCall::Create(item.clone()), url).await?;
        self.lock().items.insert(0, item.clone());
        Ok(item.clone())
    }

    async fn update(&self, item: &Item) -> RemoteResult<Item> {
        let url = resource_url(&self.endpoint, &[item.id]);
        self.receive(RemoteCall::Update(item.clone()), url.clone()).await?;
        let mut state = self.lock();
        match state.items.iter_mut().find(|rec| rec.id == item.id) {
            Some(rec) => {
                *rec = item.clone();
                Ok(item.clone())
            }
            None => Err(RemoteError::NotFound { endpoint: url }),
        }
    }

    async fn delete(&self, ids: &[u32]) -> RemoteResult<Vec<u32>> {
        let url = resource_url(&self.endpoint, ids);
        self.receive(RemoteCall::Delete(ids.to_vec()), url).await?;
        self.lock().items.retain(|rec| !ids.contains(&rec.id));
        Ok(ids.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: u32) -> Item {
        Item {
            id,
            sequence: id as i64,
            todo_text: format!("todo {}", id),
            completed: false,
            important: false,
        }
    }

    #[tokio::test]
    async fn test_calls_are_logged() {
        let store = MemoryStore::new("/api/todo").with_items(vec![item(1)]);
        store.create(&item(2)).await.unwrap();
        store.delete(&[1]).await.unwrap();
        assert_eq!(
            store.calls(),
            vec![RemoteCall::Create(item(2)), RemoteCall::Delete(vec![1])]
        );
        assert_eq!(store.items(), vec![item(2)]);
    }

    #[tokio::test]
    async fn test_fail_next_only_once() {
        let store = MemoryStore::new("/api/todo").with_items(vec![item(1)]);
        store.fail_next(FailureKind::NotFound);
        let err = store.update(&item(1)).await.unwrap_err();
        assert_eq!(
            err,
            RemoteError::NotFound {
                endpoint: "/api/todo/1".to_string()
            }
        );
        assert!(store.update(&item(1)).await.is_ok());
    }

    #[tokio::test]
    async fn test_failing_updates_target_one_id() {
        let store = MemoryStore::new("/api/todo").with_items(vec![item(1), item(2)]);
        store.fail_updates_of(2);
        assert!(store.update(&item(1)).await.is_ok());
        assert!(matches!(
            store.update(&item(2)).await,
            Err(RemoteError::Transport(_))
        ));
        assert_eq!(store.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_not_found() {
        let store = MemoryStore::new("/api/todo");
        assert!(matches!(
            store.update(&item(4)).await,
            Err(RemoteError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_failed_call_changes_nothing() {
        let store = MemoryStore::new("/api/todo").with_items(vec![item(1)]);
        store.fail_always(Some(FailureKind::Status(500)));
        assert!(store.delete(&[1]).await.is_err());
        assert!(store.create(&item(2)).await.is_err());
        store.fail_always(None);
        assert_eq!(store.items(), vec![item(1)]);
    }
}
