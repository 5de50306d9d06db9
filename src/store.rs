//! Collection Store
//!
//! Optimistic CRUD synchronization layer and sole owner of the full
//! collection. Every mutation follows the same shape: validate, snapshot,
//! mutate locally, write remotely, restore the snapshot if the write fails.
//!
//! Operations on one store are serialized through a FIFO write gate, so a
//! rollback always restores the state its own operation started from.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use tokio::sync::Mutex;

use crate::config::SyncConfig;
use crate::error::{Operation, SyncError, SyncResult};
use crate::filter::{CollectionStats, ItemFilter};
use crate::models::{sort_by_sequence, Item, ItemPatch, NewItem};
use crate::remote::{resource_url, RemoteStore};

/// Receives one human-readable message per failed operation
pub type ErrorSink = Arc<dyn Fn(String) + Send + Sync>;

/// State of the last load from the remote store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    Loading,
    Success,
    Errored(String),
}

/// Ids for `delete`: one id or several
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdSet(Vec<u32>);

impl IdSet {
    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }
}

impl From<u32> for IdSet {
    fn from(id: u32) -> Self {
        IdSet(vec![id])
    }
}

impl From<Vec<u32>> for IdSet {
    fn from(ids: Vec<u32>) -> Self {
        IdSet(ids)
    }
}

impl From<&[u32]> for IdSet {
    fn from(ids: &[u32]) -> Self {
        IdSet(ids.to_vec())
    }
}

impl<const N: usize> From<[u32; N]> for IdSet {
    fn from(ids: [u32; N]) -> Self {
        IdSet(ids.to_vec())
    }
}

pub struct CollectionStore {
    remote: Arc<dyn RemoteStore>,
    update_delay: Duration,
    items: RwLock<Vec<Item>>,
    status: RwLock<LoadStatus>,
    write_gate: Mutex<()>,
    on_error: Option<ErrorSink>,
}

impl CollectionStore {
    pub fn new(remote: Arc<dyn RemoteStore>, config: &SyncConfig) -> Self {
        Self {
            remote,
            update_delay: config.update_delay(),
            items: RwLock::new(Vec::new()),
            status: RwLock::new(LoadStatus::Loading),
            write_gate: Mutex::new(()),
            on_error: None,
        }
    }

    /// Route failure messages to `sink`
    pub fn with_error_sink<F>(mut self, sink: F) -> Self
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(sink));
        self
    }

    /// Seed local state without a fetch, e.g. from a server-rendered page
    pub fn with_items(self, mut items: Vec<Item>) -> Self {
        sort_by_sequence(&mut items);
        *self.write_items() = items;
        *self.write_status() = LoadStatus::Success;
        self
    }

    pub fn endpoint(&self) -> &str {
        self.remote.endpoint()
    }

    // ========================
    // Reads
    // ========================

    /// Copy of the full collection, ordered by sequence
    pub fn items(&self) -> Vec<Item> {
        self.read_items().clone()
    }

    pub fn ids(&self) -> Vec<u32> {
        self.read_items().iter().map(|i| i.id).collect()
    }

    pub fn get(&self, id: u32) -> Option<Item> {
        self.read_items().iter().find(|i| i.id == id).cloned()
    }

    pub fn contains(&self, id: u32) -> bool {
        self.read_items().iter().any(|i| i.id == id)
    }

    pub fn len(&self) -> usize {
        self.read_items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_items().is_empty()
    }

    pub fn status(&self) -> LoadStatus {
        self.read_status().clone()
    }

    /// Filtered subset of the current collection
    pub fn filtered(&self, filter: &ItemFilter) -> Vec<Item> {
        filter.apply(&self.read_items())
    }

    pub fn stats(&self) -> CollectionStats {
        CollectionStats::of(&self.read_items())
    }

    // ========================
    // Remote-backed operations
    // ========================

    /// Initial fetch
    pub async fn load(&self) -> SyncResult<Vec<Item>> {
        self.refetch().await
    }

    /// Replace local state with the authoritative remote collection
    pub async fn refetch(&self) -> SyncResult<Vec<Item>> {
        let _gate = self.write_gate.lock().await;
        *self.write_status() = LoadStatus::Loading;

        match self.remote.fetch_all().await {
            Ok(mut items) => {
                sort_by_sequence(&mut items);
                *self.write_items() = items.clone();
                *self.write_status() = LoadStatus::Success;
                tracing::debug!(count = items.len(), "collection refetched");
                Ok(items)
            }
            Err(e) => {
                let err = self.report(SyncError::remote(Operation::Fetch, self.endpoint(), e));
                *self.write_status() = LoadStatus::Errored(err.to_string());
                Err(err)
            }
        }
    }

    /// Append a new item: id is max id + 1, sequence is max sequence + 1
    pub async fn create(&self, new_item: NewItem) -> SyncResult<Item> {
        let _gate = self.write_gate.lock().await;
        let snapshot = self.items();

        let item = {
            let mut items = self.write_items();
            let id = match items.iter().map(|i| i.id).max() {
                Some(max) => max.checked_add(1),
                None => Some(1),
            };
            let sequence = match items.iter().map(|i| i.sequence).max() {
                Some(max) => max.checked_add(1),
                None => Some(0),
            };
            let (Some(id), Some(sequence)) = (id, sequence) else {
                drop(items);
                return Err(self.report(SyncError::InvalidInput(
                    "no id or sequence left after the current maximum".to_string(),
                )));
            };
            let item = new_item.into_item(id, sequence);
            items.push(item.clone());
            sort_by_sequence(&mut items);
            item
        };
        tracing::debug!(id = item.id, sequence = item.sequence, "optimistic create");

        match self.remote.create(&item).await {
            Ok(_) => Ok(item),
            Err(e) => {
                self.restore(snapshot);
                let resource = resource_url(self.endpoint(), &[item.id]);
                Err(self.report(SyncError::remote(Operation::Create, resource, e)))
            }
        }
    }

    /// Merge `patch` into the existing record with the same id
    pub async fn update(&self, patch: ItemPatch) -> SyncResult<Item> {
        let id = patch.id;
        self.update_with(id, move |_| patch).await
    }

    /// Flip `completed`
    pub async fn toggle_completed(&self, id: u32) -> SyncResult<Item> {
        self.update_with(id, |current| ItemPatch::new(current.id).completed(!current.completed))
            .await
    }

    /// Flip `important`
    pub async fn toggle_important(&self, id: u32) -> SyncResult<Item> {
        self.update_with(id, |current| ItemPatch::new(current.id).important(!current.important))
            .await
    }

    /// Build the patch from the record as it is once this update holds the gate
    async fn update_with<F>(&self, id: u32, make_patch: F) -> SyncResult<Item>
    where
        F: FnOnce(&Item) -> ItemPatch + Send,
    {
        let _gate = self.write_gate.lock().await;
        let snapshot = self.items();

        let (updated, sequence_only) = {
            let mut items = self.write_items();
            let Some(index) = items.iter().position(|i| i.id == id) else {
                drop(items);
                return Err(self.report(SyncError::NotFound(vec![id])));
            };
            let patch = make_patch(&items[index]);
            let updated = patch.merge_into(&items[index]);
            items[index] = updated.clone();
            sort_by_sequence(&mut items);
            (updated, patch.is_sequence_only())
        };
        tracing::debug!(id, sequence_only, "optimistic update");

        if !sequence_only && !self.update_delay.is_zero() {
            tokio::time::sleep(self.update_delay).await;
        }

        match self.remote.update(&updated).await {
            Ok(_) => Ok(updated),
            Err(e) => {
                self.restore(snapshot);
                let resource = resource_url(self.endpoint(), &[id]);
                Err(self.report(SyncError::remote(Operation::Update, resource, e)))
            }
        }
    }

    /// Remove one or several items. Every id must exist, otherwise nothing
    /// is removed.
    pub async fn delete(&self, ids: impl Into<IdSet>) -> SyncResult<Vec<u32>> {
        let mut ids = ids.into().0;
        ids.sort_unstable();
        ids.dedup();
        if ids.is_empty() {
            return Err(self.report(SyncError::InvalidInput("delete needs at least one id".to_string())));
        }

        let _gate = self.write_gate.lock().await;
        let missing: Vec<u32> = ids.iter().copied().filter(|id| !self.contains(*id)).collect();
        if !missing.is_empty() {
            return Err(self.report(SyncError::NotFound(missing)));
        }

        let snapshot = self.items();
        self.write_items().retain(|i| !ids.contains(&i.id));
        tracing::debug!(?ids, "optimistic delete");

        match self.remote.delete(&ids).await {
            Ok(deleted) => Ok(deleted),
            Err(e) => {
                self.restore(snapshot);
                let resource = resource_url(self.endpoint(), &ids);
                Err(self.report(SyncError::remote(Operation::Delete, resource, e)))
            }
        }
    }

    /// Delete every completed item in one operation
    pub async fn clear_completed(&self) -> SyncResult<Vec<u32>> {
        let completed: Vec<u32> = self
            .read_items()
            .iter()
            .filter(|i| i.completed)
            .map(|i| i.id)
            .collect();
        if completed.is_empty() {
            return Ok(Vec::new());
        }
        self.delete(completed).await
    }

    // ========================
    // Internals
    // ========================

    fn restore(&self, snapshot: Vec<Item>) {
        tracing::warn!("remote write failed, restoring previous collection");
        *self.write_items() = snapshot;
    }

    fn report(&self, err: SyncError) -> SyncError {
        tracing::warn!(error = %err, "sync operation failed");
        if let Some(sink) = &self.on_error {
            sink(err.to_string());
        }
        err
    }

    fn read_items(&self) -> RwLockReadGuard<'_, Vec<Item>> {
        self.items.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_items(&self) -> RwLockWriteGuard<'_, Vec<Item>> {
        self.items.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_status(&self) -> RwLockReadGuard<'_, LoadStatus> {
        self.status.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_status(&self) -> RwLockWriteGuard<'_, LoadStatus> {
        self.status.write().unwrap_or_else(PoisonError::into_inner)
    }
}
