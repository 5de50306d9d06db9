//! Commit Bridge
//!
//! Turns a committed order into the minimal set of sequence writes and
//! submits them through the collection store.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{SyncError, SyncResult};
use crate::models::{Item, ItemPatch};
use crate::pending::{CommitSink, PendingReorder};
use crate::store::CollectionStore;

/// Sequence writes needed to make `current` follow `new_order`.
///
/// The item at index `n` of `new_order` gets sequence `n`; only items whose
/// recorded sequence differs are listed. Ids no longer in `current` are
/// skipped.
pub fn plan_sequence_updates(new_order: &[u32], current: &[Item]) -> Vec<ItemPatch> {
    new_order
        .iter()
        .enumerate()
        .filter_map(|(index, id)| {
            let item = current.iter().find(|i| i.id == *id)?;
            let sequence = index as i64;
            (item.sequence != sequence).then(|| ItemPatch::reorder(*id, sequence))
        })
        .collect()
}

/// Outcome of one commit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitReport {
    /// Writes that went through, in submission order
    pub written: Vec<u32>,
    /// The write that failed and stopped the commit
    pub failed: Vec<u32>,
    /// Written items put back to their previous sequence after a failure
    pub reverted: Vec<u32>,
    /// Compensation failed too and the collection was refetched
    pub refetched: bool,
}

impl CommitReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct CommitBridge {
    store: Arc<CollectionStore>,
}

impl CommitBridge {
    pub fn new(store: Arc<CollectionStore>) -> Self {
        Self { store }
    }

    /// Submit one sequence update per moved item.
    ///
    /// All or nothing: the first failed write stops the commit, and the
    /// writes that already went through are sent again with their previous
    /// sequence. If that compensation fails as well, the collection is
    /// reloaded from the remote store.
    pub async fn apply(&self, new_order: &[u32]) -> CommitReport {
        let before = self.store.items();
        let plan = plan_sequence_updates(new_order, &before);
        let mut report = CommitReport::default();

        for patch in plan {
            let id = patch.id;
            match self.store.update(patch).await {
                Ok(_) => report.written.push(id),
                Err(_) => {
                    report.failed.push(id);
                    break;
                }
            }
        }

        if report.is_complete() {
            tracing::info!(written = report.written.len(), "reorder committed");
            return report;
        }

        self.revert(&before, &mut report).await;
        tracing::warn!(
            failed = ?report.failed,
            reverted = report.reverted.len(),
            refetched = report.refetched,
            "reorder commit reverted"
        );
        report
    }

    async fn revert(&self, before: &[Item], report: &mut CommitReport) {
        for id in report.written.iter().rev() {
            let Some(previous) = before.iter().find(|i| i.id == *id) else {
                continue;
            };
            if self
                .store
                .update(ItemPatch::reorder(*id, previous.sequence))
                .await
                .is_err()
            {
                report.refetched = true;
                break;
            }
            report.reverted.push(*id);
        }
        if report.refetched {
            // refetch failures are reported by the store itself
            let _ = self.store.refetch().await;
        }
    }
}

#[async_trait]
impl CommitSink for CommitBridge {
    async fn commit(&self, reorder: &PendingReorder) -> SyncResult<()> {
        let report = self.apply(&reorder.new_full_order).await;
        if report.is_complete() {
            Ok(())
        } else {
            Err(SyncError::Commit {
                failed: report.failed,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SyncConfig;
    use crate::error::RemoteError;
    use crate::remote::{FailureKind, MemoryStore, RemoteResult, RemoteStore};

    fn item(id: u32, sequence: i64) -> Item {
        Item {
            id,
            sequence,
            todo_text: format!("todo {}", id),
            completed: false,
            important: false,
        }
    }

    fn five() -> Vec<Item> {
        (1..=5).map(|id| item(id, id as i64 - 1)).collect()
    }

    #[test]
    fn test_plan_only_moved_items() {
        let plan = plan_sequence_updates(&[2, 3, 4, 1, 5], &five());
        assert_eq!(
            plan,
            vec![
                ItemPatch::reorder(2, 0),
                ItemPatch::reorder(3, 1),
                ItemPatch::reorder(4, 2),
                ItemPatch::reorder(1, 3),
            ]
        );
        assert!(plan_sequence_updates(&[1, 2, 3, 4, 5], &five()).is_empty());
    }

    #[test]
    fn test_plan_skips_vanished_ids() {
        let plan = plan_sequence_updates(&[9, 1], &[item(1, 0)]);
        assert_eq!(plan, vec![ItemPatch::reorder(1, 1)]);
    }

    fn setup(items: Vec<Item>) -> (Arc<MemoryStore>, Arc<CollectionStore>, CommitBridge) {
        let remote = Arc::new(MemoryStore::new("/api/todo").with_items(items.clone()));
        let store = Arc::new(
            CollectionStore::new(remote.clone(), &SyncConfig::default()).with_items(items),
        );
        let bridge = CommitBridge::new(store.clone());
        (remote, store, bridge)
    }

    fn sequences(items: &[Item]) -> Vec<(u32, i64)> {
        let mut pairs: Vec<(u32, i64)> = items.iter().map(|i| (i.id, i.sequence)).collect();
        pairs.sort_unstable();
        pairs
    }

    #[tokio::test]
    async fn test_apply_writes_every_moved_item() {
        let (remote, store, bridge) = setup(five());
        let report = bridge.apply(&[2, 3, 4, 1, 5]).await;
        assert!(report.is_complete());
        assert_eq!(report.written, vec![2, 3, 4, 1]);
        assert_eq!(store.ids(), vec![2, 3, 4, 1, 5]);
        assert_eq!(sequences(&remote.items()), sequences(&store.items()));
    }

    #[tokio::test]
    async fn test_first_write_failing_submits_nothing_else() {
        let (remote, store, bridge) = setup(five());
        remote.fail_next(FailureKind::Transport);

        let report = bridge.apply(&[5, 1, 2, 3, 4]).await;
        assert_eq!(report.failed, vec![5]);
        assert!(report.written.is_empty());
        assert!(report.reverted.is_empty());
        assert_eq!(remote.calls().len(), 1);
        assert_eq!(store.items(), five());
    }

    #[tokio::test]
    async fn test_late_failure_reverts_earlier_writes() {
        let (remote, store, bridge) = setup(five());
        remote.fail_updates_of(1);

        let report = bridge.apply(&[2, 3, 4, 1, 5]).await;
        assert_eq!(report.written, vec![2, 3, 4]);
        assert_eq!(report.failed, vec![1]);
        assert_eq!(report.reverted, vec![4, 3, 2]);
        assert!(!report.refetched);

        assert_eq!(store.items(), five());
        assert_eq!(sequences(&remote.items()), sequences(&five()));
    }

    /// Lets the first `budget` updates through, then fails every update
    struct UpdateBudget {
        inner: MemoryStore,
        budget: std::sync::Mutex<usize>,
    }

    #[async_trait]
    impl RemoteStore for UpdateBudget {
        fn endpoint(&self) -> &str {
            self.inner.endpoint()
        }

        async fn fetch_all(&self) -> RemoteResult<Vec<Item>> {
            self.inner.fetch_all().await
        }

        async fn create(&self, item: &Item) -> RemoteResult<Item> {
            self.inner.create(item).await
        }

        async fn update(&self, item: &Item) -> RemoteResult<Item> {
            {
                let mut budget = self.budget.lock().unwrap();
                if *budget == 0 {
                    return Err(RemoteError::Transport("offline".to_string()));
                }
                *budget -= 1;
            }
            self.inner.update(item).await
        }

        async fn delete(&self, ids: &[u32]) -> RemoteResult<Vec<u32>> {
            self.inner.delete(ids).await
        }
    }

    #[tokio::test]
    async fn test_failed_compensation_refetches() {
        let items = vec![item(1, 0), item(2, 1), item(3, 2)];
        let remote = Arc::new(UpdateBudget {
            inner: MemoryStore::new("/api/todo").with_items(items.clone()),
            budget: std::sync::Mutex::new(1),
        });
        let store = Arc::new(
            CollectionStore::new(remote.clone(), &SyncConfig::default()).with_items(items),
        );

        // 2 -> 0 lands, 3 -> 1 fails, putting 2 back to 1 fails too
        let report = CommitBridge::new(store.clone()).apply(&[2, 3, 1]).await;
        assert_eq!(report.written, vec![2]);
        assert_eq!(report.failed, vec![3]);
        assert!(report.reverted.is_empty());
        assert!(report.refetched);

        let mut server = remote.inner.items();
        crate::models::sort_by_sequence(&mut server);
        assert_eq!(store.items(), server);
        assert_eq!(store.get(2).unwrap().sequence, 0);
    }
}
