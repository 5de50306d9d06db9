//! Pending Reorder State Machine
//!
//! Holds at most one frozen, not yet committed reorder and the timer that
//! will hand it to a `CommitSink`.
//!
//! `empty -> armed -> committing -> empty`. Arming again while armed aborts
//! the old timer first. A commit that already started runs to completion.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use list_dragdrop::Point;
use tokio::task::JoinHandle;

use crate::error::SyncResult;
use crate::models::Item;

/// Frozen result of one drop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingReorder {
    /// Visible subset after the move; this is what the list shows while pending
    pub new_subset_order: Vec<Item>,
    /// Visible subset as it was before the move
    pub original_subset_order: Vec<Item>,
    /// Ids of the whole collection in their new order
    pub new_full_order: Vec<u32>,
    pub dropped_id: u32,
    pub drop_target_id: u32,
    /// Pointer position at drop time
    pub drop_pointer: Option<Point>,
    /// Pointer offset inside the dragged element at grasp time
    pub grab_offset: Option<Point>,
}

impl PendingReorder {
    /// Signed index shift of `id`: previous index minus new index.
    /// `None` if the item is not part of the visible subset.
    pub fn delta(&self, id: u32) -> Option<i64> {
        let previous = self.original_subset_order.iter().position(|i| i.id == id)?;
        let current = self.new_subset_order.iter().position(|i| i.id == id)?;
        Some(previous as i64 - current as i64)
    }

    /// Where the dropped element visually was when released
    pub fn drop_origin(&self) -> Option<Point> {
        let pointer = self.drop_pointer?;
        Some(pointer.offset_from(self.grab_offset.unwrap_or_default()))
    }
}

/// Receives the reorder once its commit window has elapsed
#[async_trait]
pub trait CommitSink: Send + Sync {
    async fn commit(&self, reorder: &PendingReorder) -> SyncResult<()>;
}

enum Phase {
    Empty,
    Armed {
        reorder: Arc<PendingReorder>,
        timer: JoinHandle<()>,
    },
    Committing {
        reorder: Arc<PendingReorder>,
    },
}

struct SchedulerState {
    phase: Phase,
    /// Bumped on every arm and cancel; a timer only acts on its own generation
    generation: u64,
}

pub struct CommitScheduler {
    state: Arc<Mutex<SchedulerState>>,
    sink: Arc<dyn CommitSink>,
    deferral: Duration,
}

fn lock(state: &Mutex<SchedulerState>) -> MutexGuard<'_, SchedulerState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl CommitScheduler {
    pub fn new(sink: Arc<dyn CommitSink>, deferral: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(SchedulerState {
                phase: Phase::Empty,
                generation: 0,
            })),
            sink,
            deferral,
        }
    }

    /// Freeze `reorder` and arm its commit, superseding any armed one.
    /// Must be called from within a tokio runtime.
    pub fn begin(&self, reorder: PendingReorder) {
        let reorder = Arc::new(reorder);
        let mut state = lock(&self.state);
        state.generation += 1;
        let generation = state.generation;

        if let Phase::Armed { timer, reorder: old } =
            std::mem::replace(&mut state.phase, Phase::Empty)
        {
            timer.abort();
            tracing::debug!(dropped = old.dropped_id, "pending reorder superseded");
        }

        let timer = tokio::spawn(fire(
            self.state.clone(),
            self.sink.clone(),
            generation,
            self.deferral,
        ));
        tracing::debug!(
            dropped = reorder.dropped_id,
            drop_target = reorder.drop_target_id,
            "pending reorder armed"
        );
        state.phase = Phase::Armed { reorder, timer };
    }

    /// Disarm without committing. A commit already handed to the sink is
    /// not interrupted, but stops being reported as pending.
    pub fn cancel(&self) {
        let mut state = lock(&self.state);
        state.generation += 1;
        if let Phase::Armed { timer, .. } = std::mem::replace(&mut state.phase, Phase::Empty) {
            timer.abort();
            tracing::debug!("pending reorder cancelled");
        }
    }

    pub fn is_pending(&self) -> bool {
        !matches!(lock(&self.state).phase, Phase::Empty)
    }

    /// The live reorder, armed or committing
    pub fn current(&self) -> Option<Arc<PendingReorder>> {
        match &lock(&self.state).phase {
            Phase::Empty => None,
            Phase::Armed { reorder, .. } | Phase::Committing { reorder } => Some(reorder.clone()),
        }
    }
}

impl Drop for CommitScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn fire(
    state: Arc<Mutex<SchedulerState>>,
    sink: Arc<dyn CommitSink>,
    generation: u64,
    deferral: Duration,
) {
    tokio::time::sleep(deferral).await;

    let reorder = {
        let mut guard = lock(&state);
        if guard.generation != generation {
            return;
        }
        match std::mem::replace(&mut guard.phase, Phase::Empty) {
            Phase::Armed { reorder, .. } => {
                guard.phase = Phase::Committing {
                    reorder: reorder.clone(),
                };
                reorder
            }
            other => {
                guard.phase = other;
                return;
            }
        }
    };

    tracing::debug!(dropped = reorder.dropped_id, "commit window elapsed");
    if let Err(e) = sink.commit(&reorder).await {
        tracing::warn!(error = %e, "reorder commit failed");
    }

    let mut guard = lock(&state);
    if guard.generation == generation {
        guard.phase = Phase::Empty;
    }
}
