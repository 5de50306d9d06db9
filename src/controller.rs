//! Reorder Controller
//!
//! View-level owner of one list: feeds gestures to the tracker, turns a
//! successful drop into a pending reorder, and answers the per-item queries a
//! renderer needs. Holds a handle to the shared store, never a private copy
//! of the collection.

use std::sync::Arc;

use list_dragdrop::{DragTracker, LeaveTarget, Point};

use crate::bridge::CommitBridge;
use crate::config::SyncConfig;
use crate::filter::ItemFilter;
use crate::models::Item;
use crate::pending::{CommitScheduler, CommitSink, PendingReorder};
use crate::remap::{move_onto, remap};
use crate::store::CollectionStore;

/// What a renderer needs to draw one item
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ItemRenderState {
    /// Being dragged
    pub grasped: bool,
    /// Current drop candidate
    pub hovered: bool,
    /// The item that was dropped, while its reorder is pending
    pub dropped: bool,
    /// The item it was dropped onto, while pending
    pub drop_target: bool,
    /// Previous index minus pending index, while pending
    pub delta: Option<i64>,
}

pub struct ReorderController {
    store: Arc<CollectionStore>,
    scheduler: CommitScheduler,
    tracker: DragTracker<u32>,
    filter: ItemFilter,
    item_gap_px: u32,
}

impl ReorderController {
    /// Controller committing through a `CommitBridge` on `store`
    pub fn new(store: Arc<CollectionStore>, config: &SyncConfig) -> Self {
        let sink = Arc::new(CommitBridge::new(store.clone()));
        Self::with_sink(store, sink, config)
    }

    pub fn with_sink(store: Arc<CollectionStore>, sink: Arc<dyn CommitSink>, config: &SyncConfig) -> Self {
        Self {
            store,
            scheduler: CommitScheduler::new(sink, config.commit_deferral()),
            tracker: DragTracker::new(),
            filter: ItemFilter::default(),
            item_gap_px: config.item_gap_px,
        }
    }

    pub fn store(&self) -> &Arc<CollectionStore> {
        &self.store
    }

    pub fn filter(&self) -> &ItemFilter {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: ItemFilter) {
        self.filter = filter;
    }

    // ========================
    // Gestures
    // ========================

    pub fn press(&mut self, id: u32, pointer: Point, element_origin: Point) {
        self.tracker.press(id, pointer, element_origin);
    }

    pub fn motion(&mut self, pointer: Point) -> bool {
        self.tracker.motion(pointer)
    }

    pub fn grasp(&mut self, id: u32, pointer: Point, element_origin: Point) {
        self.tracker.grasp(id, pointer, element_origin);
    }

    pub fn hover(&mut self, id: u32) {
        self.tracker.hover(id);
    }

    pub fn leave(&mut self, target: LeaveTarget<u32>) {
        self.tracker.leave(target);
    }

    /// Drop the grasped item onto `target`.
    ///
    /// On success the moved order is remapped onto the full collection and
    /// armed as the pending reorder, replacing any earlier one. Returns false
    /// for ignored drops (nothing grasped, dropped onto itself, unknown id).
    /// Must be called from within a tokio runtime.
    pub fn drop_on(&mut self, target: u32, pointer: Point) -> bool {
        // an ignored drop must leave the gesture intact
        let visible = self.display_order();
        let in_view = |id: u32| visible.iter().any(|i| i.id == id);
        if !in_view(target) || !self.tracker.grasped().is_some_and(in_view) {
            tracing::debug!(drop_target = target, "drop outside the visible list ignored");
            return false;
        }

        let Some(payload) = self.tracker.drop_on(target, pointer) else {
            return false;
        };
        let Some(new_subset) = move_onto(&visible, &payload.dragged, &payload.target, |i: &Item| i.id)
        else {
            return false;
        };

        let new_subset_ids: Vec<u32> = new_subset.iter().map(|i| i.id).collect();
        let new_full_order = remap(&self.base_full_order(), &new_subset_ids, |id: &u32| *id);

        self.scheduler.begin(PendingReorder {
            new_subset_order: new_subset,
            original_subset_order: visible,
            new_full_order,
            dropped_id: payload.dragged,
            drop_target_id: payload.target,
            drop_pointer: Some(payload.pointer),
            grab_offset: Some(payload.grab_offset),
        });
        true
    }

    /// Drag ended. Always call this, whether or not a drop happened.
    pub fn release(&mut self) {
        self.tracker.release();
    }

    /// Cancel the armed commit and forget any drag in progress
    pub fn dispose(&mut self) {
        self.scheduler.cancel();
        self.tracker.release();
    }

    // ========================
    // Render queries
    // ========================

    /// Items to show: the pending order while a reorder is pending,
    /// otherwise the filtered subset of the store
    pub fn display_order(&self) -> Vec<Item> {
        match self.scheduler.current() {
            Some(pending) => pending.new_subset_order.clone(),
            None => self.store.filtered(&self.filter),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.scheduler.is_pending()
    }

    pub fn pending(&self) -> Option<Arc<PendingReorder>> {
        self.scheduler.current()
    }

    pub fn item_state(&self, id: u32) -> ItemRenderState {
        let mut state = ItemRenderState {
            grasped: self.tracker.is_grasped(id),
            hovered: self.tracker.is_hovered(id),
            ..Default::default()
        };
        if let Some(pending) = self.scheduler.current() {
            state.dropped = pending.dropped_id == id;
            state.drop_target = pending.drop_target_id == id;
            state.delta = pending.delta(id);
        }
        state
    }

    /// Vertical distance an item moved by `delta` slots, for the settle animation
    pub fn slide_offset_px(&self, delta: i64, item_height_px: u32) -> i64 {
        delta * (i64::from(item_height_px) + i64::from(self.item_gap_px))
    }

    pub fn grab_offset(&self) -> Option<Point> {
        self.tracker.grab_offset()
    }

    /// Full order a new drop starts from: the pending one if any, reconciled
    /// with items created or deleted since it was frozen
    fn base_full_order(&self) -> Vec<u32> {
        let current = self.store.ids();
        match self.scheduler.current() {
            None => current,
            Some(pending) => {
                let mut order: Vec<u32> = pending
                    .new_full_order
                    .iter()
                    .copied()
                    .filter(|id| current.contains(id))
                    .collect();
                let added: Vec<u32> = current
                    .into_iter()
                    .filter(|id| !pending.new_full_order.contains(id))
                    .collect();
                order.extend(added);
                order
            }
        }
    }
}
