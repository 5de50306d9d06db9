//! Reorder Sync
//!
//! Optimistic drag-and-drop reordering of a filtered list, persisted to a
//! remote store that may reject or delay writes.
//!
//! Layered architecture:
//! - models / filter: records, patches and derived subsets
//! - remap: maps a subset reorder back onto the full collection
//! - store: optimistic CRUD with rollback, sole owner of the collection
//! - pending / bridge: deferred, cancellable commit of a dropped order
//! - controller: per-view wiring of gestures to all of the above
//! - remote: persistence boundary (HTTP, in-memory)

pub mod bridge;
pub mod config;
pub mod controller;
pub mod error;
pub mod filter;
pub mod logging;
pub mod models;
pub mod pending;
pub mod remap;
pub mod remote;
pub mod store;


pub use bridge::{plan_sequence_updates, CommitBridge, CommitReport};
pub use config::SyncConfig;
pub use controller::{ItemRenderState, ReorderController};
pub use error::{Operation, RemoteError, SyncError, SyncResult};
pub use filter::{CollectionStats, ItemFilter, StatusFilter};
pub use list_dragdrop::{DragTracker, DropPayload, LeaveTarget, Point};
pub use models::{Item, ItemPatch, NewItem};
pub use pending::{CommitScheduler, CommitSink, PendingReorder};
pub use remap::{move_onto, remap};
pub use remote::{HttpStore, MemoryStore, RemoteStore};
pub use store::{CollectionStore, ErrorSink, IdSet, LoadStatus};
