//! Remote Store Layer
//!
//! Persistence boundary of a collection. Implementations can use HTTP,
//! in-memory state, etc.

mod http;
mod memory;

use async_trait::async_trait;

use crate::error::{join_ids, RemoteError};
use crate::models::Item;

pub use http::HttpStore;
pub use memory::{FailureKind, MemoryStore, RemoteCall};

/// Result type for remote calls
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Remote operations the sync layer needs, keyed by collection endpoint.
///
/// All operations are async; a failed call must leave the remote collection
/// unchanged.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Collection endpoint, used in error messages
    fn endpoint(&self) -> &str;

    /// Load the whole collection, in any order
    async fn fetch_all(&self) -> RemoteResult<Vec<Item>>;

    /// Store a new record under its already assigned id
    async fn create(&self, item: &Item) -> RemoteResult<Item>;

    /// Replace the record with the same id
    async fn update(&self, item: &Item) -> RemoteResult<Item>;

    /// Remove records, returning the deleted ids
    async fn delete(&self, ids: &[u32]) -> RemoteResult<Vec<u32>>;
}

/// `endpoint/1,2,3`
pub fn resource_url(endpoint: &str, ids: &[u32]) -> String {
    format!("{}/{}", endpoint.trim_end_matches('/'), join_ids(ids))
}
