//! Error Types
//!
//! Precondition, transport and commit errors raised by the sync engine.

use std::fmt;

/// Common result type for sync operations
pub type SyncResult<T> = Result<T, SyncError>;

/// Which CRUD operation failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Fetch,
    Create,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Fetch => "fetch",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// Failure reported by a `RemoteStore`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// HTTP 404 for the attempted endpoint
    NotFound { endpoint: String },
    /// Any other non-success status
    Status { code: u16, body: String },
    /// Connection, timeout or other transport failure
    Transport(String),
    /// Response could not be decoded
    Decode(String),
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteError::NotFound { endpoint } => {
                write!(f, "Request failed with status code 404 url {}", endpoint)
            }
            RemoteError::Status { code, body } => {
                write!(f, "Request failed with status code {}", code)?;
                if !body.is_empty() {
                    write!(f, ": {}", body)?;
                }
                Ok(())
            }
            RemoteError::Transport(msg) => write!(f, "Transport error: {}", msg),
            RemoteError::Decode(msg) => write!(f, "Invalid response: {}", msg),
        }
    }
}

impl std::error::Error for RemoteError {}

/// Errors surfaced by the store, scheduler and bridge
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// Ids absent from the local collection; nothing was mutated
    NotFound(Vec<u32>),
    /// Malformed request or configuration; nothing was mutated
    InvalidInput(String),
    /// Remote write or fetch failed; local state was rolled back
    Remote {
        op: Operation,
        resource: String,
        source: RemoteError,
    },
    /// Some sequence writes of a reorder commit failed
    Commit { failed: Vec<u32> },
}

impl SyncError {
    pub fn remote(op: Operation, resource: impl Into<String>, source: RemoteError) -> Self {
        SyncError::Remote {
            op,
            resource: resource.into(),
            source,
        }
    }

    /// Precondition failures never reach the remote store
    pub fn is_precondition(&self) -> bool {
        matches!(self, SyncError::NotFound(_) | SyncError::InvalidInput(_))
    }
}

pub(crate) fn join_ids(ids: &[u32]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::NotFound(ids) => {
                write!(f, "No data record found for id {}", join_ids(ids))
            }
            SyncError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            SyncError::Remote { op, resource, source } => {
                write!(f, "{} {} failed: {}", op, resource, source)
            }
            SyncError::Commit { failed } => {
                write!(f, "Reorder commit failed for id {}", join_ids(failed))
            }
        }
    }
}

impl std::error::Error for SyncError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SyncError::Remote { source, .. } => Some(source),
            _ => None,
        }
    }
}
