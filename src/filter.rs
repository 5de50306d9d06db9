//! Filtered Subsets
//!
//! Predicate-based, read-only views of a collection and summary counts.

use serde::{Deserialize, Serialize};

use crate::models::{sort_by_sequence, Item};

/// Completion status to show
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    Completed,
}

/// Visible-subset predicate: status, important flag and text search
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFilter {
    pub status: StatusFilter,
    pub important_only: bool,
    /// Case-insensitive substring of `todo_text`; empty matches all
    pub search: String,
}

impl ItemFilter {
    pub fn matches(&self, item: &Item) -> bool {
        match self.status {
            StatusFilter::Pending if item.completed => return false,
            StatusFilter::Completed if !item.completed => return false,
            _ => {}
        }
        if self.important_only && !item.important {
            return false;
        }
        if self.search.is_empty() {
            return true;
        }
        item.todo_text
            .to_lowercase()
            .contains(&self.search.to_lowercase())
    }

    /// True when every item is visible, i.e. the subset is the full collection
    pub fn is_identity(&self) -> bool {
        self.status == StatusFilter::All && !self.important_only && self.search.is_empty()
    }

    /// Derive the subset: matching items, copied, ordered by sequence
    pub fn apply(&self, items: &[Item]) -> Vec<Item> {
        let mut subset: Vec<Item> = items.iter().filter(|i| self.matches(i)).cloned().collect();
        sort_by_sequence(&mut subset);
        subset
    }
}

/// Counts shown next to the list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CollectionStats {
    pub total: usize,
    pub not_completed: usize,
    /// Important and not yet completed
    pub important_open: usize,
}

impl CollectionStats {
    pub fn of(items: &[Item]) -> Self {
        Self {
            total: items.len(),
            not_completed: items.iter().filter(|i| !i.completed).count(),
            important_open: items.iter().filter(|i| !i.completed && i.important).count(),
        }
    }
}
