//! Data Models
//!
//! Records exchanged with the remote store, plus the patch type used for
//! partial updates.

use serde::{Deserialize, Serialize};

/// A todo record. `id` is immutable; `sequence` is the persisted rank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: u32,
    #[serde(default)]
    pub sequence: i64,
    pub todo_text: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub important: bool,
}

/// Content of an item that does not exist yet. Id and sequence are
/// assigned by `CollectionStore::create`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewItem {
    pub todo_text: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub important: bool,
}

impl NewItem {
    pub fn new(todo_text: impl Into<String>) -> Self {
        Self {
            todo_text: todo_text.into(),
            ..Default::default()
        }
    }

    pub fn important(mut self) -> Self {
        self.important = true;
        self
    }

    pub(crate) fn into_item(self, id: u32, sequence: i64) -> Item {
        Item {
            id,
            sequence,
            todo_text: self.todo_text,
            completed: self.completed,
            important: self.important,
        }
    }
}

/// Partial update of one item.
///
/// Merge rule: a field set to `Some` replaces the current value, a field
/// left `None` keeps the current value. There is no way to "unset" a field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemPatch {
    pub id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub todo_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub important: Option<bool>,
}

impl ItemPatch {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    /// A pure reorder write: only the rank changes
    pub fn reorder(id: u32, sequence: i64) -> Self {
        Self {
            id,
            sequence: Some(sequence),
            ..Default::default()
        }
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.todo_text = Some(text.into());
        self
    }

    pub fn completed(mut self, completed: bool) -> Self {
        self.completed = Some(completed);
        self
    }

    pub fn important(mut self, important: bool) -> Self {
        self.important = Some(important);
        self
    }

    /// True when the patch carries `sequence` and nothing else.
    /// Such writes skip the artificial update delay.
    pub fn is_sequence_only(&self) -> bool {
        self.sequence.is_some()
            && self.todo_text.is_none()
            && self.completed.is_none()
            && self.important.is_none()
    }

    /// Apply onto a copy of `current`; `current` itself is never touched.
    pub fn merge_into(&self, current: &Item) -> Item {
        Item {
            id: current.id,
            sequence: self.sequence.unwrap_or(current.sequence),
            todo_text: self
                .todo_text
                .clone()
                .unwrap_or_else(|| current.todo_text.clone()),
            completed: self.completed.unwrap_or(current.completed),
            important: self.important.unwrap_or(current.important),
        }
    }
}

/// Sort by sequence. Stable, so equal ranks keep insertion order.
pub fn sort_by_sequence(items: &mut [Item]) {
    items.sort_by_key(|item| item.sequence);
}
