//! Session-scoped index of conversation threads.

use serde::{Deserialize, Serialize};

/// Title given to a thread started with "New Chat".
pub const NEW_THREAD_TITLE: &str = "New Conversation";

/// Title given to a thread discovered in the agent runtime.
pub const OLD_THREAD_TITLE: &str = "Old Conversation";

/// A known thread and its sidebar title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadEntry {
    /// Opaque thread id.
    pub id: String,
    /// Sidebar title.
    pub title: String,
}

/// Ordered registry of threads with unique ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThreadRegistry {
    entries: Vec<ThreadEntry>,
}

impl ThreadRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `{id, title}` unless `id` is already present.
    ///
    /// Returns `true` when a new entry was added.
    pub fn register(&mut self, id: impl Into<String>, title: impl Into<String>) -> bool {
        let id = id.into();
        if self.contains(&id) {
            return false;
        }
        self.entries.push(ThreadEntry {
            id,
            title: title.into(),
        });
        true
    }

    /// Rename an existing thread. Unknown ids are ignored.
    pub fn set_title(&mut self, id: &str, title: impl Into<String>) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) {
            entry.title = title.into();
        }
    }

    /// Look up a thread by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ThreadEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Check whether `id` is registered.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Number of registered threads.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &ThreadEntry> {
        self.entries.iter()
    }

    /// Entries in sidebar order, most recently registered first.
    pub fn newest_first(&self) -> impl Iterator<Item = &ThreadEntry> {
        self.entries.iter().rev()
    }
}
