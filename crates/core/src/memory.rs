//! Memory: remembered names of deleted items, offered as quick-add suggestions.
//!
//! The lifecycle is driven by the item repository:
//! - deleting an item remembers its name (once per distinct name per list)
//! - adding an item with a remembered name forgets it again
//!
//! Suggestions are advisory and never imply that an item exists.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// A remembered `(list, name)` pair. Unique per list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub id: i64,
    pub list_id: i64,
    pub name: String,
}

#[async_trait]
pub trait MemoryRepository: Send + Sync {
    /// Distinct remembered names for a list, sorted lexicographically.
    async fn suggestions(&self, list_id: i64) -> Result<Vec<String>, StoreError>;

    /// Dismiss the suggestion matching an item's `(list_id, name)`.
    ///
    /// The item itself is left alone. Unknown ids are ignored.
    async fn forget_item_name(&self, item_id: i64) -> Result<(), StoreError>;

    /// Dismiss a suggestion directly.
    async fn forget(&self, list_id: i64, name: &str) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_entry_serialization() {
        let entry = MemoryEntry {
            id: 9,
            list_id: 2,
            name: "milk".into(),
        };
        let json = serde_json::to_string(&entry).unwrap();
        let back: MemoryEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
    }
}
