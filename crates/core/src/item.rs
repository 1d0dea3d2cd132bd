//! Items: the entries of a list, with completion state.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::error::StoreError;

/// A single entry in a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: i64,
    pub list_id: i64,
    pub name: String,
    pub completed: bool,
}

/// Display order for items of a list: open items before completed ones,
/// newest first within each group.
pub fn display_order(a: &Item, b: &Item) -> Ordering {
    a.completed
        .cmp(&b.completed)
        .then_with(|| b.id.cmp(&a.id))
}

/// CRUD over items, coupled with the memory of deleted names.
///
/// Mutations return the affected item so callers can re-render its list;
/// `None` means the id (or target list) was unknown and nothing happened.
#[async_trait]
pub trait ItemRepository: Send + Sync {
    /// Items of a list in [`display_order`].
    async fn items_for(&self, list_id: i64) -> Result<Vec<Item>, StoreError>;

    /// Look up a single item.
    async fn get_item(&self, id: i64) -> Result<Option<Item>, StoreError>;

    /// Add an open item and clear any remembered suggestion with the same name.
    async fn add_item(&self, list_id: i64, name: &str) -> Result<Option<Item>, StoreError>;

    /// Rename an item. Blank names leave it unchanged. Memory is not touched.
    async fn rename_item(&self, id: i64, name: &str) -> Result<Option<Item>, StoreError>;

    /// Flip the completion flag.
    async fn toggle_completed(&self, id: i64) -> Result<Option<Item>, StoreError>;

    /// Remove an item and remember its name as a suggestion for its list.
    async fn delete_item(&self, id: i64) -> Result<Option<Item>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: i64, completed: bool) -> Item {
        Item {
            id,
            list_id: 1,
            name: format!("item-{id}"),
            completed,
        }
    }

    #[test]
    fn open_items_come_first_newest_first() {
        let mut items = vec![item(1, false), item(2, true), item(3, false)];
        items.sort_by(display_order);
        let ids: Vec<i64> = items.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn completed_group_is_also_newest_first() {
        let mut items = vec![item(4, true), item(7, true), item(5, false)];
        items.sort_by(display_order);
        let ids: Vec<i64> = items.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![5, 7, 4]);
    }
}
