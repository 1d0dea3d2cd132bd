//! In-memory store: useful for testing and ephemeral sessions.
//!
//! Every operation takes the single write lock for its whole duration, so
//! multi-step operations (cascades, remember-on-delete) are atomic.

use async_trait::async_trait;
use shoplist_core::{
    InvariantViolation, Item, ItemRepository, List, ListRepository, MemoryEntry, MemoryRepository,
    Store, StoreError, ValidationError, display_order, normalize_name,
};
use std::collections::BTreeMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct State {
    lists: BTreeMap<i64, List>,
    items: BTreeMap<i64, Item>,
    memory: Vec<MemoryEntry>,
    next_list_id: i64,
    next_item_id: i64,
    next_memory_id: i64,
}

impl State {
    fn allocate(counter: &mut i64) -> i64 {
        *counter += 1;
        *counter
    }

    fn forget(&mut self, list_id: i64, name: &str) {
        self.memory
            .retain(|m| !(m.list_id == list_id && m.name == name));
    }
}

/// An in-memory store with the same semantics as the SQLite backend.
#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an item that belongs to no list, as found in legacy data.
    pub async fn insert_orphan(&self, name: &str) -> Item {
        let mut state = self.state.write().await;
        let id = State::allocate(&mut state.next_item_id);
        let item = Item {
            id,
            list_id: 0,
            name: name.to_string(),
            completed: false,
        };
        state.items.insert(id, item.clone());
        item
    }
}

#[async_trait]
impl ListRepository for InMemoryStore {
    async fn list_all(&self) -> shoplist_core::Result<Vec<List>> {
        Ok(self.state.read().await.lists.values().cloned().collect())
    }

    async fn get_list(&self, id: i64) -> shoplist_core::Result<Option<List>> {
        Ok(self.state.read().await.lists.get(&id).cloned())
    }

    async fn create_list(&self, name: &str) -> shoplist_core::Result<List> {
        let name = normalize_name(name).ok_or(ValidationError::EmptyName)?;
        let mut state = self.state.write().await;
        let id = State::allocate(&mut state.next_list_id);
        let list = List {
            id,
            name: name.to_string(),
        };
        state.lists.insert(id, list.clone());
        Ok(list)
    }

    async fn rename_list(&self, id: i64, name: &str) -> shoplist_core::Result<()> {
        let Some(name) = normalize_name(name) else {
            return Ok(());
        };
        let mut state = self.state.write().await;
        if let Some(list) = state.lists.get_mut(&id) {
            list.name = name.to_string();
        }
        Ok(())
    }

    async fn delete_list(&self, id: i64) -> shoplist_core::Result<()> {
        let mut state = self.state.write().await;
        if !state.lists.contains_key(&id) {
            return Ok(());
        }
        if state.lists.len() <= 1 {
            return Err(InvariantViolation::LastListProtected.into());
        }

        state.lists.remove(&id);
        state.items.retain(|_, item| item.list_id != id);
        state.memory.retain(|m| m.list_id != id);
        Ok(())
    }

    async fn ensure_default(&self, name: &str) -> shoplist_core::Result<Option<List>> {
        let name = normalize_name(name).ok_or(ValidationError::EmptyName)?;
        let mut state = self.state.write().await;
        if !state.lists.is_empty() {
            return Ok(None);
        }

        let id = State::allocate(&mut state.next_list_id);
        let list = List {
            id,
            name: name.to_string(),
        };
        state.lists.insert(id, list.clone());

        // Every item is an orphan when no list existed.
        for item in state.items.values_mut() {
            item.list_id = id;
        }
        Ok(Some(list))
    }
}

#[async_trait]
impl ItemRepository for InMemoryStore {
    async fn items_for(&self, list_id: i64) -> Result<Vec<Item>, StoreError> {
        let state = self.state.read().await;
        let mut items: Vec<Item> = state
            .items
            .values()
            .filter(|item| item.list_id == list_id)
            .cloned()
            .collect();
        items.sort_by(display_order);
        Ok(items)
    }

    async fn get_item(&self, id: i64) -> Result<Option<Item>, StoreError> {
        Ok(self.state.read().await.items.get(&id).cloned())
    }

    async fn add_item(&self, list_id: i64, name: &str) -> Result<Option<Item>, StoreError> {
        let Some(name) = normalize_name(name) else {
            return Ok(None);
        };
        let mut state = self.state.write().await;
        if !state.lists.contains_key(&list_id) {
            return Ok(None);
        }

        let id = State::allocate(&mut state.next_item_id);
        let item = Item {
            id,
            list_id,
            name: name.to_string(),
            completed: false,
        };
        state.items.insert(id, item.clone());
        state.forget(list_id, name);
        Ok(Some(item))
    }

    async fn rename_item(&self, id: i64, name: &str) -> Result<Option<Item>, StoreError> {
        let mut state = self.state.write().await;
        let Some(item) = state.items.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = normalize_name(name) {
            item.name = name.to_string();
        }
        Ok(Some(item.clone()))
    }

    async fn toggle_completed(&self, id: i64) -> Result<Option<Item>, StoreError> {
        let mut state = self.state.write().await;
        Ok(state.items.get_mut(&id).map(|item| {
            item.completed = !item.completed;
            item.clone()
        }))
    }

    async fn delete_item(&self, id: i64) -> Result<Option<Item>, StoreError> {
        let mut state = self.state.write().await;
        let Some(item) = state.items.remove(&id) else {
            return Ok(None);
        };

        let known_list = state.lists.contains_key(&item.list_id);
        let remembered = state
            .memory
            .iter()
            .any(|m| m.list_id == item.list_id && m.name == item.name);
        if known_list && !remembered {
            let memory_id = State::allocate(&mut state.next_memory_id);
            state.memory.push(MemoryEntry {
                id: memory_id,
                list_id: item.list_id,
                name: item.name.clone(),
            });
        }
        Ok(Some(item))
    }
}

#[async_trait]
impl MemoryRepository for InMemoryStore {
    async fn suggestions(&self, list_id: i64) -> Result<Vec<String>, StoreError> {
        let state = self.state.read().await;
        let mut names: Vec<String> = state
            .memory
            .iter()
            .filter(|m| m.list_id == list_id)
            .map(|m| m.name.clone())
            .collect();
        names.sort();
        names.dedup();
        Ok(names)
    }

    async fn forget_item_name(&self, item_id: i64) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if let Some(item) = state.items.get(&item_id).cloned() {
            state.forget(item.list_id, &item.name);
        }
        Ok(())
    }

    async fn forget(&self, list_id: i64, name: &str) -> Result<(), StoreError> {
        if let Some(name) = normalize_name(name) {
            self.state.write().await.forget(list_id, name);
        }
        Ok(())
    }
}

impl Store for InMemoryStore {
    fn backend_name(&self) -> &str {
        "in_memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shoplist_core::Error;

    async fn bootstrapped() -> (InMemoryStore, List) {
        let store = InMemoryStore::new();
        let list = store.ensure_default("Main List").await.unwrap().unwrap();
        (store, list)
    }

    #[tokio::test]
    async fn ordering_matches_sqlite_backend() {
        let (store, list) = bootstrapped().await;
        let a = store.add_item(list.id, "A").await.unwrap().unwrap();
        let b = store.add_item(list.id, "B").await.unwrap().unwrap();
        let c = store.add_item(list.id, "C").await.unwrap().unwrap();
        store.toggle_completed(b.id).await.unwrap();

        let ids: Vec<i64> = store
            .items_for(list.id)
            .await
            .unwrap()
            .iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(ids, vec![c.id, a.id, b.id]);
    }

    #[tokio::test]
    async fn last_list_protected_and_cascade() {
        let (store, main) = bootstrapped().await;
        assert!(matches!(
            store.delete_list(main.id).await,
            Err(Error::Invariant(InvariantViolation::LastListProtected))
        ));

        let extra = store.create_list("Extra").await.unwrap();
        let item = store.add_item(extra.id, "tape").await.unwrap().unwrap();
        store.add_item(extra.id, "rope").await.unwrap();
        store.delete_item(item.id).await.unwrap();

        store.delete_list(extra.id).await.unwrap();
        assert!(store.items_for(extra.id).await.unwrap().is_empty());
        assert!(store.suggestions(extra.id).await.unwrap().is_empty());
        assert_eq!(store.list_all().await.unwrap(), vec![main]);
    }

    #[tokio::test]
    async fn memory_round_trip_and_dedup() {
        let (store, list) = bootstrapped().await;
        let one = store.add_item(list.id, "milk").await.unwrap().unwrap();
        let two = store.add_item(list.id, "milk").await.unwrap().unwrap();
        store.delete_item(one.id).await.unwrap();
        store.delete_item(two.id).await.unwrap();

        assert_eq!(store.state.read().await.memory.len(), 1);
        assert_eq!(store.suggestions(list.id).await.unwrap(), vec!["milk"]);

        store.add_item(list.id, "milk").await.unwrap();
        assert!(store.suggestions(list.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn bootstrap_adopts_orphans_once() {
        let store = InMemoryStore::new();
        store.insert_orphan("legacy").await;

        let list = store.ensure_default("Main List").await.unwrap().unwrap();
        assert!(store.ensure_default("Main List").await.unwrap().is_none());
        assert_eq!(store.items_for(list.id).await.unwrap()[0].name, "legacy");
    }

    #[tokio::test]
    async fn blank_inputs_are_noops() {
        let (store, list) = bootstrapped().await;
        assert!(matches!(
            store.create_list(" ").await,
            Err(Error::Validation(ValidationError::EmptyName))
        ));
        assert!(store.add_item(list.id, "").await.unwrap().is_none());

        let item = store.add_item(list.id, "rice").await.unwrap().unwrap();
        let same = store.rename_item(item.id, "\t").await.unwrap().unwrap();
        assert_eq!(same.name, "rice");
    }
}
