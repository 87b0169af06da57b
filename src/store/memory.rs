// In-process item store
// Items live for the lifetime of the process; every operation holds the
// lock once so concurrent creates and deletes are serialized.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

use super::{ItemStore, Result, StoreError};
use crate::model::{Item, ItemPatch};

/// Ordered in-memory collection, insertion order preserved
pub struct MemoryStore {
    items: RwLock<Vec<Item>>,
    next_id: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ItemStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    fn next_id(&self) -> String {
        self.next_id.fetch_add(1, Ordering::SeqCst).to_string()
    }

    async fn get(&self, id: &str) -> Result<Option<Item>> {
        let items = self.items.read().await;
        Ok(items.iter().find(|item| item.id == id).cloned())
    }

    async fn list(&self) -> Result<Vec<Item>> {
        // Newest insertions first, so equal timestamps still list newest first
        let items = self.items.read().await;
        Ok(items.iter().rev().cloned().collect())
    }

    async fn put(&self, item: &Item) -> Result<()> {
        let mut items = self.items.write().await;
        if items.iter().any(|existing| existing.id == item.id) {
            return Err(StoreError::Conflict(item.id.clone()));
        }
        items.push(item.clone());
        drop(items);
        Ok(())
    }

    async fn update(
        &self,
        id: &str,
        patch: &ItemPatch,
        now: DateTime<Utc>,
    ) -> Result<Option<Item>> {
        let mut items = self.items.write().await;
        Ok(items.iter_mut().find(|item| item.id == id).map(|item| {
            item.apply(patch, now);
            item.clone()
        }))
    }

    async fn delete(&self, id: &str) -> Result<Option<Item>> {
        let mut items = self.items.write().await;
        Ok(items
            .iter()
            .position(|item| item.id == id)
            .map(|index| items.remove(index)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn at(millis: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(millis).unwrap()
    }

    fn item(store: &MemoryStore, name: &str, millis: i64) -> Item {
        Item::new(store.next_id(), name.into(), format!("{name} desc"), at(millis))
    }

    #[tokio::test]
    async fn test_put_get_delete() {
        let store = MemoryStore::new();
        let a = item(&store, "a", 1);
        store.put(&a).await.unwrap();

        assert_eq!(store.get(&a.id).await.unwrap(), Some(a.clone()));
        assert_eq!(store.delete(&a.id).await.unwrap(), Some(a.clone()));
        assert_eq!(store.get(&a.id).await.unwrap(), None);
        assert_eq!(store.delete(&a.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_put_rejects_duplicate_id() {
        let store = MemoryStore::new();
        let a = item(&store, "a", 1);
        store.put(&a).await.unwrap();
        let err = store.put(&a).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(id) if id == a.id));
    }

    #[tokio::test]
    async fn test_ids_are_never_reused() {
        let store = MemoryStore::new();
        let a = item(&store, "a", 1);
        store.put(&a).await.unwrap();
        store.delete(&a.id).await.unwrap();
        let b = item(&store, "b", 2);
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_none() {
        let store = MemoryStore::new();
        let patch = ItemPatch {
            name: Some("x".into()),
            description: None,
        };
        assert_eq!(store.update("missing", &patch, at(5)).await.unwrap(), None);
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_returns_newest_insertion_first() {
        let store = MemoryStore::new();
        for (name, millis) in [("a", 1), ("b", 1), ("c", 1)] {
            store.put(&item(&store, name, millis)).await.unwrap();
        }
        let names: Vec<_> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(names, ["c", "b", "a"]);
    }

    #[tokio::test]
    async fn test_concurrent_creates_keep_every_item() {
        let store = Arc::new(MemoryStore::new());
        let mut handles = Vec::new();
        for n in 0..32 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                let new = Item::new(store.next_id(), format!("n{n}"), "d".into(), at(n));
                store.put(&new).await.map(|()| new.id)
            }));
        }
        let mut ids = HashSet::new();
        for handle in handles {
            ids.insert(handle.await.unwrap().unwrap());
        }
        assert_eq!(ids.len(), 32);
        assert_eq!(store.list().await.unwrap().len(), 32);
    }
}
