//! In-memory (single process) implementation of the membership table for
//! local development and tests.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;

pub use error::Error;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use natsmesh_store::{MembershipEntry, MembershipStore};
use tokio::sync::Mutex;

/// In-memory membership table. Clones share the same underlying map.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    map: Arc<Mutex<HashMap<String, MembershipEntry>>>,
}

impl MemoryStore {
    /// Creates a new `MemoryStore`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            map: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl MembershipStore for MemoryStore {
    type Error = Error;

    async fn delete<A: AsRef<str> + Send>(&self, address: A) -> Result<(), Self::Error> {
        self.map.lock().await.remove(address.as_ref());
        Ok(())
    }

    async fn get<A: AsRef<str> + Send>(
        &self,
        address: A,
    ) -> Result<Option<MembershipEntry>, Self::Error> {
        let map = self.map.lock().await;
        Ok(map.get(address.as_ref()).cloned())
    }

    async fn put(&self, entry: MembershipEntry) -> Result<(), Self::Error> {
        self.map.lock().await.insert(entry.address.clone(), entry);
        Ok(())
    }

    async fn scan(&self) -> Result<Vec<MembershipEntry>, Self::Error> {
        let map = self.map.lock().await;
        Ok(map.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use natsmesh_store::NodeStatus;

    fn entry(address: &str, last_seen: u64, status: NodeStatus) -> MembershipEntry {
        MembershipEntry {
            address: address.to_string(),
            last_seen,
            status,
        }
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let store = MemoryStore::new();
        let row = entry("10.0.0.1", 100, NodeStatus::Starting);

        store.put(row.clone()).await.unwrap();
        let result = store.get("10.0.0.1").await.unwrap();

        assert_eq!(result, Some(row));
    }

    #[tokio::test]
    async fn test_put_is_upsert() {
        let store = MemoryStore::new();

        store
            .put(entry("10.0.0.1", 100, NodeStatus::Starting))
            .await
            .unwrap();
        store
            .put(entry("10.0.0.1", 200, NodeStatus::Working))
            .await
            .unwrap();

        let entries = store.scan().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].last_seen, 200);
        assert_eq!(entries[0].status, NodeStatus::Working);
    }

    #[tokio::test]
    async fn test_delete_absent_is_noop() {
        let store = MemoryStore::new();

        assert!(store.delete("10.0.0.9").await.is_ok());

        store
            .put(entry("10.0.0.1", 100, NodeStatus::Working))
            .await
            .unwrap();
        store.delete("10.0.0.1").await.unwrap();
        store.delete("10.0.0.1").await.unwrap();

        assert!(store.scan().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let store = MemoryStore::new();
        let clone = store.clone();

        clone
            .put(entry("10.0.0.1", 100, NodeStatus::Working))
            .await
            .unwrap();

        assert_eq!(store.scan().await.unwrap().len(), 1);
    }
}
