//! Persistence contract for per-server documents, plus an in-memory store.
//!
//! Stores hold one document per server and expose dotted-path partial updates
//! as the only mutation primitive. Each `set_field`/`unset_field` call is
//! atomic with respect to concurrent calls on the same document.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use toml::{Table, Value};
use tracing::debug;

use crate::document;
use crate::error::StoreError;
use crate::types::{ServerId, ServerRecord};

#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Current snapshot of a server's document, or `None` if it has none.
    async fn get(&self, server: &ServerId) -> Result<Option<ServerRecord>, StoreError>;

    /// Set `dotted_path` to `value`, creating the document if absent.
    async fn set_field(
        &self,
        server: &ServerId,
        dotted_path: &str,
        value: Value,
    ) -> Result<(), StoreError>;

    /// Remove `dotted_path`. Removing an absent field is a no-op.
    async fn unset_field(&self, server: &ServerId, dotted_path: &str) -> Result<(), StoreError>;
}

/// Convert a raw document table into a typed record.
fn record_from_table(table: Table) -> Result<ServerRecord, StoreError> {
    Value::Table(table)
        .try_into()
        .map_err(|e: toml::de::Error| StoreError::Parse {
            path: "<document>".into(),
            reason: e.to_string(),
        })
}

/// Store backed by a map in process memory.
///
/// Counts writes so callers can verify how many store updates an operation issued.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: RwLock<HashMap<ServerId, Table>>,
    writes: AtomicUsize,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty document for `server` if it has none.
    pub async fn register(&self, server: &ServerId) {
        self.documents
            .write()
            .await
            .entry(server.clone())
            .or_default();
    }

    /// Raw document for `server`, for inspection.
    pub async fn document(&self, server: &ServerId) -> Option<Table> {
        self.documents.read().await.get(server).cloned()
    }

    /// Number of `set_field`/`unset_field` calls the store accepted.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make every subsequent call fail with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ConfigStore for MemoryStore {
    async fn get(&self, server: &ServerId) -> Result<Option<ServerRecord>, StoreError> {
        self.check_available()?;
        let documents = self.documents.read().await;
        documents
            .get(server)
            .cloned()
            .map(record_from_table)
            .transpose()
    }

    async fn set_field(
        &self,
        server: &ServerId,
        dotted_path: &str,
        value: Value,
    ) -> Result<(), StoreError> {
        self.check_available()?;
        let mut documents = self.documents.write().await;
        let doc = documents.entry(server.clone()).or_default();
        document::set_path(doc, dotted_path, value)?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        debug!(server = %server, path = dotted_path, "set field");
        Ok(())
    }

    async fn unset_field(&self, server: &ServerId, dotted_path: &str) -> Result<(), StoreError> {
        self.check_available()?;
        let mut documents = self.documents.write().await;
        if let Some(doc) = documents.get_mut(server) {
            document::unset_path(doc, dotted_path);
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        debug!(server = %server, path = dotted_path, "unset field");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChannelId;

    fn server() -> ServerId {
        ServerId::new("100")
    }

    #[tokio::test]
    async fn missing_document_is_none() {
        let store = MemoryStore::new();
        assert_eq!(store.get(&server()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn registered_document_is_empty_record() {
        let store = MemoryStore::new();
        store.register(&server()).await;
        assert_eq!(
            store.get(&server()).await.unwrap(),
            Some(ServerRecord::default())
        );
    }

    #[tokio::test]
    async fn set_creates_document() {
        let store = MemoryStore::new();
        store
            .set_field(&server(), "config.boosts.channel", Value::String("7".into()))
            .await
            .unwrap();
        let record = store.get(&server()).await.unwrap().unwrap();
        assert_eq!(record.config.boosts.channel, Some(ChannelId::new("7")));
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn unset_is_idempotent() {
        let store = MemoryStore::new();
        store
            .set_field(&server(), "config.prefix", Value::String("?".into()))
            .await
            .unwrap();
        store.unset_field(&server(), "config.prefix").await.unwrap();
        let after_first = store.document(&server()).await;
        store.unset_field(&server(), "config.prefix").await.unwrap();
        assert_eq!(store.document(&server()).await, after_first);
        let record = store.get(&server()).await.unwrap().unwrap();
        assert_eq!(record.config.prefix, None);
    }

    #[tokio::test]
    async fn unset_on_missing_document_does_not_create_it() {
        let store = MemoryStore::new();
        store.unset_field(&server(), "config.prefix").await.unwrap();
        assert_eq!(store.get(&server()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn unavailable_store_fails_every_call() {
        let store = MemoryStore::new();
        store.set_unavailable(true);
        assert!(matches!(
            store.get(&server()).await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(
            store
                .set_field(&server(), "config.prefix", Value::String("?".into()))
                .await
                .is_err()
        );
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn rejected_write_is_not_counted() {
        let store = MemoryStore::new();
        store
            .set_field(&server(), "config.prefix", Value::String("?".into()))
            .await
            .unwrap();
        let err = store
            .set_field(&server(), "config.prefix.inner", Value::String("x".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::PathConflict { .. }));
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn concurrent_writes_to_different_fields_both_land() {
        let store = std::sync::Arc::new(MemoryStore::new());
        let a = {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .set_field(&server(), "config.prefix", Value::String("?".into()))
                    .await
            })
        };
        let b = {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .set_field(&server(), "config.boosts.channel", Value::String("3".into()))
                    .await
            })
        };
        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();
        let record = store.get(&server()).await.unwrap().unwrap();
        assert_eq!(record.config.prefix.as_deref(), Some("?"));
        assert_eq!(record.config.boosts.channel, Some(ChannelId::new("3")));
    }
}
