//! In-memory table
//!
//! This is primarily for development and testing.
//! It mimics the DynamoDB behaviour the store depends on, including errors
//! for missing tables and for refreshing an item that does not exist.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::{ItemUpdate, StoredSession, TableClient, UPDATED_FIELD};
use crate::config::TableConfig;
use crate::error::SessionError;

type Items = HashMap<String, StoredSession>;

/// In-memory stand-in for a DynamoDB table set
///
/// Clones share the same tables.
#[derive(Clone, Default)]
pub struct MemoryTable {
    tables: Arc<RwLock<HashMap<String, Items>>>,
    writes: Arc<AtomicUsize>,
}

impl MemoryTable {
    /// Create an empty instance with no tables
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an instance where `table` already exists
    pub fn with_table(table: &TableConfig) -> Self {
        let memory = Self::new();
        memory.tables.write().insert(table.name.clone(), HashMap::new());
        memory
    }

    /// Read an item without going through the store
    pub fn item(&self, table: &str, key: &str) -> Option<StoredSession> {
        self.tables.read().get(table)?.get(key).cloned()
    }

    /// Put an item directly, bypassing the store
    pub fn insert(&self, table: &str, key: &str, item: StoredSession) {
        self.tables
            .write()
            .entry(table.to_string())
            .or_default()
            .insert(key.to_string(), item);
    }

    /// Number of items in a table
    pub fn len(&self, table: &str) -> usize {
        self.tables.read().get(table).map_or(0, HashMap::len)
    }

    /// Number of update/delete requests served so far
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn not_found(table: &TableConfig) -> SessionError {
        SessionError::Store(format!("Requested resource not found: table {}", table.name))
    }
}

#[async_trait]
impl TableClient for MemoryTable {
    async fn table_exists(&self, table: &TableConfig) -> Result<bool, SessionError> {
        Ok(self.tables.read().contains_key(&table.name))
    }

    async fn create_table(&self, table: &TableConfig) -> Result<(), SessionError> {
        let mut tables = self.tables.write();
        if tables.contains_key(&table.name) {
            return Err(SessionError::Store(format!(
                "Table already exists: {}",
                table.name
            )));
        }
        tables.insert(table.name.clone(), HashMap::new());
        Ok(())
    }

    async fn get_item(
        &self,
        table: &TableConfig,
        key: &str,
    ) -> Result<Option<StoredSession>, SessionError> {
        let tables = self.tables.read();
        let items = tables.get(&table.name).ok_or_else(|| Self::not_found(table))?;
        Ok(items.get(key).cloned())
    }

    async fn update_item(
        &self,
        table: &TableConfig,
        key: &str,
        update: ItemUpdate,
    ) -> Result<(), SessionError> {
        let mut tables = self.tables.write();
        let items = tables
            .get_mut(&table.name)
            .ok_or_else(|| Self::not_found(table))?;
        self.writes.fetch_add(1, Ordering::SeqCst);

        match update {
            ItemUpdate::Replace { data, expires } => {
                items.insert(
                    key.to_string(),
                    StoredSession {
                        data,
                        expires: Some(expires),
                    },
                );
            }
            ItemUpdate::Refresh { updated, expires } => {
                let invalid_path = || {
                    SessionError::Store(
                        "The document path provided in the update expression is invalid for update"
                            .to_string(),
                    )
                };
                let item = items.get_mut(key).ok_or_else(invalid_path)?;
                let data = item.data.as_object_mut().ok_or_else(invalid_path)?;
                data.insert(UPDATED_FIELD.to_string(), Value::from(updated));
                item.expires = Some(expires);
            }
        }
        Ok(())
    }

    async fn delete_item(&self, table: &TableConfig, key: &str) -> Result<(), SessionError> {
        let mut tables = self.tables.write();
        let items = tables
            .get_mut(&table.name)
            .ok_or_else(|| Self::not_found(table))?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        items.remove(key);
        Ok(())
    }

    async fn scan_expired(
        &self,
        table: &TableConfig,
        now_secs: i64,
    ) -> Result<Vec<String>, SessionError> {
        let tables = self.tables.read();
        let items = tables.get(&table.name).ok_or_else(|| Self::not_found(table))?;
        Ok(items
            .iter()
            .filter(|(key, _)| key.starts_with(&table.hash_prefix))
            .filter(|(_, item)| item.expires.map_or(true, |expires| expires <= now_secs))
            .map(|(key, _)| key.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreOptions;
    use serde_json::json;

    fn table() -> TableConfig {
        StoreOptions::new().resolve().unwrap().table
    }

    #[tokio::test]
    async fn test_create_and_probe() {
        let memory = MemoryTable::new();
        let table = table();

        assert!(!memory.table_exists(&table).await.unwrap());
        memory.create_table(&table).await.unwrap();
        assert!(memory.table_exists(&table).await.unwrap());
        assert!(memory.create_table(&table).await.is_err());
    }

    #[tokio::test]
    async fn test_missing_table_errors() {
        let memory = MemoryTable::new();
        let err = memory.get_item(&table(), "sess_a").await.unwrap_err();
        assert!(matches!(err, SessionError::Store(_)));
    }

    #[tokio::test]
    async fn test_replace_then_refresh() {
        let table = table();
        let memory = MemoryTable::with_table(&table);

        memory
            .update_item(
                &table,
                "sess_a",
                ItemUpdate::Replace {
                    data: json!({ "user": "alice" }),
                    expires: 10,
                },
            )
            .await
            .unwrap();
        memory
            .update_item(&table, "sess_a", ItemUpdate::Refresh { updated: 5000, expires: 20 })
            .await
            .unwrap();

        let item = memory.item("sessions", "sess_a").unwrap();
        assert_eq!(item.expires, Some(20));
        assert_eq!(item.data, json!({ "user": "alice", "updated": 5000 }));
        assert_eq!(memory.write_count(), 2);
    }

    #[tokio::test]
    async fn test_refresh_missing_item_fails() {
        let table = table();
        let memory = MemoryTable::with_table(&table);

        let result = memory
            .update_item(&table, "sess_nope", ItemUpdate::Refresh { updated: 1, expires: 1 })
            .await;
        assert!(result.is_err());
        assert_eq!(memory.len("sessions"), 0);
    }

    #[tokio::test]
    async fn test_scan_expired_respects_prefix() {
        let table = table();
        let memory = MemoryTable::with_table(&table);
        let item = |expires| StoredSession {
            data: json!({}),
            expires,
        };
        memory.insert("sessions", "sess_old", item(Some(5)));
        memory.insert("sessions", "sess_new", item(Some(50)));
        memory.insert("sessions", "sess_none", item(None));
        memory.insert("sessions", "other_old", item(Some(5)));

        let mut keys = memory.scan_expired(&table, 10).await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["sess_none".to_string(), "sess_old".to_string()]);
    }
}
