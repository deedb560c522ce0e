//! DynamoDB session store compatible with connect-dynamodb
//!
//! This store uses the same storage format as connect-dynamodb:
//! - Key: `prefix + session_id` (default prefix: "sess_") in the hash key attribute
//! - Value: the session payload as a map in the data attribute (default "sess")
//! - `expires`: expiry in seconds since the Unix epoch

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, info};

use super::SessionStore;
use crate::config::{StoreConfig, StoreOptions};
use crate::error::SessionError;
use crate::expiry::{
    expiration_for, is_expired, to_millis_epoch, to_seconds_epoch, touch_due, Clock, SystemClock,
};
use crate::session::SessionData;
use crate::table::{ItemUpdate, TableClient, TableStatus, UPDATED_FIELD};

/// DynamoDB session store compatible with connect-dynamodb
///
/// Generic over the [`TableClient`] so the same logic runs against DynamoDB
/// or [`MemoryTable`](crate::table::MemoryTable).
///
/// # Example
///
/// ```rust,ignore
/// use salvo_dynamodb_session::{DynamoStore, StoreOptions};
///
/// let options = StoreOptions::new()
///     .with_table_name("app-sessions")
///     .with_region("us-east-1");
/// let store = DynamoStore::connect(options).await?;
/// ```
pub struct DynamoStore<C> {
    client: Arc<C>,
    config: Arc<StoreConfig>,
    clock: Arc<dyn Clock>,
}

impl<C: TableClient> DynamoStore<C> {
    /// Create a store over an existing client. The table is not checked.
    pub fn new(client: C, config: StoreConfig) -> Self {
        Self {
            client: Arc::new(client),
            config: Arc::new(config),
            clock: Arc::new(SystemClock),
        }
    }

    /// Resolve `options` and create a store over an existing client
    pub fn from_options(client: C, options: StoreOptions) -> Result<Self, SessionError> {
        Ok(Self::new(client, options.resolve()?))
    }

    /// Use a different time source
    pub fn with_clock<K: Clock>(mut self, clock: K) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Make sure the table exists, creating it if DynamoDB reports it missing.
    ///
    /// Does not wait for a newly created table to become active.
    pub async fn initialize(&self) -> Result<TableStatus, SessionError> {
        let table = &self.config.table;
        debug!(table = %table.name, "describing session table");

        if self.client.table_exists(table).await? {
            return Ok(TableStatus::Exists);
        }

        info!(
            table = %table.name,
            hash_key = %table.hash_key,
            read_capacity_units = table.read_capacity_units,
            write_capacity_units = table.write_capacity_units,
            "creating session table"
        );
        self.client.create_table(table).await?;
        Ok(TableStatus::Created)
    }

    /// Run [`initialize`](Self::initialize) on a background task.
    ///
    /// Failures are logged; the store is usable immediately, so early calls
    /// may race the table becoming active.
    pub fn initialize_in_background(&self) -> tokio::task::JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            if let Err(e) = store.initialize().await {
                error!(table = %store.config.table.name, "Failed to initialize session table: {}", e);
            }
        })
    }

    /// Delete every expired session of this store. Returns how many were removed.
    pub async fn reap(&self) -> Result<usize, SessionError> {
        let table = &self.config.table;
        let now_secs = to_seconds_epoch(self.clock.now());
        let keys = self.client.scan_expired(table, now_secs).await?;

        for key in &keys {
            self.client.delete_item(table, key).await?;
        }
        debug!(table = %table.name, reaped = keys.len(), "reaped expired sessions");
        Ok(keys.len())
    }

    /// Expired record found on read: drop it unless expired sessions are kept.
    async fn handle_expired(&self, key: &str) -> Result<Option<SessionData>, SessionError> {
        if self.config.keep_expired {
            debug!(key = %key, "session expired, keeping record");
            return Ok(None);
        }
        debug!(key = %key, "session expired, deleting record");
        self.client.delete_item(&self.config.table, key).await?;
        Ok(None)
    }
}

#[cfg(feature = "dynamodb")]
impl DynamoStore<aws_sdk_dynamodb::Client> {
    /// Build a DynamoDB client from `options.dynamo_config` and create the store.
    ///
    /// The table check/creation runs in the background and is not awaited.
    pub async fn connect(options: StoreOptions) -> Result<Self, SessionError> {
        let config = options.resolve()?;
        let client = config.dynamo_config.load_client().await;
        let store = Self::new(client, config);
        // Detached: table creation is not awaited
        drop(store.initialize_in_background());
        Ok(store)
    }
}

impl<C> Clone for DynamoStore<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            config: Arc::clone(&self.config),
            clock: Arc::clone(&self.clock),
        }
    }
}

#[async_trait]
impl<C: TableClient> SessionStore for DynamoStore<C> {
    async fn get(&self, sid: &str) -> Result<Option<SessionData>, SessionError> {
        let key = self.config.table.key_for(sid);
        debug!(table = %self.config.table.name, key = %key, "loading session");

        let record = match self.client.get_item(&self.config.table, &key).await? {
            Some(record) => record,
            None => return Ok(None),
        };

        if is_expired(record.expires, self.clock.now()) {
            return self.handle_expired(&key).await;
        }

        let session: SessionData = serde_json::from_value(record.data)?;
        Ok(Some(session))
    }

    async fn set(&self, sid: &str, session: &SessionData) -> Result<(), SessionError> {
        let key = self.config.table.key_for(sid);
        let now = self.clock.now();
        let expires = to_seconds_epoch(expiration_for(&self.config, session, now)?);

        let mut session = session.clone();
        // Flattened keys would shadow the struct fields when serialized
        session.data.remove(UPDATED_FIELD);
        session.data.remove("cookie");
        session.updated = Some(to_millis_epoch(now));
        let data = serde_json::to_value(&session)?;

        debug!(table = %self.config.table.name, key = %key, expires, "saving session");
        self.client
            .update_item(&self.config.table, &key, ItemUpdate::Replace { data, expires })
            .await
    }

    async fn destroy(&self, sid: &str) -> Result<(), SessionError> {
        let key = self.config.table.key_for(sid);
        debug!(table = %self.config.table.name, key = %key, "destroying session");
        self.client.delete_item(&self.config.table, &key).await
    }

    async fn touch(&self, sid: &str, session: &SessionData) -> Result<(), SessionError> {
        let now = self.clock.now();
        if !touch_due(session.updated, self.config.touch_interval, now) {
            return Ok(());
        }

        let key = self.config.table.key_for(sid);
        let expires = to_seconds_epoch(expiration_for(&self.config, session, now)?);
        let updated = to_millis_epoch(now);

        debug!(table = %self.config.table.name, key = %key, expires, "touching session");
        self.client
            .update_item(&self.config.table, &key, ItemUpdate::Refresh { updated, expires })
            .await
    }
}

#[cfg(all(test, feature = "dynamodb"))]
mod tests {
    // Tests require DynamoDB Local on port 8000
    // Run with: cargo test -- --ignored

    use super::*;
    use std::time::Duration;

    #[tokio::test]
    #[ignore]
    async fn test_dynamodb_store_basic() {
        let options = StoreOptions::new()
            .with_table_name("salvo-dynamodb-session-test")
            .with_region("us-east-1")
            .with_endpoint("http://localhost:8000")
            .with_credentials("local", "local");
        let config = options.resolve().unwrap();
        let client = config.dynamo_config.load_client().await;
        let store = DynamoStore::new(client, config);

        if store.initialize().await.unwrap() == TableStatus::Created {
            // DynamoDB Local activates tables almost immediately
            tokio::time::sleep(Duration::from_millis(500)).await;
        }

        let mut data = SessionData::new(3_600_000, chrono::Utc::now());
        data.set("user", "alice");

        store.set("test-id", &data).await.unwrap();

        let retrieved = store.get("test-id").await.unwrap().unwrap();
        assert_eq!(retrieved.get::<String>("user"), Some("alice".to_string()));
        assert!(retrieved.updated.is_some());

        // Within the touch interval: no write, still fine
        store.touch("test-id", &retrieved).await.unwrap();

        store.destroy("test-id").await.unwrap();
        assert!(store.get("test-id").await.unwrap().is_none());
    }
}
