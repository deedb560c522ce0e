//! Key-value table clients
//!
//! [`TableClient`] is the narrow slice of DynamoDB the session store needs.
//! It is implemented for `aws_sdk_dynamodb::Client` and for [`MemoryTable`].

use async_trait::async_trait;
use serde_json::Value;

use crate::config::TableConfig;
use crate::error::SessionError;

mod memory;

#[cfg(feature = "dynamodb")]
mod conversions;
#[cfg(feature = "dynamodb")]
mod dynamodb;

pub use memory::MemoryTable;

#[cfg(feature = "dynamodb")]
pub use conversions::{attribute_to_value, value_to_attribute};

/// Name of the numeric expiry attribute (seconds since the Unix epoch)
pub const EXPIRES_ATTRIBUTE: &str = "expires";

/// Name of the field inside the payload stamped on every save/touch
pub const UPDATED_FIELD: &str = "updated";

/// A session item as read back from the table
#[derive(Debug, Clone, PartialEq)]
pub struct StoredSession {
    /// Contents of the data attribute
    pub data: Value,
    /// `expires` in seconds, `None` when the attribute is missing
    pub expires: Option<i64>,
}

/// Partial update applied to a single item
#[derive(Debug, Clone, PartialEq)]
pub enum ItemUpdate {
    /// Write the whole payload and the expiry (save)
    Replace { data: Value, expires: i64 },
    /// Refresh the expiry and the payload's nested `updated` field (touch)
    Refresh { updated: i64, expires: i64 },
}

/// Outcome of table initialization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableStatus {
    Exists,
    Created,
}

/// Table operations used by the session store.
///
/// Every method issues a single request and never retries.
#[async_trait]
pub trait TableClient: Send + Sync + 'static {
    /// Whether the table exists. Only a definite "not found" yields `false`.
    async fn table_exists(&self, table: &TableConfig) -> Result<bool, SessionError>;

    /// Create the table with a single string hash key
    async fn create_table(&self, table: &TableConfig) -> Result<(), SessionError>;

    /// Strongly consistent point read
    async fn get_item(
        &self,
        table: &TableConfig,
        key: &str,
    ) -> Result<Option<StoredSession>, SessionError>;

    async fn update_item(
        &self,
        table: &TableConfig,
        key: &str,
        update: ItemUpdate,
    ) -> Result<(), SessionError>;

    async fn delete_item(&self, table: &TableConfig, key: &str) -> Result<(), SessionError>;

    /// Keys carrying the table's prefix whose `expires` is missing or `<= now_secs`
    async fn scan_expired(
        &self,
        table: &TableConfig,
        now_secs: i64,
    ) -> Result<Vec<String>, SessionError>;
}
