//! Store configuration
//!
//! [`StoreOptions`] is what callers hand in: every field is optional and the
//! camelCase names match the option names used by connect-dynamodb, so a JSON
//! document can configure the store directly. [`StoreOptions::resolve`] fills
//! in the documented defaults and produces the [`StoreConfig`] the store runs on.

use serde::Deserialize;
use std::fmt;
use std::time::Duration;

use crate::error::SessionError;

/// Default table name
pub const DEFAULT_TABLE_NAME: &str = "sessions";
/// Default prefix prepended to session IDs
pub const DEFAULT_HASH_PREFIX: &str = "sess_";
/// Default name of the hash key attribute
pub const DEFAULT_HASH_KEY: &str = "id";
/// Default name of the session payload attribute
pub const DEFAULT_DATA_ATTRIBUTE: &str = "sess";
/// Default provisioned read/write capacity used when creating the table
pub const DEFAULT_CAPACITY_UNITS: i64 = 5;
/// Default minimum time between two touch writes
pub const DEFAULT_TOUCH_INTERVAL: Duration = Duration::from_millis(30_000);
/// Session lifetime used when neither `ttl` nor the cookie give one (1 day)
pub const DEFAULT_TTL: Duration = Duration::from_millis(86_400_000);
/// Upper bound accepted for `ttl` and `touchInterval` (100 years)
pub const MAX_DURATION: Duration = Duration::from_millis(3_155_760_000_000);

/// Table options as supplied by the caller
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TableOptions {
    /// Table name (default: "sessions")
    pub name: Option<String>,
    /// Prefix for every session ID (default: "sess_")
    pub hash_prefix: Option<String>,
    /// Hash key attribute name (default: "id")
    pub hash_key: Option<String>,
    /// Session payload attribute name (default: "sess")
    pub data_attribute: Option<String>,
    /// Read capacity units, only used at table creation (default: 5)
    pub read_capacity_units: Option<i64>,
    /// Write capacity units, only used at table creation (default: 5)
    pub write_capacity_units: Option<i64>,
}

/// Connection settings for the DynamoDB client.
///
/// Passed through verbatim to the AWS SDK loader. Anything left unset is
/// resolved by the SDK's default provider chain (environment, profile, IMDS).
#[derive(Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DynamoConfig {
    pub region: Option<String>,
    /// Custom endpoint, e.g. `http://localhost:8000` for DynamoDB Local
    pub endpoint: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub session_token: Option<String>,
    /// Named profile from the shared AWS config files
    pub profile: Option<String>,
}

impl fmt::Debug for DynamoConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamoConfig")
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &self.secret_access_key.as_ref().map(|_| "***"))
            .field("session_token", &self.session_token.as_ref().map(|_| "***"))
            .field("profile", &self.profile)
            .finish()
    }
}

/// Options for the DynamoDB session store
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StoreOptions {
    pub table: TableOptions,
    pub dynamo_config: DynamoConfig,
    /// Minimum milliseconds between touch-triggered writes (default: 30000)
    pub touch_interval: Option<u64>,
    /// Fixed session lifetime in milliseconds; overrides the cookie max age
    pub ttl: Option<u64>,
    /// Keep expired sessions in the table instead of deleting them on read
    pub keep_expired: Option<bool>,
}

impl StoreOptions {
    /// Create options with every field left to its default
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse options from a JSON document
    pub fn from_json(json: &str) -> Result<Self, SessionError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set the table name (default: "sessions")
    pub fn with_table_name<S: Into<String>>(mut self, name: S) -> Self {
        self.table.name = Some(name.into());
        self
    }

    /// Set the session ID prefix (default: "sess_")
    pub fn with_hash_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.table.hash_prefix = Some(prefix.into());
        self
    }

    /// Set the hash key attribute name (default: "id")
    pub fn with_hash_key<S: Into<String>>(mut self, hash_key: S) -> Self {
        self.table.hash_key = Some(hash_key.into());
        self
    }

    /// Set the payload attribute name (default: "sess")
    pub fn with_data_attribute<S: Into<String>>(mut self, attribute: S) -> Self {
        self.table.data_attribute = Some(attribute.into());
        self
    }

    /// Set the provisioned throughput used when the table has to be created
    pub fn with_capacity_units(mut self, read: i64, write: i64) -> Self {
        self.table.read_capacity_units = Some(read);
        self.table.write_capacity_units = Some(write);
        self
    }

    /// Replace the DynamoDB connection settings
    pub fn with_dynamo_config(mut self, dynamo_config: DynamoConfig) -> Self {
        self.dynamo_config = dynamo_config;
        self
    }

    /// Set the AWS region
    pub fn with_region<S: Into<String>>(mut self, region: S) -> Self {
        self.dynamo_config.region = Some(region.into());
        self
    }

    /// Set a custom endpoint
    pub fn with_endpoint<S: Into<String>>(mut self, endpoint: S) -> Self {
        self.dynamo_config.endpoint = Some(endpoint.into());
        self
    }

    /// Use static credentials instead of the default provider chain
    pub fn with_credentials<A, S>(mut self, access_key_id: A, secret_access_key: S) -> Self
    where
        A: Into<String>,
        S: Into<String>,
    {
        self.dynamo_config.access_key_id = Some(access_key_id.into());
        self.dynamo_config.secret_access_key = Some(secret_access_key.into());
        self
    }

    /// Set the minimum interval between touch writes (default: 30s)
    pub fn with_touch_interval(mut self, interval: Duration) -> Self {
        self.touch_interval = Some(u64::try_from(interval.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Set a fixed session lifetime
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Keep expired sessions in the table (default: false)
    pub fn with_keep_expired(mut self, keep: bool) -> Self {
        self.keep_expired = Some(keep);
        self
    }

    /// Fill in defaults and validate
    pub fn resolve(self) -> Result<StoreConfig, SessionError> {
        let table = TableConfig {
            name: self.table.name.unwrap_or_else(|| DEFAULT_TABLE_NAME.to_string()),
            hash_prefix: self
                .table
                .hash_prefix
                .unwrap_or_else(|| DEFAULT_HASH_PREFIX.to_string()),
            hash_key: self.table.hash_key.unwrap_or_else(|| DEFAULT_HASH_KEY.to_string()),
            data_attribute: self
                .table
                .data_attribute
                .unwrap_or_else(|| DEFAULT_DATA_ATTRIBUTE.to_string()),
            read_capacity_units: self.table.read_capacity_units.unwrap_or(DEFAULT_CAPACITY_UNITS),
            write_capacity_units: self
                .table
                .write_capacity_units
                .unwrap_or(DEFAULT_CAPACITY_UNITS),
        };
        table.validate()?;

        for (field, value) in [("touchInterval", self.touch_interval), ("ttl", self.ttl)] {
            if value.is_some_and(|ms| ms > MAX_DURATION.as_millis() as u64) {
                return Err(SessionError::Config(format!(
                    "{} must be at most {}ms",
                    field,
                    MAX_DURATION.as_millis()
                )));
            }
        }

        Ok(StoreConfig {
            table,
            dynamo_config: self.dynamo_config,
            touch_interval: self
                .touch_interval
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_TOUCH_INTERVAL),
            ttl: self.ttl.map(Duration::from_millis),
            keep_expired: self.keep_expired.unwrap_or(false),
        })
    }
}

/// Resolved table settings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableConfig {
    pub name: String,
    pub hash_prefix: String,
    pub hash_key: String,
    pub data_attribute: String,
    pub read_capacity_units: i64,
    pub write_capacity_units: i64,
}

impl TableConfig {
    /// Make a storage key from session ID
    pub fn key_for(&self, sid: &str) -> String {
        format!("{}{}", self.hash_prefix, sid)
    }

    fn validate(&self) -> Result<(), SessionError> {
        for (field, value) in [
            ("table.name", &self.name),
            ("table.hashKey", &self.hash_key),
            ("table.dataAttribute", &self.data_attribute),
        ] {
            if value.is_empty() {
                return Err(SessionError::Config(format!("{} must not be empty", field)));
            }
        }
        if self.hash_key == self.data_attribute || self.hash_key == "expires" {
            return Err(SessionError::Config(format!(
                "table.hashKey `{}` collides with another attribute",
                self.hash_key
            )));
        }
        if self.data_attribute == "expires" {
            return Err(SessionError::Config(
                "table.dataAttribute must not be `expires`".to_string(),
            ));
        }
        if self.read_capacity_units < 1 || self.write_capacity_units < 1 {
            return Err(SessionError::Config(
                "capacity units must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Fully resolved store configuration
#[derive(Clone, Debug)]
pub struct StoreConfig {
    pub table: TableConfig,
    pub dynamo_config: DynamoConfig,
    pub touch_interval: Duration,
    /// Fixed lifetime; `None` means "use the cookie max age"
    pub ttl: Option<Duration>,
    pub keep_expired: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StoreOptions::new().resolve().unwrap();

        assert_eq!(config.table.name, "sessions");
        assert_eq!(config.table.hash_prefix, "sess_");
        assert_eq!(config.table.hash_key, "id");
        assert_eq!(config.table.data_attribute, "sess");
        assert_eq!(config.table.read_capacity_units, 5);
        assert_eq!(config.table.write_capacity_units, 5);
        assert_eq!(config.touch_interval, Duration::from_secs(30));
        assert_eq!(config.ttl, None);
        assert!(!config.keep_expired);
    }

    #[test]
    fn test_builder_overrides() {
        let config = StoreOptions::new()
            .with_table_name("app-sessions")
            .with_hash_prefix("s:")
            .with_capacity_units(10, 2)
            .with_ttl(Duration::from_secs(60))
            .with_keep_expired(true)
            .resolve()
            .unwrap();

        assert_eq!(config.table.name, "app-sessions");
        assert_eq!(config.table.key_for("abc"), "s:abc");
        assert_eq!(config.table.read_capacity_units, 10);
        assert_eq!(config.table.write_capacity_units, 2);
        assert_eq!(config.ttl, Some(Duration::from_millis(60_000)));
        assert!(config.keep_expired);
    }

    #[test]
    fn test_from_json_uses_option_names() {
        let options = StoreOptions::from_json(
            r#"{
                "table": { "name": "web", "hashKey": "sid", "readCapacityUnits": 1 },
                "dynamoConfig": { "region": "eu-west-1", "endpoint": "http://localhost:8000" },
                "touchInterval": 1000,
                "keepExpired": true
            }"#,
        )
        .unwrap();
        let config = options.resolve().unwrap();

        assert_eq!(config.table.name, "web");
        assert_eq!(config.table.hash_key, "sid");
        assert_eq!(config.table.data_attribute, "sess");
        assert_eq!(config.table.read_capacity_units, 1);
        assert_eq!(config.table.write_capacity_units, 5);
        assert_eq!(config.dynamo_config.region.as_deref(), Some("eu-west-1"));
        assert_eq!(config.touch_interval, Duration::from_secs(1));
        assert!(config.keep_expired);
    }

    #[test]
    fn test_rejects_invalid_table() {
        let err = StoreOptions::new().with_table_name("").resolve().unwrap_err();
        assert!(matches!(err, SessionError::Config(_)));

        let err = StoreOptions::new().with_hash_key("sess").resolve().unwrap_err();
        assert!(matches!(err, SessionError::Config(_)));

        let err = StoreOptions::new().with_capacity_units(0, 5).resolve().unwrap_err();
        assert!(matches!(err, SessionError::Config(_)));
    }

    #[test]
    fn test_rejects_out_of_range_durations() {
        let err = StoreOptions::from_json(r#"{ "ttl": 1000000000000000000 }"#)
            .unwrap()
            .resolve()
            .unwrap_err();
        assert!(matches!(err, SessionError::Config(_)));

        let err = StoreOptions::new()
            .with_touch_interval(Duration::from_millis(u64::MAX))
            .resolve()
            .unwrap_err();
        assert!(matches!(err, SessionError::Config(_)));

        let err = StoreOptions::new()
            .with_ttl(Duration::MAX)
            .resolve()
            .unwrap_err();
        assert!(matches!(err, SessionError::Config(_)));

        let config = StoreOptions::new().with_ttl(MAX_DURATION).resolve().unwrap();
        assert_eq!(config.ttl, Some(MAX_DURATION));
    }

    #[test]
    fn test_debug_hides_secrets() {
        let options = StoreOptions::new().with_credentials("AKIDEXAMPLE", "super-secret");
        let printed = format!("{:?}", options.dynamo_config);
        assert!(printed.contains("AKIDEXAMPLE"));
        assert!(!printed.contains("super-secret"));
    }
}
