//! Session payload compatible with express-session
//!
//! The store treats the payload as opaque apart from two fields: the cookie's
//! remaining max age (for expiration) and `updated` (for touch throttling).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Cookie data structure compatible with express-session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCookie {
    /// Original max age in milliseconds (as set initially)
    pub original_max_age: Option<i64>,

    /// Expiration time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires: Option<DateTime<Utc>>,

    /// Secure flag
    #[serde(default)]
    pub secure: bool,

    /// HttpOnly flag
    #[serde(default = "default_http_only")]
    pub http_only: bool,

    /// Cookie path
    #[serde(default = "default_path")]
    pub path: String,

    /// Cookie domain
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,

    /// SameSite attribute
    #[serde(skip_serializing_if = "Option::is_none")]
    pub same_site: Option<String>,
}

fn default_http_only() -> bool {
    true
}

fn default_path() -> String {
    "/".to_string()
}

impl Default for SessionCookie {
    fn default() -> Self {
        Self {
            original_max_age: None,
            expires: None,
            secure: false,
            http_only: true,
            path: "/".to_string(),
            domain: None,
            same_site: None,
        }
    }
}

impl SessionCookie {
    /// Create a cookie that expires `max_age_ms` after `now`
    pub fn new(max_age_ms: i64, now: DateTime<Utc>) -> Self {
        Self {
            original_max_age: Some(max_age_ms),
            expires: Some(now + chrono::Duration::milliseconds(max_age_ms)),
            ..Default::default()
        }
    }

    /// Remaining time in milliseconds at `now`, like express-session's `cookie.maxAge`.
    ///
    /// Negative once the cookie has expired; `None` for browser-session cookies.
    pub fn max_age(&self, now: DateTime<Utc>) -> Option<i64> {
        self.expires.map(|exp| (exp - now).num_milliseconds())
    }
}

/// Session payload as handed over by the middleware
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    /// Cookie information
    #[serde(default)]
    pub cookie: SessionCookie,

    /// Last save/touch, milliseconds since the Unix epoch. Stamped by the store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<i64>,

    /// Application data (flattened at same level as cookie)
    #[serde(flatten)]
    pub data: HashMap<String, Value>,
}

impl SessionData {
    /// Create an empty session whose cookie expires `max_age_ms` after `now`
    pub fn new(max_age_ms: i64, now: DateTime<Utc>) -> Self {
        Self {
            cookie: SessionCookie::new(max_age_ms, now),
            ..Default::default()
        }
    }

    /// Get a value from session data
    pub fn get<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Option<T> {
        self.data.get(key).and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Set a value in session data
    pub fn set<T: Serialize>(&mut self, key: &str, value: T) {
        if let Ok(v) = serde_json::to_value(value) {
            self.data.insert(key.to_string(), v);
        }
    }

    /// Remove a value from session data
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.data.remove(key)
    }

    /// Check if session data is empty (no user data)
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
