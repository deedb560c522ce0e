//! Expiration policy and time helpers
//!
//! `expires` is persisted in seconds since the Unix epoch (what DynamoDB's
//! TTL feature expects), while `updated` and every lifetime are milliseconds.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{StoreConfig, DEFAULT_TTL};
use crate::error::SessionError;
use crate::session::SessionData;

/// Source of the current time
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Clone, Debug)]
pub struct ManualClock {
    now: Arc<RwLock<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(RwLock::new(start)),
        }
    }

    /// Move the clock forward
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.write();
        *now = chrono::Duration::from_std(by)
            .ok()
            .and_then(|by| now.checked_add_signed(by))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.write() = now;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read()
    }
}

/// Whole seconds since the Unix epoch (truncating)
pub fn to_seconds_epoch(time: DateTime<Utc>) -> i64 {
    time.timestamp()
}

/// Milliseconds since the Unix epoch
pub fn to_millis_epoch(time: DateTime<Utc>) -> i64 {
    time.timestamp_millis()
}

/// A record is expired when it has no `expires` or it is not in the future.
pub fn is_expired(expires: Option<i64>, now: DateTime<Utc>) -> bool {
    match expires {
        Some(expires) if expires != 0 => expires <= to_seconds_epoch(now),
        _ => true,
    }
}

/// Milliseconds in `duration`, saturating at `i64::MAX`
pub fn duration_millis(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

/// Absolute expiration for `session` saved at `now`.
///
/// A configured `ttl` wins, then the cookie's remaining max age, then one day.
pub fn expiration_for(
    config: &StoreConfig,
    session: &SessionData,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>, SessionError> {
    let lifetime_ms = match (config.ttl, session.cookie.max_age(now)) {
        (Some(ttl), _) if !ttl.is_zero() => duration_millis(ttl),
        (_, Some(max_age)) => max_age,
        _ => duration_millis(DEFAULT_TTL),
    };
    chrono::Duration::try_milliseconds(lifetime_ms)
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .ok_or_else(|| {
            SessionError::Malformed(format!("session lifetime of {}ms is out of range", lifetime_ms))
        })
}

/// Whether a touch at `now` should write, given the last `updated` stamp.
pub fn touch_due(updated: Option<i64>, interval: Duration, now: DateTime<Utc>) -> bool {
    match updated {
        Some(updated) => updated.saturating_add(duration_millis(interval)) <= to_millis_epoch(now),
        None => true,
    }
}
