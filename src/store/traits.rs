//! Session store trait

use async_trait::async_trait;
use crate::error::SessionError;
use crate::session::SessionData;

/// Trait for session storage backends
///
/// This is the express-session store interface: the middleware owns cookies
/// and session IDs, the store only persists payloads under
/// `prefix + session_id`. Expiry is decided by the store.
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    /// Get a session by ID
    ///
    /// Returns None if the session doesn't exist or has expired
    async fn get(&self, sid: &str) -> Result<Option<SessionData>, SessionError>;

    /// Set/update a session
    async fn set(&self, sid: &str, session: &SessionData) -> Result<(), SessionError>;

    /// Destroy/delete a session
    async fn destroy(&self, sid: &str) -> Result<(), SessionError>;

    /// Touch a session - extend its expiry without rewriting the data
    ///
    /// This is called when the session is accessed but not modified
    async fn touch(&self, sid: &str, session: &SessionData) -> Result<(), SessionError>;
}
