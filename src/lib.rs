//! # salvo-dynamodb-session
//!
//! DynamoDB session store for express-session style middleware.
//!
//! This crate persists sessions in a single DynamoDB table using the same item
//! layout as Node.js connect-dynamodb, so Rust and Node.js services can share
//! one sessions table.
//!
//! ## Features
//!
//! - **connect-dynamodb compatible items**: `prefix + sid` hash key, payload map, `expires` in seconds
//! - **Table bootstrapping**: the table is created on first start when missing
//! - **Expiry policy**: fixed TTL or cookie max age, optional keep-expired mode, explicit reaping
//! - **Throttled touch**: at most one expiry refresh per `touchInterval`
//! - **Pluggable client**: run the same store against [`MemoryTable`] in tests
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use salvo_dynamodb_session::{DynamoStore, SessionData, SessionStore, StoreOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let options = StoreOptions::new()
//!         .with_table_name("sessions")
//!         .with_region("us-east-1");
//!     let store = DynamoStore::connect(options).await?;
//!
//!     let mut session = SessionData::new(86_400_000, chrono::Utc::now());
//!     session.set("views", 1);
//!     store.set("some-session-id", &session).await?;
//!
//!     let loaded = store.get("some-session-id").await?;
//!     assert!(loaded.is_some());
//!     Ok(())
//! }
//! ```
//!
//! Diagnostic output goes through `tracing`; enable it with a subscriber, e.g.
//! `RUST_LOG=salvo_dynamodb_session=debug`.

pub mod config;
pub mod error;
pub mod expiry;
pub mod session;
pub mod store;
pub mod table;

pub use config::{DynamoConfig, StoreConfig, StoreOptions, TableConfig, TableOptions};
pub use error::SessionError;
pub use expiry::{Clock, ManualClock, SystemClock};
pub use session::{SessionCookie, SessionData};
pub use store::{DynamoStore, SessionStore};
pub use table::{ItemUpdate, MemoryTable, StoredSession, TableClient, TableStatus};
