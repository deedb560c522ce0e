//! Session store implementations

mod dynamo_store;
mod traits;

pub use dynamo_store::DynamoStore;
pub use traits::SessionStore;
