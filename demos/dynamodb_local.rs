//! Session store against DynamoDB Local
//!
//! Start DynamoDB Local first:
//!
//! ```text
//! docker run -p 8000:8000 amazon/dynamodb-local
//! RUST_LOG=salvo_dynamodb_session=debug cargo run --example dynamodb_local
//! ```

use std::time::Duration;

use salvo_dynamodb_session::{DynamoStore, SessionData, SessionStore, StoreOptions, TableStatus};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let options = StoreOptions::new()
        .with_table_name("demo-sessions")
        .with_region("us-east-1")
        .with_endpoint("http://localhost:8000")
        .with_credentials("local", "local")
        .with_touch_interval(Duration::from_secs(5));

    let config = options.resolve()?;
    let client = config.dynamo_config.load_client().await;
    let store = DynamoStore::new(client, config);

    // Await the table here instead of racing it, as `connect` would
    if store.initialize().await? == TableStatus::Created {
        println!("Created table demo-sessions");
        tokio::time::sleep(Duration::from_millis(500)).await;
    }

    let sid = "demo-session";
    let views = match store.get(sid).await? {
        Some(mut session) => {
            let views: i32 = session.get("views").unwrap_or(0) + 1;
            session.set("views", views);
            store.set(sid, &session).await?;
            views
        }
        None => {
            let mut session = SessionData::new(86_400_000, chrono::Utc::now());
            session.set("views", 1);
            store.set(sid, &session).await?;
            1
        }
    };
    println!("Session {} has been viewed {} time(s)", sid, views);

    let reaped = store.reap().await?;
    println!("Reaped {} expired session(s)", reaped);

    Ok(())
}
