//! MongoDB client factory.
//!
//! One client is established at process startup and shared by every request
//! handler for the process lifetime; [`Mongo::disconnect`] tears it down
//! after the server stops.

use anyhow::Context;
use mongodb::bson::doc;
use mongodb::{Client, Database};

use folio_kernel::settings::DatabaseSettings;

/// A connected MongoDB client plus the configured database handle.
pub struct Mongo {
    client: Client,
    database: Database,
}

impl Mongo {
    /// Handle to the configured database. Cloning is cheap; the clone shares
    /// the underlying connection pool.
    pub fn database(&self) -> Database {
        self.database.clone()
    }

    /// Gracefully shut the client down, draining in-flight operations.
    pub async fn disconnect(self) {
        self.client.shutdown().await;
        tracing::info!("disconnected from MongoDB");
    }
}

/// Connect to MongoDB and verify the server is reachable with a ping.
pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<Mongo> {
    let client = Client::with_uri_str(&settings.uri)
        .await
        .with_context(|| "failed to parse MongoDB connection string")?;

    let database = client.database(&settings.database);

    database
        .run_command(doc! { "ping": 1 })
        .await
        .with_context(|| "failed to reach MongoDB server")?;

    tracing::info!(database = %settings.database, "connected to MongoDB");

    Ok(Mongo { client, database })
}
