mod modules;

use std::sync::Arc;

use anyhow::Context;

use folio_kernel::settings::Settings;
use folio_kernel::{InitCtx, ModuleRegistry};

use modules::books::store::MongoBookStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load Folio settings")?;

    folio_telemetry::init(&settings.telemetry);

    tracing::info!(
        env = ?settings.environment,
        db = %settings.database.uri,
        "folio-app bootstrap starting"
    );

    let mongo = folio_db::connect(&settings.database)
        .await
        .with_context(|| "failed to connect to the document store")?;

    let store = Arc::new(MongoBookStore::new(&mongo.database()));

    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, store);

    let ctx = InitCtx {
        settings: &settings,
    };
    registry.init_all(&ctx).await?;
    registry.start_all(&ctx).await?;

    tracing::info!("folio-app bootstrap complete");

    folio_http::start_server(&registry, &settings).await?;

    registry.stop_all().await?;
    mongo.disconnect().await;

    Ok(())
}
