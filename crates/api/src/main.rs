use std::sync::Arc;

use eventdesk_api::app::{build_app, AppServices};
use eventdesk_ids::{IdAllocator, RecoveryScanner};
use eventdesk_infra::{AppConfig, CatalogStore, InMemoryCatalogStore, PostgresCatalogStore};
use eventdesk_inventory::AvailabilityEngine;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    eventdesk_observability::init();

    let config = AppConfig::from_env()?;

    let store: Arc<dyn CatalogStore> = match &config.database_url {
        Some(url) => {
            let pg = PostgresCatalogStore::connect(url).await?;
            tracing::info!("using postgres catalog store");
            Arc::new(pg)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory catalog store");
            Arc::new(InMemoryCatalogStore::new())
        }
    };

    // Counters must be recovered before the first request can allocate an id.
    let ids = Arc::new(IdAllocator::new());
    let summary = RecoveryScanner::new(ids.clone(), store.clone())
        .with_policy(config.recovery_policy)
        .initialize_counters()
        .await?;
    for (key, seq) in &summary.seeded {
        tracing::info!(counter = %key, seq, "counter seeded");
    }

    let services = Arc::new(AppServices::new(
        ids,
        store,
        AvailabilityEngine::new(config.reservation_counting),
    ));
    let app = build_app(services);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
