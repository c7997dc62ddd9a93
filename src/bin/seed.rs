use std::sync::Arc;

use clinic_booking::{
    config::{Config, StoreBackend},
    db,
    seed::seed_demo_data,
    store::{ClinicStore, MemoryStore, PgStore},
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let cfg = Config::from_env()?;
    let store: Arc<dyn ClinicStore> = match (cfg.store_backend, cfg.database_url.as_deref()) {
        (StoreBackend::Postgres, Some(url)) => Arc::new(PgStore::new(db::connect_pg(url).await?)),
        (StoreBackend::Postgres, None) => anyhow::bail!("DATABASE_URL is required"),
        (StoreBackend::Memory, _) => {
            tracing::warn!("seeding the memory store; the data is dropped on exit");
            Arc::new(MemoryStore::new())
        }
    };

    let result = seed_demo_data(store.as_ref()).await;
    store.close().await;
    result
}
