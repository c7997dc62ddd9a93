use std::sync::Arc;

use clinic_booking::{
    config::{Config, StoreBackend},
    db,
    models::AppState,
    routes,
    seed::seed_demo_data,
    store::{ClinicStore, MemoryStore, PgStore},
};

use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use axum::http::header;
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
            tracing::warn!("using the in-memory store; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    if cfg.seed_demo {
        seed_demo_data(store.as_ref()).await?;
    }

    let state = AppState {
        store: store.clone(),
        jwt_secret: cfg.jwt_secret.clone(),
        session_ttl_hours: cfg.session_ttl_hours,
        cookie_secure: cfg.cookie_secure,
        allow_admin_signup: cfg.allow_admin_signup,
    };

    // Browser clients send the session cookie or a bearer token.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]);

    let app = routes::router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    tracing::info!("Listening on http://{}", cfg.bind_addr);
    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close().await;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
