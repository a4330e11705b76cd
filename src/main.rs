use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use library_api::{
    api::{create_router, AppState},
    config::Config,
    db::{create_pool, create_redis_client, run_migrations, Cache, PgCatalog},
    services::{GorseClient, RecommendationOptions},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("library_api=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    // Catalog
    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;
    let catalog = PgCatalog::new(pool);

    // Scorer, with optional list caching
    let mut gorse = GorseClient::new(
        &config.gorse_endpoint,
        config.gorse_api_key.clone(),
        Duration::from_secs(config.scorer_timeout_secs),
    )?;

    let mut cache_handle = None;
    match config.redis_url.as_deref() {
        Some(redis_url) if config.list_cache_ttl_secs > 0 => {
            let client = create_redis_client(redis_url)?;
            let (cache, handle) =
                Cache::new(client, Duration::from_millis(config.cache_timeout_ms)).await;
            gorse = gorse.with_cache(cache, config.list_cache_ttl_secs);
            cache_handle = Some(handle);
            tracing::info!(ttl_secs = config.list_cache_ttl_secs, "List caching enabled");
        }
        _ => tracing::info!("List caching disabled"),
    }

    let options = RecommendationOptions {
        stay_time_read_threshold_secs: config.stay_time_read_threshold_secs,
        blend_dedup: config.blend_dedup,
    };
    let state = AppState::new(Arc::new(gorse), Arc::new(catalog), options);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    tracing::info!(
        address = %config.bind_address(),
        scorer = %config.gorse_endpoint,
        "Server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = cache_handle {
        handle.shutdown().await;
    }
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
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
