use catalog_backend::common::error::AppError;
use catalog_backend::config::settings::AppConfig;
use catalog_backend::infrastructure::db::pool;
use catalog_backend::infrastructure::redis::client::RedisService;
use catalog_backend::infrastructure::storage::s3::StorageService;
use catalog_backend::state::AppState;
use catalog_backend::workers::auto_update::start_auto_update_worker;
use dotenvy::dotenv;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info,sqlx=warn")),
        )
        .init();

    info!("Starting server...");

    let config = AppConfig::new()?;
    let shutdown = CancellationToken::new();

    let db = pool::connect_with_retry(&config.database_url, &shutdown).await?;
    pool::run_migrations(&db).await?;

    let redis = RedisService::new(&config.redis_url).await?;
    let storage = StorageService::new(
        &config.minio_url,
        &config.minio_bucket,
        &config.minio_access_key,
        &config.minio_secret_key,
    );

    let port = config.server_port;
    let state = AppState::new(config, db, redis, storage)?;

    let worker = tokio::spawn(start_auto_update_worker(
        state.parser.clone(),
        shutdown.child_token(),
    ));

    let app = catalog_backend::app::create_app(state.clone());

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("🚀 Server running on http://{}", addr);

    let signal = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for shutdown signal: {}", e);
            }
            info!("Shutdown signal received");
            signal.cancel();
        })
        .await?;

    shutdown.cancel();
    match state.parser.stop().await {
        Ok(status) => info!("Parser stopped on shutdown after {} items", status.processed_items),
        Err(AppError::Conflict(_)) => {}
        Err(e) => warn!("Failed to stop parser on shutdown: {}", e),
    }
    if let Err(e) = worker.await {
        warn!("Auto-update worker ended abnormally: {}", e);
    }

    info!("Server stopped");
    Ok(())
}
