mod cli;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tinyurl_core::Shortener;
use tinyurl_gateway::{telemetry, App, AppState};
use tinyurl_shortener::{Keyspace, ShortenerService};
use tinyurl_store::{InMemoryStore, RedisStore, RedisStoreSettings};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::cli::{StorageBackendArg, CLI};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CLI::parse();
    telemetry::init(config.log_format);

    info!(
        listen_addr = %config.listen_addr,
        storage_backend = %config.storage,
        key_prefix = %config.key_prefix,
        "starting tinyurl gateway"
    );

    let keyspace = Keyspace::new(config.key_prefix.clone());
    let shortener: Arc<dyn Shortener> = match config.storage {
        StorageBackendArg::InMemory => {
            warn!("using in-memory storage; links are lost on restart");
            Arc::new(ShortenerService::with_keyspace(InMemoryStore::new(), keyspace))
        }
        StorageBackendArg::Redis => {
            let settings = RedisStoreSettings::builder()
                .url(config.redis_url())
                .timeout(config.store_timeout())
                .build();
            let store = RedisStore::connect(settings).await.with_context(|| {
                format!(
                    "failed to connect to redis (addr: {} db: {})",
                    config.redis_addr, config.redis_db
                )
            })?;
            info!(addr = %config.redis_addr, db = config.redis_db, "connected to redis");
            Arc::new(ShortenerService::with_keyspace(store, keyspace))
        }
    };

    let app = App::router(AppState::new(shortener));
    let listener = TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    info!(listen_addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
