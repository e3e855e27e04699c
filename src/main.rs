//! Peercache node
//!
//! Serves one cache group over a demo data source and joins the peer pool.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use peercache::{create_router, AppState, Config, GroupRegistry, HttpPool, LoaderFn};

/// Main entry point for a peercache node.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Register the group over the slow data source
/// 4. Join the peer pool and attach it to the group
/// 5. Serve peers on the address from `SELF_ADDR`
/// 6. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "peercache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    info!(
        "Configuration loaded: self={}, peers={:?}, group={}, cache_bytes={}",
        config.self_addr, config.peers, config.group_name, config.cache_bytes
    );

    let registry = Arc::new(GroupRegistry::new());
    let self_addr = config.self_addr.clone();
    let db = slow_db();
    let group = registry.new_group(
        config.group_name.as_str(),
        config.cache_bytes,
        Arc::new(LoaderFn::new(move |key: &str| {
            info!(key, peer = %self_addr, "[slow DB] search key");
            db.get(key)
                .map(|value| value.as_bytes().to_vec())
                .ok_or_else(|| anyhow::anyhow!("{key} is not existed"))
        })),
    );

    let pool = Arc::new(
        HttpPool::with_options(config.self_addr.as_str(), config.pool_options())
            .context("building peer client")?,
    );
    pool.set(config.peers.iter().cloned());
    group
        .register_peers(pool.clone())
        .context("attaching peer pool")?;

    let app = create_router(AppState::new(registry, pool));

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("Node listening on {}", config.self_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving peers")?;

    info!("Node shutdown complete");
    Ok(())
}

/// Stand-in for a slow backing store.
fn slow_db() -> HashMap<String, String> {
    [("Tom", "630"), ("Jack", "589"), ("Sam", "567")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to install SIGTERM handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
