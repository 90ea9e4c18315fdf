//! Secret Santa core binary entrypoint wiring configuration, storage, and
//! the purge scheduler.

use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use secret_santa_core::{
    config::AppConfig,
    dao::{memory::MemoryStore, storage::GameStore},
    services::purge_service,
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let auto_purge = config.auto_purge_enabled();
    let state = AppState::new(config);

    let store: Arc<dyn GameStore> = Arc::new(MemoryStore::new());
    store
        .health_check()
        .await
        .context("storage health check during startup")?;
    state.install_store(store).await;
    info!("storage backend installed");

    if auto_purge {
        info!("auto-purge scheduler enabled");
        tokio::spawn(purge_service::run_scheduler(state.clone()));
    } else {
        info!("auto-purge scheduler disabled by configuration");
    }

    // The chat transport driving commands plugs in here; the core itself
    // only keeps the scheduler alive until shutdown.
    shutdown_signal().await;

    state.clear_store().await;
    info!("shut down cleanly");
    Ok(())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the process down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
