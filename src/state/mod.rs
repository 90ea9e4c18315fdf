//! Shared application state: the explicitly constructed storage handle and
//! the runtime configuration.

/// Game lifecycle stages and transition guards.
pub mod lifecycle;

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{config::AppConfig, dao::storage::GameStore, error::ServiceError};

/// Shared handle to [`AppState`], cloned into every task that needs it.
pub type SharedState = Arc<AppState>;

/// Central application state holding the storage backend and configuration.
///
/// The storage slot has an explicit install/clear lifecycle: the process
/// starts without a backend (degraded mode), `main` installs one during
/// startup and clears it during shutdown. Services obtain a fresh handle
/// per operation; the persisted record is the authority for a game's state.
pub struct AppState {
    store: RwLock<Option<Arc<dyn GameStore>>>,
    config: AppConfig,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be
    /// cloned cheaply. Starts in degraded mode until a backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        Arc::new(Self {
            store: RwLock::new(None),
            config,
        })
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Obtain a handle to the storage backend, or fail with
    /// [`ServiceError::Degraded`] when none is installed.
    pub async fn store(&self) -> Result<Arc<dyn GameStore>, ServiceError> {
        let guard = self.store.read().await;
        guard.as_ref().cloned().ok_or(ServiceError::Degraded)
    }

    /// Install a storage backend and leave degraded mode.
    pub async fn install_store(&self, store: Arc<dyn GameStore>) {
        let mut guard = self.store.write().await;
        *guard = Some(store);
    }

    /// Remove the storage backend and enter degraded mode (teardown path).
    pub async fn clear_store(&self) {
        let mut guard = self.store.write().await;
        guard.take();
    }

    /// Whether the application currently lacks a storage backend.
    pub async fn is_degraded(&self) -> bool {
        let guard = self.store.read().await;
        guard.is_none()
    }
}
