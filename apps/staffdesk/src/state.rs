use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::{Config, DataMode};
use crate::data::{DataFacade, Routing};
use crate::session::credentials::{BackendCredentials, CredentialVerifier, StaticCredentials};
use crate::session::idle::{IdleHandle, IdleMonitor};
use crate::session::{SessionCell, SessionManager};
use crate::store::local::LocalStore;
use crate::store::remote::RemoteStore;
use crate::store::seed::Seeder;

const SEED_FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Shared application state injected into all route handlers via Axum extractors.
///
/// This is the one place that owns the session and the seed flag; it is built
/// once by [`AppState::init`] and torn down by [`AppState::shutdown`].
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub data: DataFacade,
    pub session: SessionManager,
    pub idle: IdleHandle,
}

impl AppState {
    /// Must run inside the tokio runtime (starts the inactivity monitor).
    pub async fn init(config: Config) -> Result<Self> {
        let local = LocalStore::open(&config.data_dir).with_context(|| {
            format!("cannot open data directory {}", config.data_dir.display())
        })?;
        let cell = SessionCell::default();

        let mut remotes = Vec::new();
        if config.data_mode == DataMode::Remote {
            for base in [&config.api_base_url, &config.api_fallback_url]
                .into_iter()
                .flatten()
            {
                remotes.push(RemoteStore::new(base.clone(), cell.clone(), config.list_limit)?);
            }
        }

        let verifier: Arc<dyn CredentialVerifier> = match remotes.first() {
            Some(primary) => Arc::new(BackendCredentials::new(primary.clone())),
            None => Arc::new(StaticCredentials::load(config.users_file.as_deref())),
        };
        info!("Credential backend: {}", verifier.backend());

        let session = SessionManager::new(cell, local.clone(), verifier);
        session.restore();

        let seed_client = reqwest::Client::builder()
            .timeout(SEED_FETCH_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;
        let seeder = Seeder::new(local.clone(), config.seed_sources.clone(), seed_client);
        let data = DataFacade::new(local, remotes, Routing::for_mode(config.data_mode), seeder);

        let idle = IdleMonitor::start(session.clone(), config.idle);

        Ok(Self {
            config,
            data,
            session,
            idle,
        })
    }

    pub async fn shutdown(&self) {
        self.idle.shutdown().await;
        info!("Application state shut down");
    }
}
