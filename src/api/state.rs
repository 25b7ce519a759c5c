use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::deploy::{DeployCommand, ProcessRunner};
use crate::execution::TradeExecutor;
use crate::store::{ArtifactStore, ConfigStore};

/// Shared application state for API handlers
#[derive(Clone)]
pub struct AppState {
    /// Per-strategy config records
    pub config_store: Arc<ConfigStore>,

    /// Per-strategy ABI sidecars
    pub artifact_store: Arc<ArtifactStore>,

    /// Subprocess runner for deployment triggers
    pub runner: Arc<ProcessRunner>,

    /// How to launch one out-of-process deployment
    pub deploy_command: Arc<DeployCommand>,

    /// In-process trade execution for the arbitrage route
    pub executor: Arc<dyn TradeExecutor>,

    /// Application start time
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        config_store: Arc<ConfigStore>,
        artifact_store: Arc<ArtifactStore>,
        runner: Arc<ProcessRunner>,
        deploy_command: DeployCommand,
        executor: Arc<dyn TradeExecutor>,
    ) -> Self {
        Self {
            config_store,
            artifact_store,
            runner,
            deploy_command: Arc::new(deploy_command),
            executor,
            started_at: Utc::now(),
        }
    }

    /// Get system uptime in seconds
    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}
