use thiserror::Error;

/// Main error type for the deployment server
#[derive(Error, Debug)]
pub enum StratopsError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // Network errors
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // Deployment pipeline errors
    #[error(transparent)]
    Deploy(#[from] DeployError),

    // Trade execution errors (in-process contract calls)
    #[error("Execution error: {0}")]
    Execution(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias for StratopsError
pub type Result<T> = std::result::Result<T, StratopsError>;

/// Error taxonomy for one deployment pipeline run.
///
/// Validation and config errors are terminal and local. Deployment errors are
/// surfaced as-is with no retry at this layer. Persistence errors always
/// report which half of the persist step succeeded so an operator can
/// reconcile the config record and the ABI sidecar manually.
#[derive(Error, Debug)]
pub enum DeployError {
    #[error("no configuration found for strategy '{strategy}'")]
    ConfigNotFound { strategy: String },

    #[error("configuration for strategy '{strategy}' is corrupt: {cause}")]
    ConfigCorrupt { strategy: String, cause: String },

    #[error("missing required config fields: {}", missing.join(", "))]
    Validation { missing: Vec<String> },

    #[error("deployment failed: {0}")]
    Deployment(String),

    #[error(
        "persistence failed (config updated: {config_updated}, artifact written: {artifact_written}): {cause}"
    )]
    Persistence {
        config_updated: bool,
        artifact_written: bool,
        cause: String,
    },

    #[error("verification failed: {0}")]
    Verification(String),

    #[error("failed to spawn deployment process: {0}")]
    Spawn(String),

    #[error("timed out after {0}s")]
    Timeout(u64),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DeployError {
    /// Stable machine-readable tag for structured HTTP error detail.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConfigNotFound { .. } => "config_not_found",
            Self::ConfigCorrupt { .. } => "config_corrupt",
            Self::Validation { .. } => "validation",
            Self::Deployment(_) => "deployment",
            Self::Persistence { .. } => "persistence",
            Self::Verification(_) => "verification",
            Self::Spawn(_) => "spawn",
            Self::Timeout(_) => "timeout",
            Self::Io(_) => "io",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_lists_missing_fields() {
        let err = DeployError::Validation {
            missing: vec!["uniswapRouter".into(), "sushiswapRouter".into()],
        };
        assert_eq!(
            err.to_string(),
            "missing required config fields: uniswapRouter, sushiswapRouter"
        );
        assert_eq!(err.kind(), "validation");
    }

    #[test]
    fn persistence_error_reports_both_halves() {
        let err = DeployError::Persistence {
            config_updated: true,
            artifact_written: false,
            cause: "disk full".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("config updated: true"));
        assert!(msg.contains("artifact written: false"));
    }
}
