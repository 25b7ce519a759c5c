use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    pub network: NetworkConfig,
    #[serde(default)]
    pub deploy: DeployConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// HTTP listen port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    /// Root of persisted state; config records live under `config/`,
    /// ABI sidecars under `abi/`
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Compiled contract build output (ABI + bytecode per contract)
    #[serde(default = "default_artifacts_dir")]
    pub artifacts_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_artifacts_dir() -> PathBuf {
    PathBuf::from("artifacts")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            artifacts_dir: default_artifacts_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    /// JSON-RPC endpoint used by the deployer and the arbitrage executor
    pub rpc_url: String,
    /// Chain ID for transaction signing
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    /// Hex-encoded signing key; usually injected via STRATOPS_NETWORK__PRIVATE_KEY
    #[serde(default)]
    pub private_key: Option<String>,
}

fn default_chain_id() -> u64 {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeployConfig {
    /// Upper bound on one deployment's confirmation wait
    #[serde(default = "default_confirm_timeout")]
    pub confirm_timeout_secs: u64,
    /// Upper bound on one spawned deployment process's lifetime
    #[serde(default = "default_subprocess_timeout")]
    pub subprocess_timeout_secs: u64,
    #[serde(default)]
    pub verify: VerifyConfig,
}

fn default_confirm_timeout() -> u64 {
    300
}

fn default_subprocess_timeout() -> u64 {
    600
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            confirm_timeout_secs: default_confirm_timeout(),
            subprocess_timeout_secs: default_subprocess_timeout(),
            verify: VerifyConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct VerifyConfig {
    /// Submit deployed contracts to a block-explorer verification API
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Start with default values
            .set_default("server.port", 3000i64)?
            .set_default("network.rpc_url", "http://127.0.0.1:8545")?
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("STRATOPS_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (STRATOPS_NETWORK__RPC_URL, etc.)
            .add_source(
                Environment::with_prefix("STRATOPS")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.network.rpc_url.trim().is_empty() {
            errors.push("network.rpc_url must not be empty".to_string());
        }

        if self.deploy.confirm_timeout_secs == 0 {
            errors.push("deploy.confirm_timeout_secs must be positive".to_string());
        }

        if self.deploy.subprocess_timeout_secs == 0 {
            errors.push("deploy.subprocess_timeout_secs must be positive".to_string());
        }

        if self.deploy.verify.enabled && self.deploy.verify.api_url.is_none() {
            errors.push("deploy.verify.api_url is required when verification is enabled".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verification_without_api_url_fails_validation() {
        let config = AppConfig {
            server: ServerConfig::default(),
            paths: PathsConfig::default(),
            network: NetworkConfig {
                rpc_url: "http://127.0.0.1:8545".into(),
                chain_id: 31337,
                private_key: None,
            },
            deploy: DeployConfig {
                verify: VerifyConfig {
                    enabled: true,
                    api_url: None,
                    api_key: None,
                },
                ..DeployConfig::default()
            },
            logging: LoggingConfig::default(),
        };

        let errors = config.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.contains("verify.api_url")));
    }

    #[test]
    fn default_timeouts_pass_validation() {
        let config = AppConfig {
            server: ServerConfig::default(),
            paths: PathsConfig::default(),
            network: NetworkConfig {
                rpc_url: "http://127.0.0.1:8545".into(),
                chain_id: 31337,
                private_key: None,
            },
            deploy: DeployConfig::default(),
            logging: LoggingConfig::default(),
        };
        assert!(config.validate().is_ok());
    }
}
