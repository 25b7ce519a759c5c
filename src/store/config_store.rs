//! Per-strategy configuration records.
//!
//! Each strategy has one JSON object of named fields (router addresses, pool
//! addresses, token identifiers) plus, after the first successful deploy, a
//! `<strategy>ContractAddress` field. Records live under `config/` in the
//! backend namespace.

use serde_json::{Map, Value};
use std::io;
use std::sync::Arc;

use crate::error::DeployError;
use crate::registry::Strategy;
use crate::store::StateBackend;

/// One strategy's configuration record: an ordered JSON object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StrategyConfig {
    fields: Map<String, Value>,
}

impl StrategyConfig {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    /// A field counts as present when it exists, is not null, and is not an
    /// empty or whitespace-only string.
    pub fn has_field(&self, field: &str) -> bool {
        match self.fields.get(field) {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.trim().is_empty(),
            Some(_) => true,
        }
    }

    pub fn set(&mut self, field: &str, value: Value) {
        self.fields.insert(field.to_string(), value);
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }

    fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec_pretty(&self.fields)
    }
}

/// Loads, validates, and atomically rewrites strategy config records through
/// the injected backend.
pub struct ConfigStore {
    backend: Arc<dyn StateBackend>,
}

impl ConfigStore {
    pub fn new(backend: Arc<dyn StateBackend>) -> Self {
        Self { backend }
    }

    fn key(strategy: Strategy) -> String {
        format!("config/{}", strategy.spec().config_file)
    }

    pub async fn load(&self, strategy: Strategy) -> Result<StrategyConfig, DeployError> {
        let bytes = self
            .backend
            .read(&Self::key(strategy))
            .await?
            .ok_or_else(|| DeployError::ConfigNotFound {
                strategy: strategy.as_str().to_string(),
            })?;

        let value: Value =
            serde_json::from_slice(&bytes).map_err(|e| DeployError::ConfigCorrupt {
                strategy: strategy.as_str().to_string(),
                cause: e.to_string(),
            })?;

        match value {
            Value::Object(fields) => Ok(StrategyConfig::new(fields)),
            other => Err(DeployError::ConfigCorrupt {
                strategy: strategy.as_str().to_string(),
                cause: format!("expected a JSON object, got {}", json_type_name(&other)),
            }),
        }
    }

    /// Check that every required field is present and non-empty.
    pub fn validate(config: &StrategyConfig, required: &[&str]) -> Result<(), DeployError> {
        let missing: Vec<String> = required
            .iter()
            .filter(|field| !config.has_field(field))
            .map(|field| field.to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(DeployError::Validation { missing })
        }
    }

    /// Merge one field into the record and write the full record back.
    ///
    /// The write itself is atomic at the backend level; callers that must
    /// couple it with an artifact write hold the per-strategy lock around
    /// both.
    pub async fn update(&self, strategy: Strategy, field: &str, value: Value) -> io::Result<()> {
        let mut config = match self.load(strategy).await {
            Ok(config) => config,
            Err(DeployError::ConfigNotFound { .. }) => StrategyConfig::default(),
            Err(e) => return Err(io::Error::new(io::ErrorKind::InvalidData, e.to_string())),
        };
        config.set(field, value);

        let bytes = config
            .to_bytes()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
        self.backend.write(&Self::key(strategy), &bytes).await
    }

    /// Write a complete record, replacing any existing one. Used by seeding
    /// and operational tooling, not by the pipeline.
    pub async fn put(&self, strategy: Strategy, config: &StrategyConfig) -> io::Result<()> {
        let bytes = config
            .to_bytes()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
        self.backend.write(&Self::key(strategy), &bytes).await
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryBackend;
    use serde_json::json;

    fn store() -> ConfigStore {
        ConfigStore::new(Arc::new(MemoryBackend::new()))
    }

    fn config_from(value: Value) -> StrategyConfig {
        match value {
            Value::Object(map) => StrategyConfig::new(map),
            _ => panic!("test config must be an object"),
        }
    }

    #[tokio::test]
    async fn load_missing_record_is_config_not_found() {
        let err = store().load(Strategy::Arbitrage).await.unwrap_err();
        assert!(matches!(err, DeployError::ConfigNotFound { .. }));
    }

    #[tokio::test]
    async fn load_unparseable_record_is_config_corrupt() {
        let backend = Arc::new(MemoryBackend::new());
        backend
            .write("config/arbitrage_config.json", b"{not json")
            .await
            .unwrap();
        let store = ConfigStore::new(backend);

        let err = store.load(Strategy::Arbitrage).await.unwrap_err();
        assert!(matches!(err, DeployError::ConfigCorrupt { .. }));
    }

    #[tokio::test]
    async fn load_non_object_record_is_config_corrupt() {
        let backend = Arc::new(MemoryBackend::new());
        backend
            .write("config/arbitrage_config.json", b"[1, 2]")
            .await
            .unwrap();
        let store = ConfigStore::new(backend);

        let err = store.load(Strategy::Arbitrage).await.unwrap_err();
        match err {
            DeployError::ConfigCorrupt { cause, .. } => assert!(cause.contains("array")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn validate_reports_absent_and_empty_fields() {
        let config = config_from(json!({
            "uniswapRouter": "0xAAA",
            "sushiswapRouter": "   ",
        }));
        let err =
            ConfigStore::validate(&config, &["uniswapRouter", "sushiswapRouter", "wethAddress"])
                .unwrap_err();
        match err {
            DeployError::Validation { missing } => {
                assert_eq!(missing, vec!["sushiswapRouter", "wethAddress"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn update_merges_into_the_existing_record() {
        let store = store();
        store
            .put(
                Strategy::Arbitrage,
                &config_from(json!({"uniswapRouter": "0xAAA"})),
            )
            .await
            .unwrap();

        store
            .update(
                Strategy::Arbitrage,
                "arbitrageContractAddress",
                json!("0xCCC"),
            )
            .await
            .unwrap();

        let config = store.load(Strategy::Arbitrage).await.unwrap();
        assert_eq!(config.get_str("uniswapRouter"), Some("0xAAA"));
        assert_eq!(config.get_str("arbitrageContractAddress"), Some("0xCCC"));
    }
}
