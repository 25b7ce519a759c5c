//! ABI sidecar files.
//!
//! Every successful deploy overwrites `abi/<strategy>_abi.json` with the
//! pretty-printed interface description of the deployed contract. The backend
//! write is all-or-nothing, so readers never see a truncated ABI.

use serde_json::Value;
use std::io;
use std::sync::Arc;

use crate::registry::Strategy;
use crate::store::StateBackend;

/// The compiled interface description of one deployed contract.
#[derive(Debug, Clone, PartialEq)]
pub struct ContractArtifact {
    pub contract_name: String,
    pub abi: Value,
}

pub struct ArtifactStore {
    backend: Arc<dyn StateBackend>,
}

impl ArtifactStore {
    pub fn new(backend: Arc<dyn StateBackend>) -> Self {
        Self { backend }
    }

    fn key(strategy: Strategy) -> String {
        format!("abi/{}", strategy.spec().abi_file)
    }

    pub async fn save(&self, strategy: Strategy, artifact: &ContractArtifact) -> io::Result<()> {
        let bytes = serde_json::to_vec_pretty(&artifact.abi)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
        self.backend.write(&Self::key(strategy), &bytes).await
    }

    /// Read back the persisted ABI, if any.
    pub async fn load(&self, strategy: Strategy) -> io::Result<Option<Value>> {
        let Some(bytes) = self.backend.read(&Self::key(strategy)).await? else {
            return Ok(None);
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryBackend;
    use serde_json::json;

    #[tokio::test]
    async fn save_then_load_round_trips_the_abi() {
        let store = ArtifactStore::new(Arc::new(MemoryBackend::new()));
        let artifact = ContractArtifact {
            contract_name: "Arbitrage".into(),
            abi: json!([{"type": "function", "name": "executeArbitrage"}]),
        };

        store.save(Strategy::Arbitrage, &artifact).await.unwrap();
        let loaded = store.load(Strategy::Arbitrage).await.unwrap();
        assert_eq!(loaded, Some(artifact.abi));
    }

    #[tokio::test]
    async fn load_missing_artifact_is_none() {
        let store = ArtifactStore::new(Arc::new(MemoryBackend::new()));
        assert_eq!(store.load(Strategy::Hft).await.unwrap(), None);
    }

    #[tokio::test]
    async fn overwrites_prior_artifact_in_full() {
        let store = ArtifactStore::new(Arc::new(MemoryBackend::new()));
        let first = ContractArtifact {
            contract_name: "HFT".into(),
            abi: json!([{"name": "first"}]),
        };
        let second = ContractArtifact {
            contract_name: "HFT".into(),
            abi: json!([{"name": "second"}]),
        };

        store.save(Strategy::Hft, &first).await.unwrap();
        store.save(Strategy::Hft, &second).await.unwrap();
        assert_eq!(store.load(Strategy::Hft).await.unwrap(), Some(second.abi));
    }
}
