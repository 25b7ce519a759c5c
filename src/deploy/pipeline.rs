//! One strategy's end-to-end deployment run.
//!
//! Load config → validate required fields → deploy (bounded by the
//! confirmation timeout) → persist address + artifact under the per-strategy
//! lock → best-effort verification.
//!
//! Re-running a strategy that already has a persisted address always performs
//! a fresh deployment and overwrites the prior address and artifact; there is
//! no deploy-if-absent guard.

use chrono::{DateTime, Utc};
use ethers::types::Address;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::deploy::deployer::Deployer;
use crate::deploy::verifier::Verifier;
use crate::error::DeployError;
use crate::registry::Strategy;
use crate::store::{ArtifactStore, ConfigStore, ContractArtifact, StrategyLocks};

/// Serializable outcome of one pipeline run. This is the payload of the
/// subprocess's final `RESULT` line and the basis of HTTP responses; only its
/// effects on the config record and the ABI sidecar are persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentResult {
    pub run_id: Uuid,
    pub strategy: Strategy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ResultError>,
    pub completed_at: DateTime<Utc>,
}

/// Structured failure detail carried by a result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultError {
    pub kind: String,
    pub message: String,
}

impl DeploymentResult {
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.address.is_some()
    }
}

pub struct DeploymentPipeline {
    config_store: Arc<ConfigStore>,
    artifact_store: Arc<ArtifactStore>,
    locks: Arc<StrategyLocks>,
    deployer: Arc<dyn Deployer>,
    verifier: Option<Arc<dyn Verifier>>,
    confirm_timeout: Duration,
}

impl DeploymentPipeline {
    pub fn new(
        config_store: Arc<ConfigStore>,
        artifact_store: Arc<ArtifactStore>,
        locks: Arc<StrategyLocks>,
        deployer: Arc<dyn Deployer>,
        verifier: Option<Arc<dyn Verifier>>,
        confirm_timeout: Duration,
    ) -> Self {
        Self {
            config_store,
            artifact_store,
            locks,
            deployer,
            verifier,
            confirm_timeout,
        }
    }

    pub async fn run(&self, strategy: Strategy) -> DeploymentResult {
        let run_id = Uuid::new_v4();
        info!(%run_id, %strategy, "starting deployment run");

        match self.run_inner(strategy).await {
            Ok((address, verified, verification_error)) => {
                info!(%run_id, %strategy, %address, verified, "deployment run succeeded");
                DeploymentResult {
                    run_id,
                    strategy,
                    address: Some(address),
                    verified,
                    verification_error,
                    error: None,
                    completed_at: Utc::now(),
                }
            }
            Err(err) => {
                error!(%run_id, %strategy, error = %err, "deployment run failed");
                DeploymentResult {
                    run_id,
                    strategy,
                    address: None,
                    verified: false,
                    verification_error: None,
                    error: Some(ResultError {
                        kind: err.kind().to_string(),
                        message: err.to_string(),
                    }),
                    completed_at: Utc::now(),
                }
            }
        }
    }

    async fn run_inner(
        &self,
        strategy: Strategy,
    ) -> Result<(String, bool, Option<String>), DeployError> {
        let spec = strategy.spec();

        // Loaded → Validated. Any failure here is terminal with zero writes.
        let config = self.config_store.load(strategy).await?;
        ConfigStore::validate(&config, spec.required_fields)?;

        // Constructor arguments in the contract's declared order; a missing
        // non-required field resolves to an empty argument.
        let constructor_args: Vec<String> = spec
            .constructor_fields
            .iter()
            .map(|field| config.get_str(field).unwrap_or_default().to_string())
            .collect();

        // Deploying. The confirmation wait is bounded; on timeout the deploy
        // future is dropped and nothing has been persisted.
        let deployment = tokio::time::timeout(
            self.confirm_timeout,
            self.deployer.deploy(spec.contract_name, &constructor_args),
        )
        .await
        .map_err(|_| DeployError::Timeout(self.confirm_timeout.as_secs()))??;

        if deployment.address.parse::<Address>().is_err() {
            return Err(DeployError::Deployment(format!(
                "deployer returned an invalid contract address: {}",
                deployment.address
            )));
        }
        let address = deployment.address;

        // Persisted. Both halves are attempted under the per-strategy lock so
        // a concurrent run cannot pair its address with this run's artifact.
        {
            let _guard = self.locks.acquire(strategy).await;

            let config_result = self
                .config_store
                .update(strategy, spec.address_field, Value::String(address.clone()))
                .await;
            let artifact_result = self
                .artifact_store
                .save(
                    strategy,
                    &ContractArtifact {
                        contract_name: spec.contract_name.to_string(),
                        abi: deployment.abi,
                    },
                )
                .await;

            let config_updated = config_result.is_ok();
            let artifact_written = artifact_result.is_ok();
            if !config_updated || !artifact_written {
                let cause = [
                    config_result.err().map(|e| format!("config: {e}")),
                    artifact_result.err().map(|e| format!("artifact: {e}")),
                ]
                .into_iter()
                .flatten()
                .collect::<Vec<_>>()
                .join("; ");

                return Err(DeployError::Persistence {
                    config_updated,
                    artifact_written,
                    cause,
                });
            }
        }

        // Verification never fails a run that has already persisted.
        let (verified, verification_error) = match &self.verifier {
            Some(verifier) => match verifier.verify(spec.contract_name, &address).await {
                Ok(()) => (true, None),
                Err(e) => {
                    warn!(%strategy, %address, error = %e, "verification failed; run stays successful");
                    (false, Some(e.to_string()))
                }
            },
            None => (false, None),
        };

        Ok((address, verified, verification_error))
    }
}
