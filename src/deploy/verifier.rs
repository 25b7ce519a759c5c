//! Best-effort source verification against a block-explorer-like service.
//!
//! Verification failure never reverts a run that has already persisted; the
//! pipeline records the error and reports `verified = false`.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::error::DeployError;

#[async_trait]
pub trait Verifier: Send + Sync {
    async fn verify(&self, contract_name: &str, address: &str) -> Result<(), DeployError>;
}

#[derive(Debug, Deserialize)]
struct ExplorerResponse {
    status: String,
    #[serde(default)]
    result: String,
}

/// Etherscan-style verification client.
pub struct ExplorerVerifier {
    http: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
}

impl ExplorerVerifier {
    pub fn new(api_url: impl Into<String>, api_key: Option<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self {
            http,
            api_url: api_url.into(),
            api_key,
        }
    }
}

#[async_trait]
impl Verifier for ExplorerVerifier {
    async fn verify(&self, contract_name: &str, address: &str) -> Result<(), DeployError> {
        let mut form = vec![
            ("module", "contract".to_string()),
            ("action", "verifysourcecode".to_string()),
            ("contractaddress", address.to_string()),
            ("contractname", contract_name.to_string()),
        ];
        if let Some(key) = &self.api_key {
            form.push(("apikey", key.clone()));
        }

        let response = self
            .http
            .post(&self.api_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| DeployError::Verification(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeployError::Verification(format!(
                "explorer returned HTTP {status}"
            )));
        }

        let body: ExplorerResponse = response
            .json()
            .await
            .map_err(|e| DeployError::Verification(e.to_string()))?;

        if body.status == "1" {
            tracing::info!(contract = contract_name, address, "verification submitted");
            Ok(())
        } else {
            Err(DeployError::Verification(body.result))
        }
    }
}
