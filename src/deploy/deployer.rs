//! The deployer collaborator boundary: submit a contract-creation transaction
//! and hand back the deployed address plus the compiled interface description.

use async_trait::async_trait;
use ethers::abi::{Abi, Token};
use ethers::contract::ContractFactory;
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Provider};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, Bytes, U256};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::{DeployError, StratopsError};

/// The outcome of one successful contract deployment.
#[derive(Debug, Clone, PartialEq)]
pub struct Deployment {
    /// 0x-prefixed deployed contract address.
    pub address: String,
    /// The contract ABI as produced by the build step.
    pub abi: Value,
}

/// Submits a deployment transaction for a named contract with ordered
/// constructor arguments. Retry policy, if any, belongs to implementations;
/// the pipeline never retries.
#[async_trait]
pub trait Deployer: Send + Sync {
    async fn deploy(
        &self,
        contract_name: &str,
        constructor_args: &[String],
    ) -> Result<Deployment, DeployError>;
}

type ChainClient = SignerMiddleware<Provider<Http>, LocalWallet>;

/// Production deployer: reads the compiled artifact (ABI + bytecode) from the
/// build output directory and deploys it over JSON-RPC with a local signing
/// key.
pub struct EthersDeployer {
    client: Arc<ChainClient>,
    artifacts_dir: PathBuf,
}

impl EthersDeployer {
    pub fn new(
        rpc_url: &str,
        private_key: &str,
        chain_id: u64,
        artifacts_dir: impl Into<PathBuf>,
    ) -> Result<Self, StratopsError> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| StratopsError::Internal(format!("invalid RPC URL: {e}")))?;
        let wallet: LocalWallet = private_key
            .parse()
            .map_err(|e| StratopsError::Internal(format!("invalid deployer key: {e}")))?;
        let client = Arc::new(SignerMiddleware::new(
            provider,
            wallet.with_chain_id(chain_id),
        ));

        Ok(Self {
            client,
            artifacts_dir: artifacts_dir.into(),
        })
    }

    /// Locate the build artifact for `contract_name`, trying the flat layout
    /// (`<dir>/<Name>.json`) first and the hardhat layout
    /// (`<dir>/<Name>.sol/<Name>.json`) second.
    async fn read_build_artifact(&self, contract_name: &str) -> Result<Value, DeployError> {
        let flat = self.artifacts_dir.join(format!("{contract_name}.json"));
        let nested = self
            .artifacts_dir
            .join(format!("{contract_name}.sol"))
            .join(format!("{contract_name}.json"));

        let bytes = match tokio::fs::read(&flat).await {
            Ok(bytes) => bytes,
            Err(_) => tokio::fs::read(&nested).await.map_err(|e| {
                DeployError::Deployment(format!(
                    "build artifact for {contract_name} not found under {}: {e}",
                    self.artifacts_dir.display()
                ))
            })?,
        };

        serde_json::from_slice(&bytes).map_err(|e| {
            DeployError::Deployment(format!("build artifact for {contract_name} is not JSON: {e}"))
        })
    }
}

/// Pull the deployable bytecode out of a build artifact, accepting both the
/// hardhat shape (`"bytecode": "0x.."`) and the foundry shape
/// (`"bytecode": {"object": "0x.."}`).
fn extract_bytecode(artifact: &Value) -> Option<&str> {
    match artifact.get("bytecode") {
        Some(Value::String(s)) => Some(s.as_str()),
        Some(Value::Object(obj)) => obj.get("object").and_then(Value::as_str),
        _ => None,
    }
}

/// Map one textual constructor argument onto an ABI token: addresses become
/// address tokens, unsigned decimals become uints, everything else a string.
fn constructor_token(arg: &str) -> Token {
    if let Ok(address) = arg.parse::<Address>() {
        return Token::Address(address);
    }
    if !arg.is_empty() && arg.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(value) = U256::from_dec_str(arg) {
            return Token::Uint(value);
        }
    }
    Token::String(arg.to_string())
}

#[async_trait]
impl Deployer for EthersDeployer {
    async fn deploy(
        &self,
        contract_name: &str,
        constructor_args: &[String],
    ) -> Result<Deployment, DeployError> {
        let artifact = self.read_build_artifact(contract_name).await?;

        let abi_json = artifact
            .get("abi")
            .cloned()
            .ok_or_else(|| {
                DeployError::Deployment(format!("build artifact for {contract_name} has no abi"))
            })?;
        let abi: Abi = serde_json::from_value(abi_json.clone()).map_err(|e| {
            DeployError::Deployment(format!("ABI for {contract_name} is malformed: {e}"))
        })?;

        let bytecode: Bytes = extract_bytecode(&artifact)
            .ok_or_else(|| {
                DeployError::Deployment(format!(
                    "build artifact for {contract_name} has no bytecode"
                ))
            })?
            .parse()
            .map_err(|e| {
                DeployError::Deployment(format!("bytecode for {contract_name} is malformed: {e}"))
            })?;

        let tokens: Vec<Token> = constructor_args
            .iter()
            .map(|arg| constructor_token(arg))
            .collect();

        tracing::info!(
            contract = contract_name,
            args = constructor_args.len(),
            "submitting deployment transaction"
        );

        let factory = ContractFactory::new(abi, bytecode, self.client.clone());
        let deployer = factory
            .deploy_tokens(tokens)
            .map_err(|e| DeployError::Deployment(e.to_string()))?;
        let contract = deployer
            .send()
            .await
            .map_err(|e| DeployError::Deployment(e.to_string()))?;

        Ok(Deployment {
            address: format!("{:#x}", contract.address()),
            abi: abi_json,
        })
    }
}
