//! In-process contract execution for the arbitrage strategy.
//!
//! `POST /run-arbitrage` does not deploy; it calls `executeArbitrage` on the
//! contract persisted by an earlier deployment, with trade parameters supplied
//! by the caller, and returns the submitted transaction hash.

use async_trait::async_trait;
use ethers::abi::Abi;
use ethers::contract::Contract;
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Provider};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, H256, U256};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::config::NetworkConfig;
use crate::error::{Result, StratopsError};
use crate::registry::Strategy;
use crate::store::{ArtifactStore, ConfigStore};

/// Caller-supplied trade parameters, as submitted by the dashboard.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeParams {
    /// Trade size in whole token units (converted to wei)
    pub trade_size: f64,
    /// Gas price in gwei
    pub gas_fee: u64,
    /// Allowed slippage in percent
    pub slippage: f64,
    /// Optional override of the persisted contract address
    #[serde(default)]
    pub contract_address: Option<String>,
}

/// Submits a trade against an already-deployed strategy contract.
#[async_trait]
pub trait TradeExecutor: Send + Sync {
    async fn execute_arbitrage(&self, params: &TradeParams) -> Result<String>;
}

/// Production executor over JSON-RPC with the shared signing key.
pub struct ArbitrageExecutor {
    network: NetworkConfig,
    config_store: Arc<ConfigStore>,
    artifact_store: Arc<ArtifactStore>,
}

impl ArbitrageExecutor {
    pub fn new(
        network: NetworkConfig,
        config_store: Arc<ConfigStore>,
        artifact_store: Arc<ArtifactStore>,
    ) -> Self {
        Self {
            network,
            config_store,
            artifact_store,
        }
    }

    fn client(&self) -> Result<Arc<SignerMiddleware<Provider<Http>, LocalWallet>>> {
        let provider = Provider::<Http>::try_from(self.network.rpc_url.as_str())
            .map_err(|e| StratopsError::Execution(format!("invalid RPC URL: {e}")))?;
        let key = self
            .network
            .private_key
            .as_deref()
            .ok_or_else(|| StratopsError::Execution("wallet private key not configured".into()))?;
        let wallet: LocalWallet = key
            .parse()
            .map_err(|e| StratopsError::Execution(format!("invalid wallet key: {e}")))?;
        Ok(Arc::new(SignerMiddleware::new(
            provider,
            wallet.with_chain_id(self.network.chain_id),
        )))
    }
}

#[async_trait]
impl TradeExecutor for ArbitrageExecutor {
    async fn execute_arbitrage(&self, params: &TradeParams) -> Result<String> {
        let spec = Strategy::Arbitrage.spec();

        let address_str = match &params.contract_address {
            Some(address) if !address.trim().is_empty() => address.clone(),
            _ => {
                let config = self.config_store.load(Strategy::Arbitrage).await?;
                config
                    .get_str(spec.address_field)
                    .ok_or_else(|| {
                        StratopsError::Execution(
                            "arbitrage contract is not deployed yet".to_string(),
                        )
                    })?
                    .to_string()
            }
        };
        let address: Address = address_str
            .parse()
            .map_err(|e| StratopsError::Execution(format!("invalid contract address: {e}")))?;

        let abi_json = self
            .artifact_store
            .load(Strategy::Arbitrage)
            .await?
            .ok_or_else(|| {
                StratopsError::Execution("no persisted ABI for the arbitrage contract".to_string())
            })?;
        let abi: Abi = serde_json::from_value(abi_json)?;

        let client = self.client()?;
        let contract = Contract::new(address, abi, client);

        let amount = ethers::utils::parse_ether(params.trade_size)
            .map_err(|e| StratopsError::Execution(format!("invalid trade size: {e}")))?;
        let slippage_bps = U256::from((params.slippage * 100.0).round().max(0.0) as u64);
        let gas_price = U256::from(params.gas_fee) * U256::exp10(9);

        let call = contract
            .method::<_, ()>("executeArbitrage", (amount, slippage_bps))
            .map_err(|e| StratopsError::Execution(e.to_string()))?
            .gas_price(gas_price);

        let pending = call
            .send()
            .await
            .map_err(|e| StratopsError::Execution(e.to_string()))?;
        let tx_hash: H256 = *pending;

        info!(address = %address_str, tx_hash = %format!("{tx_hash:#x}"), "arbitrage trade submitted");
        Ok(format!("{tx_hash:#x}"))
    }
}
