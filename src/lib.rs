pub mod api;
pub mod cli;
pub mod config;
pub mod deploy;
pub mod error;
pub mod execution;
pub mod registry;
pub mod store;

pub use config::AppConfig;
pub use deploy::{
    DeployCommand, Deployer, Deployment, DeploymentPipeline, DeploymentResult, EthersDeployer,
    ExitOutcome, ExplorerVerifier, ProcessRunner, ResultError, Verifier, RESULT_LINE_PREFIX,
};
pub use error::{DeployError, Result, StratopsError};
pub use execution::{ArbitrageExecutor, TradeExecutor, TradeParams};
pub use registry::{Strategy, StrategySpec};
pub use store::{
    ArtifactStore, ConfigStore, ContractArtifact, FileBackend, MemoryBackend, StateBackend,
    StrategyConfig, StrategyLocks,
};
