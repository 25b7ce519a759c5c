pub mod deployer;
pub mod pipeline;
pub mod runner;
pub mod verifier;

pub use deployer::{Deployer, Deployment, EthersDeployer};
pub use pipeline::{DeploymentPipeline, DeploymentResult, ResultError};
pub use runner::{DeployCommand, ExitOutcome, ProcessRunner, RunHandle, RESULT_LINE_PREFIX};
pub use verifier::{ExplorerVerifier, Verifier};
