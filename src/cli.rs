use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Deployment and state-sync server for on-chain trading strategy contracts.
#[derive(Parser, Debug)]
#[command(name = "stratops", version, about)]
pub struct Cli {
    /// Directory holding default.toml / <env>.toml configuration files
    #[arg(long, global = true, default_value = "config")]
    pub config_dir: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP server exposing the per-strategy trigger routes
    Serve {
        /// Listen port (overrides configuration)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Deploy one strategy's contract and persist its address and ABI.
    ///
    /// Always performs a fresh deployment, overwriting any previously
    /// persisted address and ABI for the strategy. Prints a final
    /// `RESULT <json>` line so a supervising process can read the structured
    /// outcome; exits non-zero on failure.
    Deploy {
        /// Strategy name (arbitrage, flashloan, frontrunning, sandwich,
        /// liquidation, hft)
        strategy: String,

        /// Override the deployment confirmation timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },
}
