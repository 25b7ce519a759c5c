use anyhow::Context;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use stratops::api::{create_router, AppState};
use stratops::cli::{Cli, Commands};
use stratops::config::{AppConfig, LoggingConfig};
use stratops::deploy::{
    DeployCommand, DeploymentPipeline, EthersDeployer, ExplorerVerifier, ProcessRunner, Verifier,
    RESULT_LINE_PREFIX,
};
use stratops::execution::ArbitrageExecutor;
use stratops::registry::Strategy;
use stratops::store::{ArtifactStore, ConfigStore, FileBackend, StateBackend, StrategyLocks};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let app_config = AppConfig::load_from(&cli.config_dir)
        .with_context(|| format!("failed to load configuration from {}", cli.config_dir.display()))?;
    if let Err(errors) = app_config.validate() {
        anyhow::bail!("invalid configuration:\n  - {}", errors.join("\n  - "));
    }
    init_logging(&app_config.logging);

    match cli.command {
        Commands::Serve { port } => run_server(app_config, port, &cli.config_dir).await,
        Commands::Deploy { strategy, timeout } => run_deploy(app_config, &strategy, timeout).await,
    }
}

fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.clone()));

    if config.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn build_stores(app_config: &AppConfig) -> (Arc<ConfigStore>, Arc<ArtifactStore>) {
    let backend: Arc<dyn StateBackend> = Arc::new(FileBackend::new(&app_config.paths.data_dir));
    (
        Arc::new(ConfigStore::new(backend.clone())),
        Arc::new(ArtifactStore::new(backend)),
    )
}

async fn run_server(
    app_config: AppConfig,
    port_override: Option<u16>,
    config_dir: &std::path::Path,
) -> anyhow::Result<()> {
    let (config_store, artifact_store) = build_stores(&app_config);

    let runner = Arc::new(ProcessRunner::new(Duration::from_secs(
        app_config.deploy.subprocess_timeout_secs,
    )));
    // Spawned deployments read the same configuration this server did.
    let deploy_command = DeployCommand::current_exe()
        .map_err(|e| anyhow::anyhow!(e))?
        .with_trailing_args(vec![
            "--config-dir".to_string(),
            config_dir.display().to_string(),
        ]);

    let executor = Arc::new(ArbitrageExecutor::new(
        app_config.network.clone(),
        config_store.clone(),
        artifact_store.clone(),
    ));

    let state = AppState::new(
        config_store,
        artifact_store,
        runner,
        deploy_command,
        executor,
    );
    let router = create_router(state);

    let port = port_override.unwrap_or(app_config.server.port);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(%addr, "server started");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install ctrl-c handler");
        return;
    }
    info!("shutdown signal received");
}

async fn run_deploy(
    app_config: AppConfig,
    strategy_name: &str,
    timeout_override: Option<u64>,
) -> anyhow::Result<()> {
    let strategy = Strategy::from_str(strategy_name)
        .with_context(|| format!("unknown strategy: {strategy_name}"))?;

    let (config_store, artifact_store) = build_stores(&app_config);

    let private_key = app_config
        .network
        .private_key
        .as_deref()
        .context("network.private_key is required to deploy (set STRATOPS_NETWORK__PRIVATE_KEY)")?;
    let deployer = Arc::new(EthersDeployer::new(
        &app_config.network.rpc_url,
        private_key,
        app_config.network.chain_id,
        &app_config.paths.artifacts_dir,
    )?);

    let verifier: Option<Arc<dyn Verifier>> = if app_config.deploy.verify.enabled {
        app_config.deploy.verify.api_url.as_ref().map(|url| {
            Arc::new(ExplorerVerifier::new(
                url.clone(),
                app_config.deploy.verify.api_key.clone(),
            )) as Arc<dyn Verifier>
        })
    } else {
        None
    };

    let confirm_timeout = Duration::from_secs(
        timeout_override.unwrap_or(app_config.deploy.confirm_timeout_secs),
    );

    let pipeline = DeploymentPipeline::new(
        config_store,
        artifact_store,
        Arc::new(StrategyLocks::new()),
        deployer,
        verifier,
        confirm_timeout,
    );

    let result = pipeline.run(strategy).await;
    let success = result.is_success();

    // The structured channel a supervising ProcessRunner reads; exit code
    // alone does not classify the outcome.
    println!("{RESULT_LINE_PREFIX}{}", serde_json::to_string(&result)?);

    if !success {
        std::process::exit(1);
    }
    Ok(())
}
