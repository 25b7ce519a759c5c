//! POST /run-<strategy> handlers.
//!
//! Deployment strategies delegate to the subprocess runner; arbitrage instead
//! performs an in-process method call against the already-deployed contract.
//! This layer is a thin dispatcher: presence checks only, every consistency
//! guarantee lives in the pipeline and the stores.

use axum::{extract::State, http::StatusCode, Json};
use serde_json::Value;

use crate::api::state::AppState;
use crate::api::types::{ErrorResponse, RunResponse};
use crate::execution::TradeParams;
use crate::registry::Strategy;

type RunResult = Result<Json<RunResponse>, (StatusCode, Json<ErrorResponse>)>;

fn failure(message: impl Into<String>, error: impl Into<String>) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            message: message.into(),
            error: error.into(),
        }),
    )
}

/// POST /run-flashloan
pub async fn run_flashloan(State(state): State<AppState>) -> RunResult {
    run_deployment(state, Strategy::Flashloan).await
}

/// POST /run-frontrunning
pub async fn run_frontrunning(State(state): State<AppState>) -> RunResult {
    run_deployment(state, Strategy::Frontrunning).await
}

/// POST /run-sandwich
pub async fn run_sandwich(State(state): State<AppState>) -> RunResult {
    run_deployment(state, Strategy::Sandwich).await
}

/// POST /run-liquidation
pub async fn run_liquidation(State(state): State<AppState>) -> RunResult {
    run_deployment(state, Strategy::Liquidation).await
}

/// POST /run-hft
pub async fn run_hft(State(state): State<AppState>) -> RunResult {
    run_deployment(state, Strategy::Hft).await
}

/// Trigger one out-of-process deployment and map its outcome onto the
/// 200/500 response contract.
async fn run_deployment(state: AppState, strategy: Strategy) -> RunResult {
    let outcome = match state.runner.run(&state.deploy_command, strategy).await {
        Ok(outcome) => outcome,
        Err(e) => {
            return Err(failure(
                format!("Failed to launch {strategy} deployment"),
                e.to_string(),
            ));
        }
    };

    if outcome.timed_out {
        return Err(failure(
            format!("{strategy} deployment timed out"),
            format!(
                "deployment process killed after {}s",
                state.runner.timeout_secs()
            ),
        ));
    }

    match outcome.result {
        Some(result) if result.is_success() => {
            let address = result.address.unwrap_or_default();
            Ok(Json(RunResponse {
                message: format!(
                    "{} contract deployed at {address}",
                    strategy.spec().contract_name
                ),
                tx_hash: None,
            }))
        }
        Some(result) => {
            let detail = result
                .error
                .map(|e| format!("{}: {}", e.kind, e.message))
                .unwrap_or_else(|| "deployment reported no address".to_string());
            Err(failure(format!("{strategy} deployment failed"), detail))
        }
        // The exit code alone is not trusted: a clean exit without a
        // structured result still counts as a crashed tool.
        None => Err(failure(
            format!("{strategy} deployment failed"),
            match outcome.code {
                Some(code) => {
                    format!("deployment process exited with code {code} without reporting a result")
                }
                None => "deployment process was killed before reporting a result".to_string(),
            },
        )),
    }
}

/// POST /run-arbitrage
///
/// Executes a trade through the deployed arbitrage contract with the
/// caller-supplied parameters; returns the submitted transaction hash.
pub async fn run_arbitrage(
    State(state): State<AppState>,
    payload: Option<Json<Value>>,
) -> RunResult {
    let Some(Json(body)) = payload else {
        return Err(failure(
            "arbitrage trade rejected",
            "missing JSON request body",
        ));
    };

    for field in ["tradeSize", "gasFee", "slippage"] {
        if body.get(field).is_none() {
            return Err(failure(
                "arbitrage trade rejected",
                format!("missing required parameter: {field}"),
            ));
        }
    }

    let params: TradeParams = match serde_json::from_value(body) {
        Ok(params) => params,
        Err(e) => {
            return Err(failure(
                "arbitrage trade rejected",
                format!("malformed trade parameters: {e}"),
            ));
        }
    };

    match state.executor.execute_arbitrage(&params).await {
        Ok(tx_hash) => Ok(Json(RunResponse {
            message: "arbitrage trade submitted".to_string(),
            tx_hash: Some(tx_hash),
        })),
        Err(e) => Err(failure("arbitrage execution failed", e.to_string())),
    }
}
