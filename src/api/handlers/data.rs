//! Read-only data routes: per-strategy persisted state, the dashboard
//! aggregate, and the liveness probe.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;

use crate::api::state::AppState;
use crate::api::types::{ErrorResponse, HealthResponse, StrategyData};
use crate::registry::Strategy;

type DataResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

fn failure(message: impl Into<String>, error: impl Into<String>) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            message: message.into(),
            error: error.into(),
        }),
    )
}

async fn strategy_data(state: &AppState, strategy: Strategy) -> Result<StrategyData, String> {
    let config = state
        .config_store
        .load(strategy)
        .await
        .map_err(|e| e.to_string())?;
    let abi = state
        .artifact_store
        .load(strategy)
        .await
        .map_err(|e| e.to_string())?;
    let deployed = config.has_field(strategy.spec().address_field);

    Ok(StrategyData {
        strategy: strategy.as_str().to_string(),
        config: config.into_value(),
        deployed,
        abi,
    })
}

/// GET /api/:strategy
pub async fn get_strategy_data(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> DataResult<StrategyData> {
    let Some(strategy) = Strategy::from_str(&name) else {
        return Err(failure(
            format!("Failed to get {name} data"),
            format!("unknown strategy: {name}"),
        ));
    };

    strategy_data(&state, strategy)
        .await
        .map(Json)
        .map_err(|e| failure(format!("Failed to get {name} data"), e))
}

/// GET /api/dashboard
///
/// All six strategies' persisted records; strategies with no record yet are
/// reported undeployed with an empty config.
pub async fn get_dashboard(State(state): State<AppState>) -> Json<Vec<StrategyData>> {
    let mut items = Vec::with_capacity(Strategy::ALL.len());
    for strategy in Strategy::ALL {
        match strategy_data(&state, strategy).await {
            Ok(data) => items.push(data),
            Err(_) => items.push(StrategyData {
                strategy: strategy.as_str().to_string(),
                config: serde_json::json!({}),
                deployed: false,
                abi: None,
            }),
        }
    }
    Json(items)
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_seconds: state.uptime_seconds(),
        timestamp: Utc::now(),
    })
}
