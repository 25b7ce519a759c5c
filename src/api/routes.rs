use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::api::{handlers, state::AppState};

pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Deployment/execution triggers, one per strategy
        .route("/run-arbitrage", post(handlers::run_arbitrage))
        .route("/run-flashloan", post(handlers::run_flashloan))
        .route("/run-frontrunning", post(handlers::run_frontrunning))
        .route("/run-sandwich", post(handlers::run_sandwich))
        .route("/run-liquidation", post(handlers::run_liquidation))
        .route("/run-hft", post(handlers::run_hft))
        // Persisted-state reads
        .route("/api/dashboard", get(handlers::get_dashboard))
        .route("/api/:strategy", get(handlers::get_strategy_data))
        // Liveness
        .route("/health", get(handlers::health))
        // Add state and CORS
        .with_state(state)
        .layer(cors)
}
