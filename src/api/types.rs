use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// Success payload for the run routes.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
}

/// Failure payload: a human-readable message plus structured detail so a
/// caller can diagnose without reading server logs.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
    pub error: String,
}

/// One strategy's last-known persisted data.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyData {
    pub strategy: String,
    pub config: Value,
    pub deployed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abi: Option<Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_seconds: i64,
    pub timestamp: DateTime<Utc>,
}
