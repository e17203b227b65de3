//! System/maintenance routes (§4.7, §6.1)

use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::system::logger::{self, Severity};

use super::extract::{bearer_header, envelope, DataEnvelope};
use super::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/v1/system/about", get(about))
        .route("/v1/system/maintenance/start", post(maintenance_start))
        .route("/v1/system/maintenance/stop", post(maintenance_stop))
        .route("/v1/system/log-level", get(log_level).post(set_log_level))
}

async fn health() -> &'static str {
    "OK"
}

async fn about(
    State(state): State<AppState>,
) -> AppResult<Json<DataEnvelope<crate::system::NodeInfo>>> {
    let info = state.node_info.snapshot().await?;
    Ok(Json(envelope(info)))
}

async fn maintenance_start(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Json<DataEnvelope<serde_json::Value>>> {
    let header = bearer_header(&headers)?;
    state.capability.require_admin(header, "nil.db.system.maintenance").await?;
    state.maintenance.start().await?;
    Ok(Json(envelope(serde_json::json!({"active": true}))))
}

async fn maintenance_stop(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Json<DataEnvelope<serde_json::Value>>> {
    let header = bearer_header(&headers)?;
    state.capability.require_admin(header, "nil.db.system.maintenance").await?;
    state.maintenance.stop().await?;
    Ok(Json(envelope(serde_json::json!({"active": false}))))
}

#[derive(Debug, Serialize)]
struct LogLevelResponse {
    level: String,
}

async fn log_level(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Json<DataEnvelope<LogLevelResponse>>> {
    let header = bearer_header(&headers)?;
    state.capability.require_admin(header, "nil.db.system.logs").await?;
    Ok(Json(envelope(LogLevelResponse { level: logger::level().to_string() })))
}

#[derive(Debug, Deserialize)]
struct SetLogLevelRequest {
    level: String,
}

async fn set_log_level(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<SetLogLevelRequest>,
) -> AppResult<Json<DataEnvelope<LogLevelResponse>>> {
    let header = bearer_header(&headers)?;
    state.capability.require_admin(header, "nil.db.system.logs").await?;

    let parsed = Severity::parse(&body.level).ok_or_else(|| {
        crate::error::AppError::DataValidation(format!("unknown log level: {}", body.level))
    })?;
    logger::set_level(parsed);
    logger::log(Severity::Info, "LOG_LEVEL_CHANGED", &[("level", parsed.as_str())]);
    Ok(Json(envelope(LogLevelResponse { level: parsed.to_string() })))
}
