//! Saved-query routes (§4.5, §6.1)

use std::collections::HashMap;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::entities::{Query, VariableSpec};
use crate::error::{AppError, AppResult};

use super::extract::{bearer_header, envelope, DataEnvelope};
use super::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/queries", post(register).get(list).delete(remove))
        .route("/v1/queries/run", post(run))
        .route("/v1/queries/job", post(job))
}

#[derive(Debug, Deserialize)]
struct RegisterQueryRequest {
    name: String,
    collection: Uuid,
    #[serde(default)]
    variables: HashMap<String, VariableSpec>,
    pipeline: Vec<Value>,
}

async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<RegisterQueryRequest>,
) -> AppResult<(StatusCode, Json<DataEnvelope<Query>>)> {
    let header = bearer_header(&headers)?;
    let (subject, _) = state.capability.require_builder(header, "nil.db.queries.write").await?;
    let crate::capability::Subject::Builder(caller) = subject else {
        unreachable!("require_builder always yields Subject::Builder");
    };

    let query = state
        .registrar
        .add_query(&caller.id, body.name, body.collection, body.variables, body.pipeline)
        .await?;

    Ok((StatusCode::CREATED, Json(envelope(query))))
}

async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Json<DataEnvelope<Vec<Query>>>> {
    let header = bearer_header(&headers)?;
    let (subject, _) = state.capability.require_builder(header, "nil.db.queries.read").await?;
    let crate::capability::Subject::Builder(caller) = subject else {
        unreachable!("require_builder always yields Subject::Builder");
    };
    let queries = state.queries.find_owned_by(&caller.id).await?;
    Ok(Json(envelope(queries)))
}

#[derive(Debug, Deserialize)]
struct RemoveQueryRequest {
    id: Uuid,
}

async fn remove(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<RemoveQueryRequest>,
) -> AppResult<StatusCode> {
    let header = bearer_header(&headers)?;
    let (subject, _) = state.capability.require_builder(header, "nil.db.queries.write").await?;
    let crate::capability::Subject::Builder(caller) = subject else {
        unreachable!("require_builder always yields Subject::Builder");
    };

    let query = state.queries.require(body.id).await?;
    crate::policy::require_owns_query(&caller.id, &query)?;
    state.cascade.remove_query(body.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct RunQueryRequest {
    id: Uuid,
    #[serde(default)]
    variables: HashMap<String, Value>,
    #[serde(default)]
    background: bool,
}

async fn run(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<RunQueryRequest>,
) -> AppResult<Json<DataEnvelope<Value>>> {
    let header = bearer_header(&headers)?;
    let (subject, _) = state.capability.require_builder(header, "nil.db.queries.execute").await?;
    let crate::capability::Subject::Builder(caller) = subject else {
        unreachable!("require_builder always yields Subject::Builder");
    };

    let query = state.queries.require(body.id).await?;
    crate::policy::require_owns_query(&caller.id, &query)?;

    if body.background {
        let run_id = state.jobs.spawn(query, body.variables).await?;
        Ok(Json(envelope(Value::String(run_id.to_string()))))
    } else {
        let result = state.executor.run(&query, body.variables).await?;
        Ok(Json(envelope(Value::Array(result))))
    }
}

#[derive(Debug, Deserialize)]
struct JobStatusRequest {
    id: Uuid,
}

async fn job(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<JobStatusRequest>,
) -> AppResult<Json<DataEnvelope<crate::entities::QueryRun>>> {
    let header = bearer_header(&headers)?;
    let (subject, _) = state.capability.require_builder(header, "nil.db.queries.read").await?;
    let crate::capability::Subject::Builder(caller) = subject else {
        unreachable!("require_builder always yields Subject::Builder");
    };

    let run = state
        .query_runs
        .find(body.id)
        .await?
        .ok_or_else(|| AppError::DocumentNotFound(body.id.to_string()))?;

    let query = state.queries.require(run.query).await?;
    crate::policy::require_owns_query(&caller.id, &query)?;

    Ok(Json(envelope(run)))
}
