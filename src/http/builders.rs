//! Builder registration and profile routes (§6.1, §4.5 registration for
//! collections — no collection-registration endpoint is named explicitly
//! despite Builders owning Collections per §1/§3; added here).

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entities::{Builder, Collection};
use crate::error::{AppError, AppResult};
use crate::ids::{CollectionType, Did};

use super::extract::{bearer_header, envelope, DataEnvelope};
use super::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/builders/register", post(register))
        .route("/v1/builders/me", get(me).post(update_me).delete(delete_me))
        .route("/v1/builders/me/collections", get(list_collections).post(register_collection))
}

#[derive(Debug, Deserialize)]
struct RegisterRequest {
    did: String,
    name: String,
}

async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<DataEnvelope<Builder>>)> {
    let header = bearer_header(&headers)?;
    let invocation = state.capability.authenticate(header, "nil.db.builders.register").await?;

    let did = Did::parse(&body.did).map_err(|e| AppError::DataValidation(e.to_string()))?;
    if did != invocation.subject {
        return Err(AppError::Unauthorized(
            "registered DID must match the invocation subject".to_string(),
        ));
    }
    if &did == state.capability.node_did() {
        return Err(AppError::DuplicateEntry("cannot register the node's own DID".to_string()));
    }
    if state.builders.find(&did).await?.is_some() {
        return Err(AppError::DuplicateEntry(format!("builder already registered: {did}")));
    }

    let builder = Builder::new(did, body.name, Utc::now());
    state.builders.insert(&builder).await?;
    Ok((StatusCode::CREATED, Json(envelope(builder))))
}

async fn me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Json<DataEnvelope<Builder>>> {
    let header = bearer_header(&headers)?;
    let (subject, _) = state.capability.require_builder(header, "nil.db.builders.read").await?;
    let crate::capability::Subject::Builder(builder) = subject else {
        unreachable!("require_builder always yields Subject::Builder");
    };
    Ok(Json(envelope(builder)))
}

#[derive(Debug, Deserialize)]
struct UpdateMeRequest {
    name: String,
}

async fn update_me(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<UpdateMeRequest>,
) -> AppResult<Json<DataEnvelope<Builder>>> {
    let header = bearer_header(&headers)?;
    let (subject, _) = state.capability.require_builder(header, "nil.db.builders.write").await?;
    let crate::capability::Subject::Builder(mut builder) = subject else {
        unreachable!("require_builder always yields Subject::Builder");
    };
    builder.name = body.name;
    builder.touch(Utc::now());
    state.builders.replace(&builder).await?;
    state.cache.taint(&builder.id).await;
    Ok(Json(envelope(builder)))
}

async fn delete_me(State(state): State<AppState>, headers: HeaderMap) -> AppResult<StatusCode> {
    let header = bearer_header(&headers)?;
    let (subject, _) = state.capability.require_builder(header, "nil.db.builders.write").await?;
    let crate::capability::Subject::Builder(builder) = subject else {
        unreachable!("require_builder always yields Subject::Builder");
    };
    state.cascade.remove_builder(&builder.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct RegisterCollectionRequest {
    name: String,
    #[serde(rename = "type")]
    kind: CollectionType,
    schema: Value,
}

#[derive(Debug, Serialize)]
struct CollectionsListResponse {
    collections: Vec<Collection>,
}

async fn register_collection(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<RegisterCollectionRequest>,
) -> AppResult<(StatusCode, Json<DataEnvelope<Collection>>)> {
    let header = bearer_header(&headers)?;
    let (subject, _) = state.capability.require_builder(header, "nil.db.collections.write").await?;
    let crate::capability::Subject::Builder(mut builder) = subject else {
        unreachable!("require_builder always yields Subject::Builder");
    };

    let now = Utc::now();
    let collection = Collection::new(builder.id.clone(), body.kind, body.schema, body.name, now);
    collection.compiled_schema()?;

    state.collections.insert(&collection).await?;
    state.store.ensure_exists(&crate::store::Namespace::Data(collection.meta.id)).await?;

    builder.collections.insert(collection.meta.id);
    builder.touch(now);
    state.builders.replace(&builder).await?;
    state.cache.taint(&builder.id).await;

    Ok((StatusCode::CREATED, Json(envelope(collection))))
}

async fn list_collections(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Json<DataEnvelope<CollectionsListResponse>>> {
    let header = bearer_header(&headers)?;
    let (subject, _) = state.capability.require_builder(header, "nil.db.collections.read").await?;
    let crate::capability::Subject::Builder(builder) = subject else {
        unreachable!("require_builder always yields Subject::Builder");
    };

    let mut collections = Vec::with_capacity(builder.collections.len());
    for id in &builder.collections {
        if let Some(c) = state.collections.find(*id).await? {
            collections.push(c);
        }
    }
    Ok(Json(envelope(CollectionsListResponse { collections })))
}
