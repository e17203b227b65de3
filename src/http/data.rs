//! Data-plane routes (§4.4, §6.1)

use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::ids::{AclEntry, Did};

use super::extract::{bearer_header, envelope, DataEnvelope};
use super::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/data/create-owned", post(create_owned))
        .route("/v1/data/create-standard", post(create_standard))
        .route("/v1/data/update", post(update))
        .route("/v1/data/delete", post(delete))
        .route("/v1/data/read", post(read))
        .route("/v1/data/tail", post(tail))
        .route("/v1/data/flush", post(flush))
        .route("/v1/data/grant", post(grant))
        .route("/v1/data/revoke", post(revoke))
}

#[derive(Debug, Deserialize)]
struct CreateOwnedRequest {
    collection: Uuid,
    owner: String,
    data: Vec<Value>,
    /// §4.4/§6.1/S3: a single ACL entry applied to every document created
    /// by this request, not a list — the wire body sends one object.
    #[serde(default)]
    acl: Option<AclEntry>,
}

async fn create_owned(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateOwnedRequest>,
) -> AppResult<Json<DataEnvelope<crate::data::UploadReport>>> {
    let header = bearer_header(&headers)?;
    let (_, _) = state.capability.require_builder(header, "nil.db.data.write").await?;

    let collection = state.collections.require(body.collection).await?;
    let owner = Did::parse(&body.owner).map_err(|e| AppError::DataValidation(e.to_string()))?;
    let acl = body.acl.into_iter().collect();
    let report = state.data.upload_owned(&collection, &owner, acl, body.data).await?;
    Ok(Json(envelope(report)))
}

#[derive(Debug, Deserialize)]
struct CreateStandardRequest {
    collection: Uuid,
    data: Vec<Value>,
}

async fn create_standard(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateStandardRequest>,
) -> AppResult<Json<DataEnvelope<crate::data::UploadReport>>> {
    let header = bearer_header(&headers)?;
    let (subject, _) = state.capability.require_builder(header, "nil.db.data.write").await?;
    let crate::capability::Subject::Builder(caller) = subject else {
        unreachable!("require_builder always yields Subject::Builder");
    };

    let collection = state.collections.require(body.collection).await?;
    crate::policy::require_owns_collection(&caller.id, &collection)?;
    let report = state.data.upload_standard(&collection, body.data).await?;
    Ok(Json(envelope(report)))
}

#[derive(Debug, Deserialize)]
struct UpdateRequest {
    collection: Uuid,
    filter: Value,
    update: Value,
}

async fn update(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<UpdateRequest>,
) -> AppResult<Json<DataEnvelope<u64>>> {
    let header = bearer_header(&headers)?;
    let (_, _) = state.capability.require_builder(header, "nil.db.data.write").await?;
    let collection = state.collections.require(body.collection).await?;
    let count = state.data.update(&collection, body.filter, body.update).await?;
    Ok(Json(envelope(count)))
}

#[derive(Debug, Deserialize)]
struct DeleteRequest {
    collection: Uuid,
    filter: Value,
}

async fn delete(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<DeleteRequest>,
) -> AppResult<Json<DataEnvelope<u64>>> {
    if body.filter.as_object().map_or(true, |o| o.is_empty()) {
        return Err(AppError::DataValidation("delete requires a non-empty filter".to_string()));
    }
    let header = bearer_header(&headers)?;
    let (_, _) = state.capability.require_builder(header, "nil.db.data.write").await?;
    let collection = state.collections.require(body.collection).await?;
    let count = state.data.delete(&collection, body.filter).await?;
    Ok(Json(envelope(count)))
}

#[derive(Debug, Deserialize)]
struct ReadRequest {
    collection: Uuid,
    #[serde(default)]
    filter: Value,
}

async fn read(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ReadRequest>,
) -> AppResult<Json<DataEnvelope<Vec<Value>>>> {
    let header = bearer_header(&headers)?;
    let (_, _) = state.capability.require_builder(header, "nil.db.data.read").await?;
    let collection = state.collections.require(body.collection).await?;
    let docs = state.data.find(&collection, &body.filter).await?;
    Ok(Json(envelope(docs)))
}

#[derive(Debug, Deserialize)]
struct TailRequest {
    collection: Uuid,
    #[serde(default = "default_tail_limit")]
    limit: usize,
}

fn default_tail_limit() -> usize {
    25
}

async fn tail(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<TailRequest>,
) -> AppResult<Json<DataEnvelope<Vec<Value>>>> {
    let header = bearer_header(&headers)?;
    let (_, _) = state.capability.require_builder(header, "nil.db.data.read").await?;
    let collection = state.collections.require(body.collection).await?;
    let docs = state.data.tail(&collection, body.limit).await?;
    Ok(Json(envelope(docs)))
}

#[derive(Debug, Deserialize)]
struct FlushRequest {
    collection: Uuid,
}

async fn flush(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<FlushRequest>,
) -> AppResult<Json<DataEnvelope<u64>>> {
    let header = bearer_header(&headers)?;
    let (subject, _) = state.capability.require_builder(header, "nil.db.data.write").await?;
    let crate::capability::Subject::Builder(caller) = subject else {
        unreachable!("require_builder always yields Subject::Builder");
    };
    let collection = state.collections.require(body.collection).await?;
    crate::policy::require_owns_collection(&caller.id, &collection)?;
    let count = state.data.flush(&collection).await?;
    Ok(Json(envelope(count)))
}

#[derive(Debug, Deserialize)]
struct AclMutationRequest {
    collection: Uuid,
    document: Uuid,
    grantee: String,
    #[serde(default)]
    read: bool,
    #[serde(default)]
    write: bool,
    #[serde(default)]
    execute: bool,
}

/// §4.3: "only the owner may add/remove ACL entries" for owned
/// documents. The route selection in §6.1 names this only implicitly
/// (ACL mutation rules exist but no endpoint is spelled out); added here.
async fn grant(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<AclMutationRequest>,
) -> AppResult<Json<DataEnvelope<Value>>> {
    let header = bearer_header(&headers)?;
    let (subject, _) = state.capability.require_user(header, "nil.db.data.write").await?;
    let crate::capability::Subject::User(caller) = subject else {
        unreachable!("require_user always yields Subject::User");
    };

    let collection = state.collections.require(body.collection).await?;
    let filter = serde_json::json!({"_id": body.document.to_string()});
    let doc = state
        .data
        .find_one(&collection, &filter)
        .await?
        .ok_or_else(|| AppError::DocumentNotFound(body.document.to_string()))?;
    crate::policy::require_owns_document(&caller.id, &doc)?;

    let grantee = Did::parse(&body.grantee).map_err(|e| AppError::DataValidation(e.to_string()))?;
    let mut acl: Vec<AclEntry> = doc
        .get("_acl")
        .cloned()
        .map(serde_json::from_value)
        .transpose()
        .map_err(AppError::from)?
        .unwrap_or_default();
    crate::ids::acl::upsert(
        &mut acl,
        AclEntry {
            grantee,
            read: body.read,
            write: body.write,
            execute: body.execute,
        },
    );

    let update = serde_json::json!({"$set": {"_acl": acl}});
    state.data.update(&collection, filter, update).await?;
    Ok(Json(envelope(serde_json::json!({"updated": true}))))
}

async fn revoke(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<AclMutationRequest>,
) -> AppResult<Json<DataEnvelope<Value>>> {
    let header = bearer_header(&headers)?;
    let (subject, _) = state.capability.require_user(header, "nil.db.data.write").await?;
    let crate::capability::Subject::User(caller) = subject else {
        unreachable!("require_user always yields Subject::User");
    };

    let collection = state.collections.require(body.collection).await?;
    let filter = serde_json::json!({"_id": body.document.to_string()});
    let doc = state
        .data
        .find_one(&collection, &filter)
        .await?
        .ok_or_else(|| AppError::DocumentNotFound(body.document.to_string()))?;
    crate::policy::require_owns_document(&caller.id, &doc)?;

    let grantee = Did::parse(&body.grantee).map_err(|e| AppError::DataValidation(e.to_string()))?;
    let mut acl: Vec<AclEntry> = doc
        .get("_acl")
        .cloned()
        .map(serde_json::from_value)
        .transpose()
        .map_err(AppError::from)?
        .unwrap_or_default();
    crate::ids::acl::revoke(&mut acl, &grantee);

    let update = serde_json::json!({"$set": {"_acl": acl}});
    state.data.update(&collection, filter, update).await?;
    Ok(Json(envelope(serde_json::json!({"updated": true}))))
}
