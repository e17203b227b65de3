//! Bearer-header extraction and the `{data: ...}` response envelope (§6.1)

use axum::http::HeaderMap;
use serde::Serialize;

use crate::error::{AppError, AppResult};

pub fn bearer_header(headers: &HeaderMap) -> AppResult<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("missing authorization header".to_string()))
}

#[derive(Debug, Serialize)]
pub struct DataEnvelope<T: Serialize> {
    pub data: T,
}

pub fn envelope<T: Serialize>(data: T) -> DataEnvelope<T> {
    DataEnvelope { data }
}
