//! Data plane (component C7): upload, update, delete, flush, read,
//! tail, plus the user-reference bookkeeping those operations trigger.

pub mod bookkeeping;
pub mod mutate;
pub mod read;
pub mod upload;

use std::sync::Arc;

use crate::entities::UserRepo;
use crate::store::DocumentStore;

#[derive(Debug, Clone, serde::Serialize)]
pub struct UploadReport {
    pub created: Vec<uuid::Uuid>,
    pub errors: Vec<UploadError>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct UploadError {
    pub reason: String,
    pub doc: serde_json::Value,
}

pub struct DataPlane {
    pub(crate) store: Arc<dyn DocumentStore>,
    pub(crate) users: Arc<UserRepo>,
}

impl DataPlane {
    pub fn new(store: Arc<dyn DocumentStore>, users: Arc<UserRepo>) -> Self {
        Self { store, users }
    }
}
