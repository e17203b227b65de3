//! Collection records (§3, §4.4)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::ids::{CollectionType, Did, RecordMeta};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collection {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub owner: Did,
    #[serde(rename = "type")]
    pub kind: CollectionType,
    pub schema: Value,
    pub name: String,
}

impl Collection {
    pub fn new(owner: Did, kind: CollectionType, schema: Value, name: String, now: DateTime<Utc>) -> Self {
        Self {
            meta: RecordMeta::new(Uuid::new_v4(), now),
            owner,
            kind,
            schema,
            name,
        }
    }

    /// Compile the stored schema, surfacing a malformed document as a
    /// validation error rather than panicking (§3: "schema compiles").
    pub fn compiled_schema(&self) -> AppResult<jsonschema::JSONSchema<'_>> {
        jsonschema::JSONSchema::compile(&self.schema)
            .map_err(|e| AppError::DataValidation(format!("collection schema does not compile: {e}")))
    }
}
