//! Query records (§3, §4.5)

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::ids::{Did, RecordMeta};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableSpec {
    /// `$.pipeline.<stage-index>.<field>...`
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub optional: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub owner: Did,
    pub name: String,
    pub collection: Uuid,
    pub variables: HashMap<String, VariableSpec>,
    pub pipeline: Vec<Value>,
}

impl Query {
    pub fn new(
        owner: Did,
        name: String,
        collection: Uuid,
        variables: HashMap<String, VariableSpec>,
        pipeline: Vec<Value>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            meta: RecordMeta::new(Uuid::new_v4(), now),
            owner,
            name,
            collection,
            variables,
            pipeline,
        }
    }
}
