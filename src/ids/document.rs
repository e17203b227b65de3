//! Base fields shared by every primary record and data document (§3)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// `_id`, `_created`, `_updated` carried by every primary record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordMeta {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(rename = "_created")]
    pub created: DateTime<Utc>,
    #[serde(rename = "_updated")]
    pub updated: DateTime<Utc>,
}

impl RecordMeta {
    pub fn new(id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id,
            created: now,
            updated: now,
        }
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated = now;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionType {
    Owned,
    Standard,
}
