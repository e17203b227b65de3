//! Builder records (§3, §4.5, §4.6)
//!
//! A Builder is keyed by its own DID rather than a UUID, so it does not use
//! the UUID-keyed [`crate::ids::RecordMeta`]; `_created`/`_updated` are
//! carried directly.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ids::Did;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Builder {
    #[serde(rename = "_id")]
    pub id: Did,
    #[serde(rename = "_created")]
    pub created: DateTime<Utc>,
    #[serde(rename = "_updated")]
    pub updated: DateTime<Utc>,
    pub name: String,
    pub collections: HashSet<Uuid>,
    pub queries: HashSet<Uuid>,
}

impl Builder {
    pub fn new(did: Did, name: String, now: DateTime<Utc>) -> Self {
        Self {
            id: did,
            created: now,
            updated: now,
            name,
            collections: HashSet::new(),
            queries: HashSet::new(),
        }
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated = now;
    }
}
