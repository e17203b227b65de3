//! User records (§3, §4.4)
//!
//! Keyed by DID like [`super::builder::Builder`]; carries the set of
//! `(builder, collection, document)` references into owned data stores and
//! an append-only operation log.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ids::Did;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LogOp {
    CreateData,
    UpdateData,
    DeleteData,
    GrantAccess,
    RevokeAccess,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub op: LogOp,
    pub collection: Uuid,
    pub document: Uuid,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DataRef {
    pub builder: Did,
    pub collection: Uuid,
    pub document: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Did,
    #[serde(rename = "_created")]
    pub created: DateTime<Utc>,
    #[serde(rename = "_updated")]
    pub updated: DateTime<Utc>,
    pub data: HashSet<DataRef>,
    pub logs: Vec<LogEntry>,
}

impl User {
    pub fn new(id: Did, now: DateTime<Utc>) -> Self {
        Self {
            id,
            created: now,
            updated: now,
            data: HashSet::new(),
            logs: Vec::new(),
        }
    }

    /// §3: "deletion of all owned data MAY remove the record"; §9 Open
    /// Question 2 resolves this to: removed.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn record(&mut self, op: LogOp, collection: Uuid, document: Uuid, now: DateTime<Utc>) {
        self.logs.push(LogEntry {
            op,
            collection,
            document,
            at: now,
        });
        self.updated = now;
    }
}
