//! QueryRun records — materialised execution of a Query (§3, §4.5)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::ids::RecordMeta;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Pending,
    Running,
    Complete,
    Error,
}

impl RunStatus {
    /// §8 invariant 4: once complete/error, status never changes again.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Error)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRun {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub query: Uuid,
    pub status: RunStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

impl QueryRun {
    pub fn new_pending(query: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            meta: RecordMeta::new(Uuid::new_v4(), now),
            query,
            status: RunStatus::Pending,
            started: None,
            completed: None,
            result: None,
            errors: None,
        }
    }

    pub fn start(&mut self, now: DateTime<Utc>) {
        self.status = RunStatus::Running;
        self.started = Some(now);
        self.meta.touch(now);
    }

    pub fn complete(&mut self, result: Value, now: DateTime<Utc>) {
        self.status = RunStatus::Complete;
        self.completed = Some(now);
        self.result = Some(result);
        self.meta.touch(now);
    }

    pub fn fail(&mut self, errors: Vec<String>, now: DateTime<Utc>) {
        self.status = RunStatus::Error;
        self.completed = Some(now);
        self.errors = Some(errors);
        self.meta.touch(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_transitions_are_terminal() {
        let mut run = QueryRun::new_pending(Uuid::new_v4(), Utc::now());
        assert!(!run.status.is_terminal());
        run.start(Utc::now());
        assert!(!run.status.is_terminal());
        run.complete(serde_json::json!([]), Utc::now());
        assert!(run.status.is_terminal());
    }
}
