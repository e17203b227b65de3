//! Maintenance singleton (§3, §4.7)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Literal tag the singleton document is keyed by in the `config` store.
pub const MAINTENANCE_TAG: &str = "maintenance";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceConfig {
    #[serde(rename = "_type")]
    pub tag: String,
    pub active: bool,
    #[serde(rename = "startedAt", default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
}

impl MaintenanceConfig {
    pub fn started(now: DateTime<Utc>) -> Self {
        Self {
            tag: MAINTENANCE_TAG.to_string(),
            active: true,
            started_at: Some(now),
        }
    }
}
