//! Node-info snapshot (§4.7, §6.1 `GET /v1/system/about`)

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::config::NodeConfig;
use crate::error::AppResult;

use super::maintenance::MaintenanceController;

#[derive(Debug, Clone, Serialize)]
pub struct NodeInfo {
    pub started: DateTime<Utc>,
    pub build: String,
    #[serde(rename = "publicKey")]
    pub public_key: String,
    pub url: String,
    pub maintenance: bool,
}

/// `started` is captured once, at service construction, not per request.
pub struct NodeInfoProvider {
    started: DateTime<Utc>,
    public_key: String,
    url: String,
    maintenance: Arc<MaintenanceController>,
}

impl NodeInfoProvider {
    pub fn new(config: &NodeConfig, maintenance: Arc<MaintenanceController>, started: DateTime<Utc>) -> Self {
        Self {
            started,
            public_key: config.trust_anchor_public_key.clone(),
            url: config.node_public_endpoint.clone(),
            maintenance,
        }
    }

    pub async fn snapshot(&self) -> AppResult<NodeInfo> {
        Ok(NodeInfo {
            started: self.started,
            build: env!("CARGO_PKG_VERSION").to_string(),
            public_key: self.public_key.clone(),
            url: self.url.clone(),
            maintenance: self.maintenance.is_active().await?,
        })
    }
}
