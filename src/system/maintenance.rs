//! Maintenance singleton (§4.7)

use chrono::Utc;

use crate::entities::{ConfigRepo, MaintenanceConfig};
use crate::error::AppResult;

/// `start` upserts `{active:true, startedAt:now}`; `stop` deletes the
/// document. Absence of the document is equivalent to inactive (§3).
pub struct MaintenanceController {
    config: std::sync::Arc<ConfigRepo>,
}

impl MaintenanceController {
    pub fn new(config: std::sync::Arc<ConfigRepo>) -> Self {
        Self { config }
    }

    pub async fn start(&self) -> AppResult<()> {
        let cfg = MaintenanceConfig::started(Utc::now());
        self.config.set_maintenance(&cfg).await
    }

    pub async fn stop(&self) -> AppResult<()> {
        self.config.clear_maintenance().await
    }

    pub async fn is_active(&self) -> AppResult<bool> {
        Ok(self.config.maintenance().await?.map(|c| c.active).unwrap_or(false))
    }

    pub async fn snapshot(&self) -> AppResult<Option<MaintenanceConfig>> {
        self.config.maintenance().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    #[tokio::test]
    async fn start_then_stop_round_trips_to_inactive() {
        let store: Arc<dyn crate::store::DocumentStore> = Arc::new(MemoryStore::new());
        let controller = MaintenanceController::new(Arc::new(ConfigRepo::new(store)));

        assert!(!controller.is_active().await.unwrap());
        controller.start().await.unwrap();
        assert!(controller.is_active().await.unwrap());
        controller.stop().await.unwrap();
        assert!(!controller.is_active().await.unwrap());
    }
}
