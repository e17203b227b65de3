//! Shared application state handed to every axum handler

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::capability::CapabilityEngine;
use crate::config::NodeConfig;
use crate::data::DataPlane;
use crate::entities::{BuilderRepo, CollectionRepo, QueryRepo, QueryRunRepo, UserRepo};
use crate::lifecycle::{BuilderCache, CascadeController};
use crate::query::{QueryExecutor, QueryJobRunner, QueryRegistrar};
use crate::store::DocumentStore;
use crate::system::{MaintenanceController, NodeInfoProvider};

#[derive(Clone)]
pub struct AppState(pub Arc<Inner>);

pub struct Inner {
    pub store: Arc<dyn DocumentStore>,
    pub capability: Arc<CapabilityEngine>,
    pub data: Arc<DataPlane>,
    pub cache: Arc<BuilderCache>,
    pub cascade: Arc<CascadeController>,
    pub registrar: Arc<QueryRegistrar>,
    pub executor: Arc<QueryExecutor>,
    pub jobs: Arc<QueryJobRunner>,
    pub maintenance: Arc<MaintenanceController>,
    pub node_info: Arc<NodeInfoProvider>,
    pub builders: Arc<BuilderRepo>,
    pub collections: Arc<CollectionRepo>,
    pub queries: Arc<QueryRepo>,
    pub query_runs: Arc<QueryRunRepo>,
    pub users: Arc<UserRepo>,
}

impl AppState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn DocumentStore>,
        config: &NodeConfig,
        capability: Arc<CapabilityEngine>,
        started: DateTime<Utc>,
    ) -> Self {
        let builders = Arc::new(BuilderRepo::new(store.clone()));
        let collections = Arc::new(CollectionRepo::new(store.clone()));
        let queries = Arc::new(QueryRepo::new(store.clone()));
        let query_runs = Arc::new(QueryRunRepo::new(store.clone()));
        let users = Arc::new(UserRepo::new(store.clone()));
        let config_repo = Arc::new(crate::entities::ConfigRepo::new(store.clone()));

        let data = Arc::new(DataPlane::new(store.clone(), users.clone()));
        let cache = Arc::new(BuilderCache::new());
        let cascade = Arc::new(CascadeController::new(
            builders.clone(),
            collections.clone(),
            queries.clone(),
            store.clone(),
            data.clone(),
            cache.clone(),
        ));
        let registrar = Arc::new(QueryRegistrar::new(
            queries.clone(),
            collections.clone(),
            builders.clone(),
            cache.clone(),
        ));
        let executor = Arc::new(QueryExecutor::new(store.clone(), collections.clone()));
        let jobs = Arc::new(QueryJobRunner::new(query_runs.clone(), executor.clone()));
        let maintenance = Arc::new(MaintenanceController::new(config_repo));
        let node_info = Arc::new(NodeInfoProvider::new(config, maintenance.clone(), started));

        Self(Arc::new(Inner {
            store,
            capability,
            data,
            cache,
            cascade,
            registrar,
            executor,
            jobs,
            maintenance,
            node_info,
            builders,
            collections,
            queries,
            query_runs,
            users,
        }))
    }
}

impl std::ops::Deref for AppState {
    type Target = Inner;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
