//! Builder cache with taint-on-mutation invalidation (§4.6, §5, §9)
//!
//! A concurrent `DID -> Builder` map. Every mutation that changes a
//! Builder calls `taint`, which simply removes the entry; the next read
//! refills it from the store. No weak references are needed — Builder
//! records are small and read-mostly (§9).

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::entities::{Builder, BuilderRepo};
use crate::error::AppResult;
use crate::ids::Did;

#[derive(Default)]
pub struct BuilderCache {
    entries: RwLock<HashMap<Did, Builder>>,
}

impl BuilderCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// §5: a stale read only produces false-denies against ownership
    /// checks, never false-grants, because collections/queries are also
    /// checked against the store.
    pub async fn get_or_load(&self, repo: &BuilderRepo, did: &Did) -> AppResult<Option<Builder>> {
        if let Some(hit) = self.entries.read().await.get(did).cloned() {
            return Ok(Some(hit));
        }
        let loaded = repo.find(did).await?;
        if let Some(builder) = &loaded {
            self.entries.write().await.insert(did.clone(), builder.clone());
        }
        Ok(loaded)
    }

    pub async fn insert(&self, builder: Builder) {
        self.entries.write().await.insert(builder.id.clone(), builder);
    }

    pub async fn taint(&self, did: &Did) {
        self.entries.write().await.remove(did);
    }
}
