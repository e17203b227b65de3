//! `find` / `findOne` / `tail` (§4.4)

use serde_json::Value;

use crate::entities::Collection;
use crate::error::AppResult;
use crate::store::{FindOptions, Namespace, SortDirection};

use super::DataPlane;

impl DataPlane {
    pub async fn find(&self, collection: &Collection, filter: &Value) -> AppResult<Vec<Value>> {
        let ns = Namespace::Data(collection.meta.id);
        self.store.find_many(&ns, filter, FindOptions::default()).await
    }

    pub async fn find_one(&self, collection: &Collection, filter: &Value) -> AppResult<Option<Value>> {
        let ns = Namespace::Data(collection.meta.id);
        self.store.find_one(&ns, filter).await
    }

    /// Most recent documents first by `_created` (§4.4).
    pub async fn tail(&self, collection: &Collection, limit: usize) -> AppResult<Vec<Value>> {
        let ns = Namespace::Data(collection.meta.id);
        let opts = FindOptions {
            limit: Some(limit),
            skip: 0,
            sort: Some(("_created".to_string(), SortDirection::Descending)),
        };
        self.store.find_many(&ns, &serde_json::json!({}), opts).await
    }
}
