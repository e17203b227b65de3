//! In-memory [`DocumentStore`] implementation.
//!
//! The only concrete store shipped with the crate — sufficient for tests
//! and for running the node in a non-persistent mode. A production
//! deployment supplies its own impl wrapping the real external document
//! store (§1).

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

use super::aggregate;
use super::filter;
use super::traits::{
    DocumentStore, FindOptions, InsertFailure, InsertFailureReason, InsertManyReport, Namespace,
    SortDirection, INSERT_BATCH_SIZE,
};

#[derive(Default)]
struct Collection {
    documents: Vec<Value>,
    indexes: Vec<(String, bool)>,
}

#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn doc_id(doc: &Value) -> Option<Uuid> {
        doc.get("_id")
            .and_then(|v| v.as_str())
            .and_then(|s| Uuid::parse_str(s).ok())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn ensure_exists(&self, ns: &Namespace) -> AppResult<()> {
        let mut collections = self.collections.write().await;
        collections.entry(ns.name()).or_default();
        Ok(())
    }

    async fn insert_one(&self, ns: &Namespace, document: Value) -> AppResult<Uuid> {
        let id = Self::doc_id(&document).unwrap_or_else(Uuid::new_v4);
        let mut collections = self.collections.write().await;
        let coll = collections.entry(ns.name()).or_default();

        if coll.documents.iter().any(|d| Self::doc_id(d) == Some(id)) {
            return Err(AppError::DuplicateEntry(id.to_string()));
        }
        coll.documents.push(document);
        Ok(id)
    }

    async fn insert_many(&self, ns: &Namespace, documents: Vec<Value>) -> AppResult<InsertManyReport> {
        let mut report = InsertManyReport::default();
        let mut collections = self.collections.write().await;
        let coll = collections.entry(ns.name()).or_default();

        for batch in documents.chunks(INSERT_BATCH_SIZE) {
            for (offset, document) in batch.iter().enumerate() {
                let index = report.inserted.len() + report.failures.len();
                let _ = offset;
                let id = match Self::doc_id(document) {
                    Some(id) => id,
                    None => {
                        report.failures.push(InsertFailure {
                            index,
                            reason: InsertFailureReason::Other("missing _id".to_string()),
                            document: document.clone(),
                        });
                        continue;
                    }
                };

                let duplicate = coll.documents.iter().any(|d| Self::doc_id(d) == Some(id))
                    || report.inserted.contains(&id);

                if duplicate {
                    report.failures.push(InsertFailure {
                        index,
                        reason: InsertFailureReason::DuplicateKey,
                        document: document.clone(),
                    });
                    continue;
                }

                coll.documents.push(document.clone());
                report.inserted.insert(id);
            }
        }
        Ok(report)
    }

    async fn find_one(&self, ns: &Namespace, filter_doc: &Value) -> AppResult<Option<Value>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&ns.name())
            .and_then(|c| c.documents.iter().find(|d| filter::matches(d, filter_doc)))
            .cloned())
    }

    async fn find_many(
        &self,
        ns: &Namespace,
        filter_doc: &Value,
        opts: FindOptions,
    ) -> AppResult<Vec<Value>> {
        let collections = self.collections.read().await;
        let mut results: Vec<Value> = collections
            .get(&ns.name())
            .map(|c| {
                c.documents
                    .iter()
                    .filter(|d| filter::matches(d, filter_doc))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some((field, dir)) = &opts.sort {
            results.sort_by(|a, b| {
                let ord = a
                    .get(field)
                    .and_then(|v| v.as_str().map(str::to_string).or_else(|| v.as_i64().map(|n| n.to_string())))
                    .cmp(&b.get(field).and_then(|v| v.as_str().map(str::to_string).or_else(|| v.as_i64().map(|n| n.to_string()))));
                match dir {
                    SortDirection::Ascending => ord,
                    SortDirection::Descending => ord.reverse(),
                }
            });
        }

        let results = results.into_iter().skip(opts.skip);
        Ok(match opts.limit {
            Some(limit) => results.take(limit).collect(),
            None => results.collect(),
        })
    }

    async fn update_one(&self, ns: &Namespace, filter_doc: &Value, update: &Value) -> AppResult<u64> {
        let mut collections = self.collections.write().await;
        let Some(coll) = collections.get_mut(&ns.name()) else {
            return Ok(0);
        };
        for doc in coll.documents.iter_mut() {
            if filter::matches(doc, filter_doc) {
                filter::apply_update(doc, update);
                return Ok(1);
            }
        }
        Ok(0)
    }

    async fn update_many(&self, ns: &Namespace, filter_doc: &Value, update: &Value) -> AppResult<u64> {
        let mut collections = self.collections.write().await;
        let Some(coll) = collections.get_mut(&ns.name()) else {
            return Ok(0);
        };
        let mut count = 0;
        for doc in coll.documents.iter_mut() {
            if filter::matches(doc, filter_doc) {
                filter::apply_update(doc, update);
                count += 1;
            }
        }
        Ok(count)
    }

    async fn delete_one(&self, ns: &Namespace, filter_doc: &Value) -> AppResult<u64> {
        let mut collections = self.collections.write().await;
        let Some(coll) = collections.get_mut(&ns.name()) else {
            return Ok(0);
        };
        if let Some(pos) = coll.documents.iter().position(|d| filter::matches(d, filter_doc)) {
            coll.documents.remove(pos);
            Ok(1)
        } else {
            Ok(0)
        }
    }

    async fn delete_many(&self, ns: &Namespace, filter_doc: &Value) -> AppResult<u64> {
        let mut collections = self.collections.write().await;
        let Some(coll) = collections.get_mut(&ns.name()) else {
            return Ok(0);
        };
        let before = coll.documents.len();
        coll.documents.retain(|d| !filter::matches(d, filter_doc));
        Ok((before - coll.documents.len()) as u64)
    }

    async fn aggregate(&self, ns: &Namespace, pipeline: &[Value]) -> AppResult<Vec<Value>> {
        let collections = self.collections.read().await;
        let docs = collections
            .get(&ns.name())
            .map(|c| c.documents.clone())
            .unwrap_or_default();
        Ok(aggregate::run(docs, pipeline))
    }

    async fn drop_collection(&self, ns: &Namespace) -> AppResult<()> {
        let mut collections = self.collections.write().await;
        collections.remove(&ns.name());
        Ok(())
    }

    async fn create_index(&self, ns: &Namespace, field: &str, unique: bool) -> AppResult<()> {
        if field.is_empty() {
            return Err(AppError::InvalidIndexOptions(
                "index field must not be empty".to_string(),
            ));
        }
        let mut collections = self.collections.write().await;
        let coll = collections.entry(ns.name()).or_default();
        if !coll.indexes.iter().any(|(f, _)| f == field) {
            coll.indexes.push((field.to_string(), unique));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::traits::PrimaryCollection;
    use serde_json::json;

    fn ns() -> Namespace {
        Namespace::Primary(PrimaryCollection::Builders)
    }

    #[tokio::test]
    async fn insert_and_find_round_trip() {
        let store = MemoryStore::new();
        let id = Uuid::new_v4();
        store
            .insert_one(&ns(), json!({"_id": id.to_string(), "name": "acme"}))
            .await
            .unwrap();

        let found = store
            .find_one(&ns(), &json!({"_id": id.to_string()}))
            .await
            .unwrap();
        assert_eq!(found.unwrap()["name"], "acme");
    }

    #[tokio::test]
    async fn insert_one_rejects_duplicate_id() {
        let store = MemoryStore::new();
        let id = Uuid::new_v4();
        store
            .insert_one(&ns(), json!({"_id": id.to_string()}))
            .await
            .unwrap();

        let err = store
            .insert_one(&ns(), json!({"_id": id.to_string()}))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "DuplicateEntry");
    }

    #[tokio::test]
    async fn insert_many_is_unordered_and_reports_partial_failure() {
        let store = MemoryStore::new();
        let dup_id = Uuid::new_v4();
        let docs = vec![
            json!({"_id": dup_id.to_string()}),
            json!({"_id": dup_id.to_string()}),
            json!({"_id": Uuid::new_v4().to_string()}),
        ];

        let report = store.insert_many(&ns(), docs).await.unwrap();
        assert_eq!(report.inserted.len(), 2);
        assert_eq!(report.failures.len(), 1);
        assert!(matches!(
            report.failures[0].reason,
            InsertFailureReason::DuplicateKey
        ));
    }

    #[tokio::test]
    async fn delete_many_removes_matches_only() {
        let store = MemoryStore::new();
        store
            .insert_one(&ns(), json!({"_id": Uuid::new_v4().to_string(), "kind": "a"}))
            .await
            .unwrap();
        store
            .insert_one(&ns(), json!({"_id": Uuid::new_v4().to_string(), "kind": "b"}))
            .await
            .unwrap();

        let deleted = store.delete_many(&ns(), &json!({"kind": "a"})).await.unwrap();
        assert_eq!(deleted, 1);

        let remaining = store
            .find_many(&ns(), &json!({}), FindOptions::default())
            .await
            .unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0]["kind"], "b");
    }
}
