//! Synchronous query execution (§4.5 "Execution")

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

use crate::entities::{CollectionRepo, Query};
use crate::error::AppResult;
use crate::store::{DocumentStore, Namespace};

use super::{injection, variables};

pub struct QueryExecutor {
    store: Arc<dyn DocumentStore>,
    collections: Arc<CollectionRepo>,
}

impl QueryExecutor {
    pub fn new(store: Arc<dyn DocumentStore>, collections: Arc<CollectionRepo>) -> Self {
        Self { store, collections }
    }

    /// Validate variables, inject them into the stored pipeline and run it
    /// against the query's collection. No ownership check here — callers
    /// authorize before invoking execution (§4.3, §4.5).
    pub async fn run(&self, query: &Query, provided: HashMap<String, Value>) -> AppResult<Vec<Value>> {
        self.collections.require(query.collection).await?;

        let provided = variables::validate(&query.variables, provided)?;
        let pipeline = injection::inject(&query.pipeline, &query.variables, &provided)?;

        self.store
            .aggregate(&Namespace::Data(query.collection), &pipeline)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Collection;
    use crate::entities::VariableSpec;
    use crate::ids::{CollectionType, Did};
    use crate::store::MemoryStore;
    use chrono::Utc;
    use serde_json::json;

    #[tokio::test]
    async fn executes_pipeline_with_injected_variable() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let collections = Arc::new(CollectionRepo::new(store.clone()));
        let owner = Did::parse("did:nil:aa").unwrap();
        let collection = Collection::new(
            owner.clone(),
            CollectionType::Standard,
            json!({"type": "object"}),
            "c".to_string(),
            Utc::now(),
        );
        collections.insert(&collection).await.unwrap();

        store
            .insert_many(
                &Namespace::Data(collection.meta.id),
                vec![json!({"_id": Uuid::new_v4().to_string(), "age": 42})],
            )
            .await
            .unwrap();

        let mut variables = HashMap::new();
        variables.insert(
            "age".to_string(),
            VariableSpec {
                path: "$.pipeline.0.$match.age".to_string(),
                description: None,
                optional: false,
            },
        );
        let query = Query::new(
            owner,
            "q".to_string(),
            collection.meta.id,
            variables,
            vec![json!({"$match": {"age": 0}})],
            Utc::now(),
        );

        let executor = QueryExecutor::new(store, collections);
        let mut provided = HashMap::new();
        provided.insert("age".to_string(), json!(42));
        let result = executor.run(&query, provided).await.unwrap();
        assert_eq!(result.len(), 1);
    }
}
