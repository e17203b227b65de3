//! `addQuery` registration (§4.5 step "Registration")

use std::sync::Arc;

use chrono::Utc;
use jsonschema::JSONSchema;
use serde_json::Value;

use crate::entities::{BuilderRepo, Collection, CollectionRepo, Query, QueryRepo, VariableSpec};
use crate::error::{AppError, AppResult};
use crate::ids::Did;
use crate::lifecycle::cache::BuilderCache;
use crate::policy::require_owns_collection;

use super::path;
use super::pipeline_schema;

pub struct QueryRegistrar {
    queries: Arc<QueryRepo>,
    collections: Arc<CollectionRepo>,
    builders: Arc<BuilderRepo>,
    cache: Arc<BuilderCache>,
}

impl QueryRegistrar {
    pub fn new(
        queries: Arc<QueryRepo>,
        collections: Arc<CollectionRepo>,
        builders: Arc<BuilderRepo>,
        cache: Arc<BuilderCache>,
    ) -> Self {
        Self {
            queries,
            collections,
            builders,
            cache,
        }
    }

    pub async fn add_query(
        &self,
        caller: &Did,
        name: String,
        collection_id: uuid::Uuid,
        variables: std::collections::HashMap<String, VariableSpec>,
        pipeline: Vec<Value>,
    ) -> AppResult<Query> {
        let schema = pipeline_schema::schema();
        let compiled = JSONSchema::compile(&schema)
            .map_err(|e| AppError::DatabaseError(format!("pipeline schema failed to compile: {e}")))?;
        let pipeline_value = Value::Array(pipeline.clone());
        if let Err(errors) = compiled.validate(&pipeline_value) {
            let messages: Vec<String> = errors.map(|e| e.to_string()).collect();
            return Err(AppError::QueryValidation(messages.join("; ")));
        }

        for spec in variables.values() {
            let segments = path::parse(&spec.path)?;
            if path::resolve(&pipeline, &segments).is_none() {
                return Err(AppError::QueryValidation(format!(
                    "variable path does not resolve inside pipeline: {}",
                    spec.path
                )));
            }
        }

        let collection: Collection = self.collections.require(collection_id).await?;
        require_owns_collection(caller, &collection)?;

        let now = Utc::now();
        let query = Query::new(caller.clone(), name, collection_id, variables, pipeline, now);
        self.queries.insert(&query).await?;

        if let Some(mut builder) = self.builders.find(caller).await? {
            builder.queries.insert(query.meta.id);
            builder.touch(now);
            self.builders.replace(&builder).await?;
        }
        self.cache.taint(caller).await;

        Ok(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::BuilderRepo;
    use crate::ids::CollectionType;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn registrar() -> (QueryRegistrar, Arc<CollectionRepo>, Arc<BuilderRepo>) {
        let store: Arc<dyn crate::store::DocumentStore> = Arc::new(MemoryStore::new());
        let queries = Arc::new(QueryRepo::new(store.clone()));
        let collections = Arc::new(CollectionRepo::new(store.clone()));
        let builders = Arc::new(BuilderRepo::new(store));
        let cache = Arc::new(BuilderCache::new());
        (
            QueryRegistrar::new(queries, collections.clone(), builders.clone(), cache),
            collections,
            builders,
        )
    }

    #[tokio::test]
    async fn registers_query_with_valid_variable_path() {
        let (registrar, collections, _builders) = registrar();
        let owner = Did::parse("did:nil:aa").unwrap();
        let collection = Collection::new(
            owner.clone(),
            CollectionType::Standard,
            json!({"type": "object"}),
            "c".to_string(),
            Utc::now(),
        );
        collections.insert(&collection).await.unwrap();

        let mut variables = std::collections::HashMap::new();
        variables.insert(
            "x".to_string(),
            VariableSpec {
                path: "$.pipeline.0.$match.age".to_string(),
                description: None,
                optional: false,
            },
        );
        let pipeline = vec![json!({"$match": {"age": 0}})];

        let query = registrar
            .add_query(&owner, "q".to_string(), collection.meta.id, variables, pipeline)
            .await
            .unwrap();
        assert_eq!(query.owner, owner);
    }

    #[tokio::test]
    async fn rejects_path_that_does_not_resolve() {
        let (registrar, collections, _builders) = registrar();
        let owner = Did::parse("did:nil:aa").unwrap();
        let collection = Collection::new(
            owner.clone(),
            CollectionType::Standard,
            json!({"type": "object"}),
            "c".to_string(),
            Utc::now(),
        );
        collections.insert(&collection).await.unwrap();

        let mut variables = std::collections::HashMap::new();
        variables.insert(
            "x".to_string(),
            VariableSpec {
                path: "$.pipeline.5.foo".to_string(),
                description: None,
                optional: false,
            },
        );
        let pipeline = vec![json!({"$match": {"age": 0}})];

        let err = registrar
            .add_query(&owner, "q".to_string(), collection.meta.id, variables, pipeline)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "QueryValidation");
    }

    #[tokio::test]
    async fn registration_links_query_into_owning_builder() {
        let (registrar, collections, builders) = registrar();
        let owner = Did::parse("did:nil:aa").unwrap();
        let collection = Collection::new(
            owner.clone(),
            CollectionType::Standard,
            json!({"type": "object"}),
            "c".to_string(),
            Utc::now(),
        );
        collections.insert(&collection).await.unwrap();
        let builder = crate::entities::Builder::new(owner.clone(), "b".to_string(), Utc::now());
        builders.insert(&builder).await.unwrap();

        let query = registrar
            .add_query(&owner, "q".to_string(), collection.meta.id, Default::default(), vec![])
            .await
            .unwrap();

        let reloaded = builders.find(&owner).await.unwrap().unwrap();
        assert!(reloaded.queries.contains(&query.meta.id));
    }

    #[tokio::test]
    async fn rejects_registration_by_non_owner() {
        let (registrar, collections, _builders) = registrar();
        let owner = Did::parse("did:nil:aa").unwrap();
        let other = Did::parse("did:nil:bb").unwrap();
        let collection = Collection::new(
            owner,
            CollectionType::Standard,
            json!({"type": "object"}),
            "c".to_string(),
            Utc::now(),
        );
        collections.insert(&collection).await.unwrap();

        let err = registrar
            .add_query(&other, "q".to_string(), collection.meta.id, Default::default(), vec![])
            .await
            .unwrap_err();
        assert_eq!(err.code(), "ResourceAccessDenied");
    }
}
