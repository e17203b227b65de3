//! Cascading deletion fan-out (§4.6)

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::data::DataPlane;
use crate::entities::{BuilderRepo, CollectionRepo, LogOp, QueryRepo};
use crate::error::AppResult;
use crate::ids::{CollectionType, Did};
use crate::store::{DocumentStore, Namespace};

use super::cache::BuilderCache;

pub struct CascadeController {
    builders: Arc<BuilderRepo>,
    collections: Arc<CollectionRepo>,
    queries: Arc<QueryRepo>,
    store: Arc<dyn DocumentStore>,
    data: Arc<DataPlane>,
    cache: Arc<BuilderCache>,
}

impl CascadeController {
    pub fn new(
        builders: Arc<BuilderRepo>,
        collections: Arc<CollectionRepo>,
        queries: Arc<QueryRepo>,
        store: Arc<dyn DocumentStore>,
        data: Arc<DataPlane>,
        cache: Arc<BuilderCache>,
    ) -> Self {
        Self {
            builders,
            collections,
            queries,
            store,
            data,
            cache,
        }
    }

    /// §4.6: load, snapshot, delete the Builder, then fan out to every
    /// snapshotted Collection and Query. Best-effort: a failure part-way
    /// through leaves the remainder to whatever later cleanup finds it.
    pub async fn remove_builder(&self, did: &Did) -> AppResult<()> {
        let builder = self.builders.require(did).await?;

        self.builders.delete(did).await?;
        self.cache.taint(did).await;

        for query_id in &builder.queries {
            self.queries.delete(*query_id).await?;
        }

        for collection_id in &builder.collections {
            self.collections.delete(*collection_id).await?;
            self.drop_collection_data(*collection_id).await?;
        }

        Ok(())
    }

    /// §4.6: removes the collection from its owner's Builder record,
    /// flushes owner bookkeeping and drops the per-collection data store.
    pub async fn remove_collection(&self, id: Uuid) -> AppResult<()> {
        let collection = self.collections.require(id).await?;

        if let Some(mut builder) = self.builders.find(&collection.owner).await? {
            builder.collections.remove(&id);
            builder.touch(Utc::now());
            self.builders.replace(&builder).await?;
            self.cache.taint(&collection.owner).await;
        }

        self.collections.delete(id).await?;
        self.drop_collection_data(id).await?;

        Ok(())
    }

    /// §4.6: removes the reference from the owning Builder's `queries`
    /// set and deletes the Query document. In-flight QueryRuns referencing
    /// this query are left to fail naturally once the job looks the query
    /// back up.
    pub async fn remove_query(&self, id: Uuid) -> AppResult<()> {
        let query = self.queries.require(id).await?;

        if let Some(mut builder) = self.builders.find(&query.owner).await? {
            builder.queries.remove(&id);
            builder.touch(Utc::now());
            self.builders.replace(&builder).await?;
            self.cache.taint(&query.owner).await;
        }

        self.queries.delete(id).await?;

        Ok(())
    }

    async fn drop_collection_data(&self, collection_id: Uuid) -> AppResult<()> {
        let ns = Namespace::Data(collection_id);
        let docs = self
            .store
            .find_many(&ns, &serde_json::json!({}), crate::store::FindOptions::default())
            .await?;

        if !docs.is_empty() {
            self.data
                .bookkeep_owned(&docs, collection_id, LogOp::DeleteData, Utc::now(), true)
                .await?;
        }

        self.store.drop_collection(&ns).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Builder, Collection, Query, UserRepo, VariableSpec};
    use crate::ids::Did;
    use crate::store::MemoryStore;
    use serde_json::json;
    use std::collections::HashMap;

    fn controller() -> (
        CascadeController,
        Arc<BuilderRepo>,
        Arc<CollectionRepo>,
        Arc<QueryRepo>,
        Arc<UserRepo>,
        Arc<dyn DocumentStore>,
    ) {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let builders = Arc::new(BuilderRepo::new(store.clone()));
        let collections = Arc::new(CollectionRepo::new(store.clone()));
        let queries = Arc::new(QueryRepo::new(store.clone()));
        let users = Arc::new(UserRepo::new(store.clone()));
        let data = Arc::new(DataPlane::new(store.clone(), users.clone()));
        let cache = Arc::new(BuilderCache::new());
        let controller = CascadeController::new(
            builders.clone(),
            collections.clone(),
            queries.clone(),
            store.clone(),
            data,
            cache,
        );
        (controller, builders, collections, queries, users, store)
    }

    #[tokio::test]
    async fn remove_builder_deletes_collections_and_queries() {
        let (controller, builders, collections, queries, _users, store) = controller();
        let owner = Did::parse("did:nil:aa").unwrap();
        let now = Utc::now();

        let collection = Collection::new(
            owner.clone(),
            CollectionType::Standard,
            json!({"type": "object"}),
            "c".to_string(),
            now,
        );
        collections.insert(&collection).await.unwrap();

        let query = Query::new(
            owner.clone(),
            "q".to_string(),
            collection.meta.id,
            HashMap::<String, VariableSpec>::new(),
            vec![],
            now,
        );
        queries.insert(&query).await.unwrap();

        let mut builder = Builder::new(owner.clone(), "acme".to_string(), now);
        builder.collections.insert(collection.meta.id);
        builder.queries.insert(query.meta.id);
        builders.insert(&builder).await.unwrap();

        store
            .insert_one(&Namespace::Data(collection.meta.id), json!({"_id": Uuid::new_v4().to_string()}))
            .await
            .unwrap();

        controller.remove_builder(&owner).await.unwrap();

        assert!(builders.find(&owner).await.unwrap().is_none());
        assert!(collections.find(collection.meta.id).await.unwrap().is_none());
        assert!(queries.find(query.meta.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn remove_collection_updates_owner_and_bookkeeps_users() {
        let (controller, builders, collections, _queries, users, store) = controller();
        let owner = Did::parse("did:nil:aa").unwrap();
        let data_owner = Did::parse("did:nil:uu").unwrap();
        let now = Utc::now();

        let collection = Collection::new(
            owner.clone(),
            CollectionType::Owned,
            json!({"type": "object"}),
            "c".to_string(),
            now,
        );
        collections.insert(&collection).await.unwrap();

        let mut builder = Builder::new(owner.clone(), "acme".to_string(), now);
        builder.collections.insert(collection.meta.id);
        builders.insert(&builder).await.unwrap();

        let doc_id = Uuid::new_v4();
        let mut user = crate::entities::User::new(data_owner.clone(), now);
        user.data.insert(crate::entities::DataRef {
            builder: owner.clone(),
            collection: collection.meta.id,
            document: doc_id,
        });
        users.insert(&user).await.unwrap();

        store
            .insert_one(
                &Namespace::Data(collection.meta.id),
                json!({"_id": doc_id.to_string(), "_owner": data_owner.as_str()}),
            )
            .await
            .unwrap();

        controller.remove_collection(collection.meta.id).await.unwrap();

        let builder = builders.find(&owner).await.unwrap().unwrap();
        assert!(!builder.collections.contains(&collection.meta.id));
        assert!(users.find(&data_owner).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn remove_query_updates_owner() {
        let (controller, builders, collections, queries, _users, _store) = controller();
        let owner = Did::parse("did:nil:aa").unwrap();
        let now = Utc::now();

        let collection = Collection::new(
            owner.clone(),
            CollectionType::Standard,
            json!({"type": "object"}),
            "c".to_string(),
            now,
        );
        collections.insert(&collection).await.unwrap();

        let query = Query::new(
            owner.clone(),
            "q".to_string(),
            collection.meta.id,
            HashMap::<String, VariableSpec>::new(),
            vec![],
            now,
        );
        queries.insert(&query).await.unwrap();

        let mut builder = Builder::new(owner.clone(), "acme".to_string(), now);
        builder.queries.insert(query.meta.id);
        builders.insert(&builder).await.unwrap();

        controller.remove_query(query.meta.id).await.unwrap();

        let builder = builders.find(&owner).await.unwrap().unwrap();
        assert!(!builder.queries.contains(&query.meta.id));
        assert!(queries.find(query.meta.id).await.unwrap().is_none());
    }
}
