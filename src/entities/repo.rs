//! Typed entity stores layered over [`crate::store::DocumentStore`]
//! (component C4).
//!
//! Each repo is a thin serde (de)serialization wrapper around the
//! primary-namespace CRUD surface; none of them know about capability
//! checks or ownership policy, which live one layer up.

use std::sync::Arc;

use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::ids::Did;
use crate::store::{DocumentStore, FindOptions, Namespace, PrimaryCollection};

use super::{Builder, Collection, MaintenanceConfig, Query, QueryRun, User, MAINTENANCE_TAG};

fn to_value<T: serde::Serialize>(value: &T) -> AppResult<Value> {
    serde_json::to_value(value).map_err(AppError::from)
}

fn from_value<T: serde::de::DeserializeOwned>(value: Value) -> AppResult<T> {
    serde_json::from_value(value).map_err(AppError::from)
}

pub struct BuilderRepo {
    store: Arc<dyn DocumentStore>,
}

impl BuilderRepo {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    fn ns() -> Namespace {
        Namespace::Primary(PrimaryCollection::Builders)
    }

    pub async fn insert(&self, builder: &Builder) -> AppResult<()> {
        self.store.insert_one(&Self::ns(), to_value(builder)?).await?;
        Ok(())
    }

    pub async fn find(&self, did: &Did) -> AppResult<Option<Builder>> {
        let doc = self
            .store
            .find_one(&Self::ns(), &json!({"_id": did.as_str()}))
            .await?;
        doc.map(from_value).transpose()
    }

    pub async fn require(&self, did: &Did) -> AppResult<Builder> {
        self.find(did)
            .await?
            .ok_or_else(|| AppError::ResourceAccessDenied(format!("no builder {did}")))
    }

    pub async fn replace(&self, builder: &Builder) -> AppResult<()> {
        self.store
            .update_one(
                &Self::ns(),
                &json!({"_id": builder.id.as_str()}),
                &json!({"$set": to_value(builder)?}),
            )
            .await?;
        Ok(())
    }

    pub async fn delete(&self, did: &Did) -> AppResult<()> {
        self.store
            .delete_one(&Self::ns(), &json!({"_id": did.as_str()}))
            .await?;
        Ok(())
    }
}

pub struct CollectionRepo {
    store: Arc<dyn DocumentStore>,
}

impl CollectionRepo {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    fn ns() -> Namespace {
        Namespace::Primary(PrimaryCollection::Collections)
    }

    pub async fn insert(&self, collection: &Collection) -> AppResult<()> {
        self.store
            .insert_one(&Self::ns(), to_value(collection)?)
            .await?;
        Ok(())
    }

    pub async fn find(&self, id: Uuid) -> AppResult<Option<Collection>> {
        let doc = self
            .store
            .find_one(&Self::ns(), &json!({"_id": id.to_string()}))
            .await?;
        doc.map(from_value).transpose()
    }

    pub async fn require(&self, id: Uuid) -> AppResult<Collection> {
        self.find(id)
            .await?
            .ok_or_else(|| AppError::CollectionNotFound(id.to_string()))
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.store
            .delete_one(&Self::ns(), &json!({"_id": id.to_string()}))
            .await?;
        Ok(())
    }
}

pub struct UserRepo {
    store: Arc<dyn DocumentStore>,
}

impl UserRepo {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    fn ns() -> Namespace {
        Namespace::Primary(PrimaryCollection::Users)
    }

    pub async fn insert(&self, user: &User) -> AppResult<()> {
        self.store.insert_one(&Self::ns(), to_value(user)?).await?;
        Ok(())
    }

    pub async fn find(&self, did: &Did) -> AppResult<Option<User>> {
        let doc = self
            .store
            .find_one(&Self::ns(), &json!({"_id": did.as_str()}))
            .await?;
        doc.map(from_value).transpose()
    }

    pub async fn replace(&self, user: &User) -> AppResult<()> {
        self.store
            .update_one(
                &Self::ns(),
                &json!({"_id": user.id.as_str()}),
                &json!({"$set": to_value(user)?}),
            )
            .await?;
        Ok(())
    }

    pub async fn delete(&self, did: &Did) -> AppResult<()> {
        self.store
            .delete_one(&Self::ns(), &json!({"_id": did.as_str()}))
            .await?;
        Ok(())
    }
}

pub struct QueryRepo {
    store: Arc<dyn DocumentStore>,
}

impl QueryRepo {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    fn ns() -> Namespace {
        Namespace::Primary(PrimaryCollection::Queries)
    }

    pub async fn insert(&self, query: &Query) -> AppResult<()> {
        self.store.insert_one(&Self::ns(), to_value(query)?).await?;
        Ok(())
    }

    pub async fn find(&self, id: Uuid) -> AppResult<Option<Query>> {
        let doc = self
            .store
            .find_one(&Self::ns(), &json!({"_id": id.to_string()}))
            .await?;
        doc.map(from_value).transpose()
    }

    pub async fn find_owned_by(&self, owner: &Did) -> AppResult<Vec<Query>> {
        let docs = self
            .store
            .find_many(&Self::ns(), &json!({"owner": owner.as_str()}), FindOptions::default())
            .await?;
        docs.into_iter().map(from_value).collect()
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.store
            .delete_one(&Self::ns(), &json!({"_id": id.to_string()}))
            .await?;
        Ok(())
    }
}

pub struct QueryRunRepo {
    store: Arc<dyn DocumentStore>,
}

impl QueryRunRepo {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    fn ns() -> Namespace {
        Namespace::Primary(PrimaryCollection::QueryRuns)
    }

    pub async fn insert(&self, run: &QueryRun) -> AppResult<()> {
        self.store.insert_one(&Self::ns(), to_value(run)?).await?;
        Ok(())
    }

    pub async fn find(&self, id: Uuid) -> AppResult<Option<QueryRun>> {
        let doc = self
            .store
            .find_one(&Self::ns(), &json!({"_id": id.to_string()}))
            .await?;
        doc.map(from_value).transpose()
    }

    pub async fn replace(&self, run: &QueryRun) -> AppResult<()> {
        self.store
            .update_one(
                &Self::ns(),
                &json!({"_id": run.meta.id.to_string()}),
                &json!({"$set": to_value(run)?}),
            )
            .await?;
        Ok(())
    }
}

pub struct ConfigRepo {
    store: Arc<dyn DocumentStore>,
}

impl ConfigRepo {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    fn ns() -> Namespace {
        Namespace::Primary(PrimaryCollection::Config)
    }

    pub async fn maintenance(&self) -> AppResult<Option<MaintenanceConfig>> {
        let doc = self
            .store
            .find_one(&Self::ns(), &json!({"_type": MAINTENANCE_TAG}))
            .await?;
        doc.map(from_value).transpose()
    }

    /// Upsert semantics per §4.7: `start` overwrites any existing
    /// singleton document.
    pub async fn set_maintenance(&self, cfg: &MaintenanceConfig) -> AppResult<()> {
        let updated = self
            .store
            .update_one(
                &Self::ns(),
                &json!({"_type": MAINTENANCE_TAG}),
                &json!({"$set": to_value(cfg)?}),
            )
            .await?;
        if updated == 0 {
            self.store.insert_one(&Self::ns(), to_value(cfg)?).await?;
        }
        Ok(())
    }

    pub async fn clear_maintenance(&self) -> AppResult<()> {
        self.store
            .delete_one(&Self::ns(), &json!({"_type": MAINTENANCE_TAG}))
            .await?;
        Ok(())
    }
}
