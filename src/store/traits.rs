//! Persistence adapter contract (component C3, §4.1)
//!
//! The adapter exposes two logical namespaces — primary (builders, users,
//! queries, query-runs, config) and data (one collection per registered
//! Collection, keyed by its UUID) — over a small, typed CRUD + aggregate
//! surface. The crate ships one implementation, [`crate::store::memory::MemoryStore`];
//! a production deployment supplies its own impl wrapping the external
//! document-store client (out of scope per §1).

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashSet;
use uuid::Uuid;

use crate::error::AppResult;

/// The primary-namespace stores named in §6.2, plus `collections`
/// (the Collection metadata records themselves — §3 defines the entity but
/// §6.2's enumeration omits its store; without one, `Builder.collections`
/// would have nothing to dereference, so it is added here and noted in the
/// grounding ledger).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimaryCollection {
    Builders,
    Users,
    Queries,
    QueryRuns,
    Collections,
    Config,
}

impl PrimaryCollection {
    pub fn name(self) -> &'static str {
        match self {
            Self::Builders => "builders",
            Self::Users => "users",
            Self::Queries => "queries",
            Self::QueryRuns => "query_runs",
            Self::Collections => "collections",
            Self::Config => "config",
        }
    }
}

/// Which store a call targets.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Namespace {
    Primary(PrimaryCollection),
    /// One collection per registered Collection, keyed by its id.
    Data(Uuid),
}

impl Namespace {
    pub fn name(&self) -> String {
        match self {
            Self::Primary(p) => p.name().to_string(),
            Self::Data(id) => id.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    pub limit: Option<usize>,
    pub skip: usize,
    pub sort: Option<(String, SortDirection)>,
}

/// Why a single document in an `insert_many` batch failed. Duplicate-key
/// errors are classified distinctly from everything else per §4.1.
#[derive(Debug, Clone)]
pub enum InsertFailureReason {
    DuplicateKey,
    Other(String),
}

#[derive(Debug, Clone)]
pub struct InsertFailure {
    pub index: usize,
    pub reason: InsertFailureReason,
    pub document: Value,
}

#[derive(Debug, Clone, Default)]
pub struct InsertManyReport {
    pub inserted: HashSet<Uuid>,
    pub failures: Vec<InsertFailure>,
}

/// Batch size cap recommended by §4.1; callers never need to chunk
/// manually, the adapter does it transparently.
pub const INSERT_BATCH_SIZE: usize = 1000;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn ensure_exists(&self, ns: &Namespace) -> AppResult<()>;

    async fn insert_one(&self, ns: &Namespace, document: Value) -> AppResult<Uuid>;

    /// Unordered: one bad document never aborts the rest of the batch.
    async fn insert_many(&self, ns: &Namespace, documents: Vec<Value>) -> AppResult<InsertManyReport>;

    async fn find_one(&self, ns: &Namespace, filter: &Value) -> AppResult<Option<Value>>;

    async fn find_many(
        &self,
        ns: &Namespace,
        filter: &Value,
        opts: FindOptions,
    ) -> AppResult<Vec<Value>>;

    async fn update_one(&self, ns: &Namespace, filter: &Value, update: &Value) -> AppResult<u64>;

    async fn update_many(&self, ns: &Namespace, filter: &Value, update: &Value) -> AppResult<u64>;

    async fn delete_one(&self, ns: &Namespace, filter: &Value) -> AppResult<u64>;

    async fn delete_many(&self, ns: &Namespace, filter: &Value) -> AppResult<u64>;

    async fn aggregate(&self, ns: &Namespace, pipeline: &[Value]) -> AppResult<Vec<Value>>;

    async fn drop_collection(&self, ns: &Namespace) -> AppResult<()>;

    async fn create_index(&self, ns: &Namespace, field: &str, unique: bool) -> AppResult<()>;
}
