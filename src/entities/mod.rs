//! Entity stores (component C4): Builders, Users, Queries, QueryRuns,
//! Config (singleton), plus the per-collection data stores addressed via
//! [`crate::store`].

pub mod builder;
pub mod collection;
pub mod maintenance;
pub mod query;
pub mod query_run;
pub mod repo;
pub mod user;

pub use builder::Builder;
pub use collection::Collection;
pub use maintenance::{MaintenanceConfig, MAINTENANCE_TAG};
pub use query::{Query, VariableSpec};
pub use query_run::{QueryRun, RunStatus};
pub use repo::{BuilderRepo, CollectionRepo, ConfigRepo, QueryRepo, QueryRunRepo, UserRepo};
pub use user::{DataRef, LogEntry, LogOp, User};
