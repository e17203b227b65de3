//! Saved aggregation queries (component C8)

pub mod execution;
pub mod injection;
pub mod job;
pub mod path;
pub mod pipeline_schema;
pub mod registration;
pub mod variables;

pub use execution::QueryExecutor;
pub use job::{QueryJobRunner, BACKGROUND_TIMEOUT};
pub use registration::QueryRegistrar;
