//! Persistence adapter (component C3)

pub mod aggregate;
pub mod coerce;
pub mod filter;
pub mod memory;
pub mod traits;

pub use coerce::CoerceType;
pub use memory::MemoryStore;
pub use traits::{
    DocumentStore, FindOptions, InsertFailure, InsertFailureReason, InsertManyReport, Namespace,
    PrimaryCollection, SortDirection, INSERT_BATCH_SIZE,
};
