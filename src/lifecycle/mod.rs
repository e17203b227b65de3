//! Cascading lifecycle (component C9)

pub mod cache;
pub mod cascade;

pub use cache::BuilderCache;
pub use cascade::CascadeController;
