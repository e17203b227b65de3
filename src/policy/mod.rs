//! Ownership & ACL policy (component C6)

pub mod acl;
pub mod ownership;

pub use acl::{require_access, require_owns_document};
pub use ownership::{require_owns_collection, require_owns_query};
