//! nildb-node — capability-gated document service for a decentralized
//! network node.
//!
//! Module layout mirrors the component breakdown (§2):
//! identifiers & ACL values (C1), the error taxonomy (C2), the persistence
//! adapter (C3), entity stores (C4), the capability engine (C5), ownership
//! & ACL policy (C6), the data plane (C7), the query engine (C8), the
//! cascading lifecycle (C9) and system/maintenance (C10). `http` wires the
//! core up behind real `axum` routes; `config` is the ambient configuration
//! surface.

pub mod capability;
pub mod config;
pub mod data;
pub mod entities;
pub mod error;
pub mod http;
pub mod ids;
pub mod lifecycle;
pub mod policy;
pub mod query;
pub mod store;
pub mod system;
