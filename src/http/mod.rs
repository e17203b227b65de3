//! HTTP surface (§6.1) — contracts only; the real routing concerns
//! (OpenAPI description, CORS/body-size/logger/maintenance middlewares,
//! metrics endpoint) are external collaborators per §1. This module
//! wires up just enough real `axum` routing to exercise the core end to
//! end.

pub mod builders;
pub mod data;
pub mod extract;
pub mod queries;
pub mod state;
pub mod system;

use axum::Router;

pub use state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(builders::routes())
        .merge(data::routes())
        .merge(queries::routes())
        .merge(system::routes())
        .with_state(state)
}
