//! A thin axum control-plane adapter over [`taskwarden_core::Supervisor`].
//!
//! `router(supervisor)` builds a `Router` ready to serve; the caller owns
//! binding the listener and running the supervisor's own tick loop
//! alongside it.

mod error;
mod routes;

pub use error::ApiError;

use axum::Router;
use axum::routing::get;
use taskwarden_core::Supervisor;

/// Builds the control-plane router, wired to the given supervisor.
pub fn router(supervisor: Supervisor) -> Router {
    Router::new()
        .route("/api/jobs", get(routes::list_jobs))
        .route("/api/jobs/{name}", get(routes::get_job))
        .route("/api/jobs/{name}/start", get(routes::start_job))
        .route("/api/jobs/{name}/cancel", get(routes::cancel_job))
        .route("/api/log-stream", get(routes::log_stream))
        .with_state(supervisor)
}
