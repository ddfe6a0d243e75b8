//! Route handlers for the control plane. Thin: every handler just calls
//! through to [`Supervisor`] and lets [`ApiError`] do the status mapping.

use crate::error::ApiError;
use axum::Json;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use serde_json::json;
use taskwarden_core::Supervisor;
use taskwarden_core::model::JobInfo;

/// `GET /api/jobs`: every registered job, in registration order.
pub async fn list_jobs(State(supervisor): State<Supervisor>) -> Json<Vec<JobInfo>> {
    Json(supervisor.list().await)
}

/// `GET /api/jobs/{name}`: one job's observable state.
pub async fn get_job(
    State(supervisor): State<Supervisor>,
    Path(name): Path<String>,
) -> Result<Json<JobInfo>, ApiError> {
    let info = supervisor.get(&name).await?;
    Ok(Json(info))
}

#[derive(Serialize)]
struct StartedBody {
    started: String,
}

/// `GET /api/jobs/{name}/start`: explicitly starts a job.
pub async fn start_job(
    State(supervisor): State<Supervisor>,
    Path(name): Path<String>,
) -> Result<Json<StartedBody>, ApiError> {
    supervisor.start(&name).await?;
    Ok(Json(StartedBody { started: name }))
}

#[derive(Serialize)]
struct CancelledBody {
    cancelled: String,
    signalled: bool,
}

/// `GET /api/jobs/{name}/cancel`: requests cooperative cancellation.
pub async fn cancel_job(
    State(supervisor): State<Supervisor>,
    Path(name): Path<String>,
) -> Result<Json<CancelledBody>, ApiError> {
    let signalled = supervisor.cancel(&name).await?;
    Ok(Json(CancelledBody {
        cancelled: name,
        signalled,
    }))
}

/// `GET /api/log-stream`: a never-ending newline-delimited-JSON feed of
/// lifecycle events, starting from the beginning of the log.
///
/// Each connection gets its own cursor (see [`Supervisor::stream_events`]);
/// a slow or disconnected reader only holds up its own subscription.
pub async fn log_stream(State(supervisor): State<Supervisor>) -> Response {
    tracing::debug!("log-stream subscriber connected");
    let subscription = supervisor.stream_events();

    let batches = stream::unfold(subscription, |mut sub| async move {
        let batch = sub.next_batch().await;
        Some((batch, sub))
    });

    let lines = batches
        .map(|batch| {
            let mut buf = String::new();
            for event in batch {
                buf.push_str(&serde_json::to_string(&event).unwrap_or_else(|_| json!({}).to_string()));
                buf.push('\n');
            }
            Ok::<_, std::io::Error>(buf)
        })
        .filter(|chunk: &Result<String, std::io::Error>| {
            let keep = chunk.as_ref().map(|s| !s.is_empty()).unwrap_or(true);
            futures_util::future::ready(keep)
        });

    (
        [(axum::http::header::CONTENT_TYPE, "application/x-ndjson")],
        Body::from_stream(lines),
    )
        .into_response()
}
