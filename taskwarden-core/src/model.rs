//! The data model shared by the registry, the dispatcher, and the wire layer.
//!
//! `JobInfo` and `EventRecord` double as the HTTP wire DTOs: their field names
//! are part of the external contract, so `taskwarden-http` serializes them
//! directly rather than mapping into a parallel set of types.

use crate::contracts::JobContract;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Current lifecycle state of a registered job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Registered,
    Pending,
    Running,
    Finished,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Registered => "registered",
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Finished => "finished",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        }
    }
}

/// Immutable definition of a job, fixed at registration time.
pub struct JobDefinition {
    pub name: String,
    pub body: Arc<dyn JobContract>,
    pub cron: Option<String>,
    pub enabled: bool,
}

/// A running task's cooperative handle: the token used to request
/// cancellation. The job's own task is fire-and-forget; completion reaches
/// the supervisor through `dispatch`, not by joining this handle.
pub struct RunningHandle {
    pub cancel: CancellationToken,
}

/// Owned by the registry: one per registered job, aggregating the immutable
/// definition with the job's mutable runtime state.
pub struct JobRecord {
    pub definition: JobDefinition,
    pub status: JobStatus,
    pub last_status: Option<JobStatus>,
    pub created_at: DateTime<Utc>,
    pub last_start: Option<DateTime<Utc>>,
    pub last_finish: Option<DateTime<Utc>>,
    pub next_start_ts: Option<DateTime<Utc>>,
    pub running_handle: Option<RunningHandle>,
}

impl JobRecord {
    pub fn new(definition: JobDefinition, created_at: DateTime<Utc>) -> Self {
        Self {
            definition,
            status: JobStatus::Registered,
            last_status: None,
            created_at,
            last_start: None,
            last_finish: None,
            next_start_ts: None,
            running_handle: None,
        }
    }

    /// A flattened, serializable view of this record's observable fields.
    pub fn info(&self) -> JobInfo {
        JobInfo {
            name: self.definition.name.clone(),
            last_status: self.status,
            enabled: self.definition.enabled,
            crontab: self.definition.cron.clone(),
            created_at: self.created_at,
            started_at: self.last_start,
            stopped_at: self.last_finish,
            next_run_in: self
                .next_start_ts
                .map(|ts| (ts - Utc::now()).num_seconds().max(0)),
        }
    }
}

/// A flattened, wire-serializable view of a [`JobRecord`]'s observable state.
///
/// Field names are part of the HTTP contract; do not rename without updating
/// the control-plane adapter's documented shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobInfo {
    pub name: String,
    pub last_status: JobStatus,
    pub enabled: bool,
    pub crontab: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub stopped_at: Option<DateTime<Utc>>,
    pub next_run_in: Option<i64>,
}

/// The category of a lifecycle transition recorded in the event log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    JobRegistered,
    JobStarted,
    JobFinished,
    JobFailed,
    JobCancelled,
}

/// An immutable record of a single lifecycle transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub event_type: EventType,
    pub job_name: String,
    pub crontab: Option<String>,
    pub enabled: bool,
    pub error: Option<String>,
    pub timestamp: i64,
}

/// A value-type snapshot of the supervisor's observable state, suitable for
/// introspection or as the `run()` hydration input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub created_at: DateTime<Utc>,
    pub jobs_info: Vec<JobInfo>,
}
