//! Error types surfaced across the Supervisor's public API.
//!
//! Job-body failures are deliberately **not** represented here: they are
//! captured as `anyhow::Error` payloads inside `job_failed` events, never
//! converted into a `SupervisorError`. This enum only covers failures of the
//! Supervisor's own operations (register/start/cancel/get).

use thiserror::Error;

/// Errors returned by [`Supervisor`](crate::Supervisor) methods.
#[derive(Error, Debug)]
pub enum SupervisorError {
    /// No record exists under this name.
    #[error("job '{0}' not found")]
    JobNotFound(String),

    /// `register` was called with a name already present in the registry.
    #[error("job '{0}' already exists")]
    JobAlreadyExists(String),

    /// `start` was called on a job already in the `running` state.
    #[error("job '{0}' already running")]
    JobAlreadyRunning(String),

    /// `cancel` was called on a job not in the `running` state.
    #[error("job '{0}' not running")]
    JobNotRunning(String),

    /// The cron expression given at `register` time failed to parse.
    #[error("invalid cron expression for job '{name}'")]
    InvalidCronExpression {
        name: String,
        #[source]
        source: anyhow::Error,
    },
}

pub type SupervisorResult<T> = Result<T, SupervisorError>;
