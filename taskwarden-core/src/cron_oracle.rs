//! Thin wrapper around the `cron` crate: the only place that parses cron
//! expressions or asks "what time is it".

use crate::error::SupervisorError;
use chrono::{DateTime, Utc};
use std::str::FromStr;

/// The current wall-clock time, UTC.
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Validates a cron expression eagerly, at registration time, so a bad
/// expression is rejected before the job ever enters the registry.
pub fn validate(expr: &str, job_name: &str) -> Result<(), SupervisorError> {
    cron::Schedule::from_str(expr).map_err(|source| SupervisorError::InvalidCronExpression {
        name: job_name.to_string(),
        source: anyhow::Error::new(source),
    })?;
    Ok(())
}

/// Seconds from `from` until `expr`'s next firing.
///
/// The expression is assumed already validated; a parse failure here
/// collapses to `0` rather than panicking, since the caller should never
/// reach this with an unvalidated expression.
pub fn next_delay(expr: &str, from: DateTime<Utc>) -> i64 {
    match cron::Schedule::from_str(expr) {
        Ok(schedule) => schedule
            .after(&from)
            .next()
            .map(|next| (next - from).num_seconds().max(0))
            .unwrap_or(0),
        Err(_) => 0,
    }
}
