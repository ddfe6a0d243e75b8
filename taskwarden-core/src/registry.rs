//! The job registry: a name-keyed store of `JobRecord`s, preserving insertion
//! order since both the tick loop and the HTTP listing rely on it.

use crate::cron_oracle;
use crate::error::SupervisorError;
use crate::model::{JobDefinition, JobRecord};
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Insertion-ordered store of job records.
///
/// Records live in a `Vec` in registration order; `index` maps name to
/// position for O(1) lookup. Tens of jobs is the expected scale, so the
/// linear scans this trades away are never a real cost.
#[derive(Default)]
struct Records {
    order: Vec<JobRecord>,
    index: HashMap<String, usize>,
}

/// Shared, insertion-ordered store of job records.
///
/// Guarded by a `tokio::sync::Mutex` rather than a blocking one: the tick
/// loop holds the lock across a full scan of the store, and the lock is
/// acquired from async contexts (the HTTP layer's query handlers) that must
/// not block a worker thread.
pub struct JobRegistry {
    records: Mutex<Records>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Records::default()),
        }
    }

    /// Inserts a new record for `definition`, validating its cron expression
    /// (if any) first. Fails with `JobAlreadyExists` if the name is taken.
    pub async fn insert(&self, definition: JobDefinition) -> Result<(), SupervisorError> {
        if let Some(expr) = &definition.cron {
            cron_oracle::validate(expr, &definition.name)?;
        }

        let mut records = self.records.lock().await;
        if records.index.contains_key(&definition.name) {
            return Err(SupervisorError::JobAlreadyExists(definition.name));
        }

        let name = definition.name.clone();
        let record = JobRecord::new(definition, cron_oracle::now());
        records.index.insert(name, records.order.len());
        records.order.push(record);
        Ok(())
    }

    pub async fn with_record<R>(
        &self,
        name: &str,
        f: impl FnOnce(&JobRecord) -> R,
    ) -> Result<R, SupervisorError> {
        let records = self.records.lock().await;
        let idx = *records
            .index
            .get(name)
            .ok_or_else(|| SupervisorError::JobNotFound(name.to_string()))?;
        Ok(f(&records.order[idx]))
    }

    pub async fn with_record_mut<R>(
        &self,
        name: &str,
        f: impl FnOnce(&mut JobRecord) -> R,
    ) -> Result<R, SupervisorError> {
        let mut records = self.records.lock().await;
        let idx = *records
            .index
            .get(name)
            .ok_or_else(|| SupervisorError::JobNotFound(name.to_string()))?;
        Ok(f(&mut records.order[idx]))
    }

    /// Locks the whole store for the duration of the closure, in insertion
    /// order. Used by the tick loop, which needs a consistent view while
    /// deciding transitions.
    pub async fn with_all_mut<R>(&self, f: impl FnOnce(&mut [JobRecord]) -> R) -> R {
        let mut records = self.records.lock().await;
        f(&mut records.order)
    }

    pub async fn with_all<R>(&self, f: impl FnOnce(&[JobRecord]) -> R) -> R {
        let records = self.records.lock().await;
        f(&records.order)
    }
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new()
    }
}
