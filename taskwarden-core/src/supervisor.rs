//! The composition root: the job registry, scheduler tick loop, lifecycle
//! dispatcher, and event log, wired behind one public API.

use crate::callbacks::{Callbacks, ExceptionCallback, NameCallback, NoArgCallback};
use crate::contracts::JobContract;
use crate::cron_oracle;
use crate::error::{SupervisorError, SupervisorResult};
use crate::event_log::{self, EventLog};
use crate::model::{
    EventRecord, EventType, JobDefinition, JobInfo, JobStatus, RunningHandle, StateSnapshot,
};
use crate::registry::JobRegistry;
use chrono::Duration as ChronoDuration;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Default interval between scheduler tick loop iterations.
const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(1500);

/// Grace period `shutdown()` waits for lifecycle callbacks to drain before
/// giving up on them.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

struct Inner {
    registry: JobRegistry,
    event_log: EventLog,
    callbacks: StdMutex<Callbacks>,
    callback_tasks: AsyncMutex<Vec<JoinHandle<()>>>,
    created_at: chrono::DateTime<chrono::Utc>,
    tick_interval: Duration,
    shutting_down: AtomicBool,
    running: AtomicBool,
}

/// The job supervisor: register jobs, drive them through their lifecycle,
/// and observe the result.
///
/// Cheaply cloneable: internally an `Arc`, so the same supervisor can be
/// shared between the tick-loop task, the dispatcher's spawned callback
/// tasks, and an HTTP router's `State` extractor.
#[derive(Clone)]
pub struct Supervisor {
    inner: Arc<Inner>,
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl Supervisor {
    /// Builds a supervisor with the default 1.5s tick interval.
    pub fn new() -> Self {
        Self::with_tick_interval(DEFAULT_TICK_INTERVAL)
    }

    /// Builds a supervisor with a custom tick interval. Tests use this to
    /// drive the scheduler fast without real sleeps.
    pub fn with_tick_interval(tick_interval: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                registry: JobRegistry::new(),
                event_log: EventLog::new(),
                callbacks: StdMutex::new(Callbacks::default()),
                callback_tasks: AsyncMutex::new(Vec::new()),
                created_at: cron_oracle::now(),
                tick_interval,
                shutting_down: AtomicBool::new(false),
                running: AtomicBool::new(false),
            }),
        }
    }

    // ---- registration & queries -----------------------------------------

    /// Registers a job body under `name` (or `body.id()` if `name` is
    /// `None`), optionally bound to a cron expression.
    pub async fn register(
        &self,
        body: Arc<dyn JobContract>,
        cron: Option<String>,
        name: Option<String>,
    ) -> SupervisorResult<()> {
        let name = name.unwrap_or_else(|| body.id());
        let enabled = true;
        let definition = JobDefinition {
            name: name.clone(),
            body,
            cron: cron.clone(),
            enabled,
        };
        self.inner.registry.insert(definition).await?;
        self.append_event(EventType::JobRegistered, &name, cron, enabled, None);
        Ok(())
    }

    /// Fetches the observable state of one job.
    pub async fn get(&self, name: &str) -> SupervisorResult<JobInfo> {
        self.inner.registry.with_record(name, |r| r.info()).await
    }

    /// Lists every registered job, in registration order.
    pub async fn list(&self) -> Vec<JobInfo> {
        self.inner
            .registry
            .with_all(|records| records.iter().map(|r| r.info()).collect())
            .await
    }

    /// A best-effort consistent snapshot of the whole supervisor.
    pub async fn state(&self) -> StateSnapshot {
        StateSnapshot {
            created_at: self.inner.created_at,
            jobs_info: self.list().await,
        }
    }

    // ---- start / cancel ---------------------------------------------------

    /// Explicitly starts a job, failing if it's already `running`.
    pub async fn start(&self, name: &str) -> SupervisorResult<()> {
        let name_owned = name.to_string();

        let (body, token, cron_expr, enabled) = self
            .inner
            .registry
            .with_record_mut(name, move |record| {
                if record.status == JobStatus::Running {
                    return Err(SupervisorError::JobAlreadyRunning(name_owned.clone()));
                }
                let token = CancellationToken::new();
                record.status = JobStatus::Running;
                record.last_start = Some(cron_oracle::now());
                record.running_handle = Some(RunningHandle {
                    cancel: token.clone(),
                });
                Ok((
                    Arc::clone(&record.definition.body),
                    token,
                    record.definition.cron.clone(),
                    record.definition.enabled,
                ))
            })
            .await??;

        self.append_event(EventType::JobStarted, name, cron_expr, enabled, None);
        self.fire_name_callback(self.get_callback(|c| c.on_job_started.clone()), name.to_string())
            .await;

        let inner = Arc::clone(&self.inner);
        let job_name = name.to_string();
        let token_for_run = token.clone();
        tokio::spawn(async move {
            let result = body.run(token_for_run).await;
            Supervisor { inner }.dispatch(&job_name, result, token).await;
        });

        Ok(())
    }

    /// Requests cooperative cancellation of a running job.
    ///
    /// Returns `true` if a cancellation signal was actually delivered to a
    /// live running task, `false` if the job had no running handle to signal.
    pub async fn cancel(&self, name: &str) -> SupervisorResult<bool> {
        let token = self
            .inner
            .registry
            .with_record(name, |record| {
                if record.status != JobStatus::Running {
                    return Err(SupervisorError::JobNotRunning(name.to_string()));
                }
                Ok(record.running_handle.as_ref().map(|h| h.cancel.clone()))
            })
            .await??;

        match token {
            Some(token) => {
                token.cancel();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Invoked when a spawned job task reaches a terminal state. Classifies
    /// the outcome, mutates the record, appends the event, and fires the
    /// matching user callback.
    async fn dispatch(&self, name: &str, result: anyhow::Result<()>, cancel: CancellationToken) {
        let now = cron_oracle::now();
        let cancelled = cancel.is_cancelled();
        let error_for_callback = if !cancelled {
            result.as_ref().err().map(|e| Arc::new(anyhow::anyhow!("{e:#}")))
        } else {
            None
        };

        let outcome = self
            .inner
            .registry
            .with_record_mut(name, |record| {
                let previous = record.status;
                record.running_handle = None;
                record.last_finish = Some(now);
                record.last_status = Some(previous);
                let cron_expr = record.definition.cron.clone();
                let enabled = record.definition.enabled;

                if cancelled {
                    record.status = JobStatus::Cancelled;
                    record.next_start_ts = None;
                    (EventType::JobCancelled, cron_expr, enabled, None::<String>)
                } else {
                    match &result {
                        Ok(()) => {
                            record.status = JobStatus::Finished;
                            record.next_start_ts = cron_expr.as_deref().map(|expr| {
                                now + ChronoDuration::seconds(cron_oracle::next_delay(expr, now))
                            });
                            (EventType::JobFinished, cron_expr, enabled, None)
                        }
                        Err(err) => {
                            record.status = JobStatus::Failed;
                            record.next_start_ts = None;
                            (EventType::JobFailed, cron_expr, enabled, Some(err.to_string()))
                        }
                    }
                }
            })
            .await;

        let Ok((event_type, cron_expr, enabled, error_msg)) = outcome else {
            // The record vanished under us (only possible via a `clear()`
            // concurrent with a terminating job). Nothing left to update.
            return;
        };

        self.append_event(event_type, name, cron_expr, enabled, error_msg);

        match event_type {
            EventType::JobCancelled => {
                self.fire_name_callback(
                    self.get_callback(|c| c.on_job_cancelled.clone()),
                    name.to_string(),
                )
                .await
            }
            EventType::JobFinished => {
                self.fire_name_callback(
                    self.get_callback(|c| c.on_job_finished.clone()),
                    name.to_string(),
                )
                .await
            }
            EventType::JobFailed => {
                if let Some(err) = error_for_callback {
                    self.fire_exception_callback(
                        self.get_callback(|c| c.on_job_exception.clone()),
                        name.to_string(),
                        err,
                    )
                    .await
                }
            }
            EventType::JobRegistered | EventType::JobStarted => unreachable!(
                "dispatch only ever appends terminal events"
            ),
        }
    }

    // ---- run / shutdown -----------------------------------------------------

    /// Enters the scheduler tick loop. Idempotent: a second concurrent call
    /// logs a warning and returns immediately without starting another loop.
    ///
    /// If `initial_state` is given, known job names have their observable
    /// fields overlaid from it before the loop starts; unknown names are
    /// ignored with a warning.
    pub async fn run(&self, initial_state: Option<StateSnapshot>) {
        if self
            .inner
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::warn!("Supervisor::run called while already running; ignoring");
            return;
        }

        self.inner.shutting_down.store(false, Ordering::SeqCst);

        if let Some(state) = initial_state {
            self.hydrate(state).await;
        }

        self.fire_noarg_callback(self.get_callback(|c| c.on_startup.clone())).await;

        loop {
            if self.inner.shutting_down.load(Ordering::SeqCst) {
                break;
            }

            self.tick().await;

            tokio::time::sleep(self.inner.tick_interval).await;
        }

        self.inner.running.store(false, Ordering::SeqCst);
    }

    /// One iteration of the scheduler: promotes `registered` jobs to
    /// `pending`, and starts any `pending`/`finished` job whose
    /// `next_start_ts` has elapsed.
    async fn tick(&self) {
        let t = cron_oracle::now();
        let shutting_down = self.inner.shutting_down.load(Ordering::SeqCst);

        let due = self
            .inner
            .registry
            .with_all_mut(|records| {
                let mut due = Vec::new();
                for record in records.iter_mut() {
                    match record.status {
                        JobStatus::Registered => {
                            let delta = record
                                .definition
                                .cron
                                .as_deref()
                                .map(|expr| cron_oracle::next_delay(expr, t))
                                .unwrap_or(0);
                            record.status = JobStatus::Pending;
                            record.next_start_ts = Some(t + ChronoDuration::seconds(delta));
                        }
                        JobStatus::Pending | JobStatus::Finished if !shutting_down => {
                            if let Some(next) = record.next_start_ts {
                                if next <= t {
                                    due.push(record.definition.name.clone());
                                }
                            }
                        }
                        _ => {}
                    }
                }
                due
            })
            .await;

        for name in due {
            if let Err(err) = self.start(&name).await {
                tracing::warn!(job = %name, error = %err, "scheduler failed to start due job");
            }
        }
    }

    /// Idempotently stops the tick loop: cancels every running task,
    /// drains outstanding lifecycle callbacks (bounded by a grace period),
    /// and invokes `on_shutdown`.
    pub async fn shutdown(&self) {
        if self
            .inner
            .shutting_down
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!("Supervisor::shutdown called again; ignoring");
            return;
        }

        let running_tokens = self
            .inner
            .registry
            .with_all(|records| {
                records
                    .iter()
                    .filter_map(|r| r.running_handle.as_ref().map(|h| h.cancel.clone()))
                    .collect::<Vec<_>>()
            })
            .await;
        for token in running_tokens {
            token.cancel();
        }

        let tasks = {
            let mut guard = self.inner.callback_tasks.lock().await;
            std::mem::take(&mut *guard)
        };
        let drain = async {
            for task in tasks {
                let _ = task.await;
            }
        };
        if tokio::time::timeout(SHUTDOWN_GRACE, drain).await.is_err() {
            tracing::warn!("shutdown grace period elapsed before all callbacks drained");
        }

        self.fire_noarg_callback(self.get_callback(|c| c.on_shutdown.clone())).await;
    }

    async fn hydrate(&self, state: StateSnapshot) {
        for info in state.jobs_info {
            let result = self
                .inner
                .registry
                .with_record_mut(&info.name, |record| {
                    record.status = info.last_status;
                    record.last_finish = info.stopped_at;
                    record.created_at = info.created_at;
                })
                .await;
            if result.is_err() {
                tracing::warn!(job = %info.name, "hydration referenced unknown job; ignoring");
            }
        }
    }

    // ---- event log ---------------------------------------------------------

    /// Starts a fresh, independent subscription over the event log, at
    /// cursor 0.
    pub fn stream_events(&self) -> EventSubscription {
        EventSubscription {
            supervisor: self.clone(),
            cursor: 0,
        }
    }

    fn append_event(
        &self,
        event_type: EventType,
        job_name: &str,
        cron: Option<String>,
        enabled: bool,
        error: Option<String>,
    ) {
        self.inner.event_log.append(EventRecord {
            event_type,
            job_name: job_name.to_string(),
            crontab: cron,
            enabled,
            error,
            timestamp: cron_oracle::now().timestamp(),
        });
    }

    // ---- callback setters ----------------------------------------------------

    pub fn on_startup(&self, cb: NoArgCallback) {
        self.inner.callbacks.lock().expect("callbacks mutex poisoned").on_startup = Some(cb);
    }

    pub fn on_shutdown(&self, cb: NoArgCallback) {
        self.inner.callbacks.lock().expect("callbacks mutex poisoned").on_shutdown = Some(cb);
    }

    pub fn on_job_started(&self, cb: NameCallback) {
        self.inner.callbacks.lock().expect("callbacks mutex poisoned").on_job_started = Some(cb);
    }

    pub fn on_job_finished(&self, cb: NameCallback) {
        self.inner.callbacks.lock().expect("callbacks mutex poisoned").on_job_finished = Some(cb);
    }

    pub fn on_job_cancelled(&self, cb: NameCallback) {
        self.inner.callbacks.lock().expect("callbacks mutex poisoned").on_job_cancelled = Some(cb);
    }

    pub fn on_job_exception(&self, cb: ExceptionCallback) {
        self.inner.callbacks.lock().expect("callbacks mutex poisoned").on_job_exception = Some(cb);
    }

    fn get_callback<T>(&self, f: impl FnOnce(&Callbacks) -> Option<T>) -> Option<T> {
        let guard = self.inner.callbacks.lock().expect("callbacks mutex poisoned");
        f(&guard)
    }

    async fn fire_noarg_callback(&self, cb: Option<NoArgCallback>) {
        if let Some(cb) = cb {
            let handle = tokio::spawn(cb());
            self.track(handle).await;
        }
    }

    async fn fire_name_callback(&self, cb: Option<NameCallback>, name: String) {
        if let Some(cb) = cb {
            let handle = tokio::spawn(cb(name));
            self.track(handle).await;
        }
    }

    async fn fire_exception_callback(
        &self,
        cb: Option<ExceptionCallback>,
        name: String,
        err: Arc<anyhow::Error>,
    ) {
        if let Some(cb) = cb {
            let handle = tokio::spawn(cb(name, err));
            self.track(handle).await;
        }
    }

    async fn track(&self, handle: JoinHandle<()>) {
        self.inner.callback_tasks.lock().await.push(handle);
    }
}

/// A per-subscriber cursor over the supervisor's event log.
///
/// Calling [`next_batch`](Self::next_batch) in a loop yields an infinite,
/// bounded-latency sequence of events: it returns immediately with anything
/// new since the last call, or sleeps briefly before returning an empty
/// batch. Owns a cloned `Supervisor` handle rather than borrowing one, so it
/// can outlive the request that created it, the shape the HTTP log-stream
/// route needs.
pub struct EventSubscription {
    supervisor: Supervisor,
    cursor: usize,
}

impl EventSubscription {
    /// Returns the next batch of events, suspending briefly when none are
    /// available yet.
    pub async fn next_batch(&mut self) -> Vec<EventRecord> {
        let (batch, new_cursor) = self.supervisor.inner.event_log.poll(self.cursor);
        self.cursor = new_cursor;
        if batch.is_empty() {
            tokio::time::sleep(event_log::poll_interval()).await;
        }
        batch
    }
}
