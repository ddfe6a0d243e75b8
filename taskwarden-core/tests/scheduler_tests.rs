//! Scheduler tick loop: registered -> pending -> running transitions and
//! cron-driven auto-rescheduling.
//!
//! The tick loop's own sleep uses `tokio::time`, but `next_start_ts` is
//! computed from `chrono::Utc::now()`, a real wall clock unaffected by
//! `tokio::time::pause`. These tests drive the loop with a fast tick
//! interval and short real sleeps rather than a paused virtual clock.

use anyhow::anyhow;
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use taskwarden_core::contracts::JobContract;
use taskwarden_core::model::JobStatus;
use taskwarden_core::{CoreResult, Supervisor};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

struct CountingJob {
    id: &'static str,
    count: Arc<AtomicUsize>,
}

#[async_trait]
impl JobContract for CountingJob {
    async fn run(&self, _cancel: CancellationToken) -> CoreResult<()> {
        self.count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn id(&self) -> String {
        self.id.to_string()
    }
}

struct FailingOnceJob {
    id: &'static str,
}

#[async_trait]
impl JobContract for FailingOnceJob {
    async fn run(&self, _cancel: CancellationToken) -> CoreResult<()> {
        Err(anyhow!("boom"))
    }

    fn id(&self) -> String {
        self.id.to_string()
    }
}

#[tokio::test]
async fn registered_job_without_cron_transitions_to_pending_immediately() {
    let supervisor = Supervisor::with_tick_interval(Duration::from_millis(30));
    let count = Arc::new(AtomicUsize::new(0));
    supervisor
        .register(
            Arc::new(CountingJob {
                id: "job",
                count: count.clone(),
            }),
            None,
            None,
        )
        .await
        .unwrap();

    let supervisor_clone = supervisor.clone();
    let run_handle = tokio::spawn(async move { supervisor_clone.run(None).await });

    // A cron-less job only auto-starts once its `next_start_ts` is set (to
    // `now`) by the tick that observes it `registered`; it never re-fires on
    // its own after that, since it has no cron expression to reschedule from.
    timeout(Duration::from_secs(2), async {
        loop {
            if count.load(Ordering::SeqCst) >= 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    supervisor.shutdown().await;
    let _ = run_handle.await;
}

#[tokio::test]
async fn cron_job_reschedules_after_each_finish() {
    let supervisor = Supervisor::with_tick_interval(Duration::from_millis(30));
    let count = Arc::new(AtomicUsize::new(0));
    supervisor
        .register(
            Arc::new(CountingJob {
                id: "ticking",
                count: count.clone(),
            }),
            Some("*/1 * * * * * *".to_string()),
            None,
        )
        .await
        .unwrap();

    let supervisor_clone = supervisor.clone();
    let run_handle = tokio::spawn(async move { supervisor_clone.run(None).await });

    timeout(Duration::from_secs(5), async {
        loop {
            if count.load(Ordering::SeqCst) >= 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    })
    .await
    .unwrap();

    supervisor.shutdown().await;
    let _ = run_handle.await;
}

#[tokio::test]
async fn failed_cron_job_is_not_auto_rescheduled() {
    let supervisor = Supervisor::with_tick_interval(Duration::from_millis(30));
    supervisor
        .register(
            Arc::new(FailingOnceJob { id: "bad" }),
            Some("*/1 * * * * * *".to_string()),
            None,
        )
        .await
        .unwrap();

    let supervisor_clone = supervisor.clone();
    let run_handle = tokio::spawn(async move { supervisor_clone.run(None).await });

    timeout(Duration::from_secs(3), async {
        loop {
            if supervisor.get("bad").await.unwrap().last_status == JobStatus::Failed {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    // Give the scheduler a few more ticks worth of time: a failed job must
    // stay failed, never silently reappearing as pending/running.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(supervisor.get("bad").await.unwrap().last_status, JobStatus::Failed);

    supervisor.shutdown().await;
    let _ = run_handle.await;
}

#[tokio::test]
async fn run_is_idempotent_when_called_while_already_running() {
    let supervisor = Supervisor::with_tick_interval(Duration::from_millis(50));

    let supervisor_clone = supervisor.clone();
    let run_handle = tokio::spawn(async move { supervisor_clone.run(None).await });

    tokio::time::sleep(Duration::from_millis(20)).await;

    // A concurrent second call should return promptly without starting a
    // second loop.
    timeout(Duration::from_millis(500), supervisor.run(None))
        .await
        .unwrap();

    supervisor.shutdown().await;
    let _ = run_handle.await;
}

#[tokio::test]
async fn shutdown_is_idempotent() {
    let supervisor = Supervisor::with_tick_interval(Duration::from_millis(50));
    let supervisor_clone = supervisor.clone();
    let run_handle = tokio::spawn(async move { supervisor_clone.run(None).await });

    tokio::time::sleep(Duration::from_millis(20)).await;
    supervisor.shutdown().await;
    supervisor.shutdown().await;
    let _ = run_handle.await;
}
