//! End-to-end lifecycle scenarios: register, start, cancel, fail, finish.

use anyhow::anyhow;
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use taskwarden_core::contracts::JobContract;
use taskwarden_core::model::{EventType, JobStatus};
use taskwarden_core::{CoreResult, FnJob, Supervisor};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

/// A job that sleeps for `delay` then optionally errors, and records how
/// many times it observed cancellation.
struct SleepJob {
    id: &'static str,
    delay: Duration,
    should_fail: bool,
    run_count: Arc<AtomicUsize>,
    was_cancelled: Arc<AtomicBool>,
}

impl SleepJob {
    fn new(id: &'static str, delay: Duration) -> (Arc<Self>, Arc<AtomicUsize>) {
        let run_count = Arc::new(AtomicUsize::new(0));
        let job = Arc::new(Self {
            id,
            delay,
            should_fail: false,
            run_count: run_count.clone(),
            was_cancelled: Arc::new(AtomicBool::new(false)),
        });
        (job, run_count)
    }

    fn failing(id: &'static str, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            id,
            delay,
            should_fail: true,
            run_count: Arc::new(AtomicUsize::new(0)),
            was_cancelled: Arc::new(AtomicBool::new(false)),
        })
    }
}

#[async_trait]
impl JobContract for SleepJob {
    async fn run(&self, cancel: CancellationToken) -> CoreResult<()> {
        self.run_count.fetch_add(1, Ordering::SeqCst);
        tokio::select! {
            _ = tokio::time::sleep(self.delay) => {}
            _ = cancel.cancelled() => {
                self.was_cancelled.store(true, Ordering::SeqCst);
                return Ok(());
            }
        }
        if self.should_fail {
            Err(anyhow!("err"))
        } else {
            Ok(())
        }
    }

    fn id(&self) -> String {
        self.id.to_string()
    }
}

#[tokio::test]
async fn cron_less_job_completes_without_reschedule() {
    let supervisor = Supervisor::new();
    let (job, run_count) = SleepJob::new("task1", Duration::from_millis(50));
    supervisor.register(job, None, None).await.unwrap();

    supervisor.start("task1").await.unwrap();
    let info = supervisor.get("task1").await.unwrap();
    assert_eq!(info.last_status, JobStatus::Running);

    timeout(Duration::from_secs(2), async {
        loop {
            if supervisor.get("task1").await.unwrap().last_status != JobStatus::Running {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    let info = supervisor.get("task1").await.unwrap();
    assert_eq!(info.last_status, JobStatus::Finished);
    assert_eq!(info.next_run_in, None);
    assert_eq!(run_count.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn starting_already_running_job_fails() {
    let supervisor = Supervisor::new();
    let (job, _) = SleepJob::new("task1", Duration::from_millis(300));
    supervisor.register(job, None, None).await.unwrap();

    supervisor.start("task1").await.unwrap();
    let err = supervisor.start("task1").await.unwrap_err();
    assert!(matches!(err, taskwarden_core::SupervisorError::JobAlreadyRunning(_)));
}

#[tokio::test]
async fn cancelling_non_running_job_fails() {
    let supervisor = Supervisor::new();
    let (job, _) = SleepJob::new("task1", Duration::from_millis(50));
    supervisor.register(job, None, None).await.unwrap();

    let err = supervisor.cancel("task1").await.unwrap_err();
    assert!(matches!(err, taskwarden_core::SupervisorError::JobNotRunning(_)));
}

#[tokio::test]
async fn cancelling_running_job_transitions_to_cancelled() {
    let supervisor = Supervisor::new();
    let (job, _) = SleepJob::new("task1", Duration::from_secs(30));
    supervisor.register(job, None, None).await.unwrap();

    supervisor.start("task1").await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    let delivered = supervisor.cancel("task1").await.unwrap();
    assert!(delivered);

    timeout(Duration::from_secs(2), async {
        loop {
            if supervisor.get("task1").await.unwrap().last_status == JobStatus::Cancelled {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn failing_body_transitions_to_failed_and_logs_error() {
    let supervisor = Supervisor::new();
    let job = SleepJob::failing("task", Duration::from_millis(20));
    supervisor.register(job, None, None).await.unwrap();

    supervisor.start("task").await.unwrap();

    timeout(Duration::from_secs(2), async {
        loop {
            if supervisor.get("task").await.unwrap().last_status == JobStatus::Failed {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    let mut stream = supervisor.stream_events();
    let mut saw_failed = false;
    for _ in 0..10 {
        let batch = tokio::time::timeout(Duration::from_millis(100), stream.next_batch())
            .await
            .unwrap_or_default();
        for event in batch {
            if event.event_type == EventType::JobFailed && event.job_name == "task" {
                assert_eq!(event.error.as_deref(), Some("err"));
                saw_failed = true;
            }
        }
        if saw_failed {
            break;
        }
    }
    assert!(saw_failed, "expected a job_failed event for 'task'");
}

#[tokio::test]
async fn registering_duplicate_name_fails_and_leaves_existing_record() {
    let supervisor = Supervisor::new();
    let (job_a, _) = SleepJob::new("dup", Duration::from_millis(10));
    supervisor.register(job_a, None, None).await.unwrap();

    let (job_b, _) = SleepJob::new("dup", Duration::from_millis(10));
    let err = supervisor.register(job_b, None, None).await.unwrap_err();
    assert!(matches!(err, taskwarden_core::SupervisorError::JobAlreadyExists(_)));

    let info = supervisor.get("dup").await.unwrap();
    assert_eq!(info.last_status, JobStatus::Registered);
}

#[tokio::test]
async fn fn_job_closure_runs_and_observes_cancellation_token() {
    let supervisor = Supervisor::new();
    let observed = Arc::new(AtomicBool::new(false));
    let observed_clone = observed.clone();

    let job = FnJob::new("fn-job", move |cancel| {
        let observed = observed_clone.clone();
        async move {
            observed.store(cancel.is_cancelled(), Ordering::SeqCst);
            Ok(())
        }
    });

    supervisor.register(Arc::new(job), None, None).await.unwrap();
    supervisor.start("fn-job").await.unwrap();

    timeout(Duration::from_secs(1), async {
        loop {
            if supervisor.get("fn-job").await.unwrap().last_status == JobStatus::Finished {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    assert!(!observed.load(Ordering::SeqCst));
}
