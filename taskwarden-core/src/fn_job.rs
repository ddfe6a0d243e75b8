use crate::CoreResult;
use crate::contracts::JobContract;
use async_trait::async_trait;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

type RunnableFunc = Arc<
    dyn Fn(CancellationToken) -> Pin<Box<dyn Future<Output = CoreResult<()>> + Send>>
        + Send
        + Sync,
>;

/// A lightweight, closure-based implementation of [`JobContract`].
///
/// `FnJob` allows registering arbitrary `async fn`s or closures as jobs without
/// defining a new struct that implements [`JobContract`]. It also supports
/// **blocking** (synchronous) functions via `tokio::task::spawn_blocking`.
///
/// ## Example: Async Job
/// ```
/// use taskwarden_core::FnJob;
///
/// let job = FnJob::new("heartbeat", |_cancel| async {
///     println!("Heartbeat ping");
///     Ok(())
/// });
/// ```
///
/// ## Example: Blocking Job
/// ```
/// use taskwarden_core::FnJob;
///
/// let job = FnJob::new_blocking("backup", || {
///     std::thread::sleep(std::time::Duration::from_millis(10));
///     Ok(())
/// });
/// ```
pub struct FnJob {
    id: String,
    func: RunnableFunc,
}

#[async_trait]
impl JobContract for FnJob {
    async fn run(&self, cancel: CancellationToken) -> CoreResult<()> {
        (self.func)(cancel).await
    }

    fn id(&self) -> String {
        self.id.clone()
    }
}

impl FnJob {
    /// Creates a new `FnJob` from an async closure or function.
    ///
    /// # Parameters
    /// - `id`: a stable identifier for this job, used as its default registry name.
    /// - `func`: an async closure or function, receiving the cooperative cancellation
    ///   token, to run when the job is triggered.
    pub fn new<F, Fut>(id: impl Into<String>, func: F) -> Self
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CoreResult<()>> + Send + 'static,
    {
        Self {
            id: id.into(),
            func: Arc::new(move |cancel| Box::pin(func(cancel))),
        }
    }

    /// Creates a new `FnJob` from a **blocking** function.
    ///
    /// The function runs inside `tokio::task::spawn_blocking` to avoid blocking
    /// the async runtime. Blocking bodies cannot poll the cancellation token;
    /// they run to completion once spawned.
    ///
    /// # Parameters
    /// - `id`: a stable identifier for this job.
    /// - `func`: a blocking function that returns `CoreResult<()>`.
    pub fn new_blocking<F>(id: impl Into<String>, func: F) -> Self
    where
        F: Fn() -> CoreResult<()> + Send + Sync + 'static + Clone,
    {
        Self {
            id: id.into(),
            func: Arc::new(move |_cancel| {
                let f = func.clone();
                Box::pin(async move { tokio::task::spawn_blocking(f).await? })
            }),
        }
    }
}
