use crate::CoreResult;
use tokio_util::sync::CancellationToken;

/// A schedulable unit of asynchronous work.
///
/// Any struct or closure that implements this trait can be registered with a
/// [`Supervisor`](crate::Supervisor) and driven through the job lifecycle.
/// The `cancel` token is advisory: the supervisor signals it when an operator
/// requests cancellation, but `run` is free to ignore it and keep working.
/// Cancellation here is cooperative, not forced.
///
/// ## Required Methods
/// - `run`: the asynchronous execution logic of the job.
/// - `id`: a stable identifier, used as the default registry name.
///
/// ## Optional Method
/// - `description`: an optional human-friendly description of the job's purpose.
#[async_trait::async_trait]
pub trait JobContract: Send + Sync {
    /// Runs the job to completion.
    ///
    /// `cancel` is fired when an operator calls
    /// [`Supervisor::cancel`](crate::Supervisor::cancel) for this job; honoring
    /// it (and returning) is the implementor's responsibility.
    ///
    /// # Returns
    /// - `Ok(())` if the job completed successfully.
    /// - `Err(anyhow::Error)` if an error occurred during execution.
    async fn run(&self, cancel: CancellationToken) -> CoreResult<()>;

    /// A stable identifier for this job, used to derive its registry name
    /// when none is given explicitly at registration.
    fn id(&self) -> String;

    /// A brief optional description of the job.
    ///
    /// This can be used to give context about what the job does.
    /// Defaults to `None`.
    fn description(&self) -> Option<String> {
        None
    }
}
