//! Type aliases for the Supervisor's optional lifecycle callbacks.
//!
//! Every callback is fire-and-forget from the dispatcher's perspective: it is
//! spawned as an independent task and its outcome never feeds back into a
//! job's own state.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub type BoxFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

pub type NoArgCallback = Arc<dyn Fn() -> BoxFuture + Send + Sync>;
pub type NameCallback = Arc<dyn Fn(String) -> BoxFuture + Send + Sync>;
pub type ExceptionCallback = Arc<dyn Fn(String, Arc<anyhow::Error>) -> BoxFuture + Send + Sync>;

/// Collected optional hooks invoked by the Supervisor at the points named by
/// each field. Absence is a no-op; `Supervisor`'s setters populate these.
#[derive(Default, Clone)]
pub struct Callbacks {
    pub on_startup: Option<NoArgCallback>,
    pub on_shutdown: Option<NoArgCallback>,
    pub on_job_started: Option<NameCallback>,
    pub on_job_finished: Option<NameCallback>,
    pub on_job_cancelled: Option<NameCallback>,
    pub on_job_exception: Option<ExceptionCallback>,
}
