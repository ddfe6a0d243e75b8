//! Cron-style async job supervisor.
//!
//! Jobs are opaque [`JobContract`] implementors, optionally bound to a cron
//! expression. A [`Supervisor`] drives registered jobs through
//! `registered → pending → running → finished/failed/cancelled`, records
//! every transition in an append-only event log, and exposes itself to an
//! external control plane via a small, cloneable handle.
//!
//! ```no_run
//! use std::sync::Arc;
//! use taskwarden_core::{FnJob, Supervisor};
//!
//! #[tokio::main]
//! async fn main() {
//!     let supervisor = Supervisor::new();
//!
//!     let job = FnJob::new("heartbeat", |_cancel| async {
//!         println!("ping");
//!         Ok(())
//!     });
//!     supervisor
//!         .register(Arc::new(job), Some("*/10 * * * * * *".into()), None)
//!         .await
//!         .unwrap();
//!
//!     supervisor.run(None).await;
//! }
//! ```

pub mod callbacks;
pub mod contracts;
mod cron_oracle;
pub mod error;
mod event_log;
mod fn_job;
pub mod model;
mod registry;
mod supervisor;

pub use cron_oracle::{next_delay, now};
pub use error::{SupervisorError, SupervisorResult};
pub use fn_job::FnJob;
pub use supervisor::{EventSubscription, Supervisor};

/// The result type returned by job bodies: an opaque, user-supplied error
/// channel the dispatcher never inspects beyond `is_ok()`/`Display`.
pub type CoreResult<T> = anyhow::Result<T>;
