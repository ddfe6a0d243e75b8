//! Process entry point: parses configuration, initializes logging, builds a
//! `Supervisor` with a couple of demo jobs, and drives the HTTP control
//! plane and the scheduler's `run()`/`shutdown()` lifecycle together,
//! exiting cleanly on `SIGINT`/`SIGTERM`.

mod cli;
mod config;
mod logging;

use clap::Parser;
use config::Config;
use std::sync::Arc;
use std::time::Duration;
use taskwarden_core::{FnJob, Supervisor};
use tokio::signal::unix::{SignalKind, signal};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    let config = Config::from_cli(cli)?;
    logging::init(&config.log_level, config.log_format)?;

    let supervisor = Supervisor::with_tick_interval(config.tick_interval);
    register_demo_jobs(&supervisor).await?;
    attach_lifecycle_logging(&supervisor);

    let run_task = {
        let supervisor = supervisor.clone();
        tokio::spawn(async move { supervisor.run(None).await })
    };

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!(addr = %config.bind_addr, "taskwarden listening");
    let server = axum::serve(listener, taskwarden_http::router(supervisor.clone()));

    tokio::select! {
        result = server => {
            if let Err(err) = result {
                error!(error = %err, "HTTP server exited with an error");
            }
        }
        _ = wait_for_shutdown_signal() => {
            info!("shutdown signal received");
        }
    }

    supervisor.shutdown().await;
    if let Err(err) = run_task.await {
        warn!(error = %err, "scheduler task panicked during shutdown");
    }

    Ok(())
}

async fn wait_for_shutdown_signal() {
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(err) => {
            warn!(error = %err, "failed to install SIGTERM handler; SIGINT only");
            std::future::pending().await
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = sigterm.recv() => {}
    }
}

/// Registers a couple of illustrative jobs so the binary does something
/// observable out of the box; operators wire their own jobs the same way.
async fn register_demo_jobs(supervisor: &Supervisor) -> anyhow::Result<()> {
    supervisor
        .register(
            Arc::new(FnJob::new("heartbeat", |_cancel| async move {
                info!("heartbeat");
                Ok(())
            })),
            Some("0/30 * * * * * *".to_string()),
            None,
        )
        .await?;

    supervisor
        .register(
            Arc::new(FnJob::new("housekeeping", |cancel| async move {
                tokio::select! {
                    _ = tokio::time::sleep(Duration::from_secs(2)) => Ok(()),
                    _ = cancel.cancelled() => Ok(()),
                }
            })),
            Some("0 0 * * * * *".to_string()),
            None,
        )
        .await?;

    Ok(())
}

fn attach_lifecycle_logging(supervisor: &Supervisor) {
    supervisor.on_job_started(Arc::new(|name: String| {
        Box::pin(async move { info!(job = %name, "job started") })
    }));
    supervisor.on_job_finished(Arc::new(|name: String| {
        Box::pin(async move { info!(job = %name, "job finished") })
    }));
    supervisor.on_job_cancelled(Arc::new(|name: String| {
        Box::pin(async move { warn!(job = %name, "job cancelled") })
    }));
    supervisor.on_job_exception(Arc::new(|name: String, err: Arc<anyhow::Error>| {
        Box::pin(async move { error!(job = %name, error = %err, "job raised an exception") })
    }));
}
