//! Command-line surface. Every flag has an environment-variable fallback, so
//! the binary is equally at home behind `docker run -e` and a shell prompt.

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "taskwarden", about = "In-process job supervisor with an HTTP control plane")]
pub struct Cli {
    /// Address the HTTP control plane binds to.
    #[arg(long, env = "TASKWARDEN_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port the HTTP control plane binds to.
    #[arg(long, env = "TASKWARDEN_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Scheduler tick interval, in milliseconds.
    #[arg(long, env = "TASKWARDEN_TICK_INTERVAL_MS", default_value_t = 1500)]
    pub tick_interval_ms: u64,

    /// Minimum log level, overridden by `RUST_LOG` when set.
    #[arg(long, env = "TASKWARDEN_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format.
    #[arg(long, env = "TASKWARDEN_LOG_FORMAT", default_value_t = LogFormat::Compact, value_enum)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LogFormat::Compact => "compact",
            LogFormat::Pretty => "pretty",
            LogFormat::Json => "json",
        };
        f.write_str(s)
    }
}
