//! Resolves the parsed [`Cli`] into the typed values the rest of the binary
//! actually wants (a socket address, a `Duration`), separating "what the
//! user typed" from "what we run with".

use crate::cli::Cli;
use anyhow::Context;
use std::net::SocketAddr;
use std::time::Duration;

pub struct Config {
    pub bind_addr: SocketAddr,
    pub tick_interval: Duration,
    pub log_level: String,
    pub log_format: crate::cli::LogFormat,
}

impl Config {
    pub fn from_cli(cli: Cli) -> anyhow::Result<Self> {
        let bind_addr = format!("{}:{}", cli.host, cli.port)
            .parse()
            .with_context(|| format!("invalid bind address {}:{}", cli.host, cli.port))?;

        Ok(Self {
            bind_addr,
            tick_interval: Duration::from_millis(cli.tick_interval_ms),
            log_level: cli.log_level,
            log_format: cli.log_format,
        })
    }
}
