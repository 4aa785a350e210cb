//! Command-line interface.
//!
//! `serve` (the default) runs the HTTP server; `demo` answers a single
//! next-departure query and exits.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::nextrip::{
    DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS, MockNexTrip, NexTripClient, NexTripConfig,
    NexTripError, NexTripSource,
};

/// Default server port.
pub const DEFAULT_PORT: u16 = 8080;

/// NexTrip API wrapper and demo server
#[derive(Parser, Debug)]
#[command(name = "nextrip-server")]
#[command(about = "Cached NexTrip API proxy and next-departure lookup")]
#[command(version)]
pub struct Cli {
    /// Enable verbose (debug) logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// NexTrip API base URL
    #[arg(long, env = "NEXTRIP_BASE_URL", default_value = DEFAULT_BASE_URL, global = true)]
    pub base_url: String,

    /// Upstream request timeout in seconds
    #[arg(long, env = "NEXTRIP_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS, global = true)]
    pub timeout_secs: u64,

    /// Serve fixtures from this directory instead of calling the API
    #[arg(long, value_name = "DIR", global = true)]
    pub mock_data: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Run the HTTP server
    Serve {
        /// Address to bind
        #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
        host: IpAddr,

        /// Port to listen on
        #[arg(long, default_value_t = DEFAULT_PORT)]
        port: u16,
    },

    /// Print minutes until the next departure
    ///
    /// Example: nextrip-server demo "METRO Blue Line" "Target Field Station Platform 1" south
    Demo {
        /// Route name (or part of it)
        route: String,

        /// Stop name (or part of it)
        stop: String,

        /// Direction: north, east, south or west
        direction: String,
    },
}

impl Cli {
    /// The subcommand to run, defaulting to `serve`.
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
        })
    }

    /// Default log filter when `RUST_LOG` is unset.
    pub fn log_filter(&self) -> &'static str {
        if self.debug {
            "nextrip_server=debug,tower_http=debug,info"
        } else {
            "info"
        }
    }

    /// Build the upstream source: fixtures if `--mock-data` is set, else the live API.
    pub fn source(&self) -> Result<Arc<dyn NexTripSource>, NexTripError> {
        Ok(match &self.mock_data {
            Some(dir) => Arc::new(MockNexTrip::new(dir)?),
            None => {
                let config = NexTripConfig::new()
                    .with_base_url(&self.base_url)
                    .with_timeout(self.timeout_secs);
                Arc::new(NexTripClient::new(config)?)
            }
        })
    }
}

impl Command {
    /// Socket address for `serve`.
    pub fn addr(&self) -> Option<SocketAddr> {
        match self {
            Command::Serve { host, port } => Some(SocketAddr::new(*host, *port)),
            Command::Demo { .. } => None,
        }
    }
}

/// Format a minute count for the `demo` subcommand, e.g. "1 Minute".
pub fn format_minutes(minutes: i64) -> String {
    let plural = if minutes == 1 { "" } else { "s" };
    format!("{minutes} Minute{plural}")
}
