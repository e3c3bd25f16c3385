//! CLI module for the FlowForge operator console
//!
//! Command-line interface definitions and handlers.
//!
//! # Commands
//!
//! - `watch` - Follow the controller live (polls + push stream)
//! - `incidents` - One-shot incidents listing
//! - `slo` - One-shot lifecycle SLO verdict
//! - `trace` - Correlate every event recorded under a request id
//! - `kill` - Ask the controller to stop the supervised process
//! - `restart` - Ask the controller to restart the last command
//!
//! # Example
//!
//! ```bash
//! # Follow a specific incident from the start
//! flowforge-console watch --incident inc-42
//!
//! # Machine-readable SLO verdict
//! flowforge-console slo --json
//! ```

pub mod actions;
pub mod incidents;
pub mod output;
pub mod slo;
pub mod trace;
pub mod watch;

use crate::config::ConsoleConfig;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// FlowForge operator console
#[derive(Parser, Debug)]
#[command(
    name = "flowforge-console",
    version,
    about = "Operator console for the FlowForge process-supervision controller"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Follow the controller live
    Watch(WatchArgs),
    /// List recorded incidents
    Incidents(IncidentsArgs),
    /// Show the lifecycle SLO verdict
    Slo(SloArgs),
    /// Correlate events by request id
    Trace(TraceArgs),
    /// Stop the supervised process
    Kill(ActionArgs),
    /// Restart the last supervised command
    Restart(RestartArgs),
}

/// Options shared by every command that talks to the controller.
#[derive(Args, Debug, Clone)]
pub struct ConnectArgs {
    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override the controller API base URL
    #[arg(long, env = "FLOWFORGE_CONSOLE_API_BASE")]
    pub api_base: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "FLOWFORGE_CONSOLE_LOG_LEVEL")]
    pub log_level: Option<String>,
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,

    /// Incident to select initially (deep-link equivalent)
    #[arg(short, long)]
    pub incident: Option<String>,

    /// Console URL used to build shareable deep links
    #[arg(long)]
    pub console_url: Option<String>,

    /// Session file remembering the API key and last selection across runs
    #[arg(long, env = "FLOWFORGE_CONSOLE_SESSION")]
    pub session: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct IncidentsArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct SloArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct TraceArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,

    /// Request id to correlate
    pub request_id: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ActionArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,
}

#[derive(Args, Debug)]
pub struct RestartArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,

    /// Reason recorded with the restart
    #[arg(short, long, default_value = "console manual restart")]
    pub reason: String,
}

/// Load configuration for a command: file (when given), then environment,
/// then CLI overrides, validated last.
pub fn load_config(connect: &ConnectArgs) -> anyhow::Result<ConsoleConfig> {
    let mut config = ConsoleConfig::load(connect.config.as_deref())?.with_env_overrides();
    if let Some(base) = &connect.api_base {
        config.base_url = base.clone();
    }
    if let Some(level) = &connect.log_level {
        config.logging.level = level.clone();
    }
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parse_watch_defaults() {
        let cli = Cli::try_parse_from(["flowforge-console", "watch"]).unwrap();
        match cli.command {
            Commands::Watch(args) => {
                assert!(args.connect.config.is_none());
                assert!(args.incident.is_none());
            }
            _ => panic!("Expected Watch command"),
        }
    }

    #[test]
    fn parse_watch_with_incident() {
        let cli = Cli::try_parse_from(["flowforge-console", "watch", "-i", "inc-42"]).unwrap();
        match cli.command {
            Commands::Watch(args) => assert_eq!(args.incident.as_deref(), Some("inc-42")),
            _ => panic!("Expected Watch command"),
        }
    }

    #[test]
    fn parse_incidents_json() {
        let cli = Cli::try_parse_from(["flowforge-console", "incidents", "--json"]).unwrap();
        match cli.command {
            Commands::Incidents(args) => assert!(args.json),
            _ => panic!("Expected Incidents command"),
        }
    }

    #[test]
    fn parse_trace_requires_request_id() {
        assert!(Cli::try_parse_from(["flowforge-console", "trace"]).is_err());
        let cli = Cli::try_parse_from(["flowforge-console", "trace", "req_9"]).unwrap();
        match cli.command {
            Commands::Trace(args) => assert_eq!(args.request_id, "req_9"),
            _ => panic!("Expected Trace command"),
        }
    }

    #[test]
    fn parse_restart_default_reason() {
        let cli = Cli::try_parse_from(["flowforge-console", "restart"]).unwrap();
        match cli.command {
            Commands::Restart(args) => {
                assert_eq!(args.reason, "console manual restart");
            }
            _ => panic!("Expected Restart command"),
        }
    }

    #[test]
    fn connect_args_override_config() {
        let cli = Cli::try_parse_from([
            "flowforge-console",
            "slo",
            "--api-base",
            "http://controller:9000",
        ])
        .unwrap();
        match cli.command {
            Commands::Slo(args) => {
                let config = load_config(&args.connect).unwrap();
                assert_eq!(config.base_url, "http://controller:9000");
            }
            _ => panic!("Expected Slo command"),
        }
    }
}
