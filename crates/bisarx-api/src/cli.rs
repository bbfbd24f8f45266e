//! CLI command definitions for the `bisarx` binary.
//!
//! Uses clap derive macros for argument parsing.

use clap::{Parser, Subcommand};

/// Chat backend for the Bisarx health assistant.
#[derive(Parser)]
#[command(name = "bisarx", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the REST API server.
    Serve {
        /// Port to listen on (defaults to config.toml, then 8000).
        #[arg(long, short)]
        port: Option<u16>,

        /// Host to bind to (defaults to config.toml, then 127.0.0.1).
        #[arg(long)]
        host: Option<String>,
    },

    /// Apply pending database migrations and exit.
    Migrate,

    /// Manage user accounts.
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
pub enum UserAction {
    /// Allow a user to log in again.
    Activate {
        #[arg(long)]
        email: String,
    },

    /// Block a user from logging in; existing tokens stop working.
    Deactivate {
        #[arg(long)]
        email: String,
    },
}

/// Level filter for the given verbosity flags. `RUST_LOG` takes precedence.
pub fn log_filter(quiet: bool, verbose: u8) -> &'static str {
    match verbose {
        0 if quiet => "error",
        0 => "info",
        1 => "info,bisarx_api=debug,bisarx_core=debug,bisarx_infra=debug",
        _ => "trace",
    }
}
