//! CLI argument definitions for the `clqy` binary.

use clap::{Parser, Subcommand};
use clap_complete::Shell;

pub mod status;
pub mod user;

/// Colloquy: quota-metered streaming chat service.
#[derive(Parser)]
#[command(name = "clqy", version, about = "Quota-metered streaming chat service")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Emit JSON instead of styled output
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a resource
    Create {
        #[command(subcommand)]
        resource: CreateResource,
    },

    /// List resources
    List {
        #[command(subcommand)]
        resource: ListResource,
    },

    /// Show service status
    Status,

    /// Start the REST API server
    Serve {
        /// Port to listen on (default from config)
        #[arg(long)]
        port: Option<u16>,

        /// Host to bind (default from config)
        #[arg(long)]
        host: Option<String>,

        /// Export spans via OpenTelemetry (stdout exporter)
        #[arg(long)]
        otel: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum CreateResource {
    /// Create a user account and print its API key (shown once)
    User {
        /// Membership tier: free, basic, premium
        #[arg(long, default_value = "free")]
        tier: String,
    },
}

#[derive(Subcommand)]
pub enum ListResource {
    /// List user accounts
    Users,
}
