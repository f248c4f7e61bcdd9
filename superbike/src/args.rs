use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Superbike avatar generator
#[derive(Debug, Parser)]
#[command(name = "superbike", about = "Turn a photo into a branded superbike avatar")]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "superbike.toml", env = "SUPERBIKE_CONFIG", global = true)]
    pub config: PathBuf,

    /// Override the listen address
    #[arg(long, env = "SUPERBIKE_LISTEN", global = true)]
    pub listen: Option<SocketAddr>,

    /// Log filter, in `RUST_LOG` syntax
    #[arg(long, default_value = "info", env = "SUPERBIKE_LOG", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP server (default)
    Serve,

    /// Generate one avatar from a local photo
    Generate {
        /// PNG or JPEG photo of the subject
        #[arg(short, long)]
        input: PathBuf,

        /// Where to write the branded PNG
        #[arg(short, long)]
        output: PathBuf,

        /// Configured provider to use instead of the default
        #[arg(short, long)]
        provider: Option<String>,
    },
}
