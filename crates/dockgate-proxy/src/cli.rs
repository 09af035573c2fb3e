//! Command-line overrides for the handful of settings that make sense as
//! flags during local runs. The environment remains the canonical
//! configuration channel; see `config.rs`.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Default)]
#[command(name = "dockgate-proxy")]
#[command(about = "Per-tenant authorizing reverse proxy for a container engine's HTTP API", long_about = None)]
pub struct Cli {
    /// Listen address (overrides the default, environment is otherwise primary)
    #[arg(short = 'l', long)]
    pub listen: Option<String>,

    /// Listen port
    #[arg(short = 'P', long)]
    pub port: Option<u16>,

    /// Path to the engine's Unix domain socket
    #[arg(short, long)]
    pub socket: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
impl Cli {
    pub fn default_for_test() -> Self {
        Self::default()
    }
}
