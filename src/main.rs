//! # APIM CLI
//!
//! Command-line tool for importing API, API Product and Application artifacts
//! into an API management service.
//!
//! ## Features
//!
//! - 📦 **Directory or zip artifacts** - Staged in an isolated workspace that is always cleaned up
//! - 🌍 **Per-environment overrides** - Endpoints, security, gateway environments and certificates from `api_params.yaml`
//! - 🔁 **Create or update** - Existing entities are detected and overwritten on request
//! - 🔐 **Env-based credentials** - Bearer tokens read from environment variables
//!
//! ## Quick Start
//!
//! ```bash
//! # Register an environment
//! apim env add dev --admin https://localhost:9443/api/am/admin/v0.17 \
//!   --publisher https://localhost:9443/api/am/publisher/v1 \
//!   --devportal https://localhost:9443/api/am/store/v1 --token-env APIM_DEV_TOKEN
//!
//! # Import an API
//! apim import-api -f ./PizzaAPI -e dev --update
//! ```
//!
//! ## Configuration
//!
//! Environments are stored in `~/.config/apim/main_config.yaml`, or at the
//! path given by `APIM_CONFIG_PATH`.

use anyhow::Result;
use apim_cli::{commands, Cli};
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Main entry point for the APIM CLI
///
/// Parses command-line arguments, installs the log subscriber and delegates to
/// the appropriate command handler.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cmd = cli.cmd.unwrap_or_else(|| {
        eprintln!("No command provided. Use --help to see available commands.");
        std::process::exit(1);
    });
    commands::run(cmd).await
}
