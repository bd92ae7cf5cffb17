//! # APIM CLI Library
//!
//! Core library functionality for the APIM CLI tool: staging of API, API
//! Product and Application artifacts and their import into an API management
//! environment.

use clap::Parser;

pub mod client;
pub mod commands;
pub mod config;
pub mod constants;
pub mod defaults;
pub mod definition;
pub mod dispatch;
pub mod envsubst;
pub mod error;
pub mod export;
pub mod inject;
pub mod locator;
pub mod merge;
pub mod package;
pub mod params;
pub mod pipeline;
pub mod remote;
pub mod validate;
pub mod workspace;

/// CLI tool for importing artifacts into an API management service
///
/// The APIM CLI takes a locally authored API, API Product or Application
/// (a directory or a zip archive), applies per-environment overrides from
/// `api_params.yaml`, validates it and uploads it to the chosen environment.
#[derive(Parser)]
#[command(
    name = "apim",
    version,
    about = "CLI tool for importing API, API Product and Application artifacts into an API management service",
    long_about = "A Rust-based command-line tool for staging and importing API management artifacts.\n\nSupports directory and zip artifacts, environment variable substitution, per-environment\nendpoint/security/certificate overrides, create-or-update imports and API Product exports."
)]
pub struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub cmd: Option<commands::Commands>,
}
