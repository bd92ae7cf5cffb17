use anyhow::{Context, Result};
use clap::Args;

use crate::client::{ApimClient, EnvTokenProvider};
use crate::config::load_main_config;
use crate::export::{export_api_product, ExportRequest};

#[derive(Args, Debug)]
pub struct ExportApiProductArgs {
    /// Name of the API Product
    #[arg(short, long)]
    pub name: String,
    /// Version of the API Product (defaults to 1.0.0)
    #[arg(short, long)]
    pub version: Option<String>,
    /// Provider of the API Product
    #[arg(short, long)]
    pub provider: String,
    /// File format of the definitions in the archive (json or yaml)
    #[arg(long)]
    pub format: Option<String>,
    #[arg(short, long)]
    pub environment: String,
    /// Do not print the location of the exported archive
    #[arg(long)]
    pub quiet: bool,
}

pub async fn run(args: ExportApiProductArgs) -> Result<()> {
    let main_cfg = load_main_config()?;
    let env = main_cfg.environment(&args.environment)?.clone();
    let client = ApimClient::from_config(&main_cfg)?;

    let request = ExportRequest {
        name: args.name,
        version: args.version,
        provider: args.provider,
        format: args.format,
        environment: env,
        export_dir: main_cfg.export_directory(),
        announce: !args.quiet,
    };
    export_api_product(&client, &EnvTokenProvider, &request)
        .await
        .with_context(|| {
            format!(
                "exporting API Product '{}' from '{}'",
                request.name, request.environment.name
            )
        })?;
    Ok(())
}
