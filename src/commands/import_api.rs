use anyhow::Result;
use clap::{ArgAction, Args};
use std::path::PathBuf;

use super::{import, ImportInvocation};
use crate::dispatch::{ImportOptions, ImportOutcome};

#[derive(Args, Debug)]
pub struct ImportApiArgs {
    /// API directory or zip archive; looked up in the export directory when not found
    #[arg(short = 'f', long)]
    pub file: String,
    /// Target environment
    #[arg(short, long)]
    pub environment: String,
    /// Parameters file; `api_params.yaml` is discovered when omitted
    #[arg(long)]
    pub params: Option<PathBuf>,
    /// Keep the provider of the API as it is in the artifact
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub preserve_provider: bool,
    /// Update the API if it already exists
    #[arg(long)]
    pub update: bool,
    /// Leave the temporary workspace and archive on disk
    #[arg(long)]
    pub skip_cleanup: bool,
}

pub async fn run(args: ImportApiArgs) -> Result<()> {
    let report = import(ImportInvocation {
        source: args.file,
        environment: args.environment,
        params: args.params,
        skip_cleanup: args.skip_cleanup,
        options: ImportOptions::Api {
            preserve_provider: args.preserve_provider,
            update: args.update,
        },
    })
    .await?;

    match report.outcome {
        ImportOutcome::Imported { .. } => println!(
            "✅ Successfully imported API '{}' version '{}'",
            report.identity.name, report.identity.version
        ),
        ImportOutcome::PartiallyImported { body } => {
            println!("⚠️  API '{}' was partially imported: {body}", report.identity.name)
        }
    }
    Ok(())
}
