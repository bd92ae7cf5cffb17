use anyhow::Result;
use clap::{ArgAction, Args};
use std::path::PathBuf;

use super::{import, ImportInvocation};
use crate::dispatch::{ImportOptions, ImportOutcome};

#[derive(Args, Debug)]
pub struct ImportApiProductArgs {
    /// API Product directory or zip archive
    #[arg(short = 'f', long)]
    pub file: String,
    #[arg(short, long)]
    pub environment: String,
    /// Parameters file applied to the product itself; not discovered when omitted
    #[arg(long)]
    pub params: Option<PathBuf>,
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub preserve_provider: bool,
    /// Import the dependent APIs bundled with the product
    #[arg(long)]
    pub import_apis: bool,
    /// Update the dependent APIs if they already exist
    #[arg(long)]
    pub update_apis: bool,
    /// Update the API Product if it already exists
    #[arg(long)]
    pub update_api_product: bool,
    #[arg(long)]
    pub skip_cleanup: bool,
}

pub async fn run(args: ImportApiProductArgs) -> Result<()> {
    let report = import(ImportInvocation {
        source: args.file,
        environment: args.environment,
        params: args.params,
        skip_cleanup: args.skip_cleanup,
        options: ImportOptions::ApiProduct {
            preserve_provider: args.preserve_provider,
            import_apis: args.import_apis,
            update_apis: args.update_apis,
            update_api_product: args.update_api_product,
        },
    })
    .await?;

    match report.outcome {
        ImportOutcome::Imported { .. } => println!(
            "✅ Successfully imported API Product '{}' version '{}'",
            report.identity.name, report.identity.version
        ),
        ImportOutcome::PartiallyImported { body } => println!(
            "⚠️  API Product '{}' was partially imported: {body}",
            report.identity.name
        ),
    }
    Ok(())
}
