use anyhow::Result;
use clap::Args;

use super::{import, ImportInvocation};
use crate::dispatch::{ImportOptions, ImportOutcome};

#[derive(Args, Debug)]
pub struct ImportAppArgs {
    /// Application directory or zip archive
    #[arg(short = 'f', long)]
    pub file: String,
    #[arg(short, long)]
    pub environment: String,
    /// Owner to import the application under
    #[arg(short = 'o', long)]
    pub owner: Option<String>,
    /// Keep the owner recorded in the artifact
    #[arg(long)]
    pub preserve_owner: bool,
    /// Do not import the application's subscriptions
    #[arg(short = 's', long)]
    pub skip_subscriptions: bool,
    /// Do not import the application's keys
    #[arg(long)]
    pub skip_keys: bool,
    /// Update the application if it already exists
    #[arg(long)]
    pub update: bool,
    #[arg(long)]
    pub skip_cleanup: bool,
}

pub async fn run(args: ImportAppArgs) -> Result<()> {
    let report = import(ImportInvocation {
        source: args.file,
        environment: args.environment,
        params: None,
        skip_cleanup: args.skip_cleanup,
        options: ImportOptions::Application {
            owner: args.owner,
            preserve_owner: args.preserve_owner,
            skip_subscriptions: args.skip_subscriptions,
            skip_keys: args.skip_keys,
            update: args.update,
        },
    })
    .await?;

    match report.outcome {
        ImportOutcome::Imported { .. } => {
            println!("✅ Successfully imported Application '{}'", report.identity.name)
        }
        ImportOutcome::PartiallyImported { .. } => println!(
            "⚠️  Partially imported Application '{}'\nNOTE: one or more subscriptions were not imported due to unavailability of APIs/Tiers",
            report.identity.name
        ),
    }
    Ok(())
}
