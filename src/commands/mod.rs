use anyhow::{Context, Result};
use clap::Subcommand;
use std::path::PathBuf;

use crate::client::{ApimClient, EnvTokenProvider};
use crate::config::load_main_config;
use crate::constants::{EXPORTED_APIS_DIR, EXPORTED_API_PRODUCTS_DIR, EXPORTED_APPS_DIR};
use crate::definition::DefinitionKind;
use crate::dispatch::{Collaborators, ImportOptions};
use crate::error::ImportError;
use crate::pipeline::{run_import, ImportReport, ImportRequest};

pub mod completions;
pub mod delete_app;
pub mod env;
pub mod export_api_product;
pub mod import_api;
pub mod import_api_product;
pub mod import_app;

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(about = "Import an API directory or archive into an environment")]
    ImportApi(import_api::ImportApiArgs),
    #[command(about = "Import an API Product, optionally with its dependent APIs")]
    ImportApiProduct(import_api_product::ImportApiProductArgs),
    #[command(about = "Import an Application into an environment")]
    ImportApp(import_app::ImportAppArgs),
    #[command(about = "Export an API Product from an environment into the export directory")]
    ExportApiProduct(export_api_product::ExportApiProductArgs),
    #[command(about = "Delete an Application by name")]
    DeleteApp(delete_app::DeleteAppArgs),
    #[command(about = "Subcommand: manage target environments (add/list/remove)")]
    Env {
        #[command(subcommand)]
        cmd: env::EnvCommands,
    },
    #[command(about = "Emit shell completion scripts (bash/zsh/fish)")]
    Completions { shell: String },
}

pub async fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::ImportApi(args) => import_api::run(args).await,
        Commands::ImportApiProduct(args) => import_api_product::run(args).await,
        Commands::ImportApp(args) => import_app::run(args).await,
        Commands::ExportApiProduct(args) => export_api_product::run(args).await,
        Commands::DeleteApp(args) => delete_app::run(args).await,
        Commands::Env { cmd } => env::run(cmd),
        Commands::Completions { shell } => completions::run(shell),
    }
}

/// Inputs shared by the import commands
pub(crate) struct ImportInvocation {
    pub source: String,
    pub environment: String,
    pub params: Option<PathBuf>,
    pub skip_cleanup: bool,
    pub options: ImportOptions,
}

/// Build an [`ImportRequest`] from the main config and run it against the HTTP client
pub(crate) async fn import(invocation: ImportInvocation) -> Result<ImportReport> {
    let main_cfg = load_main_config()?;
    let env = main_cfg.environment(&invocation.environment)?.clone();
    let kind = invocation.options.kind();

    let exported = match kind {
        DefinitionKind::Api => EXPORTED_APIS_DIR,
        DefinitionKind::ApiProduct => EXPORTED_API_PRODUCTS_DIR,
        DefinitionKind::Application => EXPORTED_APPS_DIR,
    };
    let request = ImportRequest {
        source: invocation.source,
        import_url: ApimClient::import_url(&env, kind),
        environment: env,
        export_dir: main_cfg.export_directory().join(exported),
        params_path: invocation.params,
        working_dir: std::env::current_dir().context("reading current directory")?,
        scratch_root: None,
        keep_workspace: invocation.skip_cleanup,
        options: invocation.options,
    };

    let client = ApimClient::from_config(&main_cfg)?;
    let collaborators = Collaborators {
        tokens: &EnvTokenProvider,
        catalog: &client,
        transport: &client,
    };

    run_import(&request, collaborators).await.map_err(|e| {
        if let Some(hint) = remote_hint(&e, kind) {
            eprintln!("❌ {hint}");
        }
        anyhow::Error::new(e).context(format!(
            "importing {} '{}' into '{}'",
            kind.label(),
            request.source,
            request.environment.name
        ))
    })
}

fn remote_hint(err: &ImportError, kind: DefinitionKind) -> Option<&'static str> {
    match err {
        ImportError::RemoteFailure { status: 401, .. } | ImportError::Auth(_) => {
            Some("Invalid credentials or you may not have enough permission")
        }
        ImportError::RemoteFailure { status: 403, .. } if kind == DefinitionKind::Application => {
            Some("Invalid owner: cross tenant imports are not allowed")
        }
        _ => None,
    }
}
