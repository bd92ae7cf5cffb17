//! End-to-end import: locate, stage, package and dispatch an artifact
//!
//! Stages run strictly in order and every failure aborts the run. The
//! workspace and the temporary archive are owned by guards, so they are
//! released on every exit path unless `keep_workspace` is set.

use std::path::{Path, PathBuf};

use crate::config::EnvironmentConfig;
use crate::defaults::{apply_defaults, normalize_legacy_endpoints};
use crate::definition::{Definition, DefinitionKind, Identity};
use crate::dispatch::{dispatch, Collaborators, ImportOptions, ImportOutcome};
use crate::envsubst::substitute_env_in_artifact;
use crate::error::Result;
use crate::inject::{inject_dependent_apis, inject_params};
use crate::locator::resolve_artifact_path;
use crate::package::package;
use crate::params::resolve_params_path;
use crate::validate::validate;
use crate::workspace::Workspace;

/// Everything one import run needs
#[derive(Debug, Clone)]
pub struct ImportRequest {
    /// Path as given by the user
    pub source: String,
    pub environment: EnvironmentConfig,
    /// Fallback directory for `source`
    pub export_dir: PathBuf,
    pub import_url: String,
    /// Explicit params file; skips discovery
    pub params_path: Option<PathBuf>,
    /// Last place searched for `api_params.yaml`
    pub working_dir: PathBuf,
    /// Parent of the temporary workspace and archive, system temp dir when `None`
    pub scratch_root: Option<PathBuf>,
    /// Leave the workspace and archive on disk after the run
    pub keep_workspace: bool,
    pub options: ImportOptions,
}

/// Artifact ready to be packaged
pub struct StagedArtifact {
    pub workspace: Workspace,
    pub definition: Definition,
    /// Whether overrides from a params file were merged
    pub params_applied: bool,
}

#[derive(Debug, Clone)]
pub struct ImportReport {
    pub identity: Identity,
    pub outcome: ImportOutcome,
    pub artifact_sha256: String,
    /// Id of the overwritten entity; only set for updates
    pub existing_id: Option<String>,
    /// Definition as it was uploaded
    pub definition: Definition,
}

/// Locate, materialize, substitute, merge, default and validate an artifact
pub fn stage(request: &ImportRequest) -> Result<StagedArtifact> {
    let kind = request.options.kind();
    let source = resolve_artifact_path(&request.source, &request.export_dir)?;
    tracing::info!(path = %source.display(), "{} location", kind.label());

    let workspace = match &request.scratch_root {
        Some(parent) => Workspace::create_in(&source, parent, request.keep_workspace)?,
        None => Workspace::create(&source, request.keep_workspace)?,
    };
    let root = workspace.root().to_path_buf();

    tracing::info!("substituting environment variables in artifact files");
    substitute_env_in_artifact(&root)?;

    let mut definition = Definition::load(&root, kind)?;
    let mut params_applied = false;
    match kind {
        DefinitionKind::Api => {
            if normalize_legacy_endpoints(&mut definition)? {
                definition.write(&root)?;
            }
            params_applied = merge_params(request, &source, &root, &mut definition)?;
            if apply_defaults(&mut definition)? {
                definition.write(&root)?;
            }
        }
        DefinitionKind::ApiProduct => {
            inject_dependent_apis(&root, &request.environment.name)?;
            // products are only overridden from an explicitly given file
            if request.params_path.is_some() {
                params_applied = merge_params(request, &source, &root, &mut definition)?;
            }
            if apply_defaults(&mut definition)? {
                definition.write(&root)?;
            }
        }
        DefinitionKind::Application => {}
    }

    validate(&definition)?;
    Ok(StagedArtifact {
        workspace,
        definition,
        params_applied,
    })
}

fn merge_params(
    request: &ImportRequest,
    source: &Path,
    root: &Path,
    definition: &mut Definition,
) -> Result<bool> {
    let Some(params_path) =
        resolve_params_path(source, request.params_path.as_deref(), &request.working_dir)?
    else {
        tracing::debug!("no parameters file found");
        return Ok(false);
    };
    inject_params(definition, root, &params_path, &request.environment.name)
}

/// Run the whole pipeline and upload the result
pub async fn run_import(
    request: &ImportRequest,
    collaborators: Collaborators<'_>,
) -> Result<ImportReport> {
    let staged = stage(request)?;
    let identity = staged.definition.identity()?;

    let packaged = package(
        staged.workspace.root(),
        request.keep_workspace,
        request.scratch_root.as_deref(),
    )?;

    let dispatched = dispatch(
        collaborators,
        &request.environment,
        &request.import_url,
        &packaged.path,
        &identity,
        &request.options,
    )
    .await?;

    Ok(ImportReport {
        identity,
        outcome: dispatched.outcome,
        artifact_sha256: packaged.sha256,
        existing_id: dispatched.existing_id,
        definition: staged.definition,
    })
}
