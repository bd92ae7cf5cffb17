//! Resolution of a user-supplied artifact path

use std::path::{Path, PathBuf};

use crate::error::{ImportError, Result};

/// Resolve `input` to an absolute artifact path
///
/// The path is used as given when it exists; otherwise it is looked up below
/// `export_dir`. Relative paths are made absolute against the current directory.
pub fn resolve_artifact_path(input: &str, export_dir: &Path) -> Result<PathBuf> {
    let given = PathBuf::from(input);
    tracing::debug!(path = %given.display(), "resolving artifact path");

    let found = if given.exists() {
        given
    } else {
        let fallback = export_dir.join(input);
        tracing::debug!(dir = %export_dir.display(), "looking for artifact in export directory");
        if !fallback.exists() {
            return Err(ImportError::NotFound {
                what: "artifact",
                path: given,
            });
        }
        fallback
    };

    absolute(&found)
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(|e| ImportError::io(".", e))?;
    Ok(cwd.join(path))
}
