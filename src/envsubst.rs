//! `${VAR}` substitution over the files of a materialized artifact

use std::fs;
use std::path::Path;
use walkdir::WalkDir;

use crate::config::substitute_env_strict;
use crate::constants::ENV_SUBSTITUTION_PATHS;
use crate::error::{ImportError, Result};

/// Substitute environment variables in the substitutable sub-paths of `root`
///
/// Missing sub-paths are skipped. Files that are not valid UTF-8 are left as is.
pub fn substitute_env_in_artifact(root: &Path) -> Result<()> {
    for sub in ENV_SUBSTITUTION_PATHS {
        let path = root.join(sub);
        if path.is_dir() {
            tracing::debug!(path = %path.display(), "substituting env variables in folder");
            for entry in WalkDir::new(&path).sort_by_file_name() {
                let entry = entry.map_err(|e| {
                    ImportError::io(&path, std::io::Error::other(e.to_string()))
                })?;
                if entry.file_type().is_file() {
                    substitute_env_in_file(entry.path())?;
                }
            }
        } else if path.is_file() {
            substitute_env_in_file(&path)?;
        }
    }
    Ok(())
}

pub fn substitute_env_in_file(path: &Path) -> Result<()> {
    let bytes = fs::read(path).map_err(|e| ImportError::io(path, e))?;
    let Ok(text) = String::from_utf8(bytes) else {
        return Ok(());
    };
    let replaced = substitute_env_strict(&text).map_err(|variable| ImportError::UnsetVariable {
        variable,
        path: path.to_path_buf(),
    })?;
    if replaced != text {
        tracing::debug!(path = %path.display(), "substituted env variables");
        fs::write(path, replaced).map_err(|e| ImportError::io(path, e))?;
    }
    Ok(())
}
