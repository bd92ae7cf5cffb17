//! Re-packaging of a staged artifact into the zip that gets uploaded

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{ImportError, Result};
use crate::workspace::ScratchGuard;

/// Payload ready for upload
pub struct PackagedArtifact {
    pub path: PathBuf,
    /// Hex encoded SHA-256 of the payload
    pub sha256: String,
    /// Owns the temporary zip, if one was created
    pub guard: Option<ScratchGuard>,
}

/// Archive `artifact` when it is a directory; files are uploaded as they are
///
/// The temporary zip follows the same retention rule as the workspace.
pub fn package(
    artifact: &Path,
    retain: bool,
    scratch_root: Option<&Path>,
) -> Result<PackagedArtifact> {
    if !artifact.is_dir() {
        let sha256 = sha256_file(artifact)?;
        return Ok(PackagedArtifact {
            path: artifact.to_path_buf(),
            sha256,
            guard: None,
        });
    }

    let mut builder = tempfile::Builder::new();
    builder.prefix("api-artifact").suffix(".zip");
    let tmp: NamedTempFile = match scratch_root {
        Some(dir) => builder.tempfile_in(dir).map_err(|e| ImportError::io(dir, e))?,
        None => builder
            .tempfile()
            .map_err(|e| ImportError::io(std::env::temp_dir(), e))?,
    };
    tracing::info!(from = %artifact.display(), to = %tmp.path().display(), "creating artifact archive");
    zip_dir(artifact, tmp.as_file())?;
    let guard = ScratchGuard::file(tmp, retain);

    let path = guard.path().to_path_buf();
    let sha256 = sha256_file(&path)?;
    tracing::debug!(sha256 = %sha256, "artifact packaged");
    Ok(PackagedArtifact {
        path,
        sha256,
        guard: Some(guard),
    })
}

/// Write `dir` into a zip whose entries all live under `<dir name>/`
pub fn zip_dir<W: Write + io::Seek>(dir: &Path, writer: W) -> Result<W> {
    let base = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "artifact".to_string());
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(writer);

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| ImportError::io(dir, io::Error::other(e.to_string())))?;
        let rel = entry
            .path()
            .strip_prefix(dir)
            .map_err(|e| ImportError::io(entry.path(), io::Error::other(e.to_string())))?;
        let mut name = base.clone();
        for part in rel.components() {
            name.push('/');
            name.push_str(&part.as_os_str().to_string_lossy());
        }

        if entry.file_type().is_dir() {
            zip.add_directory(name, options)
                .map_err(|e| ImportError::io(entry.path(), io::Error::other(e)))?;
        } else {
            zip.start_file(name, options)
                .map_err(|e| ImportError::io(entry.path(), io::Error::other(e)))?;
            let mut src = File::open(entry.path()).map_err(|e| ImportError::io(entry.path(), e))?;
            io::copy(&mut src, &mut zip).map_err(|e| ImportError::io(entry.path(), e))?;
        }
    }

    zip.finish()
        .map_err(|e| ImportError::io(dir, io::Error::other(e)))
}

pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path).map_err(|e| ImportError::io(path, e))?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher).map_err(|e| ImportError::io(path, e))?;
    Ok(hex::encode(hasher.finalize()))
}
