//! Scratch workspace for one import run
//!
//! An artifact is materialized into a fresh temporary directory, either by
//! copying a directory tree or by extracting a zip archive. The temporary
//! directory is owned by a [`ScratchGuard`] and removed when the guard drops,
//! on every exit path, unless the run asked to keep it for inspection.

use std::fs::{self, File};
use std::io;
use std::path::{Component, Path, PathBuf};

use tempfile::{NamedTempFile, TempDir};
use walkdir::WalkDir;

use crate::error::{ImportError, Result};

enum Scratch {
    Dir(TempDir),
    File(NamedTempFile),
}

/// Temporary directory or file released on drop unless retained
pub struct ScratchGuard {
    scratch: Option<Scratch>,
    path: PathBuf,
    retain: bool,
}

impl ScratchGuard {
    pub fn dir(dir: TempDir, retain: bool) -> Self {
        let path = dir.path().to_path_buf();
        Self {
            scratch: Some(Scratch::Dir(dir)),
            path,
            retain,
        }
    }

    pub fn file(file: NamedTempFile, retain: bool) -> Self {
        let path = file.path().to_path_buf();
        Self {
            scratch: Some(Scratch::File(file)),
            path,
            retain,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchGuard {
    fn drop(&mut self) {
        let Some(scratch) = self.scratch.take() else {
            return;
        };

        if self.retain {
            match scratch {
                Scratch::Dir(dir) => {
                    let kept = dir.keep();
                    tracing::warn!(path = %kept.display(), "leaving workspace in place");
                }
                Scratch::File(file) => match file.keep() {
                    Ok((_, kept)) => {
                        tracing::warn!(path = %kept.display(), "leaving artifact in place")
                    }
                    Err(e) => tracing::warn!(path = %self.path.display(), "could not keep artifact: {e}"),
                },
            }
            return;
        }

        let result = match scratch {
            Scratch::Dir(dir) => dir.close(),
            Scratch::File(file) => file.close(),
        };
        match result {
            Ok(()) => tracing::debug!(path = %self.path.display(), "deleted"),
            Err(e) => tracing::warn!(path = %self.path.display(), "cleanup failed: {e}"),
        }
    }
}

/// How an artifact source is brought into the workspace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Materializer {
    /// Recursive copy of a directory artifact
    Copy,
    /// Extraction of a zip archive artifact
    Extract,
}

impl Materializer {
    /// Pick the variant from the file-system kind of `source`
    pub fn for_source(source: &Path) -> Result<Self> {
        let meta = fs::metadata(source).map_err(|e| ImportError::io(source, e))?;
        Ok(if meta.is_dir() {
            Materializer::Copy
        } else {
            Materializer::Extract
        })
    }

    /// Materialize `source` below `scratch` and return the artifact root
    pub fn materialize(self, source: &Path, scratch: &Path) -> Result<PathBuf> {
        match self {
            Materializer::Copy => {
                let name = source
                    .file_name()
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("artifact"));
                let dest = scratch.join(name);
                tracing::info!(from = %source.display(), to = %dest.display(), "copying artifact");
                copy_dir(source, &dest)?;
                Ok(dest)
            }
            Materializer::Extract => {
                tracing::info!(from = %source.display(), to = %scratch.display(), "extracting artifact");
                extract_archive(source, scratch)
            }
        }
    }
}

/// Exclusively owned materialized artifact
pub struct Workspace {
    root: PathBuf,
    guard: ScratchGuard,
}

impl Workspace {
    /// Materialize `source` into a new directory under the system temp dir
    pub fn create(source: &Path, retain: bool) -> Result<Self> {
        let tmp = tempfile::Builder::new()
            .prefix("apim")
            .tempdir()
            .map_err(|e| ImportError::io(std::env::temp_dir(), e))?;
        Self::materialize_into(tmp, source, retain)
    }

    /// Same as [`Workspace::create`] with the temporary directory placed under `parent`
    pub fn create_in(source: &Path, parent: &Path, retain: bool) -> Result<Self> {
        let tmp = tempfile::Builder::new()
            .prefix("apim")
            .tempdir_in(parent)
            .map_err(|e| ImportError::io(parent, e))?;
        Self::materialize_into(tmp, source, retain)
    }

    fn materialize_into(tmp: TempDir, source: &Path, retain: bool) -> Result<Self> {
        // guard first: a failed copy or extract still releases the directory
        let guard = ScratchGuard::dir(tmp, retain);
        let root = Materializer::for_source(source)?.materialize(source, guard.path())?;
        Ok(Self { root, guard })
    }

    /// Root directory of the materialized artifact
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Temporary directory holding the artifact root
    pub fn scratch_dir(&self) -> &Path {
        self.guard.path()
    }
}

/// Recursively copy `src` to `dest`
pub fn copy_dir(src: &Path, dest: &Path) -> Result<()> {
    for entry in WalkDir::new(src) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(src).to_path_buf();
            ImportError::io(path, io::Error::other(e.to_string()))
        })?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| ImportError::io(entry.path(), io::Error::other(e.to_string())))?;
        let target = dest.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| ImportError::io(&target, e))?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|e| ImportError::io(parent, e))?;
            }
            fs::copy(entry.path(), &target).map_err(|e| ImportError::io(entry.path(), e))?;
        }
    }
    Ok(())
}

/// Extract the zip at `src` into `dest`, returning the archive's top-level entry
pub fn extract_archive(src: &Path, dest: &Path) -> Result<PathBuf> {
    let file = File::open(src).map_err(|e| ImportError::io(src, e))?;
    let mut archive =
        zip::ZipArchive::new(file).map_err(|e| ImportError::invalid_archive(src, e))?;
    if archive.is_empty() {
        return Err(ImportError::invalid_archive(src, "archive has no entries"));
    }

    let mut top_level: Vec<PathBuf> = Vec::new();
    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| ImportError::invalid_archive(src, e))?;
        let rel = entry.enclosed_name().map(Path::to_path_buf).ok_or_else(|| {
            ImportError::invalid_archive(src, format!("unsafe entry path '{}'", entry.name()))
        })?;

        if let Some(Component::Normal(first)) = rel.components().next() {
            let first = PathBuf::from(first);
            if !top_level.contains(&first) {
                top_level.push(first);
            }
        }

        let out = dest.join(&rel);
        if entry.is_dir() {
            fs::create_dir_all(&out).map_err(|e| ImportError::io(&out, e))?;
            continue;
        }
        if let Some(parent) = out.parent() {
            fs::create_dir_all(parent).map_err(|e| ImportError::io(parent, e))?;
        }
        let mut target = File::create(&out).map_err(|e| ImportError::io(&out, e))?;
        io::copy(&mut entry, &mut target).map_err(|e| ImportError::io(&out, e))?;
    }

    let Some(root) = top_level.first() else {
        return Err(ImportError::invalid_archive(src, "no entries were extracted"));
    };
    if top_level.len() > 1 {
        tracing::warn!(
            archive = %src.display(),
            "archive has {} top-level entries, using '{}'",
            top_level.len(),
            root.display()
        );
    }
    Ok(dest.join(root))
}
