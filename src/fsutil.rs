// src/fsutil.rs

//! Async filesystem helpers shared by plugins and the overlay resolver.
//!
//! All writes create intermediate directories on demand, and reads/writes are
//! byte-preserving (no re-encoding). Directory creation is idempotent.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs;

/// Read a file fully into memory.
pub async fn read(path: &Path) -> Result<Vec<u8>> {
    fs::read(path)
        .await
        .with_context(|| format!("reading {:?}", path))
}

/// Read a file fully, returning `None` if it does not exist.
///
/// Any error other than `NotFound` is still propagated.
pub async fn try_read(path: &Path) -> Result<Option<Vec<u8>>> {
    match fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err).with_context(|| format!("reading {:?}", path)),
    }
}

/// Write bytes to a file, creating parent directories as needed.
pub async fn write(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating dir {:?}", parent))?;
    }
    fs::write(path, contents)
        .await
        .with_context(|| format!("writing {:?}", path))
}

/// Copy a file byte-for-byte, creating parent directories of the target.
pub async fn copy(source: &Path, target: &Path) -> Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating dir {:?}", parent))?;
    }
    fs::copy(source, target)
        .await
        .with_context(|| format!("copying {:?} -> {:?}", source, target))?;
    Ok(())
}

/// Remove a file from the tree.
pub async fn remove(path: &Path) -> Result<()> {
    fs::remove_file(path)
        .await
        .with_context(|| format!("removing {:?}", path))
}

/// Returns true if the path exists.
pub async fn exists(path: &Path) -> bool {
    fs::try_exists(path).await.unwrap_or(false)
}

/// Change the extension of `path` to `to`.
///
/// If `from` is non-empty, the extension is only changed when the current
/// extension is in `from`; otherwise the path is returned unchanged. With an
/// empty `from` list the extension is always replaced.
pub fn change_extension(path: &Path, to: &str, from: &[String]) -> PathBuf {
    let current = path.extension().and_then(|e| e.to_str());

    let change = match current {
        Some(ext) => from.is_empty() || from.iter().any(|f| f == ext),
        None => false,
    };

    if change {
        path.with_extension(to)
    } else {
        path.to_path_buf()
    }
}
