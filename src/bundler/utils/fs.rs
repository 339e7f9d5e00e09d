//! File system utilities for packaging.
//!
//! Every helper here is idempotent: removing something that is already gone
//! or creating something that already exists succeeds.

use crate::bundler::error::{ErrorExt, Result};
use std::{io, path::Path};
use tokio::fs;

/// Creates all of the directories of the specified path, erasing it first if specified.
pub async fn create_dir_all(path: &Path, erase: bool) -> Result<()> {
    if erase {
        remove_path(path).await?;
    }

    fs::create_dir_all(path)
        .await
        .fs_context("creating directory", path)
}

/// Removes whatever exists at `path`: a directory tree, a file, or a symlink.
///
/// Symlinks are removed, never followed.
pub async fn remove_path(path: &Path) -> Result<()> {
    let metadata = match fs::symlink_metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e).fs_context("inspecting path before removal", path),
    };

    let removed = if metadata.is_dir() {
        fs::remove_dir_all(path).await
    } else {
        fs::remove_file(path).await
    };

    match removed {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).fs_context("removing stale output", path),
    }
}

/// Ensures the parent directory of `path` exists.
pub async fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .fs_context("creating parent directory", parent)?;
    }
    Ok(())
}
