//! Advisory lock around the output path.
//!
//! Two runs against the same output serialize on an exclusive `flock` held
//! on a sibling lock file (`.<output name>.lock`). The lock is released when
//! [`OutputLock`] is dropped. On non-Unix platforms locking is a no-op.

use crate::bundler::{Result, utils::fs};
use std::path::{Path, PathBuf};

/// Held advisory lock for one output path.
pub struct OutputLock {
    path: PathBuf,
    #[cfg(unix)]
    _flock: nix::fcntl::Flock<std::fs::File>,
}

impl std::fmt::Debug for OutputLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputLock").field("path", &self.path).finish()
    }
}

impl OutputLock {
    /// Lock file guarding `output`.
    pub fn lock_path(output: &Path) -> PathBuf {
        let name = output
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());
        output.with_file_name(format!(".{name}.lock"))
    }

    /// Path of the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Blocks until the lock for `output` is held.
    #[cfg(unix)]
    pub async fn acquire(output: &Path) -> Result<Self> {
        use crate::bundler::error::{Error, ErrorExt};
        use nix::fcntl::{Flock, FlockArg};

        let path = Self::lock_path(output);
        fs::ensure_parent(&path).await?;

        let lock_path = path.clone();
        let flock = tokio::task::spawn_blocking(move || -> Result<Flock<std::fs::File>> {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .truncate(false)
                .write(true)
                .open(&lock_path)
                .fs_context("opening lock file", &lock_path)?;

            let file = match Flock::lock(file, FlockArg::LockExclusiveNonblock) {
                Ok(flock) => return Ok(flock),
                Err((file, nix::errno::Errno::EWOULDBLOCK)) => {
                    log::info!(
                        "Waiting for another packaging run holding {}",
                        lock_path.display()
                    );
                    file
                }
                Err((_, errno)) => {
                    return Err(Error::Fs {
                        context: "locking output".to_string(),
                        path: lock_path.clone(),
                        source: std::io::Error::from(errno),
                    });
                }
            };

            Flock::lock(file, FlockArg::LockExclusive).map_err(|(_, errno)| Error::Fs {
                context: "locking output".to_string(),
                path: lock_path.clone(),
                source: std::io::Error::from(errno),
            })
        })
        .await??;

        log::debug!("Holding output lock {}", path.display());
        Ok(Self {
            path,
            _flock: flock,
        })
    }

    /// Blocks until the lock for `output` is held.
    #[cfg(not(unix))]
    pub async fn acquire(output: &Path) -> Result<Self> {
        let path = Self::lock_path(output);
        fs::ensure_parent(&path).await?;
        Ok(Self { path })
    }
}
