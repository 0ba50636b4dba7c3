//! Filesystem infrastructure — implements `HostDirectories`.

use std::os::unix::fs::DirBuilderExt;
use std::path::Path;

use anyhow::Result;

use crate::application::ports::HostDirectories;
use crate::domain::error::PathError;

/// Mode of every directory created for bind mounts.
pub const DIR_MODE: u32 = 0o755;

/// Production filesystem implementation of `HostDirectories`.
pub struct LocalFs;

impl HostDirectories for LocalFs {
    fn ensure_exists(&self, path: &Path) -> Result<()> {
        if path.is_dir() {
            return Ok(());
        }
        if path.exists() {
            return Err(PathError::NotADirectory(path.display().to_string()).into());
        }
        std::fs::DirBuilder::new()
            .recursive(true)
            .mode(DIR_MODE)
            .create(path)
            .map_err(|source| PathError::Create {
                path: path.display().to_string(),
                source,
            })?;
        tracing::debug!(path = %path.display(), "created directory");
        Ok(())
    }

    fn is_writable(&self, path: &Path) -> bool {
        tempfile::tempfile_in(path).is_ok()
    }
}
