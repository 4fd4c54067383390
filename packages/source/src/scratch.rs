//! Temporary working directory for downloaded and extracted files.

use std::path::{Path, PathBuf};

use crate::AcquisitionError;

/// A uniquely named directory under the system temp dir, removed
/// recursively on drop.
#[derive(Debug)]
pub struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    /// Creates a fresh scratch directory.
    ///
    /// # Errors
    ///
    /// Returns [`AcquisitionError::Io`] if the directory cannot be created.
    pub fn create() -> Result<Self, AcquisitionError> {
        Self::create_in(&std::env::temp_dir())
    }

    /// Creates a fresh scratch directory under `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`AcquisitionError::Io`] if the directory cannot be created.
    pub fn create_in(parent: &Path) -> Result<Self, AcquisitionError> {
        let path = parent.join(format!("tornado-track-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&path).map_err(|e| AcquisitionError::io(&path, e))?;
        log::debug!("Created scratch directory {}", path.display());
        Ok(Self { path })
    }

    /// The directory path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => log::debug!("Removed scratch directory {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => log::warn!(
                "Failed to remove scratch directory {}: {e}",
                self.path.display()
            ),
        }
    }
}
