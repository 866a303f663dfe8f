//! On-disk staging of downloaded messages
//!
//! A [`StagingArea`] is a private temporary directory holding one file
//! per message, named by its 1-based position in the job. It belongs to
//! exactly one copy job.

use crate::config::StagingCleanup;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};

pub struct StagingArea {
    dir: TempDir,
    positions: Vec<usize>,
}

impl StagingArea {
    /// Create an empty staging directory, under `root` if given and the
    /// system temporary directory otherwise.
    pub fn create(root: Option<&Path>) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("mailshift-");
        let dir = match root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };
        debug!("Staging messages in {}", dir.path().display());
        Ok(Self {
            dir,
            positions: Vec::new(),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    fn entry_path(&self, position: usize) -> PathBuf {
        self.dir.path().join(format!("{position}.eml"))
    }

    /// Write the message at `position`.
    pub async fn put(&mut self, position: usize, content: &[u8]) -> Result<()> {
        tokio::fs::write(self.entry_path(position), content).await?;
        if !self.positions.contains(&position) {
            self.positions.push(position);
            self.positions.sort_unstable();
        }
        Ok(())
    }

    /// Read the message at `position`.
    pub async fn get(&self, position: usize) -> Result<Vec<u8>> {
        if !self.positions.contains(&position) {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no staged message at position {position}"),
            )));
        }
        Ok(tokio::fs::read(self.entry_path(position)).await?)
    }

    /// Delete the message at `position` once it is safely uploaded.
    pub async fn remove(&mut self, position: usize) -> Result<()> {
        tokio::fs::remove_file(self.entry_path(position)).await?;
        self.positions.retain(|p| *p != position);
        Ok(())
    }

    /// Staged positions in ascending order.
    #[must_use]
    pub fn positions(&self) -> &[usize] {
        &self.positions
    }

    /// Release the directory after an aborted job.
    ///
    /// With [`StagingCleanup::Keep`] the directory and whatever is left in
    /// it survive and its path is returned.
    pub fn abandon(self, cleanup: StagingCleanup) -> Option<PathBuf> {
        match cleanup {
            StagingCleanup::Keep => {
                let path = self.dir.keep();
                warn!(
                    "Leaving {} staged message(s) in {}",
                    self.positions.len(),
                    path.display()
                );
                Some(path)
            }
            StagingCleanup::Remove => {
                if let Err(e) = self.dir.close() {
                    warn!("Failed to remove staging directory: {}", e);
                }
                None
            }
        }
    }
}
