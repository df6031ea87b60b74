use crate::{signal, Error};
use std::{
    fs::File,
    io,
    path::{Path, PathBuf},
};
use tracing::{debug, warn};

/// A temp file owned by one invocation and deleted when the owner lets go of
/// it, whichever way that happens.
#[derive(Debug)]
pub struct TransientFile {
    path: PathBuf,
    armed: bool,
    closed: bool,
}

impl TransientFile {
    /// Creates an empty file in `dir`, readable and writable only by the
    /// current user where the filesystem supports it.
    pub fn create(dir: &Path, prefix: &str, suffix: &str) -> anyhow::Result<(Self, File)> {
        let named = tempfile::Builder::new()
            .prefix(prefix)
            .suffix(suffix)
            .tempfile_in(dir)
            .map_err(|e| {
                Error::SCRIPT_IO.with_detail(format!(
                    "creating a temp file in {}: {}",
                    dir.display(),
                    e
                ))
            })?;
        // From here on deletion is ours, not tempfile's.
        let (file, path) = named.keep().map_err(|e| {
            Error::SCRIPT_IO.with_detail(format!("taking ownership of a temp file: {}", e.error))
        })?;
        debug!(path = %path.display(), "created transient file");
        Ok((
            Self {
                path,
                armed: false,
                closed: false,
            },
            file,
        ))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Registers the file for removal if the process is interrupted.
    pub fn guard_against_signals(mut self) -> Self {
        signal::arm(&self.path);
        self.armed = true;
        self
    }

    /// Deletes the file, reporting failures. Dropping does the same silently.
    pub fn close(mut self) -> anyhow::Result<()> {
        self.closed = true;
        self.remove().map_err(|e| {
            Error::SCRIPT_IO.with_detail(format!("deleting {}: {}", self.path.display(), e))
        })
    }

    fn remove(&mut self) -> io::Result<()> {
        if self.armed {
            signal::disarm();
            self.armed = false;
        }
        // Someone else may already have removed it.
        if !self.path.exists() {
            return Ok(());
        }
        match std::fs::remove_file(&self.path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            result => {
                debug!(path = %self.path.display(), "removed transient file");
                result
            }
        }
    }
}

impl Drop for TransientFile {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(e) = self.remove() {
            warn!(path = %self.path.display(), error = %e, "failed to delete transient file");
        }
    }
}
