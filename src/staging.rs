//! Scoped temporary directories.
//!
//! Every temporary directory the crate creates is owned by a [`ScopedDir`]. The directory
//! is removed exactly once: either by an explicit [`ScopedDir::close`] once its contents
//! are no longer needed, or by `Drop` on error and cancellation paths.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Local;
use tempfile::TempDir;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Number of random characters appended after the timestamp.
const RANDOM_SUFFIX_LEN: usize = 6;

/// Local timestamp in `YYYYMMDDHHmmss` form.
pub fn timestamp() -> String {
    Local::now().format("%Y%m%d%H%M%S").to_string()
}

/// A uniquely named directory that is deleted when released.
#[derive(Debug)]
pub struct ScopedDir {
    dir: Option<TempDir>,
    path: PathBuf,
}

impl ScopedDir {
    /// Create `<root>/<timestamp><random>`. `root` must already exist.
    pub fn create_in(root: &Path) -> io::Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(&timestamp())
            .rand_bytes(RANDOM_SUFFIX_LEN)
            .tempdir_in(root)?;
        let path = dir.path().to_path_buf();
        debug!(path = %path.display(), "created scoped directory");
        Ok(Self {
            dir: Some(dir),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the directory now and report the outcome.
    ///
    /// A directory that is already gone counts as removed.
    pub fn close(mut self) -> Result<()> {
        match self.dir.take() {
            Some(dir) => remove(dir),
            None => Ok(()),
        }
    }

    /// Remove the directory, logging instead of returning a failure.
    pub fn release(self) {
        let path = self.path.clone();
        if let Err(err) = self.close() {
            warn!(path = %path.display(), "{err}");
        }
    }
}

impl Drop for ScopedDir {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            if let Err(err) = remove(dir) {
                warn!(path = %self.path.display(), "{err}");
            }
        }
    }
}

/// Staging space for one batch: `<destination>/<subdir>/<timestamp><random>`.
///
/// The batch directory is always removed on release. The `<subdir>` root is removed too
/// when this area created it and nothing else was left inside.
#[derive(Debug)]
pub struct StagingArea {
    batch: Option<ScopedDir>,
    root: PathBuf,
    owns_root: bool,
}

impl StagingArea {
    /// Create the staging root (with all missing ancestors) and a fresh batch directory.
    pub fn create(destination: &Path, subdir: &Path) -> Result<Self> {
        let root = destination.join(subdir);
        let owns_root = !subdir.as_os_str().is_empty() && !root.exists();
        fs::create_dir_all(&root).map_err(|source| Error::Staging {
            path: root.clone(),
            source,
        })?;

        let batch = match ScopedDir::create_in(&root) {
            Ok(batch) => batch,
            Err(source) => {
                if owns_root {
                    let _ = fs::remove_dir(&root);
                }
                return Err(Error::Staging { path: root, source });
            }
        };
        Ok(Self {
            batch: Some(batch),
            root,
            owns_root,
        })
    }

    /// The batch directory downloads are written into
    pub fn path(&self) -> &Path {
        match &self.batch {
            Some(batch) => batch.path(),
            None => &self.root,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Remove the staging space now. Failures are logged.
    pub fn release(mut self) {
        self.cleanup();
    }

    fn cleanup(&mut self) {
        if let Some(batch) = self.batch.take() {
            batch.release();
        }
        if self.owns_root {
            self.owns_root = false;
            match fs::remove_dir(&self.root) {
                Ok(()) => debug!(path = %self.root.display(), "removed staging root"),
                Err(err) => debug!(path = %self.root.display(), "kept staging root: {err}"),
            }
        }
    }
}

impl Drop for StagingArea {
    fn drop(&mut self) {
        self.cleanup();
    }
}

fn remove(dir: TempDir) -> Result<()> {
    let path = dir.path().to_path_buf();
    match dir.close() {
        Ok(()) => {
            debug!(path = %path.display(), "removed scoped directory");
            Ok(())
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(Error::Cleanup { path, source }),
    }
}
