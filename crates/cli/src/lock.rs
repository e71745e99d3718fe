// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Cross-process drain lock.
//!
//! Only one process may drain a given state directory at a time: two
//! drainers would each mark the same head mutation in flight and deliver it
//! twice. The lock is an advisory `flock` on `drain.lock` holding the
//! owner's pid, released when the guard drops or the process exits.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::error::{Error, Result};

const LOCK_FILE_NAME: &str = "drain.lock";

/// Held for as long as this process is allowed to drain.
#[derive(Debug)]
pub struct DrainLock {
    file: File,
    path: PathBuf,
}

impl DrainLock {
    /// Takes the lock without waiting; [`Error::DrainLocked`] when another
    /// process holds it.
    pub fn acquire(state_dir: &Path) -> Result<Self> {
        fs::create_dir_all(state_dir)?;
        let path = state_dir.join(LOCK_FILE_NAME);

        // No truncate here: the file may belong to a live holder
        let mut file = fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)?;
        file.try_lock_exclusive().map_err(|_| Error::DrainLocked)?;

        file.set_len(0)?;
        write!(file, "{}", std::process::id())?;
        tracing::debug!(path = %path.display(), "drain lock acquired");

        Ok(DrainLock { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DrainLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
