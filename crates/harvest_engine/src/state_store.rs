use std::ffi::OsString;
use std::fs::{self, File, OpenOptions, TryLockError};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use harvest_core::ProgressRecord;
use harvest_logging::{harvest_debug, harvest_warn};
use thiserror::Error;

use crate::persist::{write_atomically, PersistError};

#[derive(Debug, Error)]
pub enum StateError {
    #[error("progress record at {path:?} is unavailable: {reason}")]
    Unavailable { path: PathBuf, reason: String },
    #[error("progress record at {0:?} already exists")]
    AlreadyExists(PathBuf),
    #[error("progress record is locked by another run (lock file {0:?})")]
    Locked(PathBuf),
    #[error("failed to take state lock {path:?}: {source}")]
    Lock { path: PathBuf, source: io::Error },
    #[error("failed to encode progress record: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to write progress record: {0}")]
    Persist(#[from] PersistError),
}

/// Durable home of the [`ProgressRecord`]: a pretty-printed JSON file.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the record. A missing or malformed file is an error, never a default.
    pub fn load(&self) -> Result<ProgressRecord, StateError> {
        let text = fs::read_to_string(&self.path).map_err(|err| self.unavailable(err))?;
        let record: ProgressRecord =
            serde_json::from_str(&text).map_err(|err| self.unavailable(err))?;
        harvest_debug!(
            "loaded progress record: {} visited, file {}, repo {}",
            record.visited_count(),
            record.current_file_number(),
            record.repo_index()
        );
        Ok(record)
    }

    /// Overwrites the record in full via temp-file-and-rename.
    pub fn save(&self, record: &ProgressRecord) -> Result<(), StateError> {
        let body = serde_json::to_string_pretty(record)?;
        write_atomically(&self.path, &body)?;
        Ok(())
    }

    /// Creates the record file for a fresh deployment. Refuses to overwrite.
    pub fn initialize(&self, record: &ProgressRecord) -> Result<(), StateError> {
        if self.path.exists() {
            return Err(StateError::AlreadyExists(self.path.clone()));
        }
        self.save(record)
    }

    /// Takes the advisory lock guarding a load-mutate-save sequence.
    ///
    /// The lock is an OS file lock on `<state>.lock`, so it disappears with the
    /// process that holds it. The file itself stays on disk.
    pub fn lock(&self) -> Result<StateLock, StateError> {
        let path = self.lock_path();
        let lock_error = |source| StateError::Lock {
            path: path.clone(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(lock_error)?;
        }
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(lock_error)?;

        match file.try_lock() {
            Ok(()) => {}
            Err(TryLockError::WouldBlock) => return Err(StateError::Locked(path)),
            Err(TryLockError::Error(source)) => return Err(lock_error(source)),
        }
        // Holder pid, for humans inspecting the file.
        if file.set_len(0).is_ok() {
            let _ = writeln!(file, "{}", std::process::id());
        }
        Ok(StateLock { path, file })
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("state"));
        name.push(".lock");
        self.path.with_file_name(name)
    }

    fn unavailable(&self, reason: impl ToString) -> StateError {
        StateError::Unavailable {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }
}

/// Held for the duration of a run; the OS lock is released when dropped.
#[derive(Debug)]
pub struct StateLock {
    path: PathBuf,
    file: File,
}

impl StateLock {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StateLock {
    fn drop(&mut self) {
        if let Err(err) = self.file.unlock() {
            harvest_warn!("failed to release state lock {:?}: {}", self.path, err);
        }
    }
}
