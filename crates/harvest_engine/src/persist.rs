use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory {path:?} missing or not writable: {reason}")]
    OutputDir { path: PathBuf, reason: String },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl PersistError {
    fn output_dir(path: &Path, reason: impl ToString) -> Self {
        Self::OutputDir {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

/// Ensure output directory exists; create if missing.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::output_dir(dir, e))?;
        if !meta.is_dir() {
            return Err(PersistError::output_dir(dir, "path is not a directory"));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::output_dir(dir, e))?;
    }
    Ok(())
}

/// Replace `target` with `content`: write a sibling temp file, fsync, then rename over.
///
/// Readers see either the old file or the new one, never a partial write.
pub fn write_atomically(target: &Path, content: &str) -> Result<(), PersistError> {
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    ensure_output_dir(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.flush()?;
    tmp.as_file_mut().sync_all()?;
    tmp.persist(target).map_err(|e| PersistError::Io(e.error))?;
    Ok(())
}

/// Writes named files into one directory, each atomically.
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn write(&self, filename: &str, content: &str) -> Result<PathBuf, PersistError> {
        let target = self.dir.join(filename);
        write_atomically(&target, content)?;
        Ok(target)
    }
}
