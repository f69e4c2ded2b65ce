use std::fs;
use std::path::{Path, PathBuf};

use harvest_core::{batch_filename, parse_jsonl, Batch, Entry};
use thiserror::Error;

use crate::persist::{AtomicFileWriter, PersistError};

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to encode batch: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to read batch file {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// Writes `batch` to `{output_dir}/scrape_NNNNN.jsonl` and returns the path.
pub fn write_batch(
    output_dir: &Path,
    file_number: u64,
    batch: &Batch,
) -> Result<PathBuf, OutputError> {
    let body = batch.to_jsonl()?;
    let writer = AtomicFileWriter::new(output_dir.to_path_buf());
    Ok(writer.write(&batch_filename(file_number), &body)?)
}

pub fn read_batch(path: &Path) -> Result<Vec<Entry>, OutputError> {
    let text = fs::read_to_string(path).map_err(|source| OutputError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_jsonl(&text)?)
}
