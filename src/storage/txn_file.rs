//! Transaction file persistence
//!
//! The transaction file is the only state shared between participants. It
//! is pretty-printed JSON with a trailing newline; reading and rewriting an
//! unmodified file reproduces it byte for byte.

use crate::core::Transaction;
use std::fs;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Read a transaction from JSON
pub fn read_transaction<R: Read>(reader: R) -> Result<Transaction, StorageError> {
    Ok(serde_json::from_reader(reader)?)
}

/// Write a transaction as pretty JSON followed by a newline
pub fn write_transaction<W: Write>(mut writer: W, txn: &Transaction) -> Result<(), StorageError> {
    serde_json::to_writer_pretty(&mut writer, txn)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Load a transaction file
pub fn load_transaction(path: &Path) -> Result<Transaction, StorageError> {
    let file = fs::File::open(path)?;
    read_transaction(BufReader::new(file))
}

/// Save a transaction file, replacing it atomically
pub fn save_transaction(path: &Path, txn: &Transaction) -> Result<(), StorageError> {
    write_atomic(path, |writer| write_transaction(writer, txn))?;
    log::debug!("Wrote transaction {} to {}", txn.id(), path.display());
    Ok(())
}

/// Write JSON to `path` through a temporary file in the same directory
pub(crate) fn save_json_atomic<T: serde::Serialize>(
    path: &Path,
    value: &T,
) -> Result<(), StorageError> {
    write_atomic(path, |mut writer| {
        serde_json::to_writer_pretty(&mut writer, value)?;
        writer.flush()?;
        Ok(())
    })
}

/// Write through `.{name}.tmp` and rename over `path`; the temporary file
/// never outlives a failed write
fn write_atomic<F>(path: &Path, write: F) -> Result<(), StorageError>
where
    F: FnOnce(BufWriter<fs::File>) -> Result<(), StorageError>,
{
    let temp_path = temp_path_for(path);
    let file = fs::File::create(&temp_path)?;
    let result = write(BufWriter::new(file))
        .and_then(|()| fs::rename(&temp_path, path).map_err(StorageError::from));
    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "transaction".to_string());
    path.with_file_name(format!(".{}.tmp", name))
}
