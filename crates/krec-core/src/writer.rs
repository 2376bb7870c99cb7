//! Flush-on-write JSON-lines append store.
//!
//! One [`JsonlWriter`] backs one subscription's output target. Every record is
//! written as a single `\n`-terminated line and synced to disk before
//! [`write_record`](JsonlWriter::write_record) returns. Files are opened in
//! append mode, so restarting the recorder extends existing output.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::StorageError;

/// Append-only JSON-lines writer for one output target.
#[derive(Debug)]
pub struct JsonlWriter {
    path: PathBuf,
    /// `None` once closed.
    file: Option<File>,
    records: u64,
}

impl JsonlWriter {
    /// Open (or create) `path` for appending.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|source| StorageError::Io { path: path.clone(), source })?;

        Ok(Self { path, file: Some(file), records: 0 })
    }

    /// Append one record and sync it to disk.
    ///
    /// `record` is stored byte for byte, except that raw line breaks are
    /// dropped so the record occupies exactly one line.
    pub async fn write_record(&mut self, record: &str) -> Result<(), StorageError> {
        let record = single_line(record);
        let mut line = Vec::with_capacity(record.len() + 1);
        line.extend_from_slice(record.as_bytes());
        line.push(b'\n');

        let file = self.file.as_mut().ok_or_else(|| StorageError::Closed(self.path.clone()))?;
        let io_err = |source| StorageError::Io { path: self.path.clone(), source };

        file.write_all(&line).await.map_err(io_err)?;
        file.flush().await.map_err(io_err)?;
        file.sync_data().await.map_err(io_err)?;

        self.records += 1;
        Ok(())
    }

    /// Sync and release the file. Safe to call any number of times.
    pub async fn close(&mut self) -> Result<(), StorageError> {
        let Some(mut file) = self.file.take() else {
            return Ok(());
        };
        debug!("closing {} after {} record(s)", self.path.display(), self.records);
        file.flush()
            .await
            .map_err(|source| StorageError::Io { path: self.path.clone(), source })?;
        file.sync_all()
            .await
            .map_err(|source| StorageError::Io { path: self.path.clone(), source })?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Strip raw CR/LF from a JSON text.
///
/// JSON strings cannot contain unescaped line breaks, so in a valid record
/// they are always insignificant whitespace between tokens.
fn single_line(record: &str) -> Cow<'_, str> {
    if record.contains(['\n', '\r']) {
        Cow::Owned(record.chars().filter(|c| !matches!(c, '\n' | '\r')).collect())
    } else {
        Cow::Borrowed(record)
    }
}
