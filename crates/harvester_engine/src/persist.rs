use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Ensure output directory exists; create if missing. Safe to call repeatedly.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::OutputDir(format!(
                "{} is not a directory",
                dir.display()
            )));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    }
    Ok(())
}

/// A file being written next to its final location.
///
/// Bytes land in a hidden temp file in the target's directory; [`commit`]
/// renames it over the target. Dropping without committing deletes the temp
/// file, so the target never holds partial content.
///
/// [`commit`]: PartialFile::commit
pub struct PartialFile {
    tmp: NamedTempFile,
    target: PathBuf,
    written: u64,
}

impl PartialFile {
    pub fn create(target: &Path) -> Result<Self, PersistError> {
        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        ensure_output_dir(&dir)?;
        let tmp = tempfile::Builder::new()
            .prefix(".partial-")
            .tempfile_in(&dir)?;
        Ok(Self {
            tmp,
            target: target.to_path_buf(),
            written: 0,
        })
    }

    pub fn write_chunk(&mut self, bytes: &[u8]) -> Result<(), PersistError> {
        self.tmp.write_all(bytes)?;
        self.written += bytes.len() as u64;
        Ok(())
    }

    /// Direct access for encoders that write through `std::io::Write`.
    pub fn file_mut(&mut self) -> &mut File {
        self.tmp.as_file_mut()
    }

    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    pub fn commit(mut self) -> Result<PathBuf, PersistError> {
        self.tmp.flush()?;
        self.tmp.as_file_mut().sync_all()?;

        // Replace existing file if present to keep determinism.
        if self.target.exists() {
            fs::remove_file(&self.target)?;
        }
        self.tmp
            .persist(&self.target)
            .map_err(|e| PersistError::Io(e.error))?;
        Ok(self.target)
    }
}
