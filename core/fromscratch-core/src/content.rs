//! Single-slot document persistence.
//!
//! The whole document is one UTF-8 file, overwritten on every save. There is
//! no history and no merge; the last write wins. Bytes that are not valid
//! UTF-8 are read back with replacement characters rather than refused.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use fs_err as fs;

use tracing::warn;

use crate::error::{Result, ScratchError};

#[derive(Debug, Clone)]
pub struct ContentStore {
    path: PathBuf,
}

impl ContentStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replaces the stored document with `text`.
    ///
    /// Errors are returned as-is: a failed save must reach whoever asked for it.
    pub fn write(&self, text: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| ScratchError::ContentWriteFailed {
                path: self.path.clone(),
                source,
            })?;
        }
        fs::write(&self.path, text).map_err(|source| ScratchError::ContentWriteFailed {
            path: self.path.clone(),
            source,
        })
    }

    /// Returns the stored document, or `None` if nothing was ever saved.
    pub fn read(&self) -> Result<Option<String>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(ScratchError::io("reading content", err)),
        };
        match String::from_utf8(bytes) {
            Ok(text) => Ok(Some(text)),
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    valid_up_to = err.utf8_error().valid_up_to(),
                    "Content is not valid UTF-8; decoding lossily"
                );
                Ok(Some(String::from_utf8_lossy(err.as_bytes()).into_owned()))
            }
        }
    }
}
