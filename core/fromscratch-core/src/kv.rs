//! File-backed key-value store.
//!
//! Each key is one file in the store directory, holding the JSON encoding of
//! its value. Key names are percent-encoded to form the file name, so any
//! string is a valid key.
//!
//! A missing file is the normal "never written" state and reads as `None`.
//! An unreadable or corrupt file is returned as an error for the caller to log
//! and replace with its own default; nothing here panics on bad data.
//!
//! Writes go to a temp file in the store directory first and are persisted
//! over the key file, so a crash mid-write leaves the previous value intact.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use fs_err as fs;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;

use crate::error::{Result, ScratchError};

#[derive(Debug, Clone)]
pub struct JsonStorage {
    dir: PathBuf,
}

impl JsonStorage {
    /// Opens a store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(urlencoding::encode(key).as_ref())
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let path = self.key_path(key);
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(ScratchError::io(format!("reading key '{key}'"), err)),
        };

        serde_json::from_slice(&data)
            .map(Some)
            .map_err(|err| ScratchError::json(format!("parsing key '{key}'"), err))
    }

    /// Overwrites the value stored under `key`.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .map_err(|err| ScratchError::io("creating store directory", err))?;

        let payload = serde_json::to_vec(value)
            .map_err(|err| ScratchError::json(format!("serializing key '{key}'"), err))?;
        let mut temp_file = NamedTempFile::new_in(&self.dir)
            .map_err(|err| ScratchError::io(format!("creating temp file for key '{key}'"), err))?;
        temp_file
            .write_all(&payload)
            .and_then(|()| temp_file.flush())
            .map_err(|err| ScratchError::io(format!("writing key '{key}'"), err))?;
        temp_file
            .persist(self.key_path(key))
            .map_err(|err| ScratchError::io(format!("committing key '{key}'"), err.error))?;
        Ok(())
    }

    /// Deletes `key`. Removing a key that was never written is a no-op.
    pub fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.key_path(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(ScratchError::io(format!("removing key '{key}'"), err)),
        }
    }
}
