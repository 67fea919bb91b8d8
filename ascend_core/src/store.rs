//! Key-value persistence with file locking.
//!
//! Persisted state is a small set of named keys (`userLevels`,
//! `workoutHistory`). The [`KeyValue`] trait is the seam between the stores
//! and the actual storage; [`FileStore`] maps each key to a JSON file in the
//! data directory with proper locking, and [`MemoryStore`] backs tests.
//!
//! Writes are synchronous: a read following a write observes the new value.

use crate::{Error, Result};
use fs2::FileExt;
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::PathBuf;
use tempfile::NamedTempFile;

/// Storage seam for the level and history stores
pub trait KeyValue {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// File-backed store: one `<key>.json` file per key under a data directory
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValue for FileStore {
    /// Read a key with shared locking
    ///
    /// Returns None if the key's file doesn't exist. Unreadable files are
    /// treated as absent with a warning; callers fall back to defaults.
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }

        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!("Unable to open {:?}: {}. Treating key as unset.", path, e);
                return Ok(None);
            }
        };

        if let Err(e) = file.lock_shared() {
            tracing::warn!("Unable to lock {:?}: {}. Treating key as unset.", path, e);
            return Ok(None);
        }

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        let read = reader.read_to_string(&mut contents);
        let _ = file.unlock();

        match read {
            Ok(_) => Ok(Some(contents)),
            Err(e) => {
                tracing::warn!("Failed to read {:?}: {}. Treating key as unset.", path, e);
                Ok(None)
            }
        }
    }

    /// Write a key with exclusive locking
    ///
    /// Atomically writes by:
    /// 1. Writing to a temp file
    /// 2. Syncing to disk
    /// 3. Renaming over the original
    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;

        // Unique temp file in the same directory for atomic rename
        let temp = NamedTempFile::new_in(&self.dir)?;

        // Exclusive lock on the temp file to serialize concurrent writers
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            writer.write_all(value.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        // Atomically replace the old file
        temp.persist(self.path_for(key)).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Persisted key '{}' in {:?}", key, self.dir);
        Ok(())
    }
}

/// In-memory store for tests
#[derive(Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a key directly, bypassing the trait (test setup helper)
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

impl KeyValue for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.into(), value.into());
        Ok(())
    }
}
