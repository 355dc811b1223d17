//! Key-value blob storage backing the save and achievement data

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Save error types
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// String blobs addressed by a constant key
pub trait KeyValueStore {
    /// Read a blob, `None` when the key was never written
    fn get(&self, key: &str) -> Result<Option<String>, SaveError>;

    /// Overwrite a blob
    fn set(&mut self, key: &str, value: &str) -> Result<(), SaveError>;

    /// Remove a blob; removing a missing key is not an error
    fn delete(&mut self, key: &str) -> Result<(), SaveError>;
}

/// One `<key>.json` file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store in the platform's local data directory
    pub fn default_location() -> Self {
        use directories::ProjectDirs;

        if let Some(proj_dirs) = ProjectDirs::from("com", "bibleheroes", "BibleHeroes") {
            Self::new(proj_dirs.data_local_dir().join("saves"))
        } else {
            Self::new("./saves")
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, SaveError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), SaveError> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path_for(key), value)?;
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<(), SaveError> {
        let path = self.path_for(key);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

/// Volatile store, used by tests and when the disk is unavailable
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, SaveError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), SaveError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<(), SaveError> {
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_store_round_trip() {
        let dir = std::env::temp_dir().join(format!("bible-heroes-store-{}", std::process::id()));
        let mut store = FileStore::new(&dir);

        assert!(store.get("slot").unwrap().is_none());
        store.set("slot", "{\"coins\":3}").unwrap();
        assert_eq!(store.get("slot").unwrap().as_deref(), Some("{\"coins\":3}"));
        store.delete("slot").unwrap();
        store.delete("slot").unwrap();
        assert!(store.get("slot").unwrap().is_none());

        let _ = fs::remove_dir_all(&dir);
    }
}
