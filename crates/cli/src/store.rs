//! File-backed key-value store for local preferences

use mopsos_core::{Error, KeyValueStore, Result};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// JSON object file mapping keys to string values
///
/// Every `set` rewrites the whole file, so the last write wins.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored map, or `None` when the file holds something other than a JSON object
    fn read_all(&self) -> Result<Option<Map<String, Value>>> {
        if !self.path.exists() {
            return Ok(Some(Map::new()));
        }

        let content = std::fs::read_to_string(&self.path).map_err(|e| Error::FileReadError {
            path: self.path.display().to_string(),
            source: e,
        })?;

        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(map)) => Ok(Some(map)),
            Ok(_) | Err(_) => {
                warn!("Ignoring malformed store file {:?}", self.path);
                Ok(None)
            }
        }
    }

    /// Where a malformed file is moved before it is replaced
    pub fn backup_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".bak");
        PathBuf::from(name)
    }

    fn move_aside(&self) -> Result<()> {
        let backup = self.backup_path();
        std::fs::rename(&self.path, &backup).map_err(|e| Error::FileWriteError {
            path: backup.display().to_string(),
            source: e,
        })?;
        warn!("Moved malformed store file to {:?}", backup);
        Ok(())
    }

    fn write_all(&self, map: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| Error::FileWriteError {
                    path: parent.display().to_string(),
                    source: e,
                })?;
            }
        }

        let json = serde_json::to_string_pretty(map)?;
        std::fs::write(&self.path, json).map_err(|e| Error::FileWriteError {
            path: self.path.display().to_string(),
            source: e,
        })?;

        debug!("Saved store to {:?}", self.path);
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let map = self.read_all()?.unwrap_or_default();
        Ok(map.get(key).and_then(Value::as_str).map(str::to_string))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut map = match self.read_all()? {
            Some(map) => map,
            None => {
                self.move_aside()?;
                Map::new()
            }
        };
        map.insert(key.to_string(), Value::String(value.to_string()));
        self.write_all(&map)
    }
}
