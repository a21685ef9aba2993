//! Durable key-value storage
//!
//! Small JSON-per-key store backing the stream window, the intelligence
//! records, and user preferences. Reads degrade to `None` on missing or
//! corrupt data; writes surface a typed error so callers can log and
//! continue.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use crate::error::{ConntrailError, Result};

/// Stored intelligence records, keyed by registry id
pub const KEY_INTEL_RECORDS: &str = "intel_records";
/// Persisted stream window of raw lines
pub const KEY_CAPTURE_LINES: &str = "capture_lines";
/// Persisted sort preference
pub const KEY_CAPTURE_SORT: &str = "capture_sort";
/// Release versions the user has dismissed
pub const KEY_DISMISSED_VERSIONS: &str = "dismissed_versions";
/// Whether release checks include prereleases
pub const KEY_INCLUDE_PRERELEASE: &str = "include_prerelease";

/// Thread-safe storage handle, one JSON file per key
#[derive(Clone)]
pub struct KvStore {
    dir: Arc<Mutex<PathBuf>>,
}

impl KvStore {
    /// Open or create the store at the given directory
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir).map_err(|e| {
            ConntrailError::Storage(format!("failed to create {}: {}", dir.display(), e))
        })?;

        info!("Opened storage at {}", dir.display());
        Ok(Self {
            dir: Arc::new(Mutex::new(dir)),
        })
    }

    /// Read and deserialize the value stored under `key`
    ///
    /// Missing and corrupt values both come back as `None`; a corrupt
    /// value logs a notice first.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let dir = self.dir.lock().unwrap();
        let path = path_for(&dir, key);

        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No stored value for key '{}'", key);
                return None;
            }
            Err(e) => {
                warn!("Failed to read stored value for key '{}': {}", key, e);
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Corrupt stored value for key '{}', ignoring: {}", key, e);
                None
            }
        }
    }

    /// Serialize and write `value` under `key`
    pub fn put<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let dir = self.dir.lock().unwrap();
        let path = path_for(&dir, key);

        let content = serde_json::to_string(value)?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Delete the value stored under `key`, if any
    pub fn remove(&self, key: &str) {
        let dir = self.dir.lock().unwrap();
        let path = path_for(&dir, key);

        if let Err(e) = std::fs::remove_file(&path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove stored value for key '{}': {}", key, e);
            }
        }
    }

    /// Check whether a value exists under `key`
    pub fn contains(&self, key: &str) -> bool {
        let dir = self.dir.lock().unwrap();
        path_for(&dir, key).exists()
    }
}

/// Map a key to its backing file, restricted to a safe character set
fn path_for(dir: &Path, key: &str) -> PathBuf {
    let safe: String = key
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    dir.join(format!("{}.json", safe))
}
