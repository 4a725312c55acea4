//! Display-name registry
//!
//! Durable mapping from pseudonym to a human-readable label, used only for
//! UI/report labeling. Backed by a flat JSON object mapping decimal
//! pseudonym strings to display names, pretty-printed and key-sorted on
//! every write. Each mutation is a full read-modify-write cycle with an
//! atomic rename, so a crashed writer never leaves a torn file on disk.
//!
//! A missing or unparseable store reads as an empty registry; the registry
//! is a non-authoritative display aid and load failures must never take the
//! UI down. No cross-process locking is provided; concurrent writers race.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::LogError;

/// Default registry location under the per-user config directory
pub fn default_registry_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tachylog")
        .join("participant_display_names.json")
}

/// Persistent pseudonym -> display-name store
#[derive(Debug, Clone)]
pub struct DisplayNameRegistry {
    path: PathBuf,
}

impl Default for DisplayNameRegistry {
    fn default() -> Self {
        Self {
            path: default_registry_path(),
        }
    }
}

impl DisplayNameRegistry {
    /// Create a registry backed by the given file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing store
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the full mapping. A missing or corrupt store yields an empty map.
    pub fn load(&self) -> BTreeMap<String, String> {
        match fs::read_to_string(&self.path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_default(),
            Err(_) => BTreeMap::new(),
        }
    }

    /// Overwrite the backing store with the full mapping.
    ///
    /// Parent directories are created as needed. The write goes to a
    /// temporary file in the same directory and is renamed into place.
    pub fn save(&self, mapping: &BTreeMap<String, String>) -> Result<(), LogError> {
        let parent = self
            .path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        fs::create_dir_all(&parent)?;

        let tmp = NamedTempFile::new_in(&parent)?;
        serde_json::to_writer_pretty(tmp.as_file(), mapping)?;
        tmp.persist(&self.path).map_err(|e| LogError::Io(e.error))?;
        Ok(())
    }

    /// Unconditional upsert
    pub fn set_name(&self, pseudonym: u64, display_name: &str) -> Result<(), LogError> {
        let mut mapping = self.load();
        mapping.insert(pseudonym.to_string(), display_name.to_string());
        self.save(&mapping)
    }

    /// Stored display name for a pseudonym, if any
    pub fn get_name(&self, pseudonym: u64) -> Option<String> {
        self.load().get(&pseudonym.to_string()).cloned()
    }

    /// Remove a pseudonym's entry. No-op if absent.
    pub fn delete_name(&self, pseudonym: u64) -> Result<(), LogError> {
        let mut mapping = self.load();
        if mapping.remove(&pseudonym.to_string()).is_some() {
            self.save(&mapping)?;
        }
        Ok(())
    }

    /// Whether any entry carries this display name
    pub fn name_exists(&self, display_name: &str) -> bool {
        self.load().values().any(|name| name == display_name)
    }

    /// Whether the pseudonym has an entry
    pub fn pseudonym_exists(&self, pseudonym: u64) -> bool {
        self.load().contains_key(&pseudonym.to_string())
    }

    /// Insert only if the pseudonym key is not already present.
    ///
    /// Returns `true` if the name was added, `false` if the key existed.
    pub fn set_name_if_not_exists(
        &self,
        pseudonym: u64,
        display_name: &str,
    ) -> Result<bool, LogError> {
        let mut mapping = self.load();
        let key = pseudonym.to_string();
        if mapping.contains_key(&key) {
            return Ok(false);
        }
        mapping.insert(key, display_name.to_string());
        self.save(&mapping)?;
        Ok(true)
    }

    /// Insert only if neither the pseudonym key nor the display name exists.
    ///
    /// Returns `true` if the name was added, `false` on any duplicate.
    pub fn set_name_if_unique(
        &self,
        pseudonym: u64,
        display_name: &str,
    ) -> Result<bool, LogError> {
        let mut mapping = self.load();
        let key = pseudonym.to_string();
        if mapping.contains_key(&key) || mapping.values().any(|name| name == display_name) {
            return Ok(false);
        }
        mapping.insert(key, display_name.to_string());
        self.save(&mapping)?;
        Ok(true)
    }
}
