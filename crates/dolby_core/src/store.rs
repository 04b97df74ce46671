//! Key-Value Preference Store
//!
//! Settings live in string-valued namespaces: one global namespace, one for
//! user presets and one per profile. Reads never fail; a missing or malformed
//! value falls back to the caller's default.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{error, info};

use crate::error::CoreResult;

type Namespaces = BTreeMap<String, BTreeMap<String, String>>;

/// Namespaced string storage
pub trait PreferenceStore {
    fn get(&self, namespace: &str, key: &str) -> Option<String>;

    fn put(&mut self, namespace: &str, key: &str, value: String);

    fn remove(&mut self, namespace: &str, key: &str) -> Option<String>;

    /// Keys of a namespace, sorted
    fn keys(&self, namespace: &str) -> Vec<String>;

    /// Namespaces that currently hold at least one key
    fn namespaces(&self) -> Vec<String>;

    /// Drop a whole namespace
    fn clear(&mut self, namespace: &str);

    /// Persist pending writes
    fn flush(&mut self) -> CoreResult<()> {
        Ok(())
    }

    fn get_i32(&self, namespace: &str, key: &str, default: i32) -> i32 {
        self.get(namespace, key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    fn get_bool(&self, namespace: &str, key: &str, default: bool) -> bool {
        self.get(namespace, key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    fn put_i32(&mut self, namespace: &str, key: &str, value: i32) {
        self.put(namespace, key, value.to_string());
    }

    fn put_bool(&mut self, namespace: &str, key: &str, value: bool) {
        self.put(namespace, key, value.to_string());
    }
}

/// Store that lives only as long as the process
#[derive(Debug, Clone, Default)]
pub struct MemoryPreferenceStore {
    data: Namespaces,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self, namespace: &str, key: &str) -> Option<String> {
        self.data.get(namespace)?.get(key).cloned()
    }

    fn put(&mut self, namespace: &str, key: &str, value: String) {
        self.data
            .entry(namespace.to_string())
            .or_default()
            .insert(key.to_string(), value);
    }

    fn remove(&mut self, namespace: &str, key: &str) -> Option<String> {
        let entries = self.data.get_mut(namespace)?;
        let removed = entries.remove(key);
        if entries.is_empty() {
            self.data.remove(namespace);
        }
        removed
    }

    fn keys(&self, namespace: &str) -> Vec<String> {
        self.data
            .get(namespace)
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn namespaces(&self) -> Vec<String> {
        self.data.keys().cloned().collect()
    }

    fn clear(&mut self, namespace: &str) {
        self.data.remove(namespace);
    }
}

/// Store persisted as a single JSON file
///
/// Writes are buffered until [`PreferenceStore::flush`].
#[derive(Debug)]
pub struct JsonPreferenceStore {
    path: PathBuf,
    inner: MemoryPreferenceStore,
    dirty: bool,
}

impl JsonPreferenceStore {
    /// Load the store at `path`, or start empty if missing/corrupt
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut data = Namespaces::new();

        if path.exists() {
            match fs::File::open(&path) {
                Ok(file) => match serde_json::from_reader(file) {
                    Ok(loaded) => {
                        info!("Preferences loaded from {:?}", path);
                        data = loaded;
                    }
                    Err(e) => {
                        error!("Failed to parse preferences file: {}", e);
                    }
                },
                Err(e) => {
                    error!("Failed to open preferences file: {}", e);
                }
            }
        }

        Self {
            path,
            inner: MemoryPreferenceStore { data },
            dirty: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceStore for JsonPreferenceStore {
    fn get(&self, namespace: &str, key: &str) -> Option<String> {
        self.inner.get(namespace, key)
    }

    fn put(&mut self, namespace: &str, key: &str, value: String) {
        self.inner.put(namespace, key, value);
        self.dirty = true;
    }

    fn remove(&mut self, namespace: &str, key: &str) -> Option<String> {
        let removed = self.inner.remove(namespace, key);
        self.dirty |= removed.is_some();
        removed
    }

    fn keys(&self, namespace: &str) -> Vec<String> {
        self.inner.keys(namespace)
    }

    fn namespaces(&self) -> Vec<String> {
        self.inner.namespaces()
    }

    fn clear(&mut self, namespace: &str) {
        self.inner.clear(namespace);
        self.dirty = true;
    }

    fn flush(&mut self) -> CoreResult<()> {
        if !self.dirty {
            return Ok(());
        }

        // Ensure directory exists
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write beside the target, then swap in
        let tmp = self.path.with_extension("json.tmp");
        let file = fs::File::create(&tmp)?;
        serde_json::to_writer_pretty(file, &self.inner.data)?;
        fs::rename(&tmp, &self.path)?;

        self.dirty = false;
        info!("Preferences saved to {:?}", self.path);
        Ok(())
    }
}
