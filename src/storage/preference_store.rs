use chrono::{Local, SecondsFormat};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::models::{PreferenceRecord, Preferences};

#[derive(Debug, Error)]
pub enum PreferenceError {
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Corrupt preferences file {}: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Serialization: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Per-category preferences persisted as one pretty-printed JSON object.
///
/// Loaded once at startup; `save` is the only mutation and rewrites the whole file.
#[derive(Debug)]
pub struct PreferenceStore {
    path: PathBuf,
    records: BTreeMap<String, PreferenceRecord>,
}

impl PreferenceStore {
    /// A missing file yields an empty store. A file that does not parse is an error;
    /// it is never repaired or overwritten implicitly.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PreferenceError> {
        let path = path.as_ref().to_path_buf();

        let records = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).map_err(|source| {
                PreferenceError::Corrupt {
                    path: path.clone(),
                    source,
                }
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(PreferenceError::Io { path, source }),
        };

        info!("Loaded {} saved preference records from {}", records.len(), path.display());
        Ok(Self { path, records })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn recall(&self, category: &str) -> Option<&PreferenceRecord> {
        self.records.get(&normalize_category(category))
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    /// Replaces the record for `category` and flushes every record to disk.
    pub fn save(
        &mut self,
        category: &str,
        preferences: Preferences,
        note: Option<&str>,
    ) -> Result<(), PreferenceError> {
        let category = normalize_category(category);
        let record = PreferenceRecord {
            preferences,
            timestamp: Local::now().to_rfc3339_opts(SecondsFormat::Micros, false),
            note: note.unwrap_or_default().to_string(),
        };

        self.records.insert(category.clone(), record);
        self.flush()?;

        info!("Preferences for '{}' saved to {}", category, self.path.display());
        Ok(())
    }

    // Write to a sibling file then rename over the target.
    fn flush(&self) -> Result<(), PreferenceError> {
        let json = serde_json::to_string_pretty(&self.records)?;
        let io_err = |source| PreferenceError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let mut staging = self.path.clone().into_os_string();
        staging.push(".tmp");
        let staging = PathBuf::from(staging);

        fs::write(&staging, json).map_err(io_err)?;
        fs::rename(&staging, &self.path).map_err(io_err)?;
        Ok(())
    }
}

fn normalize_category(category: &str) -> String {
    category.trim().to_lowercase()
}
