//! Durable schedule cache.
//!
//! One JSON file per version tag under a caller-supplied directory. Entries
//! are loaded once at open; every mutation writes the whole map back
//! through. Disk failures are logged and the store carries on in memory,
//! matching the behavior of the preference-blob storage it replaces.

use chrono::NaiveDate;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::types::DailyPrayerTimes;

/// Version tag baked into the cache file name. Bumping it starts the new
/// version empty; files under prior tags are deleted on first open, with no
/// per-entry migration.
const CACHE_VERSION: u32 = 2;
const CACHE_FILE_PREFIX: &str = "prayer_cache_v";

/// Composite cache key: `"{city_id}_{yyyy-MM-dd}"`.
pub fn cache_key(city_id: &str, date: NaiveDate) -> String {
    format!("{}_{}", city_id, date.format("%Y-%m-%d"))
}

/// Persistent (location, date) → schedule store.
pub struct CacheStore {
    path: PathBuf,
    // Held across the whole read-modify-write span, including the disk
    // write, so concurrent callers never interleave write-throughs.
    entries: Mutex<HashMap<String, DailyPrayerTimes>>,
}

impl CacheStore {
    /// Opens the store under `dir`, creating the directory if needed: purges
    /// files from prior version tags, then loads the current file. Unreadable
    /// or invalid data starts the store empty rather than failing.
    pub fn open(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        if let Err(e) = std::fs::create_dir_all(dir) {
            tracing::warn!(error = %e, dir = %dir.display(), "could not create cache directory");
        }
        purge_prior_versions(dir);
        let path = dir.join(format!("{CACHE_FILE_PREFIX}{CACHE_VERSION}.json"));
        let entries = load_entries(&path);
        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    /// Validated read for the exact (city, date) key.
    ///
    /// An entry whose embedded city id differs from the requested one is
    /// treated as absent. That can only happen through a tampered or
    /// corrupted file, and returning it would poison every consumer
    /// downstream.
    pub async fn validated_get(&self, city_id: &str, date: NaiveDate) -> Option<DailyPrayerTimes> {
        let key = cache_key(city_id, date);
        let entries = self.entries.lock().await;
        let entry = entries.get(&key)?;
        if entry.city().id != city_id {
            tracing::warn!(
                key,
                stored = %entry.city().id,
                "cache entry stored under a foreign key, ignoring"
            );
            return None;
        }
        Some(entry.clone())
    }

    /// Write-through insert. The key is derived from the entry itself, so an
    /// entry can never land under a mismatched key.
    pub async fn put(&self, entry: DailyPrayerTimes) {
        let key = cache_key(&entry.city().id, entry.date());
        let mut entries = self.entries.lock().await;
        entries.insert(key, entry);
        self.persist(&entries);
    }

    /// Drops every entry and removes the backing file.
    pub async fn clear(&self) {
        let mut entries = self.entries.lock().await;
        entries.clear();
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != ErrorKind::NotFound {
                tracing::warn!(error = %e, "could not remove cache file");
            }
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn persist(&self, entries: &HashMap<String, DailyPrayerTimes>) {
        match serde_json::to_vec_pretty(entries) {
            Ok(bytes) => {
                if let Err(e) = std::fs::write(&self.path, bytes) {
                    tracing::warn!(
                        error = %e,
                        path = %self.path.display(),
                        "cache write failed, continuing in memory"
                    );
                }
            }
            Err(e) => tracing::warn!(error = %e, "cache serialization failed"),
        }
    }
}

fn load_entries(path: &Path) -> HashMap<String, DailyPrayerTimes> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            if e.kind() != ErrorKind::NotFound {
                tracing::warn!(error = %e, "cache read failed, starting empty");
            }
            return HashMap::new();
        }
    };
    // Entries are revalidated one by one; a single bad entry is dropped
    // without discarding its neighbors.
    match serde_json::from_slice::<HashMap<String, serde_json::Value>>(&bytes) {
        Ok(raw) => raw
            .into_iter()
            .filter_map(|(key, value)| {
                match serde_json::from_value::<DailyPrayerTimes>(value) {
                    Ok(entry) => Some((key, entry)),
                    Err(e) => {
                        tracing::warn!(key, error = %e, "dropping invalid cache entry");
                        None
                    }
                }
            })
            .collect(),
        Err(e) => {
            tracing::warn!(error = %e, "cache file invalid, starting empty");
            HashMap::new()
        }
    }
}

/// Deletes cache files carrying a different version tag.
fn purge_prior_versions(dir: &Path) {
    let current = format!("{CACHE_FILE_PREFIX}{CACHE_VERSION}.json");
    let Ok(listing) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in listing.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if name.starts_with(CACHE_FILE_PREFIX) && name != current {
            tracing::info!(file = name, "removing cache left by a prior version");
            let _ = std::fs::remove_file(entry.path());
        }
    }
}
