//! Persisted artist-id to raw-genre cache.
//!
//! The cache is a flat JSON object: `{"artist_id": "raw genre" | null}`. A
//! `null` value records that the platform reported no genre for the artist,
//! which still counts as a cache hit on later runs.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

/// Artist genre cache loaded once per run and flushed at resolver checkpoints.
#[derive(Debug, Clone)]
pub struct GenreCache {
    path: PathBuf,
    entries: BTreeMap<String, Option<String>>,
    dirty: bool,
}

impl GenreCache {
    /// Creates an empty cache bound to `path` without touching the disk.
    #[cfg(test)]
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: BTreeMap::new(),
            dirty: false,
        }
    }

    /// Loads the cache file. Missing or unreadable files yield an empty cache.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match Self::read_entries(&path) {
            Ok(Some(entries)) => {
                info!(
                    "Loaded {} cached artist genres from {}",
                    entries.len(),
                    path.display()
                );
                entries
            }
            Ok(None) => {
                warn!("No genre cache at {}; starting empty", path.display());
                BTreeMap::new()
            }
            Err(error) => {
                warn!(
                    "Failed to load genre cache {}: {}; starting empty",
                    path.display(),
                    error
                );
                BTreeMap::new()
            }
        };
        Self {
            path,
            entries,
            dirty: false,
        }
    }

    fn read_entries(path: &Path) -> Result<Option<BTreeMap<String, Option<String>>>, String> {
        if !path.exists() {
            return Ok(None);
        }
        let content =
            fs::read_to_string(path).map_err(|err| format!("failed to read file: {err}"))?;
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|err| format!("invalid cache JSON: {err}"))
    }

    #[cfg(test)]
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns `None` on a miss and `Some(None)` for a cached "no genre".
    pub fn get(&self, artist_id: &str) -> Option<Option<&str>> {
        self.entries.get(artist_id).map(Option::as_deref)
    }

    /// Records a raw genre for an artist and reports whether the mapping changed.
    ///
    /// A known genre is never replaced by `None`.
    pub fn put(&mut self, artist_id: &str, raw_genre: Option<String>) -> bool {
        let current = self.entries.get(artist_id);
        let changed = match (current, raw_genre.as_ref()) {
            (Some(Some(_)), None) => false,
            (Some(existing), next) => existing.as_ref() != next,
            (None, _) => true,
        };
        if changed {
            self.entries.insert(artist_id.to_string(), raw_genre);
            self.dirty = true;
        }
        changed
    }

    /// Writes the mapping to disk. Failures are logged and leave memory intact.
    pub fn save(&mut self) -> bool {
        match self.write_entries() {
            Ok(()) => {
                debug!(
                    "Saved {} cached artist genres to {}",
                    self.entries.len(),
                    self.path.display()
                );
                self.dirty = false;
                true
            }
            Err(error) => {
                warn!(
                    "Failed to save genre cache {}: {}",
                    self.path.display(),
                    error
                );
                false
            }
        }
    }

    /// Saves only when entries changed since the last successful save.
    pub fn save_if_dirty(&mut self) -> bool {
        if !self.dirty {
            return false;
        }
        self.save()
    }

    fn write_entries(&self) -> Result<(), String> {
        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|err| format!("failed to create {}: {err}", parent.display()))?;
        }
        let serialized = serde_json::to_string_pretty(&self.entries)
            .map_err(|err| format!("failed to serialize cache: {err}"))?;
        let mut temp_name = self.path.as_os_str().to_owned();
        temp_name.push(".tmp");
        let temp_path = PathBuf::from(temp_name);
        fs::write(&temp_path, serialized)
            .map_err(|err| format!("failed to write {}: {err}", temp_path.display()))?;
        fs::rename(&temp_path, &self.path).map_err(|err| {
            let _ = fs::remove_file(&temp_path);
            format!("failed to replace {}: {err}", self.path.display())
        })
    }
}
