//! Curated artist-name to genre table used when the platform has no genre.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use log::{info, warn};

use crate::genre_aliases::normalize;

/// One entry of the fallback file: `{"artist": "...", "genre": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct FallbackEntry {
    pub artist: String,
    pub genre: String,
}

#[derive(Debug, Clone, Default)]
pub struct ArtistFallbackTable {
    genres: HashMap<String, String>,
}

impl ArtistFallbackTable {
    /// Builds the table keyed by normalized artist name. Later entries win.
    pub fn from_entries(entries: &[FallbackEntry]) -> Self {
        let genres = entries
            .iter()
            .filter(|entry| !entry.genre.trim().is_empty())
            .map(|entry| (normalize(&entry.artist), entry.genre.trim().to_string()))
            .filter(|(artist, _)| !artist.is_empty())
            .collect();
        Self { genres }
    }

    /// Loads entries from a JSON file; any failure yields an empty table.
    pub fn load(path: &Path) -> Self {
        let loaded = fs::read_to_string(path)
            .map_err(|err| format!("failed to read file: {err}"))
            .and_then(|content| {
                serde_json::from_str::<Vec<FallbackEntry>>(&content)
                    .map_err(|err| format!("invalid fallback JSON: {err}"))
            });
        match loaded {
            Ok(entries) => {
                let table = Self::from_entries(&entries);
                info!(
                    "Loaded {} artist genre fallbacks from {}",
                    table.len(),
                    path.display()
                );
                table
            }
            Err(error) => {
                warn!(
                    "Failed to load artist fallbacks {}: {}; continuing without them",
                    path.display(),
                    error
                );
                Self::default()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.genres.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.genres.is_empty()
    }

    /// Raw genre for an artist name, matched case- and whitespace-insensitively.
    pub fn lookup(&self, artist_name: &str) -> Option<&str> {
        self.genres.get(&normalize(artist_name)).map(String::as_str)
    }
}
