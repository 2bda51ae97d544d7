//! Canonical genre registry and genre-name normalization.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use log::{debug, info, warn};

use crate::track_record::UNKNOWN_GENRE;

/// One group of the alias file: `{"genre": "Hip Hop", "aliases": ["rap"]}`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct AliasGroup {
    pub genre: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// Lowercases and collapses whitespace runs to single spaces.
///
/// Empty input is returned unchanged.
pub fn normalize(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Capitalizes the first letter of every word and lowercases the rest.
pub fn capitalize_words(value: &str) -> String {
    value
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            let Some(first) = chars.next() else {
                return String::new();
            };
            let mut out: String = first.to_uppercase().collect();
            out.push_str(&chars.as_str().to_lowercase());
            out
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalized alias to canonical genre lookup, read-only after construction.
#[derive(Debug, Clone, Default)]
pub struct GenreAliasTable {
    aliases: HashMap<String, String>,
}

impl GenreAliasTable {
    /// Builds the table. Later groups win when two claim the same alias.
    pub fn from_groups(groups: &[AliasGroup]) -> Self {
        let mut aliases = HashMap::new();
        for group in groups {
            let canonical = capitalize_words(&group.genre);
            if canonical.is_empty() {
                continue;
            }
            Self::register(&mut aliases, &canonical, &canonical);
            for alias in &group.aliases {
                Self::register(&mut aliases, alias, &canonical);
            }
        }
        Self { aliases }
    }

    fn register(aliases: &mut HashMap<String, String>, alias: &str, canonical: &str) {
        let key = normalize(alias);
        if key.is_empty() {
            return;
        }
        if let Some(previous) = aliases.insert(key.clone(), canonical.to_string()) {
            if previous != canonical {
                debug!("Genre alias '{key}' moved from '{previous}' to '{canonical}'");
            }
        }
    }

    /// Loads groups from a JSON file; any failure yields an empty table.
    pub fn load(path: &Path) -> Self {
        match Self::read_groups(path) {
            Ok(groups) => {
                let table = Self::from_groups(&groups);
                info!(
                    "Loaded {} genre groups ({} aliases) from {}",
                    groups.len(),
                    table.len(),
                    path.display()
                );
                table
            }
            Err(error) => {
                warn!(
                    "Failed to load genre aliases {}: {}; genres will not be grouped",
                    path.display(),
                    error
                );
                Self::default()
            }
        }
    }

    fn read_groups(path: &Path) -> Result<Vec<AliasGroup>, String> {
        let content =
            fs::read_to_string(path).map_err(|err| format!("failed to read file: {err}"))?;
        serde_json::from_str(&content).map_err(|err| format!("invalid alias JSON: {err}"))
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    /// Canonical genre registered for `raw_genre`, if any.
    pub fn canonical(&self, raw_genre: &str) -> Option<&str> {
        self.aliases.get(&normalize(raw_genre)).map(String::as_str)
    }

    /// Maps a raw genre to its display label.
    ///
    /// `None` and `"Unknown"` pass through untouched. Unregistered genres are
    /// returned word-capitalized.
    pub fn map(&self, raw_genre: Option<&str>) -> Option<String> {
        let raw = raw_genre?;
        if raw == UNKNOWN_GENRE {
            return Some(raw.to_string());
        }
        Some(
            self.canonical(raw)
                .map(ToOwned::to_owned)
                .unwrap_or_else(|| capitalize_words(raw)),
        )
    }
}
