//! Fetch-and-enrich pipeline producing the genre-tagged catalog.

use std::fs;
use std::path::Path;
use std::time::Duration;

use log::{info, warn};

use crate::artist_fallback::ArtistFallbackTable;
use crate::backends::MusicPlatformAdapter;
use crate::config::PathsConfig;
use crate::genre_aliases::GenreAliasTable;
use crate::genre_cache::GenreCache;
use crate::genre_resolver::{GenreResolver, ResolutionSummary};
use crate::track_collector::TrackCollector;
use crate::track_record::{CatalogRecord, TrackRecord};

const BUNDLED_ALIASES: &str = include_str!("../data/genre_aliases.json");
const BUNDLED_FALLBACKS: &str = include_str!("../data/artist_fallbacks.json");

/// Writes `contents` to `path` unless a file already exists there.
///
/// Returns whether the file was written.
fn seed_table(path: &Path, contents: &str) -> Result<bool, String> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|err| format!("failed to create {}: {err}", parent.display()))?;
    }
    fs::write(path, contents).map_err(|err| format!("failed to write {}: {err}", path.display()))?;
    info!("Installed default table at {}", path.display());
    Ok(true)
}

/// Installs the bundled alias and fallback tables at their default locations.
///
/// Explicitly configured paths are left alone.
pub fn seed_default_tables(paths: &PathsConfig) {
    let defaults = [
        (paths.alias_file.is_none(), paths.alias_file(), BUNDLED_ALIASES),
        (paths.fallback_file.is_none(), paths.fallback_file(), BUNDLED_FALLBACKS),
    ];
    for (is_default, path, contents) in defaults {
        if !is_default {
            continue;
        }
        if let Err(error) = seed_table(&path, contents) {
            warn!("Failed to install default table: {error}");
        }
    }
}

/// Genre state loaded once at startup and shared by every pipeline stage.
pub struct GenreState {
    pub cache: GenreCache,
    pub aliases: GenreAliasTable,
    pub fallback: ArtistFallbackTable,
}

impl GenreState {
    /// Loads all three files; each falls back to an empty structure on failure.
    pub fn load(paths: &PathsConfig) -> Self {
        Self {
            cache: GenreCache::load(paths.cache_file()),
            aliases: GenreAliasTable::load(&paths.alias_file()),
            fallback: ArtistFallbackTable::load(&paths.fallback_file()),
        }
    }
}

/// Result of one catalog run: every track with its final genre.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub tracks: Vec<TrackRecord>,
    pub resolution: ResolutionSummary,
}

impl Catalog {
    /// Flat output rows in collection order.
    pub fn records(&self) -> Vec<CatalogRecord> {
        self.tracks.iter().map(CatalogRecord::from).collect()
    }
}

/// Collects every track and resolves its genre.
pub fn build_catalog<A: MusicPlatformAdapter>(
    adapter: &A,
    state: &mut GenreState,
    artist_batch_delay: Duration,
) -> Result<Catalog, String> {
    info!("Starting to fetch all tracks");
    let mut tracks = TrackCollector::new(adapter).collect()?;

    let resolution = GenreResolver::new(
        adapter,
        &mut state.cache,
        &state.aliases,
        &state.fallback,
        artist_batch_delay,
    )
    .resolve(&mut tracks)?;

    Ok(Catalog { tracks, resolution })
}
