//! Tiered genre resolution: cache, batched platform lookup, artist fallback,
//! then alias canonicalization.
//!
//! Tracks are indexed by artist so each tier touches an artist once and
//! writes the result to every track of that artist directly.

use std::collections::HashMap;
use std::thread;
use std::time::Duration;

use log::{debug, info};

use crate::artist_fallback::ArtistFallbackTable;
use crate::backends::{MusicPlatformAdapter, MAX_ARTISTS_PER_LOOKUP};
use crate::genre_aliases::{normalize, GenreAliasTable};
use crate::genre_cache::GenreCache;
use crate::track_record::{TrackRecord, UNKNOWN_GENRE};

/// Counters describing one resolver run. Artist counts are per distinct artist.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionSummary {
    pub cache_hits: usize,
    /// Artists the platform answered for.
    pub remote_lookups: usize,
    pub remote_batches: usize,
    pub fallback_applications: usize,
    pub unknown_tracks: usize,
}

/// Tracks sharing one artist. Artists without an id are grouped by name.
#[derive(Debug)]
struct ArtistGroup {
    artist_id: Option<String>,
    artist_name: String,
    track_indices: Vec<usize>,
    raw_genre: Option<String>,
}

impl ArtistGroup {
    fn needs_fallback(&self) -> bool {
        self.raw_genre
            .as_deref()
            .map_or(true, |genre| genre == UNKNOWN_GENRE)
    }
}

pub struct GenreResolver<'a, A: MusicPlatformAdapter> {
    adapter: &'a A,
    cache: &'a mut GenreCache,
    aliases: &'a GenreAliasTable,
    fallback: &'a ArtistFallbackTable,
    batch_delay: Duration,
}

impl<'a, A: MusicPlatformAdapter> GenreResolver<'a, A> {
    pub fn new(
        adapter: &'a A,
        cache: &'a mut GenreCache,
        aliases: &'a GenreAliasTable,
        fallback: &'a ArtistFallbackTable,
        batch_delay: Duration,
    ) -> Self {
        Self {
            adapter,
            cache,
            aliases,
            fallback,
            batch_delay,
        }
    }

    /// Assigns a final genre to every track. Platform errors abort the run.
    pub fn resolve(&mut self, tracks: &mut [TrackRecord]) -> Result<ResolutionSummary, String> {
        let mut summary = ResolutionSummary::default();
        let mut groups = Self::group_by_artist(tracks);

        let pending = self.apply_cache(&mut groups, &mut summary);
        self.lookup_remote(&mut groups, &pending, &mut summary)?;
        self.apply_fallback(&mut groups, &mut summary);

        for group in &groups {
            let genre = self
                .aliases
                .map(group.raw_genre.as_deref())
                .unwrap_or_else(|| UNKNOWN_GENRE.to_string());
            if genre == UNKNOWN_GENRE {
                summary.unknown_tracks += group.track_indices.len();
            }
            for &index in &group.track_indices {
                tracks[index].genre = Some(genre.clone());
            }
        }

        info!(
            "Resolved genres for {} tracks: {} cache hits, {} artists looked up in {} batches, {} fallbacks, {} unknown",
            tracks.len(),
            summary.cache_hits,
            summary.remote_lookups,
            summary.remote_batches,
            summary.fallback_applications,
            summary.unknown_tracks
        );
        Ok(summary)
    }

    fn group_by_artist(tracks: &[TrackRecord]) -> Vec<ArtistGroup> {
        let mut groups: Vec<ArtistGroup> = Vec::new();
        let mut by_id: HashMap<String, usize> = HashMap::new();
        let mut by_name: HashMap<String, usize> = HashMap::new();
        for (index, track) in tracks.iter().enumerate() {
            let slot = match track.artist_id.as_ref() {
                Some(artist_id) => by_id.get(artist_id).copied(),
                None => by_name.get(&normalize(&track.artist)).copied(),
            };
            if let Some(slot) = slot {
                groups[slot].track_indices.push(index);
                continue;
            }
            match track.artist_id.as_ref() {
                Some(artist_id) => by_id.insert(artist_id.clone(), groups.len()),
                None => by_name.insert(normalize(&track.artist), groups.len()),
            };
            groups.push(ArtistGroup {
                artist_id: track.artist_id.clone(),
                artist_name: track.artist.clone(),
                track_indices: vec![index],
                raw_genre: None,
            });
        }
        groups
    }

    /// Fills cached genres and returns the group slots that still need a lookup.
    fn apply_cache(
        &self,
        groups: &mut [ArtistGroup],
        summary: &mut ResolutionSummary,
    ) -> Vec<usize> {
        let mut pending = Vec::new();
        for (slot, group) in groups.iter_mut().enumerate() {
            let Some(artist_id) = group.artist_id.as_deref() else {
                continue;
            };
            match self.cache.get(artist_id) {
                Some(cached) => {
                    group.raw_genre = cached.map(ToOwned::to_owned);
                    summary.cache_hits += 1;
                }
                None => pending.push(slot),
            }
        }
        pending
    }

    fn lookup_remote(
        &mut self,
        groups: &mut [ArtistGroup],
        pending: &[usize],
        summary: &mut ResolutionSummary,
    ) -> Result<(), String> {
        let batch_count = pending.len().div_ceil(MAX_ARTISTS_PER_LOOKUP);
        for (batch_index, batch) in pending.chunks(MAX_ARTISTS_PER_LOOKUP).enumerate() {
            if batch_index > 0 && !self.batch_delay.is_zero() {
                thread::sleep(self.batch_delay);
            }
            let artist_ids: Vec<String> = batch
                .iter()
                .filter_map(|&slot| groups[slot].artist_id.clone())
                .collect();
            info!(
                "Looking up genres for {} artists (batch {}/{})",
                artist_ids.len(),
                batch_index + 1,
                batch_count
            );
            let artists = self.adapter.artists(&artist_ids)?;
            summary.remote_batches += 1;

            let first_genres: HashMap<String, Option<String>> = artists
                .into_iter()
                .map(|artist| {
                    let first = artist
                        .genres
                        .into_iter()
                        .next()
                        .filter(|genre| !genre.trim().is_empty());
                    (artist.artist_id, first)
                })
                .collect();

            for &slot in batch {
                let group = &mut groups[slot];
                let Some(artist_id) = group.artist_id.as_deref() else {
                    continue;
                };
                let Some(first_genre) = first_genres.get(artist_id) else {
                    debug!("Platform returned no artist for id {artist_id}");
                    continue;
                };
                summary.remote_lookups += 1;
                self.cache.put(artist_id, first_genre.clone());
                group.raw_genre = first_genre.clone();
            }
            self.cache.save_if_dirty();
        }
        Ok(())
    }

    fn apply_fallback(&mut self, groups: &mut [ArtistGroup], summary: &mut ResolutionSummary) {
        for group in groups.iter_mut().filter(|group| group.needs_fallback()) {
            let Some(raw_genre) = self.fallback.lookup(&group.artist_name) else {
                continue;
            };
            info!(
                "Applied fallback genre '{}' to {} tracks by {}",
                raw_genre,
                group.track_indices.len(),
                group.artist_name
            );
            group.raw_genre = Some(raw_genre.to_string());
            summary.fallback_applications += 1;

            let Some(artist_id) = group.artist_id.as_deref() else {
                continue;
            };
            let has_known_genre = matches!(self.cache.get(artist_id), Some(Some(_)));
            if !has_known_genre {
                self.cache.put(artist_id, Some(raw_genre.to_string()));
            }
        }
        self.cache.save_if_dirty();
    }
}
