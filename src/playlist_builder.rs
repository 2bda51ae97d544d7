//! Materializes genre-grouped playlists on the platform.

use std::collections::HashMap;
use std::thread;
use std::time::Duration;

use log::{info, warn};

use crate::backends::{MusicPlatformAdapter, MAX_ITEMS_PER_ADD};
use crate::track_record::TrackRecord;
use crate::track_uri::track_id_from_url;

/// Playlist naming, visibility and pacing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistSettings {
    pub name_prefix: String,
    pub min_tracks: usize,
    pub public: bool,
    pub creation_delay: Duration,
}

impl Default for PlaylistSettings {
    fn default() -> Self {
        Self {
            name_prefix: "[Auto]".to_string(),
            min_tracks: 3,
            public: false,
            creation_delay: Duration::from_secs(1),
        }
    }
}

impl PlaylistSettings {
    pub fn playlist_name(&self, genre: &str) -> String {
        format!("{} {} Collection", self.name_prefix, genre)
    }
}

/// Tracks of one canonical genre in collection order.
///
/// `track_ids` holds the platform ids of those tracks that have one; it is
/// what gets added to the playlist and what the threshold is checked against.
#[derive(Debug, Clone)]
pub struct PlaylistDraft<'t> {
    pub genre: String,
    pub tracks: Vec<&'t TrackRecord>,
    pub track_ids: Vec<String>,
}

impl<'t> PlaylistDraft<'t> {
    fn push(&mut self, track: &'t TrackRecord) {
        self.tracks.push(track);
        match track_id_from_url(&track.url) {
            Some(track_id) => self.track_ids.push(track_id),
            None => warn!(
                "Skipping '{}' by {}: no platform track id in '{}'",
                track.song, track.artist, track.url
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedPlaylist {
    pub genre: String,
    pub playlist_id: String,
    pub track_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaylistBuildSummary {
    pub created: Vec<CreatedPlaylist>,
    pub skipped: Vec<String>,
}

impl PlaylistBuildSummary {
    pub fn created_count(&self) -> usize {
        self.created.len()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

/// Groups tracks by their resolved genre, first-seen genre order.
pub fn group_by_genre(tracks: &[TrackRecord]) -> Vec<PlaylistDraft<'_>> {
    let mut drafts: Vec<PlaylistDraft<'_>> = Vec::new();
    let mut slots: HashMap<&str, usize> = HashMap::new();
    for track in tracks {
        let genre = track.genre_label();
        let slot = match slots.get(genre) {
            Some(&slot) => slot,
            None => {
                slots.insert(genre, drafts.len());
                drafts.push(PlaylistDraft {
                    genre: genre.to_string(),
                    tracks: Vec::new(),
                    track_ids: Vec::new(),
                });
                drafts.len() - 1
            }
        };
        drafts[slot].push(track);
    }
    drafts
}

pub struct PlaylistBuilder<'a, A: MusicPlatformAdapter> {
    adapter: &'a A,
    settings: PlaylistSettings,
}

impl<'a, A: MusicPlatformAdapter> PlaylistBuilder<'a, A> {
    pub fn new(adapter: &'a A, settings: PlaylistSettings) -> Self {
        Self { adapter, settings }
    }

    /// Creates one playlist per qualifying genre.
    ///
    /// A failed add-items call aborts the build and leaves the partially
    /// filled playlist in place.
    pub fn build(&self, tracks: &[TrackRecord]) -> Result<PlaylistBuildSummary, String> {
        let drafts = group_by_genre(tracks);
        info!("Found {} unique genres in the catalog", drafts.len());

        let mut summary = PlaylistBuildSummary::default();
        let mut owner_id: Option<String> = None;
        for (index, draft) in drafts.iter().enumerate() {
            info!(
                "Processing genre {}/{}: {} ({} tracks)",
                index + 1,
                drafts.len(),
                draft.genre,
                draft.track_ids.len()
            );
            if draft.track_ids.len() < self.settings.min_tracks {
                info!(
                    "Excluded genre '{}' with only {} tracks (below threshold of {}):",
                    draft.genre,
                    draft.track_ids.len(),
                    self.settings.min_tracks
                );
                for track in &draft.tracks {
                    info!("  - {} by {}", track.song, track.artist);
                }
                summary.skipped.push(draft.genre.clone());
                continue;
            }

            let owner = match owner_id.as_ref() {
                Some(owner) => owner.clone(),
                None => {
                    let fetched = self.adapter.current_user_id()?;
                    owner_id = Some(fetched.clone());
                    fetched
                }
            };
            let created = self.create_playlist(&owner, draft)?;
            summary.created.push(created);
            if !self.settings.creation_delay.is_zero() {
                thread::sleep(self.settings.creation_delay);
            }
        }

        info!(
            "Playlist creation complete: created {} playlists, skipped {} genres with too few tracks",
            summary.created_count(),
            summary.skipped_count()
        );
        Ok(summary)
    }

    fn create_playlist(
        &self,
        owner_id: &str,
        draft: &PlaylistDraft<'_>,
    ) -> Result<CreatedPlaylist, String> {
        let name = self.settings.playlist_name(&draft.genre);
        info!("Creating playlist: {name}");
        let playlist_id = self
            .adapter
            .create_playlist(owner_id, &name, self.settings.public)?;

        let track_ids = &draft.track_ids;
        for (chunk_index, chunk) in track_ids.chunks(MAX_ITEMS_PER_ADD).enumerate() {
            let start = chunk_index * MAX_ITEMS_PER_ADD;
            info!(
                "Adding tracks {}-{} of {} to playlist",
                start + 1,
                start + chunk.len(),
                track_ids.len()
            );
            self.adapter.add_playlist_items(&playlist_id, chunk)?;
        }

        info!(
            "Created playlist for '{}' with {} tracks",
            draft.genre,
            track_ids.len()
        );
        Ok(CreatedPlaylist {
            genre: draft.genre.clone(),
            playlist_id,
            track_count: track_ids.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{group_by_genre, PlaylistBuilder, PlaylistSettings};
    use crate::backends::fake::{track, FakeCall, FakePlatform};
    use crate::track_record::TrackRecord;
    use std::time::{Duration, Instant};

    fn settings() -> PlaylistSettings {
        PlaylistSettings {
            creation_delay: Duration::ZERO,
            ..PlaylistSettings::default()
        }
    }

    fn resolved(song: &str, genre: &str) -> TrackRecord {
        let mut record = TrackRecord::from_platform(track(song, "Artist", "a1", song));
        record.genre = Some(genre.to_string());
        record
    }

    fn tracks_of(genre: &str, count: usize) -> Vec<TrackRecord> {
        (0..count)
            .map(|index| resolved(&format!("{genre}-{index}"), genre))
            .collect()
    }

    #[test]
    fn test_group_by_genre_keeps_first_seen_order() {
        let tracks = vec![
            resolved("a", "Rock"),
            resolved("b", "Jazz"),
            resolved("c", "Rock"),
            resolved("d", "Unknown"),
        ];
        let drafts = group_by_genre(&tracks);
        let genres: Vec<&str> = drafts.iter().map(|draft| draft.genre.as_str()).collect();
        assert_eq!(genres, vec!["Rock", "Jazz", "Unknown"]);
        let rock_songs: Vec<&str> = drafts[0].tracks.iter().map(|t| t.song.as_str()).collect();
        assert_eq!(rock_songs, vec!["a", "c"]);
    }

    #[test]
    fn test_build_skips_genre_below_threshold() {
        let platform = FakePlatform::new("me");
        let tracks = tracks_of("Jazz", 2);

        let summary = PlaylistBuilder::new(&platform, settings())
            .build(&tracks)
            .expect("build should succeed");

        assert_eq!(summary.skipped, vec!["Jazz".to_string()]);
        assert!(summary.created.is_empty());
        assert!(platform.created_playlists().is_empty());
        assert!(platform.add_item_batches().is_empty());
    }

    #[test]
    fn test_build_creates_private_playlist_at_threshold() {
        let platform = FakePlatform::new("me");
        let tracks = tracks_of("Blues", 3);

        let summary = PlaylistBuilder::new(&platform, settings())
            .build(&tracks)
            .expect("build should succeed");

        assert_eq!(summary.created_count(), 1);
        assert_eq!(summary.created[0].track_count, 3);
        assert!(platform.calls().contains(&FakeCall::CreatePlaylist {
            owner_id: "me".to_string(),
            name: "[Auto] Blues Collection".to_string(),
            public: false,
        }));
        assert_eq!(
            platform.add_item_batches(),
            vec![vec![
                "Blues-0".to_string(),
                "Blues-1".to_string(),
                "Blues-2".to_string()
            ]]
        );
    }

    #[test]
    fn test_build_chunks_large_playlist_by_hundred() {
        let platform = FakePlatform::new("me");
        let tracks = tracks_of("Pop", 250);

        PlaylistBuilder::new(&platform, settings())
            .build(&tracks)
            .expect("build should succeed");

        let batches = platform.add_item_batches();
        let sizes: Vec<usize> = batches.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![100, 100, 50]);
        assert_eq!(batches[0][0], "Pop-0");
        assert_eq!(batches[2][49], "Pop-249");
    }

    #[test]
    fn test_build_includes_unknown_genre_and_fetches_user_once() {
        let platform = FakePlatform::new("me");
        let mut tracks = tracks_of("Unknown", 3);
        tracks.extend(tracks_of("Soul", 4));

        let summary = PlaylistBuilder::new(&platform, settings())
            .build(&tracks)
            .expect("build should succeed");

        assert_eq!(
            platform.created_playlists(),
            vec![
                "[Auto] Unknown Collection".to_string(),
                "[Auto] Soul Collection".to_string()
            ]
        );
        assert_eq!(summary.created_count(), 2);
        let user_calls = platform
            .calls()
            .iter()
            .filter(|call| matches!(call, FakeCall::CurrentUser))
            .count();
        assert_eq!(user_calls, 1);
    }

    #[test]
    fn test_build_aborts_without_rollback_when_add_fails() {
        let mut platform = FakePlatform::new("me");
        platform.fail_add_after = Some(1);
        let tracks = tracks_of("Rock", 150);

        let error = PlaylistBuilder::new(&platform, settings())
            .build(&tracks)
            .expect_err("second chunk should fail");

        assert!(error.contains("rejected"));
        assert_eq!(platform.created_playlists().len(), 1);
        assert_eq!(platform.add_item_batches().len(), 1);
    }

    #[test]
    fn test_build_drops_tracks_without_platform_id() {
        let platform = FakePlatform::new("me");
        let mut tracks = tracks_of("Folk", 4);
        tracks[1].url = String::new();

        let summary = PlaylistBuilder::new(&platform, settings())
            .build(&tracks)
            .expect("build should succeed");

        assert_eq!(summary.created[0].track_count, 3);
        assert_eq!(
            platform.add_item_batches(),
            vec![vec![
                "Folk-0".to_string(),
                "Folk-2".to_string(),
                "Folk-3".to_string()
            ]]
        );
    }

    #[test]
    fn test_threshold_counts_only_tracks_with_platform_id() {
        let platform = FakePlatform::new("me");
        let mut tracks = tracks_of("Folk", 3);
        tracks[0].url = String::new();
        tracks[1].url = String::new();

        let summary = PlaylistBuilder::new(&platform, settings())
            .build(&tracks)
            .expect("build should succeed");

        assert_eq!(summary.skipped, vec!["Folk".to_string()]);
        assert!(summary.created.is_empty());
        assert!(platform.created_playlists().is_empty());
        assert!(platform.add_item_batches().is_empty());

        let drafts = group_by_genre(&tracks);
        assert_eq!(drafts[0].tracks.len(), 3);
        assert_eq!(drafts[0].track_ids, vec!["Folk-2".to_string()]);
    }

    #[test]
    fn test_build_sleeps_after_created_playlists_only() {
        let platform = FakePlatform::new("me");
        let delay = Duration::from_millis(150);
        let mut tracks = tracks_of("Jazz", 2);
        tracks.extend(tracks_of("Blues", 3));

        let started = Instant::now();
        let summary = PlaylistBuilder::new(
            &platform,
            PlaylistSettings {
                creation_delay: delay,
                ..PlaylistSettings::default()
            },
        )
        .build(&tracks)
        .expect("build should succeed");
        let elapsed = started.elapsed();

        assert_eq!(summary.skipped_count(), 1);
        assert_eq!(summary.created_count(), 1);
        assert!(elapsed >= delay, "created playlist should be followed by a pause");
        assert!(
            elapsed < delay * 2,
            "skipped genre should not pause, took {elapsed:?}"
        );
    }
}
