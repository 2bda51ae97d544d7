//! Collects liked tracks and tracks of user-owned playlists.

use log::{debug, info};

use crate::backends::{MusicPlatformAdapter, PlatformPlaylist, TrackPage};
use crate::track_record::TrackRecord;

pub const SAVED_TRACKS_PAGE_SIZE: usize = 50;
pub const PLAYLISTS_PAGE_SIZE: usize = 50;
pub const PLAYLIST_TRACKS_PAGE_SIZE: usize = 100;

/// Walks every paginated listing and emits one record per accepted track.
pub struct TrackCollector<'a, A: MusicPlatformAdapter> {
    adapter: &'a A,
}

impl<'a, A: MusicPlatformAdapter> TrackCollector<'a, A> {
    pub fn new(adapter: &'a A) -> Self {
        Self { adapter }
    }

    /// Returns saved tracks first, then owned playlists in listing order.
    pub fn collect(&self) -> Result<Vec<TrackRecord>, String> {
        let mut records = self.collect_saved_tracks()?;
        let saved_count = records.len();
        info!("Completed processing {saved_count} liked tracks");

        let user_id = self.adapter.current_user_id()?;
        let playlists = self.owned_playlists(&user_id)?;
        for (index, playlist) in playlists.iter().enumerate() {
            info!(
                "Processing playlist {}/{}: {}",
                index + 1,
                playlists.len(),
                playlist.name
            );
            let before = records.len();
            self.collect_playlist_tracks(playlist, &mut records)?;
            info!(
                "Completed processing {} tracks from playlist: {}",
                records.len() - before,
                playlist.name
            );
        }

        info!("Finished collecting a total of {} tracks", records.len());
        Ok(records)
    }

    fn collect_saved_tracks(&self) -> Result<Vec<TrackRecord>, String> {
        info!("Fetching saved tracks");
        let mut records = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page = self
                .adapter
                .saved_tracks_page(cursor.as_deref(), SAVED_TRACKS_PAGE_SIZE)?;
            cursor = Self::accept_page(page, &mut records);
            if cursor.is_none() {
                break;
            }
            info!("Processed {} liked tracks so far, fetching more", records.len());
        }
        Ok(records)
    }

    fn owned_playlists(&self, user_id: &str) -> Result<Vec<PlatformPlaylist>, String> {
        let mut owned = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page = self
                .adapter
                .user_playlists_page(cursor.as_deref(), PLAYLISTS_PAGE_SIZE)?;
            for playlist in page.items {
                if playlist.owner_id == user_id {
                    owned.push(playlist);
                } else {
                    debug!(
                        "Skipping playlist '{}' owned by {}",
                        playlist.name, playlist.owner_id
                    );
                }
            }
            cursor = page.next;
            if cursor.is_none() {
                break;
            }
        }
        info!("Found {} playlists owned by {}", owned.len(), user_id);
        Ok(owned)
    }

    fn collect_playlist_tracks(
        &self,
        playlist: &PlatformPlaylist,
        records: &mut Vec<TrackRecord>,
    ) -> Result<(), String> {
        let mut cursor: Option<String> = None;
        loop {
            let page = self.adapter.playlist_tracks_page(
                &playlist.playlist_id,
                cursor.as_deref(),
                PLAYLIST_TRACKS_PAGE_SIZE,
            )?;
            cursor = Self::accept_page(page, records);
            if cursor.is_none() {
                return Ok(());
            }
            debug!("Fetching next page of playlist {}", playlist.name);
        }
    }

    fn accept_page(page: TrackPage, records: &mut Vec<TrackRecord>) -> Option<String> {
        for track in page.items.into_iter().flatten() {
            debug!("Processing: {} by {}", track.title, track.artist);
            records.push(TrackRecord::from_platform(track));
        }
        page.next
    }
}
