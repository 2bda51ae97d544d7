//! In-memory platform adapter that records every remote call.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::backends::{
    MusicPlatformAdapter, PlatformArtist, PlatformPlaylist, PlatformTrack, PlaylistPage,
    TrackPage,
};

/// Remote call observed by [`FakePlatform`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeCall {
    CurrentUser,
    SavedTracksPage { cursor: Option<String>, page_size: usize },
    PlaylistsPage { cursor: Option<String>, page_size: usize },
    PlaylistTracksPage { playlist_id: String, cursor: Option<String>, page_size: usize },
    Artists(Vec<String>),
    CreatePlaylist { owner_id: String, name: String, public: bool },
    AddItems { playlist_id: String, track_ids: Vec<String> },
}

/// Scriptable platform: listings are paged by offset cursors over fixed data.
#[derive(Default)]
pub struct FakePlatform {
    pub user_id: String,
    pub saved_tracks: Vec<Option<PlatformTrack>>,
    pub playlists: Vec<PlatformPlaylist>,
    pub playlist_tracks: HashMap<String, Vec<Option<PlatformTrack>>>,
    pub artist_genres: HashMap<String, Vec<String>>,
    /// Fails `add_playlist_items` once this many calls have succeeded.
    pub fail_add_after: Option<usize>,
    pub calls: RefCell<Vec<FakeCall>>,
}

pub fn track(title: &str, artist: &str, artist_id: &str, track_id: &str) -> PlatformTrack {
    PlatformTrack {
        title: title.to_string(),
        artist: artist.to_string(),
        artist_id: Some(artist_id.to_string()).filter(|id| !id.is_empty()),
        url: format!("https://open.spotify.com/track/{track_id}"),
    }
}

impl FakePlatform {
    pub fn new(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<FakeCall> {
        self.calls.borrow().clone()
    }

    pub fn artist_lookups(&self) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                FakeCall::Artists(ids) => Some(ids),
                _ => None,
            })
            .collect()
    }

    pub fn created_playlists(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                FakeCall::CreatePlaylist { name, .. } => Some(name),
                _ => None,
            })
            .collect()
    }

    pub fn add_item_batches(&self) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                FakeCall::AddItems { track_ids, .. } => Some(track_ids),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: FakeCall) {
        self.calls.borrow_mut().push(call);
    }

    fn page<T: Clone>(items: &[T], cursor: Option<&str>, page_size: usize) -> (Vec<T>, Option<String>) {
        let offset = cursor.and_then(|value| value.parse::<usize>().ok()).unwrap_or(0);
        let end = (offset + page_size.max(1)).min(items.len());
        let page = items.get(offset..end).map(<[T]>::to_vec).unwrap_or_default();
        let next = (end < items.len()).then(|| end.to_string());
        (page, next)
    }
}

impl MusicPlatformAdapter for FakePlatform {
    fn current_user_id(&self) -> Result<String, String> {
        self.record(FakeCall::CurrentUser);
        Ok(self.user_id.clone())
    }

    fn saved_tracks_page(
        &self,
        cursor: Option<&str>,
        page_size: usize,
    ) -> Result<TrackPage, String> {
        self.record(FakeCall::SavedTracksPage {
            cursor: cursor.map(ToOwned::to_owned),
            page_size,
        });
        let (items, next) = Self::page(&self.saved_tracks, cursor, page_size);
        Ok(TrackPage { items, next })
    }

    fn user_playlists_page(
        &self,
        cursor: Option<&str>,
        page_size: usize,
    ) -> Result<PlaylistPage, String> {
        self.record(FakeCall::PlaylistsPage {
            cursor: cursor.map(ToOwned::to_owned),
            page_size,
        });
        let (items, next) = Self::page(&self.playlists, cursor, page_size);
        Ok(PlaylistPage { items, next })
    }

    fn playlist_tracks_page(
        &self,
        playlist_id: &str,
        cursor: Option<&str>,
        page_size: usize,
    ) -> Result<TrackPage, String> {
        self.record(FakeCall::PlaylistTracksPage {
            playlist_id: playlist_id.to_string(),
            cursor: cursor.map(ToOwned::to_owned),
            page_size,
        });
        let tracks = self
            .playlist_tracks
            .get(playlist_id)
            .ok_or_else(|| format!("unknown playlist {playlist_id}"))?;
        let (items, next) = Self::page(tracks, cursor, page_size);
        Ok(TrackPage { items, next })
    }

    fn artists(&self, artist_ids: &[String]) -> Result<Vec<PlatformArtist>, String> {
        self.record(FakeCall::Artists(artist_ids.to_vec()));
        Ok(artist_ids
            .iter()
            .filter_map(|artist_id| {
                self.artist_genres
                    .get(artist_id)
                    .map(|genres| PlatformArtist {
                        artist_id: artist_id.clone(),
                        genres: genres.clone(),
                    })
            })
            .collect())
    }

    fn create_playlist(
        &self,
        owner_id: &str,
        name: &str,
        public: bool,
    ) -> Result<String, String> {
        self.record(FakeCall::CreatePlaylist {
            owner_id: owner_id.to_string(),
            name: name.to_string(),
            public,
        });
        Ok(format!("remote-{}", self.created_playlists().len()))
    }

    fn add_playlist_items(&self, playlist_id: &str, track_ids: &[String]) -> Result<(), String> {
        if let Some(limit) = self.fail_add_after {
            if self.add_item_batches().len() >= limit {
                return Err("add items rejected".to_string());
            }
        }
        self.record(FakeCall::AddItems {
            playlist_id: playlist_id.to_string(),
            track_ids: track_ids.to_vec(),
        });
        Ok(())
    }
}
