//! Music platform adapter abstractions and concrete implementations.

#[cfg(test)]
pub mod fake;
pub mod spotify;

/// Remote track payload returned by platform adapters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformTrack {
    pub title: String,
    pub artist: String,
    /// Primary artist id. Local files uploaded to the platform have none.
    pub artist_id: Option<String>,
    pub url: String,
}

/// One page of track entries. `None` items are deleted or non-track entries.
#[derive(Debug, Clone, Default)]
pub struct TrackPage {
    pub items: Vec<Option<PlatformTrack>>,
    /// Opaque cursor for the next page; `None` once the listing is exhausted.
    pub next: Option<String>,
}

/// Playlist summary as listed for the current user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformPlaylist {
    pub playlist_id: String,
    pub name: String,
    pub owner_id: String,
}

/// One page of playlist summaries.
#[derive(Debug, Clone, Default)]
pub struct PlaylistPage {
    pub items: Vec<PlatformPlaylist>,
    pub next: Option<String>,
}

/// Artist metadata returned by batched artist lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformArtist {
    pub artist_id: String,
    pub genres: Vec<String>,
}

/// Interface implemented by concrete music platform adapters.
///
/// Cursors are opaque: `None` requests the first page and every later call
/// passes back the `next` value of the previous page unchanged.
pub trait MusicPlatformAdapter {
    fn current_user_id(&self) -> Result<String, String>;
    fn saved_tracks_page(
        &self,
        cursor: Option<&str>,
        page_size: usize,
    ) -> Result<TrackPage, String>;
    fn user_playlists_page(
        &self,
        cursor: Option<&str>,
        page_size: usize,
    ) -> Result<PlaylistPage, String>;
    fn playlist_tracks_page(
        &self,
        playlist_id: &str,
        cursor: Option<&str>,
        page_size: usize,
    ) -> Result<TrackPage, String>;
    /// Looks up at most [`MAX_ARTISTS_PER_LOOKUP`] artists in one call.
    fn artists(&self, artist_ids: &[String]) -> Result<Vec<PlatformArtist>, String>;
    fn create_playlist(&self, owner_id: &str, name: &str, public: bool)
        -> Result<String, String>;
    /// Appends at most [`MAX_ITEMS_PER_ADD`] tracks, by platform track id.
    fn add_playlist_items(&self, playlist_id: &str, track_ids: &[String]) -> Result<(), String>;
}

/// Remote limit for one batched artist lookup.
pub const MAX_ARTISTS_PER_LOOKUP: usize = 50;
/// Remote limit for one add-items call.
pub const MAX_ITEMS_PER_ADD: usize = 100;
