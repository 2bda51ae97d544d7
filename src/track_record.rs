//! Track records flowing through the catalog pipeline.

use crate::backends::PlatformTrack;

/// Genre assigned when no source knows the artist.
pub const UNKNOWN_GENRE: &str = "Unknown";

/// One collected track. `genre` stays `None` until the resolver runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackRecord {
    pub song: String,
    pub artist: String,
    pub artist_id: Option<String>,
    pub url: String,
    pub genre: Option<String>,
}

impl TrackRecord {
    pub fn from_platform(track: PlatformTrack) -> Self {
        Self {
            song: track.title,
            artist: track.artist,
            artist_id: track.artist_id,
            url: track.url,
            genre: None,
        }
    }

    /// Final genre label; unresolved tracks report [`UNKNOWN_GENRE`].
    pub fn genre_label(&self) -> &str {
        self.genre.as_deref().unwrap_or(UNKNOWN_GENRE)
    }
}

/// Flat output row handed to export and playlist-confirmation flows.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CatalogRecord {
    pub song: String,
    pub artist: String,
    pub genre: String,
    pub url: String,
}

impl From<&TrackRecord> for CatalogRecord {
    fn from(track: &TrackRecord) -> Self {
        Self {
            song: track.song.clone(),
            artist: track.artist.clone(),
            genre: track.genre_label().to_string(),
            url: track.url.clone(),
        }
    }
}
