//! Spotify Web API adapter implementation.

use std::time::Duration;

use log::debug;
use serde_json::{json, Value};

use crate::backends::{
    MusicPlatformAdapter, PlatformArtist, PlatformPlaylist, PlatformTrack, PlaylistPage,
    TrackPage, MAX_ARTISTS_PER_LOOKUP, MAX_ITEMS_PER_ADD,
};
use crate::track_uri::{spotify_track_uri, spotify_track_url};

pub const DEFAULT_API_BASE_URL: &str = "https://api.spotify.com/v1";

/// Spotify adapter backed by a blocking `ureq` agent.
pub struct SpotifyAdapter {
    http_client: ureq::Agent,
    api_base_url: String,
    access_token: String,
}

impl SpotifyAdapter {
    /// Creates a new adapter authenticated with an already-issued access token.
    pub fn new(api_base_url: &str, access_token: &str) -> Self {
        let http_client = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(5))
            .timeout_read(Duration::from_secs(15))
            .timeout_write(Duration::from_secs(15))
            .build();
        Self {
            http_client,
            api_base_url: Self::endpoint_base(api_base_url),
            access_token: access_token.trim().to_string(),
        }
    }

    fn endpoint_base(endpoint: &str) -> String {
        endpoint.trim().trim_end_matches('/').to_string()
    }

    fn api_url(&self, path: &str, params: &[(&str, String)]) -> String {
        let mut url = format!("{}/{}", self.api_base_url, path.trim_start_matches('/'));
        if params.is_empty() {
            return url;
        }
        url.push('?');
        let query: Vec<String> = params
            .iter()
            .map(|(key, value)| format!("{key}={}", urlencoding::encode(value)))
            .collect();
        url.push_str(&query.join("&"));
        url
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token)
    }

    fn error_message(operation: &str, error: ureq::Error) -> String {
        match error {
            ureq::Error::Status(code, response) => {
                let detail = response
                    .into_json::<Value>()
                    .ok()
                    .and_then(|body| {
                        body.get("error")
                            .and_then(|value| value.get("message"))
                            .and_then(Value::as_str)
                            .map(ToOwned::to_owned)
                    })
                    .unwrap_or_else(|| "no error message".to_string());
                format!("Spotify request failed ({operation}): HTTP {code}: {detail}")
            }
            ureq::Error::Transport(transport) => {
                format!("Spotify request failed ({operation}): {transport}")
            }
        }
    }

    fn get_json(&self, operation: &str, url: &str) -> Result<Value, String> {
        debug!("Spotify GET {url}");
        let response = self
            .http_client
            .get(url)
            .set("Authorization", &self.bearer())
            .set("Accept", "application/json")
            .call()
            .map_err(|err| Self::error_message(operation, err))?;
        response
            .into_json()
            .map_err(|err| format!("Spotify response parse failed ({operation}): {err}"))
    }

    fn post_json(&self, operation: &str, url: &str, body: Value) -> Result<Value, String> {
        debug!("Spotify POST {url}");
        let response = self
            .http_client
            .post(url)
            .set("Authorization", &self.bearer())
            .set("Accept", "application/json")
            .send_json(body)
            .map_err(|err| Self::error_message(operation, err))?;
        response
            .into_json()
            .map_err(|err| format!("Spotify response parse failed ({operation}): {err}"))
    }

    /// Resolves the URL of a page: the first page is built from `path`, later
    /// pages follow the absolute `next` link the API returned.
    fn page_url(&self, path: &str, cursor: Option<&str>, page_size: usize) -> String {
        match cursor {
            Some(next) => next.to_string(),
            None => self.api_url(path, &[("limit", page_size.to_string())]),
        }
    }

    fn next_cursor(payload: &Value) -> Option<String> {
        payload
            .get("next")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(ToOwned::to_owned)
    }

    fn array_items(payload: &Value) -> Vec<&Value> {
        payload
            .get("items")
            .and_then(Value::as_array)
            .map(|items| items.iter().collect())
            .unwrap_or_default()
    }

    fn parse_track_item(item: &Value) -> Option<PlatformTrack> {
        let track = item.get("track")?;
        if track.is_null() {
            return None;
        }
        let is_track = track
            .get("type")
            .and_then(Value::as_str)
            .map_or(true, |kind| kind == "track");
        if !is_track {
            return None;
        }
        let primary_artist = track.get("artists")?.as_array()?.first()?;
        let artist = primary_artist
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or("Unknown Artist")
            .to_string();
        let artist_id = primary_artist
            .get("id")
            .and_then(Value::as_str)
            .filter(|value| !value.is_empty())
            .map(ToOwned::to_owned);
        let title = track
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or("Unknown Title")
            .to_string();
        let url = track
            .get("external_urls")
            .and_then(|value| value.get("spotify"))
            .and_then(Value::as_str)
            .map(ToOwned::to_owned)
            .or_else(|| {
                track
                    .get("id")
                    .and_then(Value::as_str)
                    .map(spotify_track_url)
            })
            .unwrap_or_default();
        Some(PlatformTrack {
            title,
            artist,
            artist_id,
            url,
        })
    }

    fn parse_track_page(payload: &Value) -> TrackPage {
        TrackPage {
            items: Self::array_items(payload)
                .into_iter()
                .map(Self::parse_track_item)
                .collect(),
            next: Self::next_cursor(payload),
        }
    }

    fn parse_playlist(playlist: &Value) -> Option<PlatformPlaylist> {
        let playlist_id = playlist.get("id")?.as_str()?.to_string();
        let name = playlist
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or("Untitled Playlist")
            .to_string();
        let owner_id = playlist
            .get("owner")
            .and_then(|value| value.get("id"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Some(PlatformPlaylist {
            playlist_id,
            name,
            owner_id,
        })
    }

    fn parse_artist(artist: &Value) -> Option<PlatformArtist> {
        let artist_id = artist.get("id")?.as_str()?.to_string();
        let genres = artist
            .get("genres")
            .and_then(Value::as_array)
            .map(|genres| {
                genres
                    .iter()
                    .filter_map(Value::as_str)
                    .map(ToOwned::to_owned)
                    .collect()
            })
            .unwrap_or_default();
        Some(PlatformArtist { artist_id, genres })
    }
}

impl MusicPlatformAdapter for SpotifyAdapter {
    fn current_user_id(&self) -> Result<String, String> {
        let payload = self.get_json("me", &self.api_url("me", &[]))?;
        payload
            .get("id")
            .and_then(Value::as_str)
            .map(ToOwned::to_owned)
            .ok_or_else(|| "Spotify /me response missing user id".to_string())
    }

    fn saved_tracks_page(
        &self,
        cursor: Option<&str>,
        page_size: usize,
    ) -> Result<TrackPage, String> {
        let url = self.page_url("me/tracks", cursor, page_size);
        let payload = self.get_json("saved tracks", &url)?;
        Ok(Self::parse_track_page(&payload))
    }

    fn user_playlists_page(
        &self,
        cursor: Option<&str>,
        page_size: usize,
    ) -> Result<PlaylistPage, String> {
        let url = self.page_url("me/playlists", cursor, page_size);
        let payload = self.get_json("playlists", &url)?;
        Ok(PlaylistPage {
            items: Self::array_items(&payload)
                .into_iter()
                .filter_map(Self::parse_playlist)
                .collect(),
            next: Self::next_cursor(&payload),
        })
    }

    fn playlist_tracks_page(
        &self,
        playlist_id: &str,
        cursor: Option<&str>,
        page_size: usize,
    ) -> Result<TrackPage, String> {
        let path = format!("playlists/{}/tracks", urlencoding::encode(playlist_id));
        let url = self.page_url(&path, cursor, page_size);
        let payload = self.get_json("playlist tracks", &url)?;
        Ok(Self::parse_track_page(&payload))
    }

    fn artists(&self, artist_ids: &[String]) -> Result<Vec<PlatformArtist>, String> {
        if artist_ids.is_empty() {
            return Ok(Vec::new());
        }
        if artist_ids.len() > MAX_ARTISTS_PER_LOOKUP {
            return Err(format!(
                "artist lookup accepts at most {MAX_ARTISTS_PER_LOOKUP} ids, got {}",
                artist_ids.len()
            ));
        }
        let url = self.api_url("artists", &[("ids", artist_ids.join(","))]);
        let payload = self.get_json("artists", &url)?;
        // Unknown ids come back as `null` entries and are dropped here.
        Ok(payload
            .get("artists")
            .and_then(Value::as_array)
            .map(|artists| artists.iter().filter_map(Self::parse_artist).collect())
            .unwrap_or_default())
    }

    fn create_playlist(
        &self,
        owner_id: &str,
        name: &str,
        public: bool,
    ) -> Result<String, String> {
        let trimmed_name = name.trim();
        if trimmed_name.is_empty() {
            return Err("playlist name cannot be empty".to_string());
        }
        let path = format!("users/{}/playlists", urlencoding::encode(owner_id));
        let payload = self.post_json(
            "create playlist",
            &self.api_url(&path, &[]),
            json!({ "name": trimmed_name, "public": public }),
        )?;
        payload
            .get("id")
            .and_then(Value::as_str)
            .map(ToOwned::to_owned)
            .ok_or_else(|| "Spotify create playlist response missing playlist id".to_string())
    }

    fn add_playlist_items(&self, playlist_id: &str, track_ids: &[String]) -> Result<(), String> {
        if track_ids.len() > MAX_ITEMS_PER_ADD {
            return Err(format!(
                "add items accepts at most {MAX_ITEMS_PER_ADD} tracks, got {}",
                track_ids.len()
            ));
        }
        let uris: Vec<String> = track_ids
            .iter()
            .map(|track_id| spotify_track_uri(track_id))
            .collect();
        let path = format!("playlists/{}/tracks", urlencoding::encode(playlist_id));
        self.post_json(
            "add playlist items",
            &self.api_url(&path, &[]),
            json!({ "uris": uris }),
        )?;
        Ok(())
    }
}
