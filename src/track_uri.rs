//! Track locator helpers for platform source URLs.

const SPOTIFY_TRACK_URL_BASE: &str = "https://open.spotify.com/track";
const SPOTIFY_TRACK_URI_PREFIX: &str = "spotify:track:";

/// Extracts the platform track id from a track source URL.
///
/// The id is the trailing path segment; query strings and fragments such as
/// `?si=...` are ignored. Returns `None` for empty locators.
pub fn track_id_from_url(url: &str) -> Option<String> {
    let trimmed = url.trim();
    if let Some(id) = trimmed.strip_prefix(SPOTIFY_TRACK_URI_PREFIX) {
        return Some(id.to_string()).filter(|id| !id.is_empty());
    }
    let without_query = trimmed
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim_end_matches('/');
    let segment = without_query.rsplit('/').next().unwrap_or_default();
    if segment.is_empty() {
        return None;
    }
    Some(segment.to_string())
}

/// Builds the public web URL of a track from its id.
pub fn spotify_track_url(track_id: &str) -> String {
    format!("{SPOTIFY_TRACK_URL_BASE}/{track_id}")
}

/// Builds the `spotify:track:` URI the add-items endpoint expects.
pub fn spotify_track_uri(track_id: &str) -> String {
    if track_id.starts_with(SPOTIFY_TRACK_URI_PREFIX) {
        return track_id.to_string();
    }
    format!("{SPOTIFY_TRACK_URI_PREFIX}{track_id}")
}
