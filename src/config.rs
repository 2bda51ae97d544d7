//! Persistent application configuration model and defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::info;

use crate::backends::spotify::DEFAULT_API_BASE_URL;
use crate::playlist_builder::PlaylistSettings;

const APP_DIR_NAME: &str = "genrelist";
const MAX_DELAY_MS: u64 = 60_000;

/// Root configuration persisted to `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Config {
    #[serde(default)]
    /// Platform endpoint settings.
    pub spotify: SpotifyConfig,
    #[serde(default)]
    /// Locations of the genre cache and static tables.
    pub paths: PathsConfig,
    #[serde(default)]
    /// Fixed delays between remote calls.
    pub throttle: ThrottleConfig,
    #[serde(default)]
    /// Genre playlist creation preferences.
    pub playlists: PlaylistsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct SpotifyConfig {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
}

/// File locations. Unset paths resolve under the user data directory.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct PathsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias_file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ThrottleConfig {
    #[serde(default = "default_artist_batch_delay_ms")]
    pub artist_batch_delay_ms: u64,
    #[serde(default = "default_playlist_creation_delay_ms")]
    pub playlist_creation_delay_ms: u64,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct PlaylistsConfig {
    /// Create genre playlists after the catalog is built.
    #[serde(default)]
    pub create_playlists: bool,
    #[serde(default = "default_name_prefix")]
    pub name_prefix: String,
    #[serde(default = "default_min_tracks")]
    pub min_tracks: usize,
    #[serde(default)]
    pub public: bool,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct LoggingConfig {
    /// One of `off`, `error`, `warn`, `info`, `debug`, `trace`.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_artist_batch_delay_ms() -> u64 {
    200
}

fn default_playlist_creation_delay_ms() -> u64 {
    1_000
}

fn default_name_prefix() -> String {
    "[Auto]".to_string()
}

fn default_min_tracks() -> usize {
    3
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for SpotifyConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
        }
    }
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            artist_batch_delay_ms: default_artist_batch_delay_ms(),
            playlist_creation_delay_ms: default_playlist_creation_delay_ms(),
        }
    }
}

impl Default for PlaylistsConfig {
    fn default() -> Self {
        Self {
            create_playlists: false,
            name_prefix: default_name_prefix(),
            min_tracks: default_min_tracks(),
            public: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Per-user directory holding the cache and static tables.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR_NAME)
}

/// Default location of `config.toml`.
pub fn default_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join("config.toml"))
}

impl PathsConfig {
    pub fn cache_file(&self) -> PathBuf {
        self.cache_file
            .clone()
            .unwrap_or_else(|| default_data_dir().join("genre_cache.json"))
    }

    pub fn alias_file(&self) -> PathBuf {
        self.alias_file
            .clone()
            .unwrap_or_else(|| default_data_dir().join("genre_aliases.json"))
    }

    pub fn fallback_file(&self) -> PathBuf {
        self.fallback_file
            .clone()
            .unwrap_or_else(|| default_data_dir().join("artist_fallbacks.json"))
    }
}

impl ThrottleConfig {
    pub fn artist_batch_delay(&self) -> Duration {
        Duration::from_millis(self.artist_batch_delay_ms)
    }

    pub fn playlist_creation_delay(&self) -> Duration {
        Duration::from_millis(self.playlist_creation_delay_ms)
    }
}

impl LoggingConfig {
    pub fn level_filter(&self) -> log::LevelFilter {
        self.level
            .trim()
            .parse()
            .unwrap_or(log::LevelFilter::Info)
    }
}

impl Config {
    pub fn playlist_settings(&self) -> PlaylistSettings {
        PlaylistSettings {
            name_prefix: self.playlists.name_prefix.clone(),
            min_tracks: self.playlists.min_tracks,
            public: self.playlists.public,
            creation_delay: self.throttle.playlist_creation_delay(),
        }
    }
}

/// Clamps out-of-range values to usable ones.
pub fn sanitize_config(config: Config) -> Config {
    let api_base_url = match config.spotify.api_base_url.trim() {
        "" => default_api_base_url(),
        value => value.trim_end_matches('/').to_string(),
    };
    let name_prefix = match config.playlists.name_prefix.trim() {
        "" => default_name_prefix(),
        value => value.to_string(),
    };

    Config {
        spotify: SpotifyConfig { api_base_url },
        paths: config.paths,
        throttle: ThrottleConfig {
            artist_batch_delay_ms: config.throttle.artist_batch_delay_ms.min(MAX_DELAY_MS),
            playlist_creation_delay_ms: config
                .throttle
                .playlist_creation_delay_ms
                .min(MAX_DELAY_MS),
        },
        playlists: PlaylistsConfig {
            create_playlists: config.playlists.create_playlists,
            name_prefix,
            min_tracks: config.playlists.min_tracks.max(1),
            public: config.playlists.public,
        },
        logging: config.logging,
    }
}

/// Loads `config.toml`, writing a default file first when none exists.
pub fn load_or_create_config(config_file: &Path) -> Result<Config, String> {
    if !config_file.exists() {
        info!(
            "Config file not found. Creating default config. path={}",
            config_file.display()
        );
        if let Some(parent) = config_file.parent() {
            fs::create_dir_all(parent)
                .map_err(|err| format!("failed to create {}: {err}", parent.display()))?;
        }
        let serialized = toml::to_string(&Config::default())
            .map_err(|err| format!("failed to serialize default config: {err}"))?;
        fs::write(config_file, serialized)
            .map_err(|err| format!("failed to write {}: {err}", config_file.display()))?;
    }

    let content = fs::read_to_string(config_file)
        .map_err(|err| format!("failed to read {}: {err}", config_file.display()))?;
    let config = toml::from_str::<Config>(&content)
        .map_err(|err| format!("invalid config {}: {err}", config_file.display()))?;
    Ok(sanitize_config(config))
}

#[cfg(test)]
mod tests {
    use super::{load_or_create_config, sanitize_config, Config, PathsConfig};
    use std::fs;
    use std::path::PathBuf;
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    fn unique_temp_dir(name: &str) -> PathBuf {
        let nonce = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time should be valid")
            .as_nanos();
        std::env::temp_dir().join(format!("genrelist_{name}_{nonce}"))
    }

    #[test]
    fn test_default_config_has_expected_values() {
        let config = Config::default();

        assert_eq!(config.spotify.api_base_url, "https://api.spotify.com/v1");
        assert_eq!(config.paths, PathsConfig::default());
        assert_eq!(config.throttle.artist_batch_delay_ms, 200);
        assert_eq!(config.throttle.playlist_creation_delay_ms, 1_000);
        assert!(!config.playlists.create_playlists);
        assert_eq!(config.playlists.name_prefix, "[Auto]");
        assert_eq!(config.playlists.min_tracks, 3);
        assert!(!config.playlists.public);
        assert_eq!(config.logging.level_filter(), log::LevelFilter::Info);
    }

    #[test]
    fn test_partial_config_fills_missing_sections_with_defaults() {
        let config: Config = toml::from_str(
            r#"
[playlists]
create_playlists = true
min_tracks = 5

[paths]
cache_file = "/tmp/cache.json"
"#,
        )
        .expect("partial config should parse");

        assert!(config.playlists.create_playlists);
        assert_eq!(config.playlists.min_tracks, 5);
        assert_eq!(config.playlists.name_prefix, "[Auto]");
        assert_eq!(config.paths.cache_file(), PathBuf::from("/tmp/cache.json"));
        assert!(config.paths.alias_file().ends_with("genrelist/genre_aliases.json"));
        assert_eq!(config.throttle.artist_batch_delay_ms, 200);
    }

    #[test]
    fn test_sanitize_config_clamps_values() {
        let mut config = Config::default();
        config.playlists.min_tracks = 0;
        config.playlists.name_prefix = "   ".to_string();
        config.throttle.playlist_creation_delay_ms = 10_000_000;
        config.spotify.api_base_url = "https://api.example.com/v1/".to_string();

        let sanitized = sanitize_config(config);
        assert_eq!(sanitized.playlists.min_tracks, 1);
        assert_eq!(sanitized.playlists.name_prefix, "[Auto]");
        assert_eq!(sanitized.throttle.playlist_creation_delay_ms, 60_000);
        assert_eq!(sanitized.spotify.api_base_url, "https://api.example.com/v1");
    }

    #[test]
    fn test_playlist_settings_follow_config() {
        let mut config = Config::default();
        config.playlists.name_prefix = "[Genre]".to_string();
        config.throttle.playlist_creation_delay_ms = 250;

        let settings = config.playlist_settings();
        assert_eq!(settings.playlist_name("Jazz"), "[Genre] Jazz Collection");
        assert_eq!(settings.creation_delay, Duration::from_millis(250));
        assert_eq!(settings.min_tracks, 3);
    }

    #[test]
    fn test_unknown_log_level_falls_back_to_info() {
        let mut config = Config::default();
        config.logging.level = "chatty".to_string();
        assert_eq!(config.logging.level_filter(), log::LevelFilter::Info);
        config.logging.level = "DEBUG".to_string();
        assert_eq!(config.logging.level_filter(), log::LevelFilter::Debug);
    }

    #[test]
    fn test_load_or_create_config_writes_default_file() {
        let dir = unique_temp_dir("config_create");
        let path = dir.join("genrelist").join("config.toml");

        let config = load_or_create_config(&path).expect("default config should load");
        assert_eq!(config, Config::default());
        assert!(path.exists());

        let reloaded = load_or_create_config(&path).expect("written config should reload");
        assert_eq!(reloaded, config);

        fs::remove_dir_all(dir).expect("fixture dir should be removable");
    }

    #[test]
    fn test_load_or_create_config_rejects_invalid_toml() {
        let dir = unique_temp_dir("config_invalid");
        fs::create_dir_all(&dir).expect("fixture dir should be creatable");
        let path = dir.join("config.toml");
        fs::write(&path, "[playlists\nmin_tracks = ").expect("fixture should be writable");

        let error = load_or_create_config(&path).expect_err("invalid TOML should fail");
        assert!(error.contains("invalid config"));

        fs::remove_dir_all(dir).expect("fixture dir should be removable");
    }
}
