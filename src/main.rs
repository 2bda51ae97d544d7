mod artist_fallback;
mod backends;
mod catalog_pipeline;
mod config;
mod credentials;
mod genre_aliases;
mod genre_cache;
mod genre_resolver;
mod playlist_builder;
mod track_collector;
mod track_record;
mod track_uri;

use std::collections::BTreeMap;
use std::path::PathBuf;

use log::info;

use backends::spotify::SpotifyAdapter;
use catalog_pipeline::{build_catalog, seed_default_tables, GenreState};
use config::{default_config_file, load_or_create_config};
use playlist_builder::PlaylistBuilder;

fn config_path_from_args() -> Option<PathBuf> {
    std::env::args_os().nth(1).map(PathBuf::from)
}

fn log_genre_breakdown(records: &[track_record::CatalogRecord]) {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for record in records {
        *counts.entry(record.genre.as_str()).or_default() += 1;
    }
    info!("Catalog spans {} genres", counts.len());
    for (genre, count) in counts {
        info!("  {genre}: {count}");
    }
}

fn run() -> Result<(), String> {
    let config_file = config_path_from_args()
        .or_else(default_config_file)
        .ok_or_else(|| "could not determine a config directory".to_string())?;
    let config = load_or_create_config(&config_file)?;
    log::set_max_level(config.logging.level_filter());
    info!("Using config {}", config_file.display());

    let access_token = credentials::resolve_access_token()?;
    let adapter = SpotifyAdapter::new(&config.spotify.api_base_url, &access_token);
    seed_default_tables(&config.paths);
    let mut state = GenreState::load(&config.paths);

    let catalog = build_catalog(&adapter, &mut state, config.throttle.artist_batch_delay())?;
    let records = catalog.records();
    let resolution = &catalog.resolution;
    info!("Finished processing a total of {} tracks", records.len());
    info!(
        "Genre sources: {} cached artists, {} looked up, {} fallbacks, {} tracks unknown; cache holds {} artists",
        resolution.cache_hits,
        resolution.remote_lookups,
        resolution.fallback_applications,
        resolution.unknown_tracks,
        state.cache.len()
    );
    log_genre_breakdown(&records);

    if !config.playlists.create_playlists {
        info!("Playlist creation disabled; set playlists.create_playlists = true to enable");
        return Ok(());
    }
    let summary =
        PlaylistBuilder::new(&adapter, config.playlist_settings()).build(&catalog.tracks)?;
    for created in &summary.created {
        info!(
            "  {} -> playlist {} ({} tracks)",
            created.genre, created.playlist_id, created.track_count
        );
    }
    if !summary.skipped.is_empty() {
        info!("Genres below threshold: {}", summary.skipped.join(", "));
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut clog = colog::default_builder();
    clog.filter(None, log::LevelFilter::Trace);
    clog.init();
    log::set_max_level(log::LevelFilter::Info);

    std::panic::set_hook(Box::new(|panic_info| {
        let current_thread = std::thread::current();
        let thread_name = current_thread.name().unwrap_or("unnamed");
        log::error!("panic in thread '{}': {}", thread_name, panic_info);
    }));

    if let Err(error) = run() {
        log::error!("{error}");
        return Err(error.into());
    }
    Ok(())
}
