mod app;
mod audio;
mod components;
mod http;
mod mpv;
mod surfaces;
#[cfg(test)]
mod testing;
mod theme;
mod ui;
mod widgets;

use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use clap::Parser;
use tokio::sync::mpsc;

use ethereal_core::audio_url::AudioResolver;
use ethereal_core::catalog::CatalogLoader;
use ethereal_core::config::Config;
use ethereal_core::coordinator::{Coordinator, Surfaces};
use ethereal_core::favorites::{FavoritesStore, FileSlot};
use ethereal_core::input::InputMapper;
use ethereal_core::intent::Intent;
use ethereal_core::link;

#[derive(Parser, Debug)]
#[command(name = "ethereal", about = "Browse generative animations with background music")]
struct Args {
    /// Open on this animation (same as `?animation=<id>` in a share link).
    /// A full share link is accepted too.
    #[arg(long)]
    animation: Option<String>,

    /// Config file (default: ~/.config/ethereal/config.toml).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Keep manifest order instead of shuffling.
    #[arg(long)]
    no_shuffle: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let data_dir = ethereal_core::platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let log_path = data_dir.join("ethereal.log");
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // Allow RUST_LOG override; default to debug for app code but suppress noisy
    // connection-level DEBUG from HTTP client internals (hyper_util, reqwest).
    let log_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "debug,hyper_util=warn,reqwest=warn,hyper=warn".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    eprintln!("ethereal log: {}", log_path.display());
    tracing::info!("ethereal starting…");

    // ── Load config ──────────────────────────────────────────────────────────
    let loaded = match &args.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    let mut config = loaded.unwrap_or_else(|e| {
        tracing::warn!("config unreadable, using defaults: {}", e);
        let mut config = Config::default();
        config.audio.apply_env();
        config
    });
    if args.no_shuffle {
        config.catalog.shuffle = false;
    }

    let deep_link = args.animation.as_deref().and_then(|value| {
        link::deep_link_from_url(value).or_else(|| Some(value.trim().to_string()))
    });
    let deep_link = deep_link.filter(|v| !v.is_empty());

    // ── Capabilities ─────────────────────────────────────────────────────────
    let local_base = config.local_base_url();
    let viewport = surfaces::SharedViewport::default();
    let (audio_tx, audio_rx) = mpsc::unbounded_channel();
    let player = audio::spawn_player(audio_rx);

    let surfaces = Surfaces {
        display: Box::new(surfaces::TerminalSurface::new(
            config.catalog.content_root.clone(),
            local_base,
            viewport.clone(),
        )),
        audio: Box::new(audio::ChannelAudioSink::new(audio_tx)),
        capture: Box::new(surfaces::ThumbnailCapture::new(&config.catalog.content_root)),
        share: Box::new(surfaces::ClipboardShare::new()),
    };
    let favorites = FavoritesStore::new(Box::new(FileSlot::new(
        config.paths.favorites_file.clone(),
    )));
    let coordinator = Coordinator::new(favorites, surfaces, config.share_base_url());

    // ── HTTP server ──────────────────────────────────────────────────────────
    let api: http::SharedApiState = Arc::new(RwLock::new(http::ApiState::capture(&coordinator)));
    let (intent_tx, intent_rx) = mpsc::channel::<Intent>(64);
    if config.http.enabled {
        http::start_server(
            config.http.bind_address.clone(),
            config.http.port,
            config.catalog.content_root.clone(),
            api.clone(),
            intent_tx.clone(),
        );
    }

    // ── Run TUI ──────────────────────────────────────────────────────────────
    let loader = CatalogLoader::from_config(&config.catalog);
    tracing::info!("manifest source: {:?}", loader.source());
    let app = app::App::new(
        coordinator,
        InputMapper::new(&config.input),
        config.input.favorite_key,
        loader,
        AudioResolver::from_config(&config.audio),
        deep_link,
        viewport,
        api,
    );
    let result = app.run(intent_rx).await;

    // The app owned the last audio sink; the player drains and stops mpv.
    drop(intent_tx);
    let _ = player.await;
    result
}
