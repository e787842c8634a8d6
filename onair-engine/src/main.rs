//! onair-engine - Main entry point
//!
//! Loads configuration and content indexes, starts every station runner and
//! serves the control API until interrupted.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use onair_common::catalog::{self, StationCatalog};
use onair_common::config::TomlConfig;
use onair_common::events::EventBus;
use onair_common::metadata::{FadeMetadataIndex, NarrationDurations};
use onair_common::news::NewsCalendar;
use onair_engine::api::{self, AppContext};
use onair_engine::clock::MonotonicClock;
use onair_engine::loader::FileProbeLoader;
use onair_engine::playback::TracingSink;
use onair_engine::{Director, EngineResources};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for onair-engine
#[derive(Parser, Debug)]
#[command(name = "onair-engine")]
#[command(about = "Continuous multi-station radio sequencing engine")]
#[command(version)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for the control API
    #[arg(short, long, env = "ONAIR_PORT")]
    port: Option<u16>,

    /// Root folder containing station content
    #[arg(short, long, env = "ONAIR_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// Seed for every station's random source (station index is added)
    #[arg(long)]
    seed: Option<u64>,

    /// Station that starts audible
    #[arg(long)]
    active: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = TomlConfig::load_with_priority(args.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(root) = args.root_folder {
        config.root_folder = Some(root);
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if args.active.is_some() {
        config.active_station = args.active;
    }

    let level = config.logging.level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("onair_engine={level},onair_common={level},tower_http=info").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    config.validate().context("Invalid configuration")?;

    let root = config.root_folder();
    info!("Starting onair-engine on port {}", config.port);
    info!("Root folder: {}", root.display());

    let resources = load_resources(&config);
    let director = Arc::new(
        Director::start(
            &config,
            resources,
            Arc::new(FileProbeLoader::new(root)),
            Arc::new(TracingSink),
            Arc::new(MonotonicClock::new()),
            EventBus::default(),
        )
        .context("Failed to start stations")?,
    );

    api::run(
        AppContext {
            director: director.clone(),
        },
        config.port,
        shutdown_signal(),
    )
    .await
    .context("Server error")?;

    director.shutdown();
    info!("Shutdown complete");
    Ok(())
}

/// Load indexes and catalogs; anything missing degrades with a warning
fn load_resources(config: &TomlConfig) -> EngineResources {
    let metadata_path = config.metadata_file.as_ref().map(|p| config.resolve_path(p));
    let fade_metadata = FadeMetadataIndex::load_or_empty(metadata_path.as_deref());
    info!("Fade metadata: {} entries", fade_metadata.len());

    let duration_paths: Vec<PathBuf> = config
        .duration_files
        .iter()
        .map(|p| config.resolve_path(p))
        .collect();
    let mut durations = NarrationDurations::load_files(&duration_paths);
    if !durations.conflicts().is_empty() {
        warn!(
            "{} narration duration keys have conflicting values",
            durations.conflicts().len()
        );
    }

    let calendar_path = config
        .news_calendar_file
        .as_ref()
        .map(|p| config.resolve_path(p));
    let news = NewsCalendar::load_or_empty(calendar_path.as_deref());

    let mut catalogs = HashMap::new();
    for station in &config.stations {
        let path = config.resolve_path(&station.catalog_path());
        let loaded = StationCatalog::load(&path).and_then(|c| catalog::validate(&c).map(|_| c));
        match loaded {
            Ok(c) => {
                info!(
                    "Station '{}': {} tracks, {} ids, {} ads",
                    station.id,
                    c.music.len(),
                    c.ids.len(),
                    c.ads.len()
                );
                catalogs.insert(station.id.clone(), Arc::new(c));
            }
            Err(e) => warn!("Station '{}' catalog {}: {}", station.id, path.display(), e),
        }
    }

    let ambiguous = durations.flag_ambiguous_keys(catalogs.values().flat_map(|c| c.narration_ids()));
    if ambiguous > 0 {
        warn!("{} narration duration keys are shared by several assets", ambiguous);
    }

    EngineResources {
        fade_metadata: Arc::new(fade_metadata),
        durations: Arc::new(durations),
        news: Arc::new(news),
        catalogs,
        ..EngineResources::new()
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
