// src/main.rs
//! Map Tools - command line front end for grids, basemaps and recordings

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use leafmap_tools::{
    basemaps,
    bounds::{bounds, coords},
    config::ToolsConfig,
    grid::{hexgrid, mercator, GridKind},
    host::{HeadlessMap, MapHost},
    recording::{Player, Recording},
    BoundingBox,
};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "leafmap-tools", version)]
#[command(about = "Tile grids, basemaps and map recordings without a map widget")]
struct Cli {
    /// Configuration file (defaults to ~/.config/leafmap-tools/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the bounds of a GeoJSON file as [[south, west], [north, east]]
    Bounds { file: PathBuf },

    /// Print the grid covering a bounding box as a GeoJSON FeatureCollection
    Grid {
        kind: GridKind,
        #[arg(long, allow_hyphen_values = true)]
        south: f64,
        #[arg(long, allow_hyphen_values = true)]
        west: f64,
        #[arg(long, allow_hyphen_values = true)]
        north: f64,
        #[arg(long, allow_hyphen_values = true)]
        east: f64,
        /// Zoom level (Mercator) or resolution (H3)
        #[arg(long)]
        level: u8,
        /// Zoom of the map the grid is drawn on (defaults to the level)
        #[arg(long)]
        map_zoom: Option<f64>,
    },

    /// List known basemaps, or show one by its dotted name
    Basemap { name: Option<String> },

    /// Inspect or replay a map recording
    Recording {
        #[command(subcommand)]
        action: RecordingAction,
    },
}

#[derive(Subcommand, Debug)]
enum RecordingAction {
    /// Print every event of a recording
    Show { file: PathBuf },
    /// Replay a recording onto a headless map in real time
    Replay { file: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => ToolsConfig::load_from(path)?,
        None => ToolsConfig::load().unwrap_or_else(|e| {
            warn!(error = %e, "using default configuration");
            ToolsConfig::default()
        }),
    };

    match cli.command {
        Command::Bounds { file } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let geojson: serde_json::Value = serde_json::from_str(&text)?;
            let bbox = bounds(&geojson)?;
            info!(positions = coords(&geojson).len(), "bounds computed");
            println!("{}", serde_json::to_string(&bbox.corners())?);
        }
        Command::Grid {
            kind,
            south,
            west,
            north,
            east,
            level,
            map_zoom,
        } => {
            let bbox = BoundingBox::new(south, west, north, east)?;
            let map_zoom = map_zoom.unwrap_or(level as f64);
            let policy = config.policy(kind);
            let features = match kind {
                GridKind::Mercator => mercator::grid(&bbox, level, map_zoom, &policy)?,
                GridKind::H3 => {
                    hexgrid::grid(&bbox, level, map_zoom, &policy, config.h3_containment)?
                }
            };
            info!(grid = %kind, level, features = features.len(), "grid computed");
            println!("{}", serde_json::to_string_pretty(&features.to_geojson())?);
        }
        Command::Basemap { name: None } => {
            for basemap in basemaps::catalog() {
                let marker = if basemap.name == config.default_basemap { "*" } else { " " };
                println!("{} {:<32} max zoom {:>2}", marker, basemap.name, basemap.max_zoom);
            }
        }
        Command::Basemap { name: Some(name) } => match basemaps::get_basemap(&name) {
            Some(basemap) => println!("{}", serde_json::to_string_pretty(&basemap)?),
            None => bail!("unknown basemap {:?}", name),
        },
        Command::Recording {
            action: RecordingAction::Show { file },
        } => {
            let recording = Recording::load(&file)?;
            for event in recording.events() {
                println!("{}", serde_json::to_string(event)?);
            }
            info!(
                events = recording.len(),
                duration_secs = recording.duration(),
                "recording loaded"
            );
        }
        Command::Recording {
            action: RecordingAction::Replay { file },
        } => replay(Recording::load(&file)?).await?,
    }

    Ok(())
}

async fn replay(recording: Recording) -> anyhow::Result<()> {
    let Some(first) = recording.events().first() else {
        bail!("recording is empty");
    };
    let mut map = HeadlessMap::new(first.center(), first.zoom, (1024, 768));
    map.subscribe_viewport();

    let player = Player::new();
    let handle = player.handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            handle.stop();
        }
    });

    let applied = player.play(&recording, &mut map).await;
    for viewport in map.take_notifications() {
        info!(
            lat = viewport.center.0,
            lon = viewport.center.1,
            zoom = viewport.zoom,
            "viewport"
        );
    }
    println!("replayed {} of {} events", applied, recording.len());
    Ok(())
}
