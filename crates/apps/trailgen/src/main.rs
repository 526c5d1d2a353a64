use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use camera::{
    route_duration_s, synthesize, AutoConfig, CameraMode, Diagnostics, FollowConfig, FrameBudget,
    PreparedRoute,
};
use clap::{Parser, Subcommand, ValueEnum};
use formats::{read_gpx_file, route_points, write_frames_json, FrameSink, NdjsonFrameSink};
use foundation::GeoBounds;
use terrain::{DiskTileStore, HeightSource, HttpTileFetcher, NoTerrain, TerrainConfig, TerrainSampler};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod settings;

use settings::{TerrainOverrides, TerrainSettings};

#[derive(Parser, Debug)]
#[command(author, version, about = "Camera paths for 3D trail flyovers")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Synthesize camera frames for a GPX route
    Frames(FramesArgs),
}

#[derive(clap::Args, Debug)]
struct FramesArgs {
    /// GPX file with a track or route
    #[arg(long)]
    gpx: PathBuf,

    /// Output file for the frames
    #[arg(long)]
    out: PathBuf,

    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Video duration in seconds; overrides --speed-kmh
    #[arg(long)]
    duration: Option<f64>,

    /// Route speed used to derive the duration
    #[arg(long, default_value_t = 20.0)]
    speed_kmh: f64,

    #[arg(long, default_value_t = 2.5)]
    intro_seconds: f64,

    #[arg(long, default_value_t = 2.0)]
    outro_seconds: f64,

    /// Chaikin smoothing iterations applied to the route
    #[arg(long, default_value_t = 1)]
    route_smooth: usize,

    #[arg(long, value_enum, default_value_t = ModeArg::Auto)]
    camera_mode: ModeArg,

    /// Auto-mode lookahead override in meters
    #[arg(long)]
    lookahead_m: Option<f64>,

    #[arg(long, default_value_t = 500.0)]
    follow_distance_m: f64,

    /// Follow-mode pitch in degrees (clamped to 5..85)
    #[arg(long, default_value_t = 60.0)]
    follow_pitch: f64,

    #[arg(long, default_value_t = 120.0)]
    follow_lookahead_m: f64,

    #[arg(long, default_value_t = 3.0)]
    follow_bearing_sensitivity: f64,

    #[arg(long, default_value_t = 1.5)]
    follow_panning_sensitivity: f64,

    #[arg(long, default_value_t = 0.5)]
    follow_smoothing_s: f64,

    #[arg(long, default_value_t = 30.0)]
    follow_min_clearance_m: f64,

    /// Terrain-RGB tile URL template with {z}/{x}/{y} [env: TRAILGEN_TERRAIN_TILES]
    #[arg(long)]
    terrain_tiles: Option<String>,

    /// mapbox or terrarium [env: TRAILGEN_TERRAIN_ENCODING]
    #[arg(long)]
    terrain_encoding: Option<String>,

    #[arg(long)]
    terrain_exaggeration: Option<f64>,

    /// Tile cache directory [env: TRAILGEN_CACHE_DIR]
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Tile cache budget, e.g. 2GB [env: TRAILGEN_CACHE_MAX]
    #[arg(long)]
    cache_max: Option<String>,

    #[arg(long, allow_hyphen_values = true)]
    dem_zoom_bias: Option<i32>,

    /// Skip terrain and use recorded route elevations
    #[arg(long, default_value_t = false)]
    no_terrain: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Ndjson,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    Auto,
    Follow,
}

impl FramesArgs {
    fn camera_mode(&self) -> CameraMode {
        match self.camera_mode {
            ModeArg::Auto => {
                let defaults = AutoConfig::default();
                CameraMode::Auto(AutoConfig {
                    lookahead_m: self.lookahead_m.unwrap_or(defaults.lookahead_m),
                    ..defaults
                })
            }
            ModeArg::Follow => CameraMode::Follow(FollowConfig {
                distance_m: self.follow_distance_m,
                pitch_deg: self.follow_pitch,
                lookahead_m: self.follow_lookahead_m,
                bearing_sensitivity: self.follow_bearing_sensitivity,
                panning_sensitivity: self.follow_panning_sensitivity,
                smoothing_s: self.follow_smoothing_s,
                min_clearance_m: self.follow_min_clearance_m,
            }),
        }
    }

    fn terrain_overrides(&self) -> TerrainOverrides {
        TerrainOverrides {
            tiles: self.terrain_tiles.clone(),
            encoding: self.terrain_encoding.clone(),
            exaggeration: self.terrain_exaggeration,
            cache_dir: self.cache_dir.clone(),
            cache_max: self.cache_max.clone(),
            zoom_bias: self.dem_zoom_bias,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    match args.command {
        Command::Frames(frames) => run_frames(&frames),
    }
}

fn run_frames(args: &FramesArgs) -> Result<()> {
    let track = read_gpx_file(&args.gpx)
        .with_context(|| format!("failed to load route from {}", args.gpx.display()))?;
    let points = route_points(&track);
    info!(points = points.len(), path = %args.gpx.display(), "route loaded");

    let center = GeoBounds::from_points(points.iter().map(|p| p.lat_lon()))
        .map(|b| b.center())
        .context("route has no points")?;
    let terrain = build_terrain(args, center.lat)?;

    let mut diagnostics = Diagnostics::new();
    let prepared = PreparedRoute::prepare(&points, args.route_smooth, &*terrain, &mut diagnostics)
        .context("route preparation failed")?;

    let duration_s = route_duration_s(prepared.route.total_distance(), args.duration, args.speed_kmh);
    let budget = FrameBudget::from_duration(duration_s, args.fps, args.intro_seconds, args.outro_seconds)
        .context("invalid frame budget")?;
    info!(duration_s, ?budget, "frame budget");

    let synthesis = synthesize(&prepared, &budget, args.fps, &args.camera_mode(), &*terrain, diagnostics)
        .context("camera synthesis failed")?;

    write_frames(&args.out, args.format, args.fps, &synthesis.frames)?;
    for (name, count) in synthesis.diagnostics.snapshot() {
        info!(counter = %name, count, "diagnostics");
    }
    info!(frames = synthesis.frames.len(), out = %args.out.display(), "frames written");
    Ok(())
}

fn build_terrain(args: &FramesArgs, center_lat: f64) -> Result<Box<dyn HeightSource>> {
    if args.no_terrain {
        return Ok(Box::new(NoTerrain));
    }
    let settings = TerrainSettings::resolve(args.terrain_overrides())?;
    let Some(template) = settings.url_template.clone() else {
        bail!("no terrain tiles configured; set TRAILGEN_TERRAIN_TILES, pass --terrain-tiles, or use --no-terrain");
    };

    let zoom = settings.dem_zoom(center_lat);
    let config = TerrainConfig::new(template, zoom)
        .with_encoding(settings.encoding)
        .with_exaggeration(settings.exaggeration);
    let store = DiskTileStore::open(&settings.cache_dir, settings.cache_max_bytes);
    let fetcher = HttpTileFetcher::new().context("failed to build tile HTTP client")?;
    info!(
        zoom,
        encoding = %settings.encoding,
        cache_dir = %settings.cache_dir.display(),
        cache_bytes = store.used_bytes(),
        "terrain sampler ready"
    );
    if settings.exaggeration != 1.0 {
        warn!(exaggeration = settings.exaggeration, "terrain heights are exaggerated");
    }
    Ok(Box::new(TerrainSampler::new(config, store, fetcher)))
}

fn write_frames(path: &Path, format: OutputFormat, fps: u32, frames: &[camera::CameraFrame]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    match format {
        OutputFormat::Json => write_frames_json(file, fps, frames)?,
        OutputFormat::Ndjson => NdjsonFrameSink::new(BufWriter::new(file)).push_all(frames)?,
    }
    Ok(())
}
