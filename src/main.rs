use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use env_logger::Env;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;

use geoveil::config::FileConfig;
use geoveil::io::{read_collection, write_collection};
use geoveil::localizer::CoordinateLocalizer;
use geoveil::projector::{ProjectionOptions, Projector, SvgCanvas};
use geoveil::{Offset, geometry::select_zone};

/// Anonymize and re-project GeoJSON polygons
///
/// Examples:
///   # Move a field boundary to the origin and remember the offset
///   geoveil localize fields.geojson -o fields.local.geojson
///
///   # Put it back where it was
///   geoveil restore fields.local.geojson -o fields.geojson --lat 37.8 --lon -122.4
///
///   # Metric frame, rotated by 30 degrees, with an SVG preview
///   geoveil project fields.geojson -o fields.m.geojson --rotate-deg 30 --svg fields.svg
///
///   # Which UTM zone would be used
///   geoveil zone fields.geojson
#[derive(Parser, Debug)]
#[command(name = "geoveil")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to config file (optional, auto-searches geoveil.toml if not provided)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Write single-line JSON instead of pretty-printed output
    #[arg(long, global = true)]
    compact: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Translate a document so its first coordinate sits at (0, 0)
    Localize {
        input: PathBuf,
        #[arg(short = 'o', long)]
        output: PathBuf,
        #[command(flatten)]
        offset: OffsetArgs,
    },
    /// Add a previously used offset back to a localized document
    Restore {
        input: PathBuf,
        #[arg(short = 'o', long)]
        output: PathBuf,
        #[command(flatten)]
        offset: OffsetArgs,
    },
    /// Project polygons into a local metric frame (meters)
    Project {
        input: PathBuf,
        #[arg(short = 'o', long)]
        output: PathBuf,
        /// Counter-clockwise rotation in degrees
        #[arg(long, allow_hyphen_values = true)]
        rotate_deg: Option<f64>,
        /// Uniform scale applied after rotation
        #[arg(long, allow_hyphen_values = true)]
        scale_factor: Option<f64>,
        /// Keep raw UTM eastings/northings instead of centering on the data
        #[arg(long)]
        no_recenter: bool,
        /// Also write an SVG plot of the projected polygons
        #[arg(long)]
        svg: Option<PathBuf>,
    },
    /// Print the UTM zone selected for a document
    Zone { input: PathBuf },
}

#[derive(Args, Debug)]
struct OffsetArgs {
    /// Offset latitude (use with --lon)
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    lat: Option<f64>,

    /// Offset longitude (use with --lat)
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    lon: Option<f64>,
}

impl OffsetArgs {
    /// CLI offset first, then the `[offset]` table of the config file
    fn resolve(&self, file_config: &FileConfig) -> Result<Option<Offset>> {
        if let (Some(lat), Some(lon)) = (self.lat, self.lon) {
            return Ok(Some(Offset::new(lat, lon)?));
        }
        match file_config.offset {
            Some(offset) => Ok(Some(
                offset.to_offset().context("Invalid [offset] in config file")?,
            )),
            None => Ok(None),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (file_config, skipped) = if let Some(ref config_path) = cli.config {
        if !config_path.exists() {
            bail!("Config file not found: {:?}", config_path);
        }
        let config = FileConfig::from_path(config_path)
            .context(format!("Failed to load config file: {:?}", config_path))?;
        (config, Vec::new())
    } else {
        let (config, skipped) = FileConfig::search();
        (config.unwrap_or_default(), skipped)
    };

    let env = if cli.verbose || file_config.verbose {
        Env::default().default_filter_or("debug")
    } else {
        Env::default().default_filter_or("warn")
    };
    env_logger::Builder::from_env(env).init();

    for (path, e) in skipped {
        log::warn!("failed to load config file {}: {}", path.display(), e);
    }

    let pretty = !cli.compact && file_config.pretty;

    match cli.command {
        Command::Localize {
            input,
            output,
            offset,
        } => run_localize(&input, &output, offset.resolve(&file_config)?, pretty),
        Command::Restore {
            input,
            output,
            offset,
        } => {
            let Some(offset) = offset.resolve(&file_config)? else {
                bail!("restore needs an offset: pass --lat and --lon, or set [offset] in the config file");
            };
            run_restore(&input, &output, offset, pretty)
        }
        Command::Project {
            input,
            output,
            rotate_deg,
            scale_factor,
            no_recenter,
            svg,
        } => {
            let mut options = file_config.projection;
            if let Some(rotate_deg) = rotate_deg {
                options = options.with_rotation(rotate_deg);
            }
            if let Some(scale_factor) = scale_factor {
                options = options.with_scale(scale_factor);
            }
            if no_recenter {
                options = options.with_recenter(false);
            }
            run_project(&input, &output, options, svg.as_deref(), pretty)
        }
        Command::Zone { input } => run_zone(&input),
    }
}

fn run_localize(input: &Path, output: &Path, offset: Option<Offset>, pretty: bool) -> Result<()> {
    let start = Instant::now();
    let spinner = create_spinner("Localizing coordinates...");

    let collection = read_collection(input).context(format!("Failed to read {:?}", input))?;
    let mut localizer = CoordinateLocalizer::with_geodata(collection);
    if let Some(offset) = offset {
        localizer.set_offset(offset.lat, offset.lon)?;
    }
    let localized = localizer.localize().context("Failed to localize document")?;
    write_collection(output, &localized, pretty)
        .context(format!("Failed to write {:?}", output))?;

    spinner.finish_with_message(format!(
        "Localized {} features [{:.1}s]",
        localized.len(),
        start.elapsed().as_secs_f32()
    ));

    if let Some(offset) = localizer.offset() {
        println!("Offset: lat {} lon {}", offset.lat, offset.lon);
        println!(
            "Restore with: geoveil restore {} -o <OUTPUT> --lat {} --lon {}",
            output.display(),
            offset.lat,
            offset.lon
        );
    }
    Ok(())
}

fn run_restore(input: &Path, output: &Path, offset: Offset, pretty: bool) -> Result<()> {
    let start = Instant::now();
    let spinner = create_spinner("Restoring coordinates...");

    let localized = read_collection(input).context(format!("Failed to read {:?}", input))?;
    let mut localizer = CoordinateLocalizer::new();
    localizer.set_offset(offset.lat, offset.lon)?;
    let restored = localizer.restore(&localized)?;
    write_collection(output, &restored, pretty)
        .context(format!("Failed to write {:?}", output))?;

    spinner.finish_with_message(format!(
        "Restored {} features [{:.1}s]",
        restored.len(),
        start.elapsed().as_secs_f32()
    ));
    Ok(())
}

fn run_project(
    input: &Path,
    output: &Path,
    options: ProjectionOptions,
    svg: Option<&Path>,
    pretty: bool,
) -> Result<()> {
    let start = Instant::now();
    let spinner = create_spinner("Projecting polygons...");

    let collection = read_collection(input).context(format!("Failed to read {:?}", input))?;
    let mut projector =
        Projector::with_geodata(collection, options).context("Invalid projection options")?;
    let layer = projector.project().context("Failed to project document")?;
    let zone = layer.zone;
    let extent = layer
        .bounds()
        .map(|b| format!("{:.0}m x {:.0}m", b.width(), b.height()))
        .unwrap_or_else(|| "empty".to_string());

    let projected = projector.cast_to_geojson()?;
    write_collection(output, &projected, pretty)
        .context(format!("Failed to write {:?}", output))?;

    spinner.finish_with_message(format!(
        "Projected {} features in UTM zone {} ({}) [{:.1}s]",
        projected.len(),
        zone,
        extent,
        start.elapsed().as_secs_f32()
    ));

    if let Some(svg_path) = svg {
        let mut canvas = SvgCanvas::default();
        projector.plot(&mut canvas)?;
        canvas
            .write_to(svg_path)
            .context(format!("Failed to write plot {:?}", svg_path))?;
        println!("Plot: {}", svg_path.display());
    }
    Ok(())
}

fn run_zone(input: &Path) -> Result<()> {
    let collection = read_collection(input).context(format!("Failed to read {:?}", input))?;
    let zone = select_zone(&collection).context("Failed to select UTM zone")?;
    println!("Zone: {}", zone);
    println!("EPSG: {}", zone.epsg());
    println!("PROJ: {}", zone.proj_string());
    Ok(())
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(80));
    pb
}
