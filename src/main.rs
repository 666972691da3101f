//! # Timelapse-tile CLI
//!
//! Picks a place from the configuration, resolves it to a tile of the
//! repository's time-lapse pyramid and downloads that tile video.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use log::error;
use rand::rngs::StdRng;
use rand::SeedableRng;
use timelapse_tile::{
    choose_point, Config, DownloadOptions, Error, Locator, MaxMetersPerPixel,
    MetadataFetcher, OverwriteBehavior, RepositoryConfig, Result, TileDownloader, Verbosity,
};

mod cli;

/// Command-line interface for timelapse-tile
#[derive(Parser, Debug)]
#[command(name = "timelapse-tile")]
#[command(about = "Resolves a place to one video tile of a time-lapse pyramid and downloads it")]
#[command(long_about = "Resolves a place to one video tile of a time-lapse pyramid and downloads it:
  timelapse-tile                             # Use ./config.toml
  timelapse-tile site.toml --dry-run         # Print the tile without downloading
  timelapse-tile --point 44.59,-100.36       # Override the configured place
  timelapse-tile --polygon alps.geojson --seed 7

File Overwrite Behavior:
  By default, you'll be prompted if the tile file exists
  --force                          # Overwrite without asking
  --no-clobber                     # Never overwrite, fail if file exists")]
#[command(version = env!("TIMELAPSE_TILE_VERSION"))]
struct Cli {
    /// TOML configuration file
    #[arg(default_value = "config.toml")]
    config: PathBuf,

    /// Point to look at, as LAT,LON (overrides the configured geography)
    #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
    point: Option<[f64; 2]>,

    /// GeoJSON polygon to sample a point from
    #[arg(long)]
    polygon: Option<PathBuf>,

    /// Ground resolution ceiling in meters per pixel
    #[arg(long = "max-mpp")]
    max_mpp: Option<f64>,

    /// Seed for point and resolution sampling
    #[arg(long)]
    seed: Option<u64>,

    /// Resolve and print the tile without downloading it
    #[arg(long)]
    dry_run: bool,

    /// Enable verbose logging
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,

    /// Force overwrite existing files without prompting
    #[arg(short, long)]
    force: bool,

    /// Never overwrite existing files (fail if destination exists)
    #[arg(long)]
    no_clobber: bool,
}

fn parse_point(value: &str) -> std::result::Result<[f64; 2], String> {
    let (lat, lon) = value
        .split_once(',')
        .ok_or_else(|| format!("expected LAT,LON, got '{value}'"))?;
    let parse = |part: &str| {
        part.trim()
            .parse::<f64>()
            .map_err(|e| format!("'{}' is not a number: {e}", part.trim()))
    };
    Ok([parse(lat)?, parse(lon)?])
}

impl Cli {
    /// Applies command-line flags on top of the file configuration
    fn apply_to(&self, config: &mut Config) -> Result<()> {
        if let Some(polygon) = &self.polygon {
            config.geography.polygon = Some(polygon.clone());
            config.geography.point = None;
        }
        if let Some(point) = self.point {
            config.geography.point = Some(point);
        }
        if let Some(max_mpp) = self.max_mpp {
            config.geography.max_meters_per_pixel = MaxMetersPerPixel::Fixed(max_mpp);
        }
        if self.verbose {
            config.general.verbosity = Verbosity::Verbose;
        } else if self.quiet {
            config.general.verbosity = Verbosity::Quiet;
        }
        config.validate()
    }

    fn overwrite_behavior(&self) -> Result<OverwriteBehavior> {
        match (self.force, self.no_clobber) {
            (true, true) => Err(Error::InvalidInput(
                "--force and --no-clobber cannot be used together".to_string(),
            )),
            (true, false) => Ok(OverwriteBehavior::Force),
            (false, true) => Ok(OverwriteBehavior::NeverOverwrite),
            (false, false) => Ok(OverwriteBehavior::Prompt),
        }
    }
}

#[tokio::main]
async fn main() {
    let logging = cli::LogSink::init();
    if let Err(e) = run(&logging).await {
        error!("❌ Error: {e}");
        std::process::exit(1);
    }
}

async fn run(logging: &Arc<cli::LogSink>) -> Result<()> {
    let cli = Cli::parse();
    let overwrite = cli.overwrite_behavior()?;

    let mut config = Config::load(&cli.config)?;
    cli.apply_to(&mut config)?;
    logging.set_verbosity(config.general.verbosity);
    if let Some(logfile) = &config.general.logfile {
        logging.attach_file(logfile)?;
    }

    let verbose = config.general.verbosity == Verbosity::Verbose;
    if verbose {
        eprintln!("🎞️  Timelapse-tile v{} starting...", env!("TIMELAPSE_TILE_VERSION"));
    }

    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let point = choose_point(&config.geography, &mut rng)?;
    let max_mpp = config.geography.max_meters_per_pixel.sample(&mut rng)?;

    let repository = RepositoryConfig::new(&config.timemachine.repository_url);
    let metadata = MetadataFetcher::new(repository)?.fetch().await?;
    let locator = Locator::new(metadata);
    let location = locator.locate(&point, max_mpp);

    let metadata = locator.metadata();
    let url = metadata.repository().tile_url(metadata.dataset(), &location.tile);

    if cli.dry_run {
        eprintln!("🔍 [DRY RUN] Would download: {url}");
        println!("{location}");
        return Ok(());
    }

    if verbose {
        eprintln!("🌐 Downloading from HTTP: {url}");
    }

    let downloader = TileDownloader::new(&config.general.temp_dir)?;
    eprintln!("📁 Saving to: {}", downloader.tile_path(&location.tile).display());

    let progress_manager = cli::ProgressManager::new(0, &format!("🌐 Downloading tile {}", location.tile));
    let options = DownloadOptions {
        overwrite,
        progress: Some(progress_manager.callback()),
        ..Default::default()
    };

    match downloader.download_tile(metadata, &location.tile, &options).await {
        Ok(path) => {
            progress_manager.finish();
            println!("{}", path.display());
            Ok(())
        }
        Err(e) => {
            progress_manager.abandon();
            Err(e)
        }
    }
}
