//! # Timelapse-tile Library
//!
//! Resolves a place on Earth to one video tile of a time-lapse pyramid and
//! fetches that tile from the repository serving it.
//!
//! ## Features
//!
//! - **Mercator pixel space**: forward and inverse projection for the
//!   repository's raster, whatever its bounds
//! - **Zoom selection**: finest level whose ground resolution stays above a ceiling
//! - **Tile indexing**: overlapping video tiles, clamped to each level's grid
//! - **Polygon sampling**: uniform random points inside a GeoJSON polygon
//! - **Progress tracking**: optional callbacks while a tile video streams to disk
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use timelapse_tile::GeoPoint;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let repository = "https://tiles.example.org/landsat/";
//!     let point = GeoPoint::new(44.59, -100.36)?;
//!
//!     let location = timelapse_tile::locate(repository, &point, 300.0).await?;
//!     println!("{location}");
//!
//!     let path = timelapse_tile::get_tile(repository, &location, "temp").await?;
//!     println!("saved to {}", path.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Working offline
//!
//! The geometry types need no network at all:
//!
//! ```rust
//! use timelapse_tile::{GeoPoint, MercatorProjection, ProjectionBounds};
//!
//! let bounds = ProjectionBounds { west: -180.0, north: 85.0, east: 180.0, south: -85.0 };
//! let projection = MercatorProjection::new(bounds, 65536.0, 65536.0);
//! let pixel = projection.forward(&GeoPoint::new(0.0, 0.0).unwrap());
//! assert!((pixel.x - 32768.0).abs() < 1e-6);
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

// Re-export core types that users might need
pub use crate::core::config::{Config, GeneralConfig, GeographyConfig, MaxMetersPerPixel, TimeMachineConfig, Verbosity};
pub use crate::core::coord::{GeoPoint, GeoRect, PixelPoint};
pub use crate::core::error::{Error, Result};
pub use crate::core::locator::{choose_point, Location, Locator};
pub use crate::core::metadata::{DatasetMetadata, MetadataFetcher};
pub use crate::core::projection::{MercatorProjection, ProjectionBounds};
pub use crate::core::region::{PolygonRegion, DEFAULT_MAX_SAMPLING_ATTEMPTS};
pub use crate::core::source::{resolve_output_filename, RepositoryConfig};
pub use crate::core::stream::{DownloadOptions, OverwriteBehavior, ProgressCallback};
pub use crate::core::tile::{LevelGrid, TileCoordinate, TileIndexer};
pub use crate::core::zoom::{ZoomLevel, ZoomLevelResolver, EARTH_RADIUS_METERS};
pub use crate::core::TileDownloader;

// Internal modules
mod core;

/// Fetch and validate the metadata of a repository
pub async fn fetch_metadata(repository_url: &str) -> Result<DatasetMetadata> {
    MetadataFetcher::new(RepositoryConfig::new(repository_url))?
        .fetch()
        .await
}

/// Resolve `point` to a tile of the repository's dataset
///
/// # Examples
/// ```rust,no_run
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let point = timelapse_tile::GeoPoint::new(-33.8568, 151.2153)?;
/// let location = timelapse_tile::locate("https://tiles.example.org/", &point, 50.0).await?;
/// println!("tile {}", location.tile);
/// # Ok(())
/// # }
/// ```
pub async fn locate(repository_url: &str, point: &GeoPoint, max_meters_per_pixel: f64) -> Result<Location> {
    let metadata = fetch_metadata(repository_url).await?;
    Ok(Locator::new(metadata).locate(point, max_meters_per_pixel))
}

/// Download the tile of `location` into `temp_dir`, replacing any previous copy
pub async fn get_tile<P: AsRef<Path>>(repository_url: &str, location: &Location, temp_dir: P) -> Result<PathBuf> {
    let options = DownloadOptions {
        overwrite: OverwriteBehavior::Force,
        ..Default::default()
    };
    get_tile_with_options(repository_url, location, temp_dir, options).await
}

/// Download with progress tracking
///
/// The callback receives (downloaded, total) bytes; total is 0 when the
/// server sends no length.
pub async fn get_tile_with_progress<P, F>(
    repository_url: &str,
    location: &Location,
    temp_dir: P,
    progress: F,
) -> Result<PathBuf>
where
    P: AsRef<Path>,
    F: Fn(u64, u64) + Send + Sync + 'static,
{
    let options = DownloadOptions {
        progress: Some(Arc::new(progress)),
        overwrite: OverwriteBehavior::Force,
        ..Default::default()
    };
    get_tile_with_options(repository_url, location, temp_dir, options).await
}

/// Download with custom options
pub async fn get_tile_with_options<P: AsRef<Path>>(
    repository_url: &str,
    location: &Location,
    temp_dir: P,
    options: DownloadOptions,
) -> Result<PathBuf> {
    let metadata = fetch_metadata(repository_url).await?;
    TileDownloader::new(temp_dir.as_ref())?
        .download_tile(&metadata, &location.tile, &options)
        .await
}
