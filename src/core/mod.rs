//! Core library modules for timelapse-tile
//!
//! Geometry and pyramid arithmetic are synchronous and free of I/O; the
//! metadata and download modules talk to the repository over HTTP.

pub mod config;
pub mod coord;
pub mod downloader;
pub mod error;
pub mod locator;
pub mod metadata;
pub mod projection;
pub mod region;
pub mod source;
pub mod stream;
pub mod tile;
pub mod zoom;

// Re-export main types for internal use
pub use config::{Config, GeographyConfig, MaxMetersPerPixel, Verbosity};
pub use coord::{GeoPoint, GeoRect, PixelPoint};
pub use downloader::TileDownloader;
pub use locator::{choose_point, Location, Locator};
pub use metadata::{DatasetMetadata, MetadataFetcher};
pub use projection::{MercatorProjection, ProjectionBounds};
pub use region::PolygonRegion;
pub use source::{resolve_output_filename, RepositoryConfig};
pub use tile::{LevelGrid, TileCoordinate, TileIndexer};
pub use zoom::{ZoomLevel, ZoomLevelResolver};
