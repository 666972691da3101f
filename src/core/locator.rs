//! Point to tile resolution against one dataset

use std::fmt;

use log::info;
use rand::Rng;

use crate::core::config::GeographyConfig;
use crate::core::coord::{GeoPoint, PixelPoint};
use crate::core::error::{Error, Result};
use crate::core::metadata::DatasetMetadata;
use crate::core::projection::MercatorProjection;
use crate::core::tile::TileCoordinate;
use crate::core::zoom::{ZoomLevel, ZoomLevelResolver};

/// Everything known about where a point lands in the pyramid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub point: GeoPoint,
    pub pixel: PixelPoint,
    pub zoom: ZoomLevel,
    pub tile: TileCoordinate,
    /// Ground extent of the tile video in km
    pub footprint_km: (f64, f64),
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at level {} ({:.2} m/px), tile {}, {} x {} km",
            self.point,
            self.zoom.index,
            self.zoom.meters_per_pixel,
            self.tile,
            self.footprint_km.0,
            self.footprint_km.1
        )
    }
}

pub struct Locator {
    metadata: DatasetMetadata,
    projection: MercatorProjection,
}

impl Locator {
    pub fn new(metadata: DatasetMetadata) -> Self {
        let projection = metadata.projection();
        Self { metadata, projection }
    }

    pub fn metadata(&self) -> &DatasetMetadata {
        &self.metadata
    }

    pub fn projection(&self) -> &MercatorProjection {
        &self.projection
    }

    /// Resolves `point` to the finest tile whose pixels stay coarser than
    /// `max_meters_per_pixel`.
    pub fn locate(&self, point: &GeoPoint, max_meters_per_pixel: f64) -> Location {
        let pixel = self.projection.forward(point);
        let zoom = ZoomLevelResolver::new(&self.projection).resolve(
            point,
            self.metadata.nlevels(),
            max_meters_per_pixel,
        );
        let tile = self.metadata.tile_indexer().tile_for(&pixel, &zoom);
        let (video_width, video_height) = self.metadata.video_size();

        let location = Location {
            point: *point,
            pixel,
            zoom,
            tile,
            footprint_km: zoom.footprint_km(video_width, video_height),
        };
        info!("📍 {location}");
        location
    }
}

/// Picks the point to look at: the configured point, else a random point
/// inside the configured polygon.
pub fn choose_point<R: Rng + ?Sized>(geography: &GeographyConfig, rng: &mut R) -> Result<GeoPoint> {
    if let Some(point) = geography.point()? {
        return Ok(point);
    }
    match geography.region()? {
        Some(region) => region.random_point(rng),
        None => Err(Error::InvalidInput(
            "geography needs either a point or a polygon".to_string(),
        )),
    }
}
