//! Zoom level selection under a ground-resolution ceiling

use std::f64::consts::PI;

use log::debug;

use crate::core::coord::GeoPoint;
use crate::core::projection::MercatorProjection;

/// Mean Earth radius in meters
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// One level of the resolution pyramid, as chosen for a specific point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomLevel {
    /// 0 is coarsest, `nlevels - 1` finest
    pub index: usize,
    /// Latitude the ground resolution was measured at
    pub reference_lat: f64,
    pub meters_per_pixel: f64,
}

impl ZoomLevel {
    /// Ground extent of one tile video in kilometres, rounded to two decimals.
    pub fn footprint_km(&self, video_width: u32, video_height: u32) -> (f64, f64) {
        let km = |pixels: u32| (self.meters_per_pixel * pixels as f64 / 1000.0 * 100.0).round() / 100.0;
        (km(video_width), km(video_height))
    }
}

/// Picks zoom levels for points by measuring one pixel's ground width.
#[derive(Debug, Clone, Copy)]
pub struct ZoomLevelResolver<'a> {
    projection: &'a MercatorProjection,
}

impl<'a> ZoomLevelResolver<'a> {
    pub fn new(projection: &'a MercatorProjection) -> Self {
        Self { projection }
    }

    /// Returns the finest level whose pixels are still wider on the ground
    /// than `max_meters_per_pixel`, or level 0 when none is.
    ///
    /// Walks from the finest level towards the coarsest. At each level the
    /// point is shifted by one level-pixel along x and the longitude
    /// difference is converted to meters at the point's latitude.
    pub fn resolve(&self, point: &GeoPoint, nlevels: usize, max_meters_per_pixel: f64) -> ZoomLevel {
        let finest = nlevels.saturating_sub(1);
        let pixel_x = self.projection.forward(point).x;

        let meters_per_pixel_at = |index: usize| {
            let scale = 2f64.powi(index as i32 - finest as i32);
            let one_pixel_off_lon = self.projection.unproject_lon(pixel_x + 1.0 / scale);
            let degrees_per_pixel = (point.lon() - one_pixel_off_lon).abs();
            degrees_per_pixel * point.lat().to_radians().cos() * (PI / 180.0) * EARTH_RADIUS_METERS
        };

        let (index, meters_per_pixel) = (1..=finest)
            .rev()
            .map(|index| (index, meters_per_pixel_at(index)))
            .find(|&(_, meters_per_pixel)| meters_per_pixel > max_meters_per_pixel)
            .unwrap_or_else(|| (0, meters_per_pixel_at(0)));

        debug!("level {index}: {meters_per_pixel:.2} m/px (ceiling {max_meters_per_pixel})");
        ZoomLevel {
            index,
            reference_lat: point.lat(),
            meters_per_pixel,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::projection::ProjectionBounds;

    fn world() -> MercatorProjection {
        MercatorProjection::new(
            ProjectionBounds {
                west: -180.0,
                north: 85.0,
                east: 180.0,
                south: -85.0,
            },
            65536.0,
            65536.0,
        )
    }

    #[test]
    fn test_tight_ceiling_picks_finest_level() {
        let proj = world();
        let resolver = ZoomLevelResolver::new(&proj);
        let level = resolver.resolve(&GeoPoint::new(0.0, 0.0).unwrap(), 10, 1.0);
        assert_eq!(level.index, 9);
        assert_eq!(level.reference_lat, 0.0);
        // 360° / 65536 px at the equator
        let expected = 360.0 / 65536.0 * PI / 180.0 * EARTH_RADIUS_METERS;
        assert!((level.meters_per_pixel - expected).abs() < 1e-6);
    }

    #[test]
    fn test_loose_ceiling_falls_back_to_level_zero() {
        let proj = world();
        let resolver = ZoomLevelResolver::new(&proj);
        let level = resolver.resolve(&GeoPoint::new(0.0, 0.0).unwrap(), 10, 1_000_000.0);
        assert_eq!(level.index, 0);
    }

    #[test]
    fn test_each_coarser_level_doubles_resolution() {
        let proj = world();
        let resolver = ZoomLevelResolver::new(&proj);
        let point = GeoPoint::new(0.0, 0.0).unwrap();
        let finest = resolver.resolve(&point, 10, 1.0).meters_per_pixel;
        // Just below 4x the finest footprint stops two levels up
        let level = resolver.resolve(&point, 10, finest * 3.9);
        assert_eq!(level.index, 7);
        assert!((level.meters_per_pixel - finest * 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_high_latitude_pixels_are_narrower() {
        let proj = world();
        let resolver = ZoomLevelResolver::new(&proj);
        let equator = resolver.resolve(&GeoPoint::new(0.0, 10.0).unwrap(), 10, 1.0);
        let arctic = resolver.resolve(&GeoPoint::new(70.0, 10.0).unwrap(), 10, 1.0);
        let ratio = arctic.meters_per_pixel / equator.meters_per_pixel;
        assert!((ratio - 70f64.to_radians().cos()).abs() < 1e-9);
    }

    #[test]
    fn test_resolve_is_monotonic_in_ceiling() {
        let proj = world();
        let resolver = ZoomLevelResolver::new(&proj);
        for (lat, lon) in [(0.0, 0.0), (47.3, 8.5), (-60.0, 179.9), (84.0, -179.9)] {
            let point = GeoPoint::new(lat, lon).unwrap();
            let mut previous = usize::MAX;
            let mut ceiling = 0.5;
            while ceiling < 2_000_000.0 {
                let index = resolver.resolve(&point, 12, ceiling).index;
                assert!(index <= previous, "ceiling {ceiling} gave finer level {index} than {previous}");
                previous = index;
                ceiling *= 1.7;
            }
        }
    }

    #[test]
    fn test_single_level_pyramid() {
        let proj = world();
        let resolver = ZoomLevelResolver::new(&proj);
        let level = resolver.resolve(&GeoPoint::new(10.0, 10.0).unwrap(), 1, 1e9);
        assert_eq!(level.index, 0);
    }

    #[test]
    fn test_footprint_km() {
        let level = ZoomLevel {
            index: 3,
            reference_lat: 0.0,
            meters_per_pixel: 12.345,
        };
        assert_eq!(level.footprint_km(1424, 800), (17.58, 9.88));
    }
}
