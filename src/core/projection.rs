//! Mercator projection between geographic coordinates and dataset pixels
//!
//! Matches the pixel convention of the time-lapse viewer: longitude maps
//! linearly onto x, latitude is stretched logarithmically before mapping onto
//! y, and y grows southwards.

use std::f64::consts::FRAC_PI_2;

use serde::Deserialize;

use crate::core::coord::{GeoPoint, PixelPoint};
use crate::core::error::Result;

/// Geographic extent covered by the full-resolution raster.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ProjectionBounds {
    pub west: f64,
    pub north: f64,
    pub east: f64,
    pub south: f64,
}

/// Bidirectional transform between [`GeoPoint`] and [`PixelPoint`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MercatorProjection {
    bounds: ProjectionBounds,
    width: f64,
    height: f64,
    projected_north: f64,
    projected_south: f64,
}

impl MercatorProjection {
    pub fn new(bounds: ProjectionBounds, width: f64, height: f64) -> Self {
        Self {
            bounds,
            width,
            height,
            projected_north: project_lat(bounds.north),
            projected_south: project_lat(bounds.south),
        }
    }

    pub fn bounds(&self) -> ProjectionBounds {
        self.bounds
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn forward(&self, point: &GeoPoint) -> PixelPoint {
        let x = interpolate(point.lon(), self.bounds.west, self.bounds.east, 0.0, self.width);
        let y = interpolate(
            project_lat(point.lat()),
            self.projected_north,
            self.projected_south,
            0.0,
            self.height,
        );
        PixelPoint::new(x, y)
    }

    /// Maps a pixel back to geographic space.
    ///
    /// Fails with `InvalidCoordinate` when the pixel lies so far outside the
    /// raster that its longitude leaves [-180, 180].
    pub fn inverse(&self, pixel: &PixelPoint) -> Result<GeoPoint> {
        GeoPoint::new(self.unproject_lat(pixel.y), self.unproject_lon(pixel.x))
    }

    /// Longitude of pixel column `x`, without range validation.
    pub fn unproject_lon(&self, x: f64) -> f64 {
        interpolate(x, 0.0, self.width, self.bounds.west, self.bounds.east)
    }

    /// Latitude of pixel row `y`, without range validation.
    pub fn unproject_lat(&self, y: f64) -> f64 {
        unproject_lat(interpolate(
            y,
            0.0,
            self.height,
            self.projected_north,
            self.projected_south,
        ))
    }
}

fn project_lat(lat: f64) -> f64 {
    let rad = lat.to_radians();
    ((1.0 + rad.sin()) / rad.cos()).ln()
}

fn unproject_lat(y: f64) -> f64 {
    (2.0 * y.exp().atan() - FRAC_PI_2).to_degrees()
}

fn interpolate(x: f64, from_low: f64, from_high: f64, to_low: f64, to_high: f64) -> f64 {
    (x - from_low) / (from_high - from_low) * (to_high - to_low) + to_low
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::Error;

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
    fn test_origin_maps_to_raster_center() {
        let pixel = world().forward(&GeoPoint::new(0.0, 0.0).unwrap());
        assert!((pixel.x - 32768.0).abs() < 1e-9);
        assert!((pixel.y - 32768.0).abs() < 1e-9);
    }

    #[test]
    fn test_bounds_map_to_raster_corners() {
        let proj = world();
        let nw = proj.forward(&GeoPoint::new(85.0, -180.0).unwrap());
        let se = proj.forward(&GeoPoint::new(-85.0, 180.0).unwrap());
        assert!(nw.x.abs() < 1e-9 && nw.y.abs() < 1e-9);
        assert!((se.x - 65536.0).abs() < 1e-9 && (se.y - 65536.0).abs() < 1e-6);
    }

    #[test]
    fn test_latitude_is_stretched_towards_poles() {
        let proj = world();
        let y10 = proj.forward(&GeoPoint::new(10.0, 0.0).unwrap()).y;
        let y20 = proj.forward(&GeoPoint::new(20.0, 0.0).unwrap()).y;
        let y70 = proj.forward(&GeoPoint::new(70.0, 0.0).unwrap()).y;
        let y80 = proj.forward(&GeoPoint::new(80.0, 0.0).unwrap()).y;
        // North is up, so y shrinks as latitude grows
        assert!(y20 < y10);
        assert!((y70 - y80) > (y10 - y20));
    }

    #[test]
    fn test_round_trip_within_bounds() {
        let proj = world();
        let mut lat = -84.5;
        while lat <= 84.5 {
            let mut lon = -180.0;
            while lon <= 180.0 {
                let point = GeoPoint::new(lat, lon).unwrap();
                let back = proj.inverse(&proj.forward(&point)).unwrap();
                assert!((back.lat() - lat).abs() < 1e-6, "lat {lat} came back as {}", back.lat());
                assert!((back.lon() - lon).abs() < 1e-6, "lon {lon} came back as {}", back.lon());
                lon += 7.5;
            }
            lat += 3.25;
        }
    }

    #[test]
    fn test_round_trip_regional_bounds() {
        let proj = MercatorProjection::new(
            ProjectionBounds {
                west: 5.0,
                north: 48.0,
                east: 11.0,
                south: 45.0,
            },
            4096.0,
            2048.0,
        );
        let point = GeoPoint::new(46.95, 7.44).unwrap();
        let back = proj.inverse(&proj.forward(&point)).unwrap();
        assert!((back.lat() - point.lat()).abs() < 1e-6);
        assert!((back.lon() - point.lon()).abs() < 1e-6);
    }

    #[test]
    fn test_inverse_far_outside_raster_is_rejected() {
        let proj = world();
        match proj.inverse(&PixelPoint::new(-70000.0, 100.0)) {
            Err(Error::InvalidCoordinate { .. }) => {}
            other => panic!("Expected InvalidCoordinate, got {other:?}"),
        }
        // The raw longitude is still available
        assert!(proj.unproject_lon(-70000.0) < -180.0);
    }
}
