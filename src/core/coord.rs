//! Geographic and pixel coordinate types
//!
//! Points are always stored latitude first (ISO 6709). The lon/lat order used
//! by polygon data is confined to [`crate::core::region`].

use std::fmt;

use rand::Rng;

use crate::core::error::{Error, Result};

/// Valid latitude range
pub const MIN_LAT: f64 = -90.0;
pub const MAX_LAT: f64 = 90.0;

/// Valid longitude range
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// A validated latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    lat: f64,
    lon: f64,
}

impl GeoPoint {
    /// Creates a point, rejecting coordinates outside the valid ranges.
    ///
    /// NaN never compares as in range and is rejected as well.
    pub fn new(lat: f64, lon: f64) -> Result<Self> {
        if !(MIN_LAT..=MAX_LAT).contains(&lat) || !(MIN_LON..=MAX_LON).contains(&lon) {
            return Err(Error::InvalidCoordinate { lat, lon });
        }
        Ok(Self { lat, lon })
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }

    /// Degrees/minutes/seconds rendering, e.g. `44°35'27.6"N 100°21'53.1"W`.
    pub fn format(&self) -> String {
        format!(
            "{} {}",
            format_dms(self.lat, 'N', 'S'),
            format_dms(self.lon, 'E', 'W')
        )
    }

    /// Draws a point uniformly by surface area from `rect`.
    ///
    /// Latitude goes through the inverse sine of a uniform value between
    /// sin(south) and sin(north), so high-latitude bands where meridians
    /// converge are not oversampled. Longitude is uniform over the width,
    /// wrapping across the antimeridian when east < west.
    pub fn random_in_rect<R: Rng + ?Sized>(rect: &GeoRect, rng: &mut R) -> Self {
        let south = rect.south().to_radians();
        let north = rect.north().to_radians();
        let u: f64 = rng.gen();
        let lat = (u * (north.sin() - south.sin()) + south.sin())
            .asin()
            .to_degrees()
            .clamp(rect.south(), rect.north());

        let mut width = rect.east() - rect.west();
        if width < 0.0 {
            width += 360.0;
        }
        let mut lon = rect.west() + width * rng.gen::<f64>();
        if lon > MAX_LON {
            lon -= 360.0;
        } else if lon < MIN_LON {
            lon += 360.0;
        }

        Self { lat, lon }
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

fn format_dms(coord: f64, pos: char, neg: char) -> String {
    let hemisphere = if coord > 0.0 { pos } else { neg };
    let abs = coord.abs();
    let degrees = abs.floor();
    let minutes_full = (abs - degrees) * 60.0;
    let minutes = minutes_full.floor();
    let seconds = ((minutes_full - minutes) * 600.0).round_ties_even() / 10.0;
    format!("{degrees}°{minutes}'{seconds:.1}\"{hemisphere}")
}

/// A region between a southwestern and a northeastern corner.
///
/// ```text
///    +---+ ne
///    |   |
/// sw +---+
/// ```
///
/// The longitude span may cross the antimeridian, in which case
/// `sw.lon() > ne.lon()`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoRect {
    sw: GeoPoint,
    ne: GeoPoint,
}

impl GeoRect {
    pub fn new(sw: GeoPoint, ne: GeoPoint) -> Result<Self> {
        if sw.lat > ne.lat {
            return Err(Error::InvalidRect {
                south: sw.lat,
                north: ne.lat,
            });
        }
        Ok(Self { sw, ne })
    }

    /// Builds a rectangle from a `[min_lon, min_lat, max_lon, max_lat]`
    /// bounding box as stored alongside polygon data.
    pub fn from_bounding_box(bbox: [f64; 4]) -> Result<Self> {
        let [min_lon, min_lat, max_lon, max_lat] = bbox;
        let sw = GeoPoint::new(min_lat, min_lon)?;
        let ne = GeoPoint::new(max_lat, max_lon)?;
        Self::new(sw, ne)
    }

    pub fn sw(&self) -> GeoPoint {
        self.sw
    }

    pub fn ne(&self) -> GeoPoint {
        self.ne
    }

    pub fn south(&self) -> f64 {
        self.sw.lat
    }

    pub fn north(&self) -> f64 {
        self.ne.lat
    }

    pub fn west(&self) -> f64 {
        self.sw.lon
    }

    pub fn east(&self) -> f64 {
        self.ne.lon
    }

    pub fn crosses_antimeridian(&self) -> bool {
        self.east() < self.west()
    }

    /// Inclusive containment test that honours an antimeridian wrap.
    pub fn contains(&self, point: &GeoPoint) -> bool {
        if point.lat < self.south() || point.lat > self.north() {
            return false;
        }
        if self.crosses_antimeridian() {
            point.lon >= self.west() || point.lon <= self.east()
        } else {
            point.lon >= self.west() && point.lon <= self.east()
        }
    }
}

/// A position in the dataset's full-resolution pixel space.
///
/// Points produced by the projection normally fall within the raster, but
/// nothing enforces it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(&self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}
