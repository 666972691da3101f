//! Polygon regions of interest
//!
//! Polygon data stores vertices as (longitude, latitude). That ordering stays
//! inside this module; everything it hands out is a [`GeoPoint`].

use std::path::Path;

use geo::{BoundingRect, Contains, Coord, LineString, Point, Polygon};
use geojson::GeoJson;
use log::debug;
use rand::Rng;

use crate::core::coord::{GeoPoint, GeoRect};
use crate::core::error::{Error, Result};

/// Default number of draws before rejection sampling gives up
pub const DEFAULT_MAX_SAMPLING_ATTEMPTS: usize = 250;

/// A single closed polygon together with its bounding box.
#[derive(Debug, Clone)]
pub struct PolygonRegion {
    polygon: Polygon<f64>,
    bounding_box: GeoRect,
    max_attempts: usize,
}

impl PolygonRegion {
    /// Wraps `polygon`, using `bbox` (`[min_lon, min_lat, max_lon, max_lat]`)
    /// as the sampling rectangle or computing it from the vertices.
    pub fn new(polygon: Polygon<f64>, bbox: Option<[f64; 4]>) -> Result<Self> {
        let bbox = match bbox {
            Some(bbox) => bbox,
            None => {
                let rect = polygon
                    .bounding_rect()
                    .ok_or_else(|| Error::InvalidPolygon("polygon has no vertices".to_string()))?;
                [rect.min().x, rect.min().y, rect.max().x, rect.max().y]
            }
        };

        Ok(Self {
            polygon,
            bounding_box: GeoRect::from_bounding_box(bbox)?,
            max_attempts: DEFAULT_MAX_SAMPLING_ATTEMPTS,
        })
    }

    /// Replaces the rejection-sampling budget.
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Loads the single polygon of a GeoJSON document.
    ///
    /// Accepts a Polygon geometry, a Feature holding one, or a
    /// FeatureCollection of exactly one such Feature. The outermost `bbox`
    /// member found is used as bounding box.
    pub fn from_geojson_str(text: &str) -> Result<Self> {
        let geojson: GeoJson = text
            .parse()
            .map_err(|e: geojson::Error| Error::InvalidPolygon(e.to_string()))?;

        let (outer_bbox, geometry) = match geojson {
            GeoJson::Geometry(geometry) => (None, geometry),
            GeoJson::Feature(feature) => feature_geometry(feature)?,
            GeoJson::FeatureCollection(collection) => {
                let count = collection.features.len();
                if count != 1 {
                    return Err(Error::InvalidPolygon(format!(
                        "expected exactly one feature, found {count}"
                    )));
                }
                let feature = collection.features.into_iter().next().ok_or_else(|| {
                    Error::InvalidPolygon("feature collection is empty".to_string())
                })?;
                let (feature_bbox, geometry) = feature_geometry(feature)?;
                (collection.bbox.or(feature_bbox), geometry)
            }
        };

        let bbox = outer_bbox
            .or(geometry.bbox)
            .map(|b| parse_bbox(&b))
            .transpose()?;

        let rings = match geometry.value {
            geojson::Value::Polygon(rings) => rings,
            _ => return Err(Error::InvalidPolygon("expected a Polygon geometry".to_string())),
        };

        let mut rings = rings.iter().map(|ring| parse_ring(ring));
        let exterior = rings
            .next()
            .ok_or_else(|| Error::InvalidPolygon("polygon has no exterior ring".to_string()))??;
        let interiors = rings.collect::<Result<Vec<_>>>()?;

        Self::new(Polygon::new(exterior, interiors), bbox)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("loading polygon from {}", path.display());
        let text = std::fs::read_to_string(path)?;
        Self::from_geojson_str(&text)
    }

    pub fn bounding_box(&self) -> GeoRect {
        self.bounding_box
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Strict containment: points on the outline or inside a hole are outside.
    pub fn contains(&self, point: &GeoPoint) -> bool {
        self.polygon.contains(&Point::new(point.lon(), point.lat()))
    }

    /// Draws area-uniform points from the bounding box until one falls inside
    /// the polygon.
    ///
    /// Gives up with `SamplingExhausted` after `max_attempts` rejected draws,
    /// which happens for shapes covering little of their bounding box.
    pub fn random_point<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<GeoPoint> {
        for attempt in 1..=self.max_attempts {
            let candidate = GeoPoint::random_in_rect(&self.bounding_box, rng);
            if self.contains(&candidate) {
                debug!("accepted {candidate} after {attempt} draw(s)");
                return Ok(candidate);
            }
        }
        Err(Error::SamplingExhausted {
            attempts: self.max_attempts,
        })
    }
}

fn feature_geometry(feature: geojson::Feature) -> Result<(Option<geojson::Bbox>, geojson::Geometry)> {
    let geometry = feature
        .geometry
        .ok_or_else(|| Error::InvalidPolygon("feature has no geometry".to_string()))?;
    Ok((feature.bbox, geometry))
}

fn parse_ring<P: AsRef<[f64]>>(ring: &[P]) -> Result<LineString<f64>> {
    if ring.len() < 4 {
        return Err(Error::InvalidPolygon(format!(
            "ring needs at least 4 positions, found {}",
            ring.len()
        )));
    }
    ring.iter()
        .map(|position| match position.as_ref() {
            [lon, lat, ..] => Ok(Coord { x: *lon, y: *lat }),
            _ => Err(Error::InvalidPolygon("position with fewer than 2 values".to_string())),
        })
        .collect::<Result<Vec<_>>>()
        .map(LineString::new)
}

fn parse_bbox(bbox: &[f64]) -> Result<[f64; 4]> {
    match *bbox {
        [min_lon, min_lat, max_lon, max_lat] => Ok([min_lon, min_lat, max_lon, max_lat]),
        [min_lon, min_lat, _, max_lon, max_lat, _] => Ok([min_lon, min_lat, max_lon, max_lat]),
        _ => Err(Error::InvalidPolygon(format!(
            "bbox must have 4 or 6 values, found {}",
            bbox.len()
        ))),
    }
}
