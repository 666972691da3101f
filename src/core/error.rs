//! Error types for timelapse-tile
//!
//! One error type covers the geospatial core and the network, file and
//! configuration layers around it.

use std::fmt;

/// Main error type for timelapse-tile operations
#[derive(Debug)]
pub enum Error {
    /// Latitude or longitude outside [-90, 90] / [-180, 180]
    InvalidCoordinate { lat: f64, lon: f64 },

    /// Rectangle whose southwest corner lies north of its northeast corner
    InvalidRect { south: f64, north: f64 },

    /// Rejection sampling gave up without finding a point inside the polygon
    SamplingExhausted { attempts: usize },

    /// Dataset metadata failed validation
    InvalidMetadata(String),

    /// Polygon input could not be loaded
    InvalidPolygon(String),

    /// HTTP-specific error
    HttpError(String),

    /// Network connectivity issues
    NetworkError(String),

    /// File I/O error
    IoError(std::io::Error),

    /// Invalid configuration or parameters
    InvalidInput(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidCoordinate { lat, lon } => {
                write!(f, "Invalid coordinate: lat {lat}, lon {lon} (expected -90..=90, -180..=180)")
            }
            Error::InvalidRect { south, north } => {
                write!(f, "Invalid rectangle: south latitude {south} lies north of {north}")
            }
            Error::SamplingExhausted { attempts } => {
                write!(
                    f,
                    "No point inside the polygon after {attempts} attempts; the shape may cover \
                     very little of its bounding box (e.g. spread-out islands), raise \
                     max_sampling_attempts if the data is correct"
                )
            }
            Error::InvalidMetadata(msg) => {
                write!(f, "Invalid dataset metadata: {}", msg)
            }
            Error::InvalidPolygon(msg) => {
                write!(f, "Invalid polygon: {}", msg)
            }
            Error::HttpError(msg) => {
                write!(f, "HTTP error: {}", msg)
            }
            Error::NetworkError(msg) => {
                write!(f, "Network error: {}", msg)
            }
            Error::IoError(err) => {
                write!(f, "I/O error: {}", err)
            }
            Error::InvalidInput(msg) => {
                write!(f, "Invalid input: {}", msg)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            Error::NetworkError(err.to_string())
        } else if err.is_decode() {
            Error::InvalidMetadata(err.to_string())
        } else {
            Error::HttpError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::InvalidMetadata(err.to_string())
    }
}

/// Convenience result type for timelapse-tile operations
pub type Result<T> = std::result::Result<T, Error>;
