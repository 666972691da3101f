//! TOML configuration for timelapse-tile
//!
//! ```toml
//! [general]
//! verbosity = "normal"
//! temp_dir = "temp"
//! logfile = "timelapse-tile.log"
//!
//! [timemachine]
//! repository_url = "https://example.org/timelapse/"
//!
//! [geography]
//! point = [44.59, -100.36]
//! max_meters_per_pixel = [100, 1000]
//! ```

use std::path::{Path, PathBuf};

use log::LevelFilter;
use rand::Rng;
use serde::Deserialize;

use crate::core::coord::GeoPoint;
use crate::core::error::{Error, Result};
use crate::core::region::{PolygonRegion, DEFAULT_MAX_SAMPLING_ATTEMPTS};

/// How chatty the binary is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Verbose,
}

impl Verbosity {
    pub fn level_filter(self) -> LevelFilter {
        match self {
            Verbosity::Quiet => LevelFilter::Error,
            Verbosity::Normal => LevelFilter::Info,
            Verbosity::Verbose => LevelFilter::Debug,
        }
    }
}

/// Ground resolution ceiling, either fixed or drawn per run
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum MaxMetersPerPixel {
    Fixed(f64),
    /// Whole numbers in `[lo, hi)`
    Range(f64, f64),
}

impl MaxMetersPerPixel {
    pub fn validate(&self) -> Result<()> {
        match *self {
            MaxMetersPerPixel::Fixed(value) if !(value.is_finite() && value > 0.0) => Err(
                Error::InvalidInput(format!("max_meters_per_pixel must be positive, got {value}")),
            ),
            MaxMetersPerPixel::Fixed(_) => Ok(()),
            MaxMetersPerPixel::Range(lo, hi) => whole_range(lo, hi).map(|_| ()),
        }
    }

    /// Value to use for one run
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<f64> {
        self.validate()?;
        match *self {
            MaxMetersPerPixel::Fixed(value) => Ok(value),
            MaxMetersPerPixel::Range(lo, hi) => {
                let (low, high) = whole_range(lo, hi)?;
                Ok(rng.gen_range(low..high) as f64)
            }
        }
    }
}

fn whole_range(lo: f64, hi: f64) -> Result<(u64, u64)> {
    if !(lo.is_finite() && hi.is_finite() && lo > 0.0) {
        return Err(Error::InvalidInput(format!(
            "max_meters_per_pixel range [{lo}, {hi}] must be positive"
        )));
    }
    let (low, high) = (lo.ceil() as u64, hi.ceil() as u64);
    if low >= high {
        return Err(Error::InvalidInput(format!(
            "max_meters_per_pixel range [{lo}, {hi}] contains no whole number"
        )));
    }
    Ok((low, high))
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeneralConfig {
    #[serde(default)]
    pub verbosity: Verbosity,
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,
    /// Receives every log record with a timestamp, whatever the verbosity
    #[serde(default)]
    pub logfile: Option<PathBuf>,
}

fn default_temp_dir() -> PathBuf {
    PathBuf::from("temp")
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbosity: Verbosity::default(),
            temp_dir: default_temp_dir(),
            logfile: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TimeMachineConfig {
    pub repository_url: String,
}

/// Where on Earth to look, and how closely
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeographyConfig {
    /// GeoJSON file holding one polygon
    #[serde(default)]
    pub polygon: Option<PathBuf>,
    /// `[lat, lon]`; takes precedence over `polygon`
    #[serde(default)]
    pub point: Option<[f64; 2]>,
    pub max_meters_per_pixel: MaxMetersPerPixel,
    #[serde(default)]
    pub max_sampling_attempts: Option<usize>,
}

impl GeographyConfig {
    pub fn point(&self) -> Result<Option<GeoPoint>> {
        self.point.map(|[lat, lon]| GeoPoint::new(lat, lon)).transpose()
    }

    /// Loads the polygon region, if one is configured
    pub fn region(&self) -> Result<Option<PolygonRegion>> {
        let attempts = self.max_sampling_attempts.unwrap_or(DEFAULT_MAX_SAMPLING_ATTEMPTS);
        self.polygon
            .as_ref()
            .map(|path| PolygonRegion::from_path(path).map(|region| region.with_max_attempts(attempts)))
            .transpose()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    pub timemachine: TimeMachineConfig,
    pub geography: GeographyConfig,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::IoError(std::io::Error::new(
                e.kind(),
                format!("cannot read config {}: {e}", path.display()),
            ))
        })?;
        Self::from_toml_str(&text)
            .map_err(|e| Error::InvalidInput(format!("{}: {e}", path.display())))
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text).map_err(|e| Error::InvalidInput(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values serde cannot; run again after command-line overrides
    pub fn validate(&self) -> Result<()> {
        let url = self.timemachine.repository_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(Error::InvalidInput(format!(
                "repository_url must be an http(s) URL, got '{url}'"
            )));
        }
        self.geography.point()?;
        self.geography.max_meters_per_pixel.validate()?;
        if self.geography.max_sampling_attempts == Some(0) {
            return Err(Error::InvalidInput(
                "max_sampling_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
