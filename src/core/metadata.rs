//! Dataset metadata for timelapse-tile
//!
//! The repository describes itself in two JSON documents. Both are parsed into
//! wire structs and then validated into one [`DatasetMetadata`] value before
//! anything else sees them.

use log::{debug, info};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::core::downloader::{create_helpful_http_error, http_client};
use crate::core::error::{Error, Result};
use crate::core::projection::{MercatorProjection, ProjectionBounds};
use crate::core::source::RepositoryConfig;
use crate::core::tile::{LevelGrid, TileIndexer};

/// Repository index (`tm.json`)
#[derive(Debug, Clone, Deserialize)]
pub struct TmJson {
    pub datasets: Vec<DatasetEntry>,
    #[serde(rename = "projection-bounds")]
    pub projection_bounds: ProjectionBounds,
    #[serde(rename = "capture-times")]
    pub capture_times: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatasetEntry {
    pub id: String,
}

/// Dataset description (`{dataset}/r.json`)
#[derive(Debug, Clone, Deserialize)]
pub struct RJson {
    pub leader: i64,
    pub frames: usize,
    pub fps: f64,
    pub level_info: Vec<LevelGrid>,
    pub nlevels: usize,
    pub width: u32,
    pub height: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    pub video_width: u32,
    pub video_height: u32,
}

/// Validated description of one time-lapse dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetMetadata {
    repository: RepositoryConfig,
    dataset: String,
    projection_bounds: ProjectionBounds,
    capture_times: Vec<String>,
    frames: usize,
    fps: f64,
    level_info: Vec<LevelGrid>,
    width: u32,
    height: u32,
    tile_width: u32,
    tile_height: u32,
    video_width: u32,
    video_height: u32,
}

fn ensure(condition: bool, reason: impl FnOnce() -> String) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(Error::InvalidMetadata(reason()))
    }
}

impl DatasetMetadata {
    /// Validates the two repository documents and combines them.
    pub fn from_documents(repository: RepositoryConfig, tm: TmJson, r: RJson) -> Result<Self> {
        ensure(tm.datasets.len() == 1, || {
            format!("expected exactly one dataset in tm.json, found {}", tm.datasets.len())
        })?;
        ensure(r.leader == 0, || format!("leader must be 0, found {}", r.leader))?;
        ensure(tm.capture_times.len() == r.frames, || {
            format!(
                "{} capture times for {} frames",
                tm.capture_times.len(),
                r.frames
            )
        })?;
        ensure(r.nlevels >= 1, || "nlevels must be at least 1".to_string())?;
        ensure(r.level_info.len() == r.nlevels, || {
            format!(
                "level_info has {} entries for {} levels",
                r.level_info.len(),
                r.nlevels
            )
        })?;
        ensure(
            r.level_info.iter().all(|grid| grid.cols > 0 && grid.rows > 0),
            || "every level needs at least one column and one row".to_string(),
        )?;
        ensure(
            [r.width, r.height, r.tile_width, r.tile_height].iter().all(|&v| v > 0),
            || "raster and tile sizes must be positive".to_string(),
        )?;
        ensure(r.tile_width.checked_mul(4) == Some(r.video_width), || {
            format!(
                "video_width {} is not 4 x tile_width {}",
                r.video_width, r.tile_width
            )
        })?;
        ensure(r.tile_height.checked_mul(4) == Some(r.video_height), || {
            format!(
                "video_height {} is not 4 x tile_height {}",
                r.video_height, r.tile_height
            )
        })?;

        let bounds = tm.projection_bounds;
        ensure(
            [bounds.west, bounds.north, bounds.east, bounds.south]
                .iter()
                .all(|v| v.is_finite()),
            || "projection bounds must be finite".to_string(),
        )?;
        ensure(bounds.west != bounds.east && bounds.north != bounds.south, || {
            format!("degenerate projection bounds {bounds:?}")
        })?;
        ensure(
            bounds.north.abs() < 90.0 && bounds.south.abs() < 90.0,
            || "projection bounds must stay clear of the poles".to_string(),
        )?;

        let dataset = tm.datasets.into_iter().next().map(|d| d.id).unwrap_or_default();

        Ok(Self {
            repository,
            dataset,
            projection_bounds: bounds,
            capture_times: tm.capture_times,
            frames: r.frames,
            fps: r.fps,
            level_info: r.level_info,
            width: r.width,
            height: r.height,
            tile_width: r.tile_width,
            tile_height: r.tile_height,
            video_width: r.video_width,
            video_height: r.video_height,
        })
    }

    pub fn repository(&self) -> &RepositoryConfig {
        &self.repository
    }

    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    pub fn projection_bounds(&self) -> ProjectionBounds {
        self.projection_bounds
    }

    pub fn capture_times(&self) -> &[String] {
        &self.capture_times
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn nlevels(&self) -> usize {
        self.level_info.len()
    }

    pub fn level_info(&self) -> &[LevelGrid] {
        &self.level_info
    }

    /// Full-resolution raster size in pixels
    pub fn raster_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn tile_size(&self) -> (u32, u32) {
        (self.tile_width, self.tile_height)
    }

    pub fn video_size(&self) -> (u32, u32) {
        (self.video_width, self.video_height)
    }

    pub fn projection(&self) -> MercatorProjection {
        MercatorProjection::new(self.projection_bounds, self.width as f64, self.height as f64)
    }

    pub fn tile_indexer(&self) -> TileIndexer<'_> {
        TileIndexer::new(self.tile_size(), self.video_size(), &self.level_info)
    }
}

/// Retrieves and validates the metadata of a repository
pub struct MetadataFetcher {
    client: Client,
    repository: RepositoryConfig,
}

impl MetadataFetcher {
    pub fn new(repository: RepositoryConfig) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            repository,
        })
    }

    pub fn with_client(client: Client, repository: RepositoryConfig) -> Self {
        Self { client, repository }
    }

    pub async fn fetch(&self) -> Result<DatasetMetadata> {
        let tm: TmJson = self.get_json(&self.repository.tm_json_url()).await?;
        let dataset = match tm.datasets.as_slice() {
            [only] => only.id.clone(),
            other => {
                return Err(Error::InvalidMetadata(format!(
                    "expected exactly one dataset in tm.json, found {}",
                    other.len()
                )))
            }
        };
        let r: RJson = self.get_json(&self.repository.r_json_url(&dataset)).await?;

        let metadata = DatasetMetadata::from_documents(self.repository.clone(), tm, r)?;
        info!(
            "Dataset {}: {} levels, {} frames at {} fps",
            metadata.dataset(),
            metadata.nlevels(),
            metadata.frames(),
            metadata.fps()
        );
        Ok(metadata)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!("GET {url}");
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(create_helpful_http_error(url, response.status()));
        }
        let body = response.bytes().await?;
        serde_json::from_slice(&body)
            .map_err(|e| Error::InvalidMetadata(format!("{url}: {e}")))
    }
}
