//! Tile indexing within the video pyramid
//!
//! Each level of the pyramid is a grid of fixed-size video tiles. Neighbouring
//! tiles overlap: a video is four tiles wide and high, and tile centres sit
//! half a video in from the tile origin.

use std::fmt;

use log::debug;
use serde::Deserialize;

use crate::core::coord::PixelPoint;
use crate::core::zoom::ZoomLevel;

/// Grid size of one pyramid level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct LevelGrid {
    pub cols: u32,
    pub rows: u32,
}

/// A tile in the pyramid, addressed by level, column and row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoordinate {
    pub level: usize,
    pub col: u32,
    pub row: u32,
}

impl TileCoordinate {
    /// Path of the tile relative to the dataset root: `{level}/{row}/{col}`.
    pub fn address(&self) -> String {
        format!("{}/{}/{}", self.level, self.row, self.col)
    }
}

impl fmt::Display for TileCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address())
    }
}

/// Maps full-resolution pixels to tiles of a given level.
#[derive(Debug, Clone)]
pub struct TileIndexer<'a> {
    tile_width: u32,
    tile_height: u32,
    video_width: u32,
    video_height: u32,
    level_grid: &'a [LevelGrid],
}

impl<'a> TileIndexer<'a> {
    /// The pyramid has one level per `level_grid` entry, finest last.
    pub fn new(
        (tile_width, tile_height): (u32, u32),
        (video_width, video_height): (u32, u32),
        level_grid: &'a [LevelGrid],
    ) -> Self {
        Self {
            tile_width,
            tile_height,
            video_width,
            video_height,
            level_grid,
        }
    }

    /// Returns the tile whose video is centred nearest to `pixel` at `zoom`.
    ///
    /// Column and row are clamped into the level's grid, so pixels outside
    /// the raster land on the nearest edge tile. A `zoom.index` past the
    /// finest level is treated as the finest level.
    pub fn tile_for(&self, pixel: &PixelPoint, zoom: &ZoomLevel) -> TileCoordinate {
        let finest = self.level_grid.len().saturating_sub(1);
        let level = zoom.index.min(finest);
        if level != zoom.index {
            debug!("zoom level {} clamped to finest level {level}", zoom.index);
        }
        let grid = self
            .level_grid
            .get(level)
            .copied()
            .unwrap_or(LevelGrid { cols: 1, rows: 1 });
        let level_scale = 2f64.powi(finest as i32 - level as i32);

        let col = nearest_index(pixel.x, self.video_width, self.tile_width, level_scale, grid.cols);
        let row = nearest_index(pixel.y, self.video_height, self.tile_height, level_scale, grid.rows);

        if col.clamped || row.clamped {
            debug!(
                "tile index clamped at level {}: col {} -> {}, row {} -> {}",
                level, col.raw, col.index, row.raw, row.index
            );
        }

        TileCoordinate {
            level,
            col: col.index,
            row: row.index,
        }
    }
}

struct AxisIndex {
    raw: f64,
    index: u32,
    clamped: bool,
}

fn nearest_index(position: f64, video_size: u32, tile_size: u32, level_scale: f64, count: u32) -> AxisIndex {
    // Ties go to the even index
    let raw = ((position - video_size as f64 * level_scale * 0.5) / (tile_size as f64 * level_scale))
        .round_ties_even();
    let max = count.saturating_sub(1) as f64;
    let bounded = raw.max(0.0).min(max);
    AxisIndex {
        raw,
        index: bounded as u32,
        clamped: bounded != raw,
    }
}
