//! Repository URL construction for timelapse-tile
//!
//! A time-lapse repository serves `tm.json` at its root, one `r.json` per
//! dataset, and the tile videos below the dataset directory.

use crate::core::tile::TileCoordinate;

/// Location of a time-lapse repository
#[derive(Debug, Clone, PartialEq)]
pub struct RepositoryConfig {
    /// Base URL, always ending in `/`
    base_url: String,
}

impl RepositoryConfig {
    pub fn new(base_url: &str) -> Self {
        let mut base_url = base_url.trim().to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self { base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn tm_json_url(&self) -> String {
        format!("{}tm.json", self.base_url)
    }

    pub fn r_json_url(&self, dataset: &str) -> String {
        format!("{}{}/r.json", self.base_url, dataset)
    }

    /// URL of the video of `tile` in `dataset`
    pub fn tile_url(&self, dataset: &str, tile: &TileCoordinate) -> String {
        format!("{}{}/{}.mp4", self.base_url, dataset, tile.address())
    }
}

/// Generates the local file name of a tile video
pub fn resolve_output_filename(tile: &TileCoordinate) -> String {
    format!("{}-{}-{}-raw.mp4", tile.level, tile.row, tile.col)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tile() -> TileCoordinate {
        TileCoordinate {
            level: 5,
            col: 17,
            row: 9,
        }
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        assert_eq!(
            RepositoryConfig::new("https://tiles.example.org/landsat").base_url(),
            "https://tiles.example.org/landsat/"
        );
        assert_eq!(
            RepositoryConfig::new("https://tiles.example.org/landsat/").base_url(),
            "https://tiles.example.org/landsat/"
        );
    }

    #[test]
    fn test_metadata_urls() {
        let repo = RepositoryConfig::new("https://tiles.example.org/landsat");
        assert_eq!(repo.tm_json_url(), "https://tiles.example.org/landsat/tm.json");
        assert_eq!(
            repo.r_json_url("crf20-12fps-1424x800"),
            "https://tiles.example.org/landsat/crf20-12fps-1424x800/r.json"
        );
    }

    #[test]
    fn test_tile_url() {
        let repo = RepositoryConfig::new("https://tiles.example.org/landsat/");
        assert_eq!(
            repo.tile_url("ds", &tile()),
            "https://tiles.example.org/landsat/ds/5/9/17.mp4"
        );
    }

    #[test]
    fn test_resolve_output_filename() {
        assert_eq!(resolve_output_filename(&tile()), "5-9-17-raw.mp4");
    }
}
