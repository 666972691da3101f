//! Tile video retrieval for timelapse-tile
//!
//! Fetches one tile video over HTTP and streams it to the temp directory.
//! There is no retry layer; failures surface to the caller.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::TryStreamExt;
use log::{debug, info, warn};
use reqwest::{Client, ClientBuilder};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_util::io::StreamReader;

use crate::core::error::{Error, Result};
use crate::core::metadata::DatasetMetadata;
use crate::core::source::resolve_output_filename;
use crate::core::stream::{DownloadOptions, OverwriteBehavior};
use crate::core::tile::TileCoordinate;

/// Builds the HTTP client shared by metadata and tile requests
pub fn http_client() -> Result<Client> {
    ClientBuilder::new()
        .tcp_keepalive(Duration::from_secs(60))
        .pool_idle_timeout(Duration::from_secs(90))
        .timeout(Duration::from_secs(120))        // Overall request timeout
        .connect_timeout(Duration::from_secs(10)) // Connection timeout
        .user_agent(format!("timelapse-tile/{}", env!("TIMELAPSE_TILE_VERSION")))
        .build()
        .map_err(Error::from)
}

/// Check if destination file exists and handle overwrite behavior
async fn check_overwrite_permission(file_path: &Path, behavior: &OverwriteBehavior) -> Result<bool> {
    if !file_path.exists() {
        return Ok(true);
    }
    let display = file_path.display();

    match behavior {
        OverwriteBehavior::Force => {
            warn!("Overwriting existing file: {display}");
            Ok(true)
        }
        OverwriteBehavior::NeverOverwrite => Err(Error::IoError(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            format!("File already exists: {display} (use --force to overwrite)"),
        ))),
        OverwriteBehavior::Prompt => {
            eprintln!("⚠️  File already exists: {display}");
            eprint!("Overwrite? [y/N]: ");

            // Flush stderr to ensure prompt is displayed
            use std::io::Write;
            std::io::stderr().flush().map_err(Error::IoError)?;

            let mut input = String::new();
            std::io::stdin().read_line(&mut input).map_err(Error::IoError)?;

            match input.trim().to_lowercase().as_str() {
                "y" | "yes" => {
                    eprintln!("✅ Overwriting file");
                    Ok(true)
                }
                _ => {
                    eprintln!("❌ Download cancelled");
                    Err(Error::IoError(std::io::Error::new(
                        std::io::ErrorKind::Interrupted,
                        "Download cancelled by user",
                    )))
                }
            }
        }
    }
}

/// Downloads tile videos into a temp directory
pub struct TileDownloader {
    client: Client,
    temp_dir: PathBuf,
}

impl TileDownloader {
    pub fn new<P: Into<PathBuf>>(temp_dir: P) -> Result<Self> {
        Ok(Self::with_client(http_client()?, temp_dir))
    }

    pub fn with_client<P: Into<PathBuf>>(client: Client, temp_dir: P) -> Self {
        Self {
            client,
            temp_dir: temp_dir.into(),
        }
    }

    /// Local path a tile video is stored at
    pub fn tile_path(&self, tile: &TileCoordinate) -> PathBuf {
        self.temp_dir.join(resolve_output_filename(tile))
    }

    /// Download the video of `tile` and return where it was written
    pub async fn download_tile(
        &self,
        metadata: &DatasetMetadata,
        tile: &TileCoordinate,
        options: &DownloadOptions,
    ) -> Result<PathBuf> {
        let file_path = self.tile_path(tile);
        check_overwrite_permission(&file_path, &options.overwrite).await?;

        if !self.temp_dir.is_dir() {
            debug!("creating {}", self.temp_dir.display());
            tokio::fs::create_dir_all(&self.temp_dir).await?;
        }

        let url = metadata.repository().tile_url(metadata.dataset(), tile);
        info!("Downloading tile {tile} from {url}");

        // Only a complete body ever lands at the tile path
        let partial_path = partial_path(&file_path);
        match self.download_http_to_file(&url, &partial_path, options).await {
            Ok(()) => tokio::fs::rename(&partial_path, &file_path).await?,
            Err(e) => {
                if let Err(remove_err) = tokio::fs::remove_file(&partial_path).await {
                    if remove_err.kind() != std::io::ErrorKind::NotFound {
                        warn!("could not remove {}: {remove_err}", partial_path.display());
                    }
                }
                return Err(e);
            }
        }

        Ok(file_path)
    }

    /// Stream from HTTP into a file, reporting progress as bytes arrive
    async fn download_http_to_file(
        &self,
        url: &str,
        file_path: &Path,
        options: &DownloadOptions,
    ) -> Result<()> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(create_helpful_http_error(url, response.status()));
        }
        let total_size = response.content_length().unwrap_or(0);
        let mut stream = Box::pin(StreamReader::new(
            response.bytes_stream().map_err(std::io::Error::other),
        ));

        let mut file = tokio::fs::File::create(file_path).await?;
        let mut buffer = vec![0u8; options.buffer_size];
        let mut downloaded = 0u64;

        loop {
            let bytes_read = stream
                .read(&mut buffer)
                .await
                .map_err(|e| Error::NetworkError(format!("Stream read error: {e}")))?;

            if bytes_read == 0 {
                break;
            }

            file.write_all(&buffer[..bytes_read]).await?;
            downloaded += bytes_read as u64;

            if let Some(ref progress) = options.progress {
                progress(downloaded, total_size);
            }
        }

        file.flush().await?;
        debug!("wrote {downloaded} bytes to {}", file_path.display());
        Ok(())
    }
}

/// Sibling path a tile is streamed to before it is complete
fn partial_path(file_path: &Path) -> PathBuf {
    let mut name = file_path.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    file_path.with_file_name(name)
}

/// Create an HTTP error naming the URL, with a hint for missing tiles
pub fn create_helpful_http_error(url: &str, status: reqwest::StatusCode) -> Error {
    let message = if status == reqwest::StatusCode::NOT_FOUND && url.ends_with(".mp4") {
        format!("Tile not found ({status}): {url}. The dataset may not cover this tile")
    } else if status == reqwest::StatusCode::NOT_FOUND {
        format!("Not found ({status}): {url}. Check the repository URL")
    } else {
        format!("Request failed ({status}): {url}")
    };
    Error::HttpError(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::metadata::{RJson, TmJson};
    use crate::core::source::RepositoryConfig;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;
    use tempfile::{tempdir, NamedTempFile};
    use tokio::net::TcpListener;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn metadata_for(base_url: &str) -> DatasetMetadata {
        let tm: TmJson = serde_json::from_value(crate::core::metadata::tests::tm_value()).unwrap();
        let r: RJson = serde_json::from_value(crate::core::metadata::tests::r_value()).unwrap();
        DatasetMetadata::from_documents(RepositoryConfig::new(base_url), tm, r).unwrap()
    }

    fn tile() -> TileCoordinate {
        TileCoordinate {
            level: 2,
            col: 3,
            row: 1,
        }
    }

    #[tokio::test]
    async fn test_download_tile_writes_file() {
        let mock_server = MockServer::start().await;
        let video = b"\x00\x00\x00\x18ftypmp42".repeat(512);
        Mock::given(method("GET"))
            .and(path("/crf20-2fps-1424x800/2/1/3.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(video.clone(), "video/mp4"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let dir = tempdir().unwrap();
        let temp_dir = dir.path().join("nested").join("temp");
        let downloader = TileDownloader::new(&temp_dir).unwrap();

        let last_seen = Arc::new(AtomicU64::new(0));
        let last_seen_clone = Arc::clone(&last_seen);
        let options = DownloadOptions {
            progress: Some(Arc::new(move |downloaded, _total| {
                last_seen_clone.store(downloaded, Ordering::SeqCst);
            })),
            ..Default::default()
        };

        let path = downloader
            .download_tile(&metadata_for(&mock_server.uri()), &tile(), &options)
            .await
            .unwrap();

        assert_eq!(path, temp_dir.join("2-1-3-raw.mp4"));
        assert_eq!(std::fs::read(&path).unwrap(), video);
        assert_eq!(last_seen.load(Ordering::SeqCst), video.len() as u64);
    }

    #[tokio::test]
    async fn test_missing_tile_is_http_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let dir = tempdir().unwrap();
        let downloader = TileDownloader::new(dir.path()).unwrap();
        let result = downloader
            .download_tile(&metadata_for(&mock_server.uri()), &tile(), &DownloadOptions::default())
            .await;

        match result {
            Err(Error::HttpError(msg)) => {
                assert!(msg.contains("Tile not found"), "{msg}");
                assert!(msg.contains("2/1/3.mp4"), "{msg}");
            }
            other => panic!("Expected HttpError, got {other:?}"),
        }
    }

    /// Serves one response announcing more bytes than it sends, then hangs up
    async fn truncating_server() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 4096];
            let _ = socket.read(&mut request).await;
            let head = "HTTP/1.1 200 OK\r\nContent-Type: video/mp4\r\nContent-Length: 100000\r\n\r\n";
            socket.write_all(head.as_bytes()).await.unwrap();
            socket.write_all(&[1u8; 5000]).await.unwrap();
            socket.shutdown().await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_truncated_body_leaves_no_file() {
        let base_url = truncating_server().await;
        let dir = tempdir().unwrap();
        let downloader = TileDownloader::new(dir.path()).unwrap();
        let metadata = metadata_for(&base_url);

        let result = downloader
            .download_tile(&metadata, &tile(), &DownloadOptions::default())
            .await;
        assert!(result.is_err(), "short body must fail, got {result:?}");

        let tile_path = downloader.tile_path(&tile());
        assert!(!tile_path.exists());
        assert!(!partial_path(&tile_path).exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_retry_after_truncated_body_with_no_clobber() {
        let dir = tempdir().unwrap();
        let downloader = TileDownloader::new(dir.path()).unwrap();
        let truncated = metadata_for(&truncating_server().await);
        assert!(downloader
            .download_tile(&truncated, &tile(), &DownloadOptions::default())
            .await
            .is_err());

        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/crf20-2fps-1424x800/2/1/3.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(vec![7u8; 300], "video/mp4"))
            .mount(&mock_server)
            .await;
        let options = DownloadOptions {
            overwrite: OverwriteBehavior::NeverOverwrite,
            ..Default::default()
        };
        let path = downloader
            .download_tile(&metadata_for(&mock_server.uri()), &tile(), &options)
            .await
            .unwrap();
        assert_eq!(std::fs::read(path).unwrap(), vec![7u8; 300]);
    }

    #[test]
    fn test_partial_path_is_sibling() {
        let partial = partial_path(Path::new("/tmp/tiles/2-1-3-raw.mp4"));
        assert_eq!(partial, PathBuf::from("/tmp/tiles/2-1-3-raw.mp4.part"));
    }

    #[tokio::test]
    async fn test_overwrite_behavior_force() {
        let temp_file = NamedTempFile::new().unwrap();
        std::fs::write(temp_file.path(), "existing content").unwrap();

        let result = check_overwrite_permission(temp_file.path(), &OverwriteBehavior::Force).await;
        assert!(result.unwrap(), "Force overwrite should return true");
    }

    #[tokio::test]
    async fn test_overwrite_behavior_never() {
        let temp_file = NamedTempFile::new().unwrap();
        std::fs::write(temp_file.path(), "existing content").unwrap();

        let result = check_overwrite_permission(temp_file.path(), &OverwriteBehavior::NeverOverwrite).await;
        match result.unwrap_err() {
            Error::IoError(io_err) => {
                assert_eq!(io_err.kind(), std::io::ErrorKind::AlreadyExists);
                assert!(io_err.to_string().contains("use --force to overwrite"));
            }
            other => panic!("Expected IoError with AlreadyExists kind, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_overwrite_behavior_new_file() {
        let temp_dir = tempdir().unwrap();
        let file_path = temp_dir.path().join("nonexistent.mp4");

        for behavior in [OverwriteBehavior::Force, OverwriteBehavior::NeverOverwrite, OverwriteBehavior::Prompt] {
            let result = check_overwrite_permission(&file_path, &behavior).await;
            assert!(result.unwrap(), "All behaviors should return true for non-existent file");
        }
    }

    #[test]
    fn test_helpful_http_error_messages() {
        let tile_err = create_helpful_http_error("https://x/ds/1/2/3.mp4", reqwest::StatusCode::NOT_FOUND);
        assert!(tile_err.to_string().contains("Tile not found"));

        let meta_err = create_helpful_http_error("https://x/tm.json", reqwest::StatusCode::NOT_FOUND);
        assert!(meta_err.to_string().contains("Check the repository URL"));

        let server_err = create_helpful_http_error("https://x/tm.json", reqwest::StatusCode::BAD_GATEWAY);
        assert!(server_err.to_string().contains("502"));
    }
}
