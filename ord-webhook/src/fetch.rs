//! Remote file download.
//!
//! Files are streamed straight to `<download_dir>/<uuid>.<ext>` so large
//! images never sit in memory.

use std::path::PathBuf;

use futures::StreamExt;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use url::Url;
use uuid::Uuid;

/// Errors that can occur while downloading a file.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The request could not be sent or no response arrived.
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: StatusCode },

    /// The response body broke off mid-transfer.
    #[error("stream from {url} failed: {source}")]
    Stream {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The destination file could not be created or written.
    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Downloads remote files into a local directory.
#[derive(Clone)]
pub struct Fetcher {
    client: Client,
    download_dir: PathBuf,
}

impl Fetcher {
    /// Create a fetcher with its own HTTP client.
    pub fn new(download_dir: impl Into<PathBuf>, user_agent: &str) -> reqwest::Result<Self> {
        let client = Client::builder().user_agent(user_agent).build()?;
        Ok(Self::with_client(client, download_dir))
    }

    /// Create a fetcher around an existing client.
    pub fn with_client(client: Client, download_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            download_dir: download_dir.into(),
        }
    }

    /// Download `url` and return the path it was written to.
    ///
    /// A non-2xx response is an error and writes nothing. A failure after
    /// the file was created may leave a partial file behind.
    pub async fn fetch(&self, url: &Url) -> Result<PathBuf, DownloadError> {
        let path = self.download_dir.join(destination_name(url));

        info!(url = %url, path = %path.display(), "download_starting");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| DownloadError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Status {
                url: url.to_string(),
                status,
            });
        }

        let mut file = File::create(&path).await.map_err(|source| DownloadError::Io {
            path: path.clone(),
            source,
        })?;

        let mut stream = response.bytes_stream();
        let mut bytes_written: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|source| DownloadError::Stream {
                url: url.to_string(),
                source,
            })?;
            file.write_all(&chunk).await.map_err(|source| DownloadError::Io {
                path: path.clone(),
                source,
            })?;
            bytes_written += chunk.len() as u64;
        }

        file.flush().await.map_err(|source| DownloadError::Io {
            path: path.clone(),
            source,
        })?;

        debug!(path = %path.display(), status_code = status.as_u16(), "download_flushed");
        info!(
            url = %url,
            path = %path.display(),
            bytes = bytes_written,
            "download_complete"
        );

        Ok(path)
    }
}

/// `<uuid>.<ext>` where `ext` follows the last `.` of the final path segment.
///
/// The extension is taken as-is; a segment with no `.` gives a bare uuid.
pub fn destination_name(url: &Url) -> String {
    let id = Uuid::new_v4();
    match file_extension(url) {
        Some(ext) => format!("{}.{}", id, ext),
        None => id.to_string(),
    }
}

fn file_extension(url: &Url) -> Option<&str> {
    let segment = url.path().rsplit('/').next()?;
    segment.rsplit_once('.').map(|(_, ext)| ext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension(&url("https://x/y/img.png")), Some("png"));
        assert_eq!(file_extension(&url("https://x/y/archive.tar.gz")), Some("gz"));
        assert_eq!(file_extension(&url("https://x/img.png?size=large#top")), Some("png"));
        assert_eq!(file_extension(&url("https://x.com/a.b/image")), None);
        assert_eq!(file_extension(&url("https://x/y/")), None);
        assert_eq!(file_extension(&url("https://x/y/trailing.")), Some(""));
    }

    #[test]
    fn test_destination_name_is_uuid_plus_extension() {
        let name = destination_name(&url("https://x/y/img.png"));
        let (stem, ext) = name.rsplit_once('.').unwrap();
        assert_eq!(ext, "png");
        assert!(Uuid::parse_str(stem).is_ok());

        let bare = destination_name(&url("https://x/y/img"));
        assert!(Uuid::parse_str(&bare).is_ok());
    }

    #[test]
    fn test_destination_names_are_unique() {
        let u = url("https://x/y/img.png");
        assert_ne!(destination_name(&u), destination_name(&u));
    }

    #[tokio::test]
    async fn test_fetch_writes_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/art/cat.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"\x89PNG fake".to_vec()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let fetcher = Fetcher::new(dir.path(), "test-agent").unwrap();

        let source = url(&format!("{}/art/cat.png", server.uri()));
        let written = fetcher.fetch(&source).await.unwrap();

        assert_eq!(written.parent(), Some(dir.path()));
        assert_eq!(written.extension().and_then(|e| e.to_str()), Some("png"));
        assert_eq!(std::fs::read(&written).unwrap(), b"\x89PNG fake");
    }

    #[tokio::test]
    async fn test_fetch_not_found_writes_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let fetcher = Fetcher::new(dir.path(), "test-agent").unwrap();

        let source = url(&format!("{}/missing.png", server.uri()));
        let err = fetcher.fetch(&source).await.unwrap_err();

        assert!(matches!(err, DownloadError::Status { status, .. } if status == StatusCode::NOT_FOUND));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_fetch_unwritable_destination() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"data".to_vec()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let fetcher = Fetcher::new(dir.path().join("does-not-exist"), "test-agent").unwrap();

        let source = url(&format!("{}/a.png", server.uri()));
        let err = fetcher.fetch(&source).await.unwrap_err();

        assert!(matches!(err, DownloadError::Io { .. }));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        // Bind then drop to get a port nothing listens on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let dir = tempfile::tempdir().unwrap();
        let fetcher = Fetcher::new(dir.path(), "test-agent").unwrap();

        let source = url(&format!("http://{}/a.png", addr));
        let err = fetcher.fetch(&source).await.unwrap_err();

        assert!(matches!(err, DownloadError::Request { .. }));
    }

    #[tokio::test]
    async fn test_fetch_truncated_body_leaves_partial_file() {
        use std::io::{Read, Write};

        // Promise 1000 bytes, send 7, then hang up.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = std::thread::spawn(move || {
            let (mut socket, _) = listener.accept().unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request);
            socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 1000\r\n\r\npartial")
                .unwrap();
        });

        let dir = tempfile::tempdir().unwrap();
        let fetcher = Fetcher::new(dir.path(), "test-agent").unwrap();

        let source = url(&format!("http://{}/a.png", addr));
        let err = fetcher.fetch(&source).await.unwrap_err();
        server.join().unwrap();

        assert!(matches!(err, DownloadError::Stream { .. }), "{:?}", err);

        let files: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].extension().and_then(|e| e.to_str()), Some("png"));
    }
}
