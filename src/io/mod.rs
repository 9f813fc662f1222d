mod http;
mod local;

pub use http::HttpFetcher;
pub use local::LocalFileFetcher;

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Errors raised while fetching a single remote resource.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error(transparent)]
    Request(#[from] reqwest::Error),

    #[error("request to '{url}' failed with status: {status}")]
    Status {
        url: Url,
        status: reqwest::StatusCode,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("unsupported URL scheme '{0}'")]
    UnsupportedScheme(String),

    #[error("'{0}' does not point to a local file")]
    NotAFileUrl(Url),
}

/// Trait for streaming a remote resource into a local file
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Write the body behind `url` to `dest`, returning the number of bytes written.
    ///
    /// `dest`'s parent directory must already exist.
    async fn fetch(&self, url: &Url, dest: &Path) -> Result<u64, FetchError>;
}

/// Dispatches on the URL scheme: `http`/`https` go over the network,
/// `file` is copied from disk.
pub struct DefaultFetcher {
    http: HttpFetcher,
    local: LocalFileFetcher,
}

impl DefaultFetcher {
    pub fn new(timeout: Option<Duration>) -> Result<Self, FetchError> {
        Ok(Self {
            http: HttpFetcher::new(timeout)?,
            local: LocalFileFetcher,
        })
    }
}

#[async_trait]
impl Fetcher for DefaultFetcher {
    async fn fetch(&self, url: &Url, dest: &Path) -> Result<u64, FetchError> {
        match url.scheme() {
            "http" | "https" => self.http.fetch(url, dest).await,
            "file" => self.local.fetch(url, dest).await,
            other => Err(FetchError::UnsupportedScheme(other.to_string())),
        }
    }
}

pub fn is_http_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}
