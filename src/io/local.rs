use super::{FetchError, Fetcher};
use async_trait::async_trait;
use std::path::Path;
use url::Url;

/// Fetcher for `file://` URLs
pub struct LocalFileFetcher;

#[async_trait]
impl Fetcher for LocalFileFetcher {
    async fn fetch(&self, url: &Url, dest: &Path) -> Result<u64, FetchError> {
        let source = url
            .to_file_path()
            .map_err(|_| FetchError::NotAFileUrl(url.clone()))?;
        Ok(tokio::fs::copy(&source, dest).await?)
    }
}
