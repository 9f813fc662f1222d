use tracing::debug;
use url::Url;

use crate::archive::{ExtractedEntry, extract_entry};
use crate::error::{Error, Result};
use crate::io::Fetcher;
use crate::staging::ScopedDir;

const DOWNLOADED_ARCHIVE: &str = "archive.zip";

/// Download the archive at `url` and extract a single `entry` from it.
///
/// The downloaded archive lives in its own scoped directory that is removed as soon as
/// the entry has been extracted; only the [`ExtractedEntry`] outlives this call.
pub async fn extract_remote_entry<F: Fetcher + ?Sized>(
    fetcher: &F,
    url: &Url,
    entry: &str,
) -> Result<ExtractedEntry> {
    let temp_root = std::env::temp_dir();
    let download = ScopedDir::create_in(&temp_root).map_err(|source| Error::TempDir {
        path: temp_root.clone(),
        source,
    })?;
    let archive = download.path().join(DOWNLOADED_ARCHIVE);

    debug!(%url, archive = %archive.display(), "fetching archive");
    fetcher
        .fetch(url, &archive)
        .await
        .map_err(|source| Error::Download {
            url: url.clone(),
            filename: DOWNLOADED_ARCHIVE.to_string(),
            source,
        })?;

    let extracted = extract_entry(&archive, entry).await;
    download.release();
    extracted
}
