//! Fetch-and-archive: download a batch of files and bundle them into one zip.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::{StreamExt, TryStreamExt, stream};
use tracing::{debug, info, warn};

use crate::archive::TreeWriter;
use crate::error::{ArchiveWriteError, Error, Result};
use crate::io::{DefaultFetcher, FetchError, Fetcher};
use crate::item::DownloadItem;
use crate::paths::{entry_prefix, relative_file_path, relative_path, resolve_dir};
use crate::staging::{StagingArea, timestamp};

/// Staging directory used when none is configured, always nested below the destination.
pub const DEFAULT_STAGING_SUBDIR: &str = "/tmp";

/// Downloads in flight at once unless configured otherwise.
pub const DEFAULT_MAX_CONCURRENT_DOWNLOADS: usize = 16;

/// Connect and idle-read timeout unless configured otherwise.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Knobs for [`archive_remote_files`].
///
/// | field | default |
/// |---|---|
/// | `working_dir` | process current directory |
/// | `staging_subdir` | `"/tmp"`, relative to the destination |
/// | `archive_file_name` | `YYYYMMDDHHmmss.zip` (local time) |
/// | `entry_prefix` | none |
/// | `max_concurrent_downloads` | 16 (`None` is unbounded) |
/// | `timeout` | 30 seconds to connect and between body reads (`None` disables it) |
#[derive(Debug, Clone)]
pub struct ArchiveOptions {
    pub working_dir: Option<PathBuf>,
    pub staging_subdir: PathBuf,
    pub archive_file_name: Option<String>,
    pub entry_prefix: String,
    pub max_concurrent_downloads: Option<NonZeroUsize>,
    pub timeout: Option<Duration>,
}

impl Default for ArchiveOptions {
    fn default() -> Self {
        Self {
            working_dir: None,
            staging_subdir: PathBuf::from(DEFAULT_STAGING_SUBDIR),
            archive_file_name: None,
            entry_prefix: String::new(),
            max_concurrent_downloads: NonZeroUsize::new(DEFAULT_MAX_CONCURRENT_DOWNLOADS),
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }
}

impl ArchiveOptions {
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_staging_subdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_subdir = dir.into();
        self
    }

    pub fn with_archive_file_name(mut self, name: impl Into<String>) -> Self {
        self.archive_file_name = Some(name.into());
        self
    }

    pub fn with_entry_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.entry_prefix = prefix.into();
        self
    }

    pub fn with_max_concurrent_downloads(mut self, limit: Option<NonZeroUsize>) -> Self {
        self.max_concurrent_downloads = limit;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// The archive produced by a successful batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveResult {
    pub file_name: String,
    pub path: PathBuf,
}

/// Download every item and bundle them into a zip under `destination_dir`.
///
/// The batch is all-or-nothing: the first failed download cancels the rest and no archive
/// is written. The staging directory is gone by the time this returns, whatever the
/// outcome, and also if the returned future is dropped early.
pub async fn archive_remote_files(
    items: &[DownloadItem],
    destination_dir: impl AsRef<Path>,
    options: &ArchiveOptions,
) -> Result<ArchiveResult> {
    let fetcher = DefaultFetcher::new(options.timeout).map_err(Error::Client)?;
    archive_with_fetcher(&fetcher, items, destination_dir, options).await
}

/// [`archive_remote_files`] with a caller supplied [`Fetcher`].
pub async fn archive_with_fetcher<F: Fetcher + ?Sized>(
    fetcher: &F,
    items: &[DownloadItem],
    destination_dir: impl AsRef<Path>,
    options: &ArchiveOptions,
) -> Result<ArchiveResult> {
    let destination = resolve_dir(options.working_dir.as_deref(), destination_dir.as_ref())?;
    let staging_subdir = relative_path(&options.staging_subdir)?;
    let file_name = archive_file_name(options)?;
    let prefix = entry_prefix(&options.entry_prefix)?;
    let jobs = plan(items)?;

    let staging = StagingArea::create(&destination, &staging_subdir)?;
    info!(
        items = jobs.len(),
        staging = %staging.path().display(),
        "downloading batch"
    );

    let target = Target {
        destination: &destination,
        file_name: &file_name,
        prefix: &prefix,
    };
    let outcome = stage_and_write(fetcher, &jobs, &staging, target, options).await;

    staging.release();

    let path = outcome?;
    info!(path = %path.display(), "archive written");
    Ok(ArchiveResult { file_name, path })
}

/// Where the finished archive goes and how its entries are named
struct Target<'a> {
    destination: &'a Path,
    file_name: &'a str,
    prefix: &'a str,
}

async fn stage_and_write<F: Fetcher + ?Sized>(
    fetcher: &F,
    jobs: &[Job<'_>],
    staging: &StagingArea,
    target: Target<'_>,
    options: &ArchiveOptions,
) -> Result<PathBuf> {
    download_all(fetcher, jobs, staging.path(), options.max_concurrent_downloads).await?;

    // Only reached once every download has landed
    let source = staging.path().to_path_buf();
    let destination = target.destination.to_path_buf();
    let file_name = target.file_name.to_string();
    let prefix = target.prefix.to_string();
    tokio::task::spawn_blocking(move || write_archive(&source, &destination, &file_name, &prefix))
        .await?
}

struct Job<'a> {
    item: &'a DownloadItem,
    relative: PathBuf,
}

/// Validate file names up front and collapse duplicates; a later item replaces an
/// earlier one with the same file name.
fn plan(items: &[DownloadItem]) -> Result<Vec<Job<'_>>> {
    let mut jobs: Vec<Job<'_>> = Vec::with_capacity(items.len());
    let mut seen: HashMap<PathBuf, usize> = HashMap::new();

    for item in items {
        let relative = relative_file_path(Path::new(&item.filename))?;
        match seen.entry(relative.clone()) {
            Entry::Occupied(slot) => {
                warn!(filename = %item.filename, "duplicate file name, later item wins");
                jobs[*slot.get()] = Job { item, relative };
            }
            Entry::Vacant(slot) => {
                slot.insert(jobs.len());
                jobs.push(Job { item, relative });
            }
        }
    }
    Ok(jobs)
}

fn archive_file_name(options: &ArchiveOptions) -> Result<String> {
    let name = match &options.archive_file_name {
        Some(name) => name.clone(),
        None => format!("{}.zip", timestamp()),
    };
    let plain = Path::new(&name).file_name().and_then(|n| n.to_str()) == Some(name.as_str());
    if !plain {
        return Err(Error::InvalidPath {
            path: PathBuf::from(name),
            reason: "archive file name must not contain directories",
        });
    }
    Ok(name)
}

async fn download_all<F: Fetcher + ?Sized>(
    fetcher: &F,
    jobs: &[Job<'_>],
    staging: &Path,
    limit: Option<NonZeroUsize>,
) -> Result<()> {
    let limit = limit.map_or(jobs.len().max(1), NonZeroUsize::get);

    let sizes: Vec<u64> = stream::iter(jobs)
        .map(|job| download_one(fetcher, job, staging))
        .buffer_unordered(limit)
        .try_collect()
        .await?;

    debug!(
        files = sizes.len(),
        bytes = sizes.iter().sum::<u64>(),
        "batch downloaded"
    );
    Ok(())
}

async fn download_one<F: Fetcher + ?Sized>(fetcher: &F, job: &Job<'_>, staging: &Path) -> Result<u64> {
    let dest = staging.join(&job.relative);
    let fail = |source: FetchError| Error::Download {
        url: job.item.url.clone(),
        filename: job.item.filename.clone(),
        source,
    };

    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| fail(FetchError::Io(e)))?;
    }

    debug!(url = %job.item.url, dest = %dest.display(), "downloading");
    let written = fetcher.fetch(&job.item.url, &dest).await.map_err(fail)?;
    debug!(url = %job.item.url, bytes = written, "downloaded");
    Ok(written)
}

/// Zip `source` into `destination/file_name`.
///
/// The archive is assembled in a temporary file next to its final location and only
/// renamed into place once complete, so a failure never leaves a partial archive behind.
fn write_archive(source: &Path, destination: &Path, file_name: &str, prefix: &str) -> Result<PathBuf> {
    let path = destination.join(file_name);

    let write = || -> std::result::Result<usize, ArchiveWriteError> {
        let partial = tempfile::Builder::new()
            .prefix(".")
            .suffix(".zip.part")
            .tempfile_in(destination)?;
        let mut writer = TreeWriter::new(partial);
        writer.add_tree(source, prefix)?;
        let entries = writer.entries();
        let partial = writer.finish()?;
        partial.as_file().sync_all()?;
        // Dropping the persist error's file handle removes the partial archive
        partial.persist(&path).map_err(|err| err.error)?;
        Ok(entries)
    };

    match write() {
        Ok(entries) => {
            debug!(entries, path = %path.display(), "archive finalized");
            Ok(path)
        }
        Err(source) => Err(Error::ArchiveWrite { path, source }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn item(filename: &str) -> DownloadItem {
        DownloadItem::new(Url::parse("https://example.com/x").unwrap(), filename)
    }

    #[test]
    fn test_defaults() {
        let options = ArchiveOptions::default();
        assert_eq!(options.staging_subdir, PathBuf::from("/tmp"));
        assert_eq!(options.entry_prefix, "");
        assert_eq!(options.max_concurrent_downloads.map(NonZeroUsize::get), Some(16));
        assert!(options.working_dir.is_none());
        assert!(options.archive_file_name.is_none());
    }

    #[test]
    fn test_default_archive_file_name() {
        let name = archive_file_name(&ArchiveOptions::default()).unwrap();
        assert_eq!(name.len(), "YYYYMMDDHHmmss.zip".len());
        assert!(name.ends_with(".zip"));
        assert!(name[..14].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_archive_file_name_rejects_directories() {
        let options = ArchiveOptions::default().with_archive_file_name("nested/out.zip");
        assert!(matches!(
            archive_file_name(&options),
            Err(Error::InvalidPath { .. })
        ));
    }

    #[test]
    fn test_plan_rejects_escaping_names() {
        let items = [item("ok.txt"), item("../escape.txt")];
        assert!(matches!(plan(&items), Err(Error::InvalidPath { .. })));
    }

    #[test]
    fn test_plan_later_duplicate_wins() {
        let mut second = item("same.txt");
        second.url = Url::parse("https://example.com/second").unwrap();
        let items = [item("same.txt"), item("other.txt"), second];

        let jobs = plan(&items).unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].relative, PathBuf::from("same.txt"));
        assert_eq!(jobs[0].item.url.as_str(), "https://example.com/second");
        assert_eq!(jobs[1].relative, PathBuf::from("other.txt"));
    }

    #[test]
    fn test_write_archive_leaves_no_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = write_archive(&dir.path().join("missing"), dir.path(), "out.zip", "")
            .unwrap_err();

        assert!(matches!(err, Error::ArchiveWrite { .. }));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
