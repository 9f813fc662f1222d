//! # zipfetch
//!
//! Download a batch of remote files into a single zip archive, or pull one entry out of
//! an existing zip.
//!
//! ## Features
//!
//! - Concurrent downloads over HTTP/HTTPS (and `file://`), bounded by a configurable limit
//! - All-or-nothing batches: one failed download means no archive
//! - Staging and extraction directories are always cleaned up, including on error and
//!   when the future is dropped
//! - Nested file names (`images/logo.png`) keep their structure inside the archive
//! - Single-entry extraction from local or remote archives
//!
//! ## Example
//!
//! ```no_run
//! use zipfetch::{ArchiveOptions, DownloadItem, archive_remote_files, extract_entry};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let items: Vec<DownloadItem> = vec![
//!         "https://example.com/logo.png=images/logo.png".parse()?,
//!         "https://example.com/readme.txt".parse()?,
//!     ];
//!
//!     // Bundle both files into ./out/<timestamp>.zip
//!     let archive = archive_remote_files(&items, "out", &ArchiveOptions::default()).await?;
//!
//!     // Read one of them back; the temporary copy is removed when `logo` is dropped
//!     let logo = extract_entry(&archive.path, "images/logo.png").await?;
//!     println!("{}", std::fs::read(logo.path())?.len());
//!
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod cli;
pub mod error;
pub mod io;
pub mod item;
pub mod pack;
pub mod paths;
pub mod remote;
pub mod staging;

pub use archive::{EntryInfo, ExtractedEntry, extract_entry, extract_entry_blocking, list_entries};
pub use cli::Cli;
pub use error::{Error, Result};
pub use io::{DefaultFetcher, FetchError, Fetcher, HttpFetcher, LocalFileFetcher};
pub use item::DownloadItem;
pub use pack::{ArchiveOptions, ArchiveResult, archive_remote_files, archive_with_fetcher};
pub use remote::extract_remote_entry;
