use clap::{Args, Parser, Subcommand};
use std::num::NonZeroUsize;
use std::path::PathBuf;

use crate::item::DownloadItem;
use crate::pack::{DEFAULT_MAX_CONCURRENT_DOWNLOADS, DEFAULT_STAGING_SUBDIR};

#[derive(Parser, Debug)]
#[command(name = "zipfetch")]
#[command(version)]
#[command(about = "Bundle remote files into a zip, or pull one entry out of a zip", long_about = None)]
#[command(after_help = "Examples:\n  \
  zipfetch pack -d out https://example.com/a.png=img/a.png https://example.com/b.txt\n  \
  zipfetch extract out/20240101120000.zip img/a.png -d .\n  \
  zipfetch extract -p https://example.com/archive.zip docs/readme.txt | more\n  \
  zipfetch list -v out/20240101120000.zip")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// More log output (-v debug, -vv trace)
    #[arg(short = 'v', long = "verbose", global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Less log output (-q errors only, -qq silent)
    #[arg(short = 'q', long = "quiet", global = true, action = clap::ArgAction::Count)]
    pub quiet: u8,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Download files and bundle them into one zip archive
    Pack(PackArgs),
    /// Extract a single entry from a zip archive
    Extract(ExtractArgs),
    /// List the entries of a zip archive
    List(ListArgs),
}

#[derive(Args, Debug)]
pub struct PackArgs {
    /// Files to fetch, as URL or URL=FILENAME
    #[arg(value_name = "ITEM", required = true)]
    pub items: Vec<DownloadItem>,

    /// Directory the archive is written to
    #[arg(short = 'd', long = "dest", value_name = "DIR", default_value = ".")]
    pub destination: PathBuf,

    /// Resolve the destination relative to this directory
    #[arg(short = 'C', long = "cwd", value_name = "DIR")]
    pub working_dir: Option<PathBuf>,

    /// Staging directory for downloads, relative to the destination
    #[arg(long = "staging", value_name = "DIR", default_value = DEFAULT_STAGING_SUBDIR)]
    pub staging_subdir: PathBuf,

    /// Archive file name (default: YYYYMMDDHHmmss.zip)
    #[arg(short = 'o', long = "output", value_name = "NAME")]
    pub archive_file_name: Option<String>,

    /// Directory prefix for every entry inside the archive
    #[arg(long = "prefix", value_name = "PATH", default_value = "")]
    pub entry_prefix: String,

    /// Maximum concurrent downloads, 0 for unlimited
    #[arg(short = 'j', long = "jobs", value_name = "N", default_value_t = DEFAULT_MAX_CONCURRENT_DOWNLOADS)]
    pub jobs: usize,

    /// Connect and idle-read timeout in seconds, 0 to disable
    #[arg(long = "timeout", value_name = "SECS", default_value_t = 30)]
    pub timeout: u64,
}

impl PackArgs {
    pub fn max_concurrent_downloads(&self) -> Option<NonZeroUsize> {
        NonZeroUsize::new(self.jobs)
    }
}

#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// ZIP file path or HTTP URL
    #[arg(value_name = "ARCHIVE")]
    pub archive: String,

    /// Entry path inside the archive, e.g. res/logo.png
    #[arg(value_name = "ENTRY")]
    pub entry: String,

    /// Copy the extracted file into this directory
    #[arg(short = 'd', value_name = "DIR", default_value = ".", conflicts_with = "pipe")]
    pub extract_dir: PathBuf,

    /// Write the entry to stdout instead
    #[arg(short = 'p')]
    pub pipe: bool,

    /// Overwrite an existing file in the target directory
    #[arg(short = 'o')]
    pub overwrite: bool,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// ZIP file path
    #[arg(value_name = "ARCHIVE")]
    pub archive: PathBuf,

    /// Show sizes and compression ratio
    #[arg(short = 'l', long = "long")]
    pub long: bool,
}

impl ExtractArgs {
    pub fn is_http_url(&self) -> bool {
        crate::io::is_http_url(&self.archive)
    }
}

impl Cli {
    /// Log filter derived from `-v`/`-q`, used when `RUST_LOG` is unset.
    pub fn log_level(&self) -> &'static str {
        match (self.verbose, self.quiet) {
            (_, q) if q > 1 => "off",
            (_, 1) => "error",
            (0, _) => "warn",
            (1, _) => "debug",
            _ => "trace",
        }
    }
}
