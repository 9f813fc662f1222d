//! Main entry point for the zipfetch CLI application.
//!
//! Dispatches to the `pack`, `extract` and `list` subcommands.

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing_subscriber::EnvFilter;
use url::Url;

use zipfetch::cli::{Command, ExtractArgs, ListArgs, PackArgs};
use zipfetch::{
    ArchiveOptions, Cli, DefaultFetcher, ExtractedEntry, archive_remote_files, extract_entry,
    extract_remote_entry, list_entries,
};

/// Application entry point.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    match &cli.command {
        Command::Pack(args) => pack(args).await,
        Command::Extract(args) => extract(args).await,
        Command::List(args) => list(args).await,
    }
}

/// Install a stderr fmt subscriber. `RUST_LOG` wins over the `-v`/`-q` flags.
fn init_logging(cli: &Cli) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("zipfetch={}", cli.log_level())));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

/// Download all items and write the archive, printing its path on success.
async fn pack(args: &PackArgs) -> Result<()> {
    let mut options = ArchiveOptions::default()
        .with_staging_subdir(&args.staging_subdir)
        .with_entry_prefix(&args.entry_prefix)
        .with_max_concurrent_downloads(args.max_concurrent_downloads())
        .with_timeout((args.timeout > 0).then(|| Duration::from_secs(args.timeout)));
    if let Some(dir) = &args.working_dir {
        options = options.with_working_dir(dir);
    }
    if let Some(name) = &args.archive_file_name {
        options = options.with_archive_file_name(name);
    }

    let result = archive_remote_files(&args.items, &args.destination, &options)
        .await
        .context("failed to build archive")?;

    println!("{}", result.path.display());
    Ok(())
}

/// Extract one entry and either pipe it to stdout or copy it out of the temporary
/// directory before that directory is removed.
async fn extract(args: &ExtractArgs) -> Result<()> {
    let extracted = if args.is_http_url() {
        let url = Url::parse(&args.archive).context("invalid archive URL")?;
        let fetcher = DefaultFetcher::new(None)?;
        extract_remote_entry(&fetcher, &url, &args.entry).await?
    } else {
        extract_entry(&args.archive, &args.entry).await?
    };

    if args.pipe {
        let data = tokio::fs::read(extracted.path()).await?;
        let mut stdout = tokio::io::stdout();
        stdout.write_all(&data).await?;
        stdout.flush().await?;
    } else {
        copy_out(&extracted, &args.extract_dir, args.overwrite).await?;
    }

    extracted.close()?;
    Ok(())
}

async fn copy_out(extracted: &ExtractedEntry, dir: &Path, overwrite: bool) -> Result<()> {
    let file_name = extracted
        .path()
        .file_name()
        .context("extracted entry has no file name")?;
    let target = dir.join(file_name);

    if target.exists() && !overwrite {
        bail!("{} already exists (use -o to overwrite)", target.display());
    }

    tokio::fs::create_dir_all(dir).await?;
    tokio::fs::copy(extracted.path(), &target)
        .await
        .with_context(|| format!("failed to write {}", target.display()))?;
    eprintln!("  extracting: {}", target.display());
    Ok(())
}

/// List archive entries. Long format adds sizes and compression ratio.
async fn list(args: &ListArgs) -> Result<()> {
    let entries = list_entries(&args.archive).await?;

    if args.long {
        println!("{:>10}  {:>10}  {:>5}  Name", "Length", "Size", "Cmpr");
        println!("{}", "-".repeat(50));
    }

    let mut total_uncompressed = 0u64;
    let mut total_compressed = 0u64;
    let mut file_count = 0usize;

    for entry in &entries {
        if !args.long {
            println!("{}", entry.name);
            continue;
        }

        println!(
            "{:>10}  {:>10}  {}  {}",
            entry.uncompressed_size,
            entry.compressed_size,
            ratio(entry.compressed_size, entry.uncompressed_size),
            entry.name
        );
        if !entry.is_directory {
            total_uncompressed += entry.uncompressed_size;
            total_compressed += entry.compressed_size;
            file_count += 1;
        }
    }

    if args.long {
        println!("{}", "-".repeat(50));
        println!(
            "{:>10}  {:>10}  {}  {} files ({})",
            total_uncompressed,
            total_compressed,
            ratio(total_compressed, total_uncompressed),
            file_count,
            format_size(total_uncompressed)
        );
    }

    Ok(())
}

/// Space saved by compression, as a right aligned percentage.
fn ratio(compressed: u64, uncompressed: u64) -> String {
    if uncompressed > 0 && compressed <= uncompressed {
        format!("{:>4}%", 100 - (compressed * 100 / uncompressed))
    } else {
        "  0%".to_string()
    }
}

/// Format a byte size into a human-readable string.
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
