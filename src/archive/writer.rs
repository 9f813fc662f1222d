use std::fs::{self, File};
use std::io::{self, Seek, Write};
use std::path::{Path, PathBuf};

use tracing::debug;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::error::ArchiveWriteError;
use crate::paths::entry_name;

/// Adds a whole directory tree to a zip archive.
pub struct TreeWriter<W: Write + Seek> {
    zip: ZipWriter<W>,
    options: SimpleFileOptions,
    entries: usize,
}

impl<W: Write + Seek> TreeWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            zip: ZipWriter::new(inner),
            options: SimpleFileOptions::default()
                .compression_method(zip::CompressionMethod::Deflated)
                .unix_permissions(0o644),
            entries: 0,
        }
    }

    /// Add every regular file below `root`, named `prefix/<path relative to root>`.
    ///
    /// Only files become entries; directories are implied by the entry names.
    pub fn add_tree(&mut self, root: &Path, prefix: &str) -> Result<(), ArchiveWriteError> {
        let mut pending = vec![PathBuf::new()];
        while let Some(relative) = pending.pop() {
            for entry in fs::read_dir(root.join(&relative))? {
                let entry = entry?;
                let file_type = entry.file_type()?;
                let relative = relative.join(entry.file_name());

                if file_type.is_dir() {
                    pending.push(relative);
                } else if file_type.is_file() {
                    self.add_file(&entry.path(), &entry_name(prefix, &relative))?;
                }
            }
        }
        Ok(())
    }

    fn add_file(&mut self, source: &Path, name: &str) -> Result<(), ArchiveWriteError> {
        debug!(entry = name, "adding to archive");
        self.zip.start_file(name, self.options)?;
        let mut file = File::open(source)?;
        io::copy(&mut file, &mut self.zip)?;
        self.entries += 1;
        Ok(())
    }

    /// Number of entries written so far
    pub fn entries(&self) -> usize {
        self.entries
    }

    /// Write the central directory and hand back the underlying writer.
    pub fn finish(self) -> Result<W, ArchiveWriteError> {
        Ok(self.zip.finish()?)
    }
}
