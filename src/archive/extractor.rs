use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use tracing::debug;
use zip::ZipArchive;
use zip::result::ZipError;

use crate::error::{Error, Result};
use crate::staging::ScopedDir;

/// Metadata of a single archive entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    pub name: String,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub is_directory: bool,
}

/// A file extracted into its own temporary directory.
///
/// The directory, and with it [`path`](Self::path), lives exactly as long as this value.
#[derive(Debug)]
pub struct ExtractedEntry {
    dir: ScopedDir,
    path: PathBuf,
}

impl ExtractedEntry {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding the extracted file
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Remove the temporary directory, reporting failures instead of logging them.
    pub fn close(self) -> Result<()> {
        self.dir.close()
    }
}

impl AsRef<Path> for ExtractedEntry {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}

/// Single-entry extractor over an opened zip archive
#[derive(Debug)]
pub struct ZipExtractor {
    archive: ZipArchive<File>,
    path: PathBuf,
}

impl ZipExtractor {
    /// Open the archive at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| open_error(path, ZipError::Io(e)))?;
        let archive = ZipArchive::new(file).map_err(|source| open_error(path, source))?;
        Ok(Self {
            archive,
            path: path.to_path_buf(),
        })
    }

    /// List all entries in the archive
    pub fn list_entries(&mut self) -> Result<Vec<EntryInfo>> {
        let mut entries = Vec::with_capacity(self.archive.len());
        for index in 0..self.archive.len() {
            let entry = self
                .archive
                .by_index(index)
                .map_err(|source| open_error(&self.path, source))?;
            entries.push(EntryInfo {
                name: entry.name().to_string(),
                compressed_size: entry.compressed_size(),
                uncompressed_size: entry.size(),
                is_directory: entry.is_dir(),
            });
        }
        Ok(entries)
    }

    /// Decompress `entry` into a fresh directory under `temp_root`.
    ///
    /// The file keeps the entry's base name; the entry's own directories are dropped.
    pub fn extract_to_temp(&mut self, entry: &str, temp_root: &Path) -> Result<ExtractedEntry> {
        let file_name = Path::new(entry)
            .file_name()
            .ok_or_else(|| Error::InvalidPath {
                path: PathBuf::from(entry),
                reason: "entry path does not name a file",
            })?
            .to_os_string();

        let dir = ScopedDir::create_in(temp_root).map_err(|source| Error::TempDir {
            path: temp_root.to_path_buf(),
            source,
        })?;
        let output = dir.path().join(file_name);

        // On any error below `dir` drops and takes the directory with it
        let mut source = match self.archive.by_name(entry) {
            Ok(source) => source,
            Err(ZipError::FileNotFound) => {
                return Err(Error::EntryNotFound {
                    archive: self.path.clone(),
                    entry: entry.to_string(),
                });
            }
            Err(source) => return Err(open_error(&self.path, source)),
        };
        if source.is_dir() {
            return Err(Error::EntryIsDirectory {
                archive: self.path.clone(),
                entry: entry.to_string(),
            });
        }

        debug!(entry, output = %output.display(), "extracting entry");
        if let Err(source) = write_file(&mut source, &output) {
            return Err(Error::Extract {
                path: output,
                source,
            });
        }

        Ok(ExtractedEntry { dir, path: output })
    }
}

fn open_error(path: &Path, source: ZipError) -> Error {
    Error::ArchiveOpen {
        path: path.to_path_buf(),
        source,
    }
}

fn write_file(reader: &mut impl Read, output: &Path) -> io::Result<()> {
    let mut file = File::create(output)?;
    io::copy(reader, &mut file)?;
    file.sync_all()
}

/// Extract `entry` from the archive at `archive` into a fresh directory under the system
/// temporary directory. Blocking.
pub fn extract_entry_blocking(archive: &Path, entry: &str) -> Result<ExtractedEntry> {
    let mut extractor = ZipExtractor::open(archive)?;
    extractor.extract_to_temp(entry, &std::env::temp_dir())
}

/// Async wrapper around [`extract_entry_blocking`]; the work runs on the blocking pool.
pub async fn extract_entry(archive: impl AsRef<Path>, entry: &str) -> Result<ExtractedEntry> {
    let archive = archive.as_ref().to_path_buf();
    let entry = entry.to_string();
    tokio::task::spawn_blocking(move || extract_entry_blocking(&archive, &entry)).await?
}

/// List the entries of the archive at `archive`.
pub async fn list_entries(archive: impl AsRef<Path>) -> Result<Vec<EntryInfo>> {
    let archive = archive.as_ref().to_path_buf();
    tokio::task::spawn_blocking(move || ZipExtractor::open(&archive)?.list_entries()).await?
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    fn write_archive(path: &Path, files: &[(&str, &[u8])]) {
        let mut zip = ZipWriter::new(File::create(path).unwrap());
        let options = SimpleFileOptions::default();
        for (name, data) in files {
            zip.start_file(*name, options).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.add_directory("dir/", options).unwrap();
        zip.finish().unwrap();
    }

    #[test]
    fn test_extract_discards_inner_directories() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("a.zip");
        write_archive(&archive, &[("x1/x.txt", b"Hello world!123456789")]);

        let mut extractor = ZipExtractor::open(&archive).unwrap();
        let extracted = extractor.extract_to_temp("x1/x.txt", dir.path()).unwrap();

        assert_eq!(extracted.path().file_name().unwrap(), "x.txt");
        assert_eq!(extracted.path().parent().unwrap(), extracted.dir());
        assert_eq!(
            std::fs::read(extracted.path()).unwrap(),
            b"Hello world!123456789"
        );

        let out_dir = extracted.dir().to_path_buf();
        extracted.close().unwrap();
        assert!(!out_dir.exists());
    }

    #[test]
    fn test_missing_entry_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("a.zip");
        write_archive(&archive, &[("a.txt", b"a")]);
        let temp_root = dir.path().join("out");
        std::fs::create_dir(&temp_root).unwrap();

        let mut extractor = ZipExtractor::open(&archive).unwrap();
        let err = extractor
            .extract_to_temp("does/not/exist.txt", &temp_root)
            .unwrap_err();

        assert!(matches!(err, Error::EntryNotFound { ref entry, .. } if entry == "does/not/exist.txt"));
        assert_eq!(std::fs::read_dir(&temp_root).unwrap().count(), 0);
    }

    #[test]
    fn test_directory_entry_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("a.zip");
        write_archive(&archive, &[]);

        let mut extractor = ZipExtractor::open(&archive).unwrap();
        let err = extractor.extract_to_temp("dir/", dir.path()).unwrap_err();
        assert!(matches!(err, Error::EntryIsDirectory { .. }));
    }

    #[test]
    fn test_missing_temp_root_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("a.zip");
        write_archive(&archive, &[("a.txt", b"a")]);

        let mut extractor = ZipExtractor::open(&archive).unwrap();
        let err = extractor
            .extract_to_temp("a.txt", &dir.path().join("missing"))
            .unwrap_err();
        assert!(matches!(err, Error::TempDir { .. }));
        assert!(err.to_string().starts_with("failed to create temporary directory"));
    }

    #[test]
    fn test_open_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = ZipExtractor::open(&dir.path().join("missing.zip")).unwrap_err();
        assert!(matches!(missing, Error::ArchiveOpen { .. }));

        let garbage = dir.path().join("garbage.zip");
        std::fs::write(&garbage, b"definitely not a zip").unwrap();
        let corrupt = ZipExtractor::open(&garbage).unwrap_err();
        assert!(matches!(corrupt, Error::ArchiveOpen { .. }));
    }

    #[test]
    fn test_list_entries() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("a.zip");
        write_archive(&archive, &[("a.txt", b"abc"), ("b/c.txt", b"")]);

        let entries = ZipExtractor::open(&archive).unwrap().list_entries().unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "b/c.txt", "dir/"]);
        assert_eq!(entries[0].uncompressed_size, 3);
        assert!(entries[2].is_directory);
    }
}
