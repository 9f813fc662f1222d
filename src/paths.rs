//! Path resolution helpers shared by the pack and extract pipelines.

use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Reduce `path` to a normalized relative path.
///
/// Root and drive prefixes are stripped so `"/tmp"` nests like `"tmp"`, `.` segments are
/// dropped, and `..` is rejected since the result must stay below whatever it is joined to.
pub fn relative_path(path: &Path) -> Result<PathBuf> {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::CurDir => {}
            Component::Normal(part) => out.push(part),
            Component::ParentDir => {
                return Err(Error::InvalidPath {
                    path: path.to_path_buf(),
                    reason: "parent directory references are not allowed",
                });
            }
        }
    }
    Ok(out)
}

/// Like [`relative_path`] but also rejects paths that normalize to nothing.
pub fn relative_file_path(path: &Path) -> Result<PathBuf> {
    let out = relative_path(path)?;
    if out.as_os_str().is_empty() {
        return Err(Error::InvalidPath {
            path: path.to_path_buf(),
            reason: "path does not name a file",
        });
    }
    Ok(out)
}

/// Resolve `dir` against `working_dir` (or the process cwd) into an absolute path.
pub fn resolve_dir(working_dir: Option<&Path>, dir: &Path) -> Result<PathBuf> {
    let base = match working_dir {
        Some(base) => base.to_path_buf(),
        None => PathBuf::new(),
    };
    let joined = base.join(dir);
    std::path::absolute(&joined).map_err(|_| Error::InvalidPath {
        path: joined,
        reason: "cannot be made absolute",
    })
}

/// Normalize an entry prefix to `/`-separated segments, rejecting `..` in either
/// separator style so no entry can point above the extraction root.
pub fn entry_prefix(prefix: &str) -> Result<String> {
    let mut parts = Vec::new();
    for part in prefix.split(['/', '\\']) {
        match part {
            "" | "." => {}
            ".." => {
                return Err(Error::InvalidPath {
                    path: PathBuf::from(prefix),
                    reason: "parent directory references are not allowed",
                });
            }
            part => parts.push(part),
        }
    }
    Ok(parts.join("/"))
}

/// Build an in-archive entry name: forward slashes, optional prefix.
pub fn entry_name(prefix: &str, relative: &Path) -> String {
    let mut parts: Vec<String> = prefix
        .split(['/', '\\'])
        .filter(|s| !s.is_empty() && *s != ".")
        .map(str::to_string)
        .collect();
    parts.extend(
        relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            }),
    );
    parts.join("/")
}
