use std::fmt;
use std::str::FromStr;

use url::Url;

/// One remote resource to fetch.
///
/// `filename` is where the body lands relative to the staging directory, and therefore
/// also its path inside the produced archive. Nested paths like `images/logo.png` are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadItem {
    pub url: Url,
    pub filename: String,
}

impl DownloadItem {
    pub fn new(url: Url, filename: impl Into<String>) -> Self {
        Self {
            url,
            filename: filename.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ParseItemError {
    #[error("invalid URL '{input}': {source}")]
    Url {
        input: String,
        source: url::ParseError,
    },

    #[error("cannot derive a file name from '{0}', use URL=FILENAME")]
    NoFileName(Url),
}

/// Parses `URL[=FILENAME]`.
///
/// A trailing `=FILENAME` is only split off when the query before it is made of complete
/// `key=value` pairs, so `?id=7` stays part of the URL while `?id=7=seven.bin` names a
/// file. Without a file name, the last non-empty path segment is used.
impl FromStr for DownloadItem {
    type Err = ParseItemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some((url, filename)) = split_filename(s) {
            if let Ok(url) = Url::parse(url) {
                return Ok(Self::new(url, filename));
            }
        }

        let url = Url::parse(s).map_err(|source| ParseItemError::Url {
            input: s.to_string(),
            source,
        })?;
        let filename = url
            .path_segments()
            .and_then(|mut segments| segments.rfind(|seg| !seg.is_empty()))
            .map(str::to_string)
            .ok_or_else(|| ParseItemError::NoFileName(url.clone()))?;
        Ok(Self::new(url, filename))
    }
}

fn split_filename(s: &str) -> Option<(&str, &str)> {
    let (url, filename) = s.rsplit_once('=')?;
    if filename.is_empty() || filename.contains(['?', '&', '#']) {
        return None;
    }
    if let Some((_, query)) = url.split_once('?') {
        let last_pair = query.rsplit_once('&').map_or(query, |(_, last)| last);
        // `?key` without a value: the `=` belongs to the query
        if !last_pair.contains('=') {
            return None;
        }
    }
    Some((url, filename))
}

impl fmt::Display for DownloadItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.url, self.filename)
    }
}
