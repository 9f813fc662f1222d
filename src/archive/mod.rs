//! ZIP archive assembly and single-entry extraction.
//!
//! The format itself is handled by the [`zip`] crate; this module only decides what goes
//! into an archive and where things come out.
//!
//! ## Components
//!
//! - `writer`: [`TreeWriter`] adds a staged directory tree to a new archive
//! - `extractor`: [`ZipExtractor`] pulls one named entry into a scoped temporary
//!   directory, and lists entries
//!
//! Both sides are blocking. The async entry points move the work onto tokio's blocking
//! pool with `spawn_blocking`.

mod extractor;
mod writer;

pub use extractor::{
    EntryInfo, ExtractedEntry, ZipExtractor, extract_entry, extract_entry_blocking, list_entries,
};
pub use writer::TreeWriter;
