//! Error types for the conversion pipeline.
//!
//! Only failures that abort a document's conversion live here. Recoverable
//! cases (missing chapter file, unresolved diagram, jagged table, corrupt
//! image asset) are handled where they occur with a `log::warn!` plus a
//! placeholder element or box, so one bad reference never sinks the whole
//! document. Batch callers in [`crate::book`] catch
//! per-document errors and keep going with the rest.

use std::path::PathBuf;

use thiserror::Error;

/// Fatal conversion failures.
#[derive(Debug, Error)]
pub enum Error {
    /// The input document could not be read.
    #[error("Failed to read '{path}': {source}")]
    ReadInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The finished PDF could not be written to disk.
    #[error("Failed to write '{path}': {source}")]
    WriteOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A measurement font was supplied but could not be parsed.
    #[error("Failed to parse font '{path}': {reason}")]
    FontParse { path: PathBuf, reason: String },

    /// A book was assembled with no chapters at all.
    #[error("Book has no chapters")]
    EmptyBook,

    /// The PDF backend refused the assembled document.
    #[error("Failed to render PDF: {0}")]
    Render(String),
}

pub type Result<T> = std::result::Result<T, Error>;
