//! Error type shared by the TSV reader and writer.

use std::{io, path::PathBuf};

use thiserror::Error;

/// An error raised while reading or creating TSV files.
///
/// Malformed records are not errors: the reader skips them with a warning.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum TsvError {
    /// An input file could not be opened or read.
    #[error("failed to read `{path}`: {source}")]
    Read {
        /// Path that triggered the failure.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// An output file could not be created.
    #[error("failed to create `{path}`: {source}")]
    Create {
        /// Path that triggered the failure.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// Flushing buffered output failed.
    #[error("failed to flush output: {source}")]
    Flush {
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
}
