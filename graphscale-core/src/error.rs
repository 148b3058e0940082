//! Error types for the graphscale core library.
//!
//! Defines the error enums exposed by the public API and a convenient result
//! alias.

use std::{fmt, io};

use thiserror::Error;

/// Stable codes describing [`ModelError`] variants.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum ModelErrorCode {
    /// A sampler was constructed over an empty or zero-mass distribution.
    EmptyDistribution,
    /// A distribution weight was negative or not finite.
    InvalidWeight,
    /// The scaling factor was zero, negative, or not finite.
    InvalidScale,
    /// The writer rejected a record.
    WriteFailure,
}

impl ModelErrorCode {
    /// Return the stable machine-readable representation of this error code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EmptyDistribution => "MODEL_EMPTY_DISTRIBUTION",
            Self::InvalidWeight => "MODEL_INVALID_WEIGHT",
            Self::InvalidScale => "MODEL_INVALID_SCALE",
            Self::WriteFailure => "MODEL_WRITE_FAILURE",
        }
    }
}

impl fmt::Display for ModelErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error raised while writing a generated record.
///
/// Produced by [`GraphWriter`](crate::GraphWriter) implementations; the
/// writer boundary is the only place generation may fail once the model is
/// built.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum WriteError {
    /// The underlying sink rejected a record.
    #[error("failed to write {record} record: {source}")]
    Io {
        /// Which kind of record was being written (`"node"` or `"edge"`).
        record: &'static str,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// A synchronisation primitive became poisoned after a panic.
    #[error("writer lock for {resource} is poisoned")]
    Poisoned {
        /// Name of the locked resource that was poisoned.
        resource: &'static str,
    },
}

/// Error type produced when constructing or sampling the graph model.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ModelError {
    /// A sampler was constructed over an empty or zero-mass distribution.
    #[error("cannot build a sampler over an empty or zero-mass distribution")]
    EmptyDistribution,
    /// A distribution weight was negative or not finite.
    #[error("distribution weight {weight} is negative or not finite")]
    InvalidWeight {
        /// The offending weight.
        weight: f64,
    },
    /// The scaling factor was zero, negative, or not finite.
    #[error("scaling factor must be positive and finite (got {got})")]
    InvalidScale {
        /// The rejected scaling factor.
        got: f64,
    },
    /// The writer rejected a record during generation.
    #[error(transparent)]
    Write(#[from] WriteError),
}

impl ModelError {
    /// Retrieve the stable [`ModelErrorCode`] for this error.
    #[must_use]
    pub const fn code(&self) -> ModelErrorCode {
        match self {
            Self::EmptyDistribution => ModelErrorCode::EmptyDistribution,
            Self::InvalidWeight { .. } => ModelErrorCode::InvalidWeight,
            Self::InvalidScale { .. } => ModelErrorCode::InvalidScale,
            Self::Write(_) => ModelErrorCode::WriteFailure,
        }
    }
}

/// Convenient alias for results returned by the core API.
pub type Result<T> = core::result::Result<T, ModelError>;
