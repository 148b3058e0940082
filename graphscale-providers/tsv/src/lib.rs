//! Tab-separated ingest and output for graphscale.
//!
//! The reader streams node and edge files into an
//! [`InputModel`](graphscale_core::InputModel); the writer implements the
//! [`GraphWriter`](graphscale_core::GraphWriter) capability over a pair of
//! TSV files.

mod error;
mod reader;
mod writer;

pub use crate::{
    error::TsvError,
    reader::{ReadSummary, TsvReader},
    writer::TsvWriter,
};
