//! Line-oriented TSV ingest.
//!
//! Node lines carry `id\ttype\t…`, edge lines `src\tdst\tcolor\t…`;
//! trailing columns are ignored. The first line of every file is a header
//! and skipped. Lines with fewer than the required tabs are skipped with a
//! warning and counted in the summary; ingest is recoverable at record
//! granularity.

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use tracing::{info, instrument, warn};

use graphscale_core::InputModel;

use crate::error::TsvError;

/// Totals reported after a full ingest pass.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ReadSummary {
    /// Node records fed into the model.
    pub nodes_read: u64,
    /// Edge records fed into the model.
    pub edges_read: u64,
    /// Malformed lines skipped across all files.
    pub lines_skipped: u64,
}

/// Streams node and edge TSV files into an [`InputModel`].
#[derive(Clone, Debug)]
pub struct TsvReader {
    node_files: Vec<PathBuf>,
    edge_files: Vec<PathBuf>,
}

impl TsvReader {
    /// Creates a reader over the given node and edge file paths.
    #[must_use]
    pub fn new(node_files: Vec<PathBuf>, edge_files: Vec<PathBuf>) -> Self {
        Self {
            node_files,
            edge_files,
        }
    }

    /// Reads every configured file into `model`, nodes first so edge
    /// endpoints can be resolved to their types.
    ///
    /// # Errors
    /// Returns [`TsvError::Read`] when a file cannot be opened or a line
    /// cannot be decoded; malformed records only warn.
    #[instrument(skip_all)]
    pub fn read_into(&self, model: &mut InputModel) -> Result<ReadSummary, TsvError> {
        let mut summary = ReadSummary::default();

        for path in &self.node_files {
            let (read, skipped) = read_file(path, |line| {
                let Some((id, node_type)) = parse_node_line(line) else {
                    return false;
                };
                model.read_node(id, node_type);
                true
            })?;
            info!(path = %path.display(), nodes = read, skipped, "node file read");
            summary.nodes_read += read;
            summary.lines_skipped += skipped;
        }

        for path in &self.edge_files {
            let (read, skipped) = read_file(path, |line| {
                let Some((start, end, color)) = parse_edge_line(line) else {
                    return false;
                };
                model.read_edge(start, end, color);
                true
            })?;
            info!(path = %path.display(), edges = read, skipped, "edge file read");
            summary.edges_read += read;
            summary.lines_skipped += skipped;
        }

        Ok(summary)
    }
}

// Applies `consume` to every line after the header; returns (consumed,
// skipped) counts.
fn read_file(
    path: &Path,
    mut consume: impl FnMut(&str) -> bool,
) -> Result<(u64, u64), TsvError> {
    let file = File::open(path).map_err(|source| TsvError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);

    let mut read = 0_u64;
    let mut skipped = 0_u64;
    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| TsvError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        // The first line names the columns.
        if index == 0 {
            continue;
        }
        if consume(&line) {
            read += 1;
        } else {
            warn!(path = %path.display(), line_number = index + 1, "skipping malformed line");
            skipped += 1;
        }
    }
    Ok((read, skipped))
}

/// Splits a node line into `(id, type)`; `None` when a required tab is
/// missing.
fn parse_node_line(line: &str) -> Option<(&str, &str)> {
    let mut fields = line.splitn(3, '\t');
    let id = fields.next()?;
    let node_type = fields.next()?;
    // The trailing column separator is part of the format.
    fields.next()?;
    Some((id, node_type))
}

/// Splits an edge line into `(src, dst, color)`; `None` when a required tab
/// is missing.
fn parse_edge_line(line: &str) -> Option<(&str, &str, &str)> {
    let mut fields = line.splitn(4, '\t');
    let start = fields.next()?;
    let end = fields.next()?;
    let color = fields.next()?;
    fields.next()?;
    Some((start, end, color))
}
