//! TSV output for generated graphs.
//!
//! One file per record kind, truncated on creation. Generation calls the
//! writer from many threads at once; a mutex around each buffered handle
//! gives line-level atomicity, which is all the contract demands. Record
//! order across threads is unspecified.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
    sync::Mutex,
};

use graphscale_core::{GraphWriter, NodeId, WriteError};

use crate::error::TsvError;

/// Writes nodes as `id\ttype` and edges as `src\tdst\tcolor`, no header.
#[derive(Debug)]
pub struct TsvWriter {
    nodes: Mutex<BufWriter<File>>,
    edges: Mutex<BufWriter<File>>,
}

impl TsvWriter {
    /// Creates (truncating) the node and edge output files.
    ///
    /// # Errors
    /// Returns [`TsvError::Create`] when either file cannot be created.
    pub fn create(node_path: &Path, edge_path: &Path) -> Result<Self, TsvError> {
        let nodes = File::create(node_path).map_err(|source| TsvError::Create {
            path: node_path.to_path_buf(),
            source,
        })?;
        let edges = File::create(edge_path).map_err(|source| TsvError::Create {
            path: edge_path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            nodes: Mutex::new(BufWriter::new(nodes)),
            edges: Mutex::new(BufWriter::new(edges)),
        })
    }

    /// Flushes both output files, surfacing any buffered write error.
    ///
    /// Dropping the writer also flushes, but silently; calling this at the
    /// end of a run turns deferred I/O failures into a reportable error.
    ///
    /// # Errors
    /// Returns [`TsvError::Flush`] when either handle fails to flush.
    pub fn finish(self) -> Result<(), TsvError> {
        for handle in [self.nodes, self.edges] {
            handle
                .into_inner()
                .map_err(|_| TsvError::Flush {
                    source: std::io::Error::other("writer lock poisoned"),
                })?
                .into_inner()
                .map_err(|error| TsvError::Flush {
                    source: error.into_error(),
                })?;
        }
        Ok(())
    }
}

impl GraphWriter for TsvWriter {
    fn write_node(&self, node_type: &str, node: NodeId) -> Result<(), WriteError> {
        let mut handle = self.nodes.lock().map_err(|_| WriteError::Poisoned {
            resource: "node file",
        })?;
        writeln!(handle, "{node}\t{node_type}").map_err(|source| WriteError::Io {
            record: "node",
            source,
        })
    }

    fn write_edge(&self, color: &str, start: NodeId, end: NodeId) -> Result<(), WriteError> {
        let mut handle = self.edges.lock().map_err(|_| WriteError::Poisoned {
            resource: "edge file",
        })?;
        writeln!(handle, "{start}\t{end}\t{color}").map_err(|source| WriteError::Io {
            record: "edge",
            source,
        })
    }
}
