//! Writer boundary for generated graphs.
//!
//! Generation hands every record to a [`GraphWriter`]; the edge phase calls
//! it from many Rayon workers at once, so implementations must serialize
//! access to their sink themselves. Line-level atomicity is sufficient;
//! no ordering is guaranteed across threads.

use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::{Duration, Instant},
};

use crate::{NodeId, error::WriteError};

/// Capability consumed by [`GraphModel::generate`](crate::GraphModel::generate).
///
/// Both operations may be invoked concurrently from any number of threads.
pub trait GraphWriter: Sync {
    /// Persists one node record.
    ///
    /// # Errors
    /// Returns [`WriteError`] when the sink rejects the record; generation
    /// aborts on the first failure.
    fn write_node(&self, node_type: &str, node: NodeId) -> Result<(), WriteError>;

    /// Persists one edge record.
    ///
    /// # Errors
    /// Returns [`WriteError`] when the sink rejects the record; generation
    /// aborts on the first failure.
    fn write_edge(&self, color: &str, start: NodeId, end: NodeId) -> Result<(), WriteError>;
}

/// Discards all records while measuring generation throughput.
///
/// Byte counts approximate the rendered TSV size: label length plus the
/// decimal width of each identifier plus a configurable per-record padding
/// for separators. The reported rate is therefore an approximation of what
/// a real writer would have produced, not a measurement of actual I/O.
///
/// # Examples
/// ```
/// use graphscale_core::{BenchmarkWriter, GraphWriter};
///
/// let writer = BenchmarkWriter::default();
/// writer.write_edge("r", 7, 42)?;
/// // "7" + "42" + "r" + 3 separator bytes
/// assert_eq!(writer.edge_bytes(), 7);
/// # Ok::<(), graphscale_core::WriteError>(())
/// ```
#[derive(Debug)]
pub struct BenchmarkWriter {
    edge_padding: u64,
    node_padding: u64,
    edge_bytes: AtomicU64,
    node_bytes: AtomicU64,
    started: Option<Instant>,
}

impl BenchmarkWriter {
    /// Creates a writer with explicit per-record padding byte counts.
    #[must_use]
    pub fn new(edge_padding: u64, node_padding: u64) -> Self {
        Self {
            edge_padding,
            node_padding,
            edge_bytes: AtomicU64::new(0),
            node_bytes: AtomicU64::new(0),
            started: None,
        }
    }

    /// Starts the wall-clock timer.
    pub fn start_timer(&mut self) {
        self.started = Some(Instant::now());
    }

    /// Time elapsed since [`start_timer`](Self::start_timer), or zero if the
    /// timer was never started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started
            .map(|start| start.elapsed())
            .unwrap_or(Duration::ZERO)
    }

    /// Approximate bytes a TSV writer would have emitted for edges.
    #[must_use]
    pub fn edge_bytes(&self) -> u64 {
        self.edge_bytes.load(Ordering::Relaxed)
    }

    /// Approximate bytes a TSV writer would have emitted for nodes.
    #[must_use]
    pub fn node_bytes(&self) -> u64 {
        self.node_bytes.load(Ordering::Relaxed)
    }
}

impl Default for BenchmarkWriter {
    /// Tab-separated defaults: two separators and a newline per edge line,
    /// one separator and a newline per node line.
    fn default() -> Self {
        Self::new(3, 2)
    }
}

impl GraphWriter for BenchmarkWriter {
    fn write_node(&self, node_type: &str, node: NodeId) -> Result<(), WriteError> {
        let bytes = node_type.len() as u64 + decimal_width(node) + self.node_padding;
        self.node_bytes.fetch_add(bytes, Ordering::Relaxed);
        Ok(())
    }

    fn write_edge(&self, color: &str, start: NodeId, end: NodeId) -> Result<(), WriteError> {
        let bytes =
            color.len() as u64 + decimal_width(start) + decimal_width(end) + self.edge_padding;
        self.edge_bytes.fetch_add(bytes, Ordering::Relaxed);
        Ok(())
    }
}

// Generated identifiers are non-negative; a sign would add one byte.
fn decimal_width(value: NodeId) -> u64 {
    if value <= 0 {
        return 1;
    }
    u64::from(value.ilog10()) + 1
}
