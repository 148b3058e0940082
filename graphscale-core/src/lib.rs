//! Graphscale core library.
//!
//! Builds a statistical model of an observed typed, multi-relational graph
//! and samples a scaled-up synthetic graph from it. The model preserves, per
//! edge color, the type-pair mixing of a degree-corrected stochastic block
//! model, the in/out degree distribution per node type, and an approximately
//! uniform, non-sequential assignment of node identifiers within each type.

mod alias;
mod edge_distribution;
mod error;
mod graph_model;
mod input_model;
mod node_type;
mod prime;
mod writer;

pub use crate::{
    alias::AliasSampler,
    edge_distribution::EdgeDistribution,
    error::{ModelError, ModelErrorCode, Result, WriteError},
    graph_model::GraphModel,
    input_model::{DegreeHistogram, InputModel},
    node_type::NodeType,
    writer::{BenchmarkWriter, GraphWriter},
};

/// Globally unique identifier of a generated node.
pub type NodeId = i64;

/// Number of edges of one color incident to a node.
pub type Degree = i64;

/// Non-negative tally of nodes or edges.
pub type Count = i64;

/// IEEE-754 double in `[0, 1]`.
pub type Probability = f64;
