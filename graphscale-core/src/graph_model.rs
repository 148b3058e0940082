//! Scaled graph model and the parallel generation driver.
//!
//! Construction scales the observed counts, builds one [`EdgeDistribution`]
//! per color and one [`NodeType`] per type, and freezes the result. The
//! edge phase then fans out over Rayon workers; every sampler is read-only,
//! so the only mutable state per draw is the worker's own RNG stream and
//! the writer behind its lock.

use std::collections::{BTreeMap, HashMap};

use rand::{SeedableRng, rngs::SmallRng};
use rayon::prelude::*;
use tracing::{info, instrument, warn};

use crate::{
    Count, Degree, NodeId,
    edge_distribution::EdgeDistribution,
    error::ModelError,
    input_model::{DegreeHistogram, InputModel},
    node_type::NodeType,
    writer::GraphWriter,
};

/// SplitMix64 increment (the 64-bit golden ratio) used for stream seed
/// derivation.
const STREAM_SEED_SPACING: u64 = 0x9E37_79B9_7F4A_7C15;
const SPLITMIX_MULT_A: u64 = 0xBF58_476D_1CE4_E5B9;
const SPLITMIX_MULT_B: u64 = 0x94D0_49BB_1331_11EB;

/// Edges drawn per RNG stream. Chunk seeds depend only on the global seed,
/// the color, and the chunk index, so the emitted multiset is reproducible
/// regardless of how Rayon schedules the chunks.
const EDGES_PER_CHUNK: Count = 1024;

#[inline]
fn splitmix64(mut state: u64) -> u64 {
    state = state.wrapping_add(STREAM_SEED_SPACING);
    state = (state ^ (state >> 30)).wrapping_mul(SPLITMIX_MULT_A);
    state = (state ^ (state >> 27)).wrapping_mul(SPLITMIX_MULT_B);
    state ^ (state >> 31)
}

#[inline]
fn chunk_seed(base_seed: u64, color_index: usize, chunk_index: u64) -> u64 {
    let color_lane =
        splitmix64(base_seed ^ (color_index as u64 + 1).wrapping_mul(STREAM_SEED_SPACING));
    splitmix64(color_lane ^ (chunk_index + 1).wrapping_mul(STREAM_SEED_SPACING))
}

/// Per-color generation plan: how many edges to draw and from which
/// transition distribution.
#[derive(Debug)]
struct ColorPlan {
    color: String,
    target: Count,
    distribution: EdgeDistribution,
}

/// Immutable, scaled-up model of the input graph, ready to generate.
#[derive(Debug)]
pub struct GraphModel {
    seed: u64,
    node_count: Count,
    edges: Vec<ColorPlan>,
    nodes: HashMap<String, NodeType>,
    type_order: Vec<String>,
}

impl GraphModel {
    /// Scales a preprocessed [`InputModel`] by `scale` and builds the
    /// sampling structures.
    ///
    /// The model is preprocessed first if the caller has not done so.
    /// Types and colors are laid out in sorted order, so identifier
    /// offsets and hash coefficients are fully determined by `seed`.
    ///
    /// # Errors
    /// Returns [`ModelError::InvalidScale`] for a non-positive or
    /// non-finite `scale`, and [`ModelError::EmptyDistribution`] when a
    /// color has no usable type transitions.
    pub fn from_input(model: &mut InputModel, scale: f64, seed: u64) -> Result<Self, ModelError> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(ModelError::InvalidScale { got: scale });
        }
        if !model.is_preprocessed() {
            model.preprocess();
        }

        let mut colors: Vec<String> = model.edge_count().keys().cloned().collect();
        colors.sort();

        let mut edges = Vec::with_capacity(colors.len());
        for color in colors {
            let observed = model.edge_count().get(&color).copied().unwrap_or(0);
            let target = scale_count(observed, scale);
            let transitions = usable_transitions(model, &color);
            let distribution = EdgeDistribution::new(model.node_types(), &transitions)?;
            edges.push(ColorPlan {
                color,
                target,
                distribution,
            });
        }

        let mut type_order: Vec<String> = model.node_types().keys().cloned().collect();
        type_order.sort();

        let mut construction_rng = SmallRng::seed_from_u64(splitmix64(seed));
        let mut nodes = HashMap::with_capacity(type_order.len());
        let mut offset: NodeId = 0;
        let mut node_count: Count = 0;
        for name in &type_order {
            let observed = model.node_types().get(name).copied().unwrap_or(0);
            let target = scale_count(observed, scale);
            let scaled_in = scale_histograms(model.in_distribution(name), scale);
            let scaled_out = scale_histograms(model.out_distribution(name), scale);
            let node_type = NodeType::new(
                name.clone(),
                offset,
                target,
                scaled_in,
                scaled_out,
                &mut construction_rng,
            )?;
            nodes.insert(name.clone(), node_type);
            offset += target;
            node_count += target;
        }

        Ok(Self {
            seed,
            node_count,
            edges,
            nodes,
            type_order,
        })
    }

    /// Total number of nodes the model will emit.
    #[must_use]
    pub fn node_count(&self) -> Count {
        self.node_count
    }

    /// Total number of edges the model will emit, across all colors.
    #[must_use]
    pub fn edge_count(&self) -> Count {
        self.edges.iter().map(|plan| plan.target).sum()
    }

    /// Per-color edge targets, in generation order.
    pub fn edge_targets(&self) -> impl Iterator<Item = (&str, Count)> {
        self.edges.iter().map(|plan| (plan.color.as_str(), plan.target))
    }

    /// Draws every edge and node of the scaled graph into `writer`.
    ///
    /// Edges are generated color by color, each color's draws running in
    /// parallel; nodes are emitted sequentially afterwards. No ordering is
    /// guaranteed between colors or phases.
    ///
    /// # Errors
    /// Propagates the first [`WriteError`](crate::WriteError) the writer
    /// reports; the run is aborted at that point.
    #[instrument(skip_all, fields(nodes = self.node_count, edges = self.edge_count()))]
    pub fn generate<W: GraphWriter + ?Sized>(&self, writer: &W) -> Result<(), ModelError> {
        for (color_index, plan) in self.edges.iter().enumerate() {
            self.generate_color(color_index, plan, writer)?;
            info!(
                color = %plan.color,
                edges = plan.target,
                "edge generation complete"
            );
        }

        for name in &self.type_order {
            let Some(node_type) = self.nodes.get(name) else {
                continue;
            };
            for index in 0..node_type.size() {
                writer.write_node(name, node_type.offset() + index)?;
            }
            if node_type.size() > 0 {
                info!(
                    node_type = %name,
                    first = node_type.offset(),
                    last = node_type.offset() + node_type.size() - 1,
                    "node identifiers emitted"
                );
            }
        }
        Ok(())
    }

    fn generate_color<W: GraphWriter + ?Sized>(
        &self,
        color_index: usize,
        plan: &ColorPlan,
        writer: &W,
    ) -> Result<(), ModelError> {
        let chunk_count = (plan.target + EDGES_PER_CHUNK - 1) / EDGES_PER_CHUNK;
        (0..chunk_count).into_par_iter().try_for_each(|chunk| {
            let mut rng =
                SmallRng::seed_from_u64(chunk_seed(self.seed, color_index, chunk as u64));
            let lower = chunk * EDGES_PER_CHUNK;
            let upper = (lower + EDGES_PER_CHUNK).min(plan.target);
            for _ in lower..upper {
                let (start_type, end_type) = plan.distribution.transition(&mut rng);
                let (Some(start), Some(end)) =
                    (self.nodes.get(start_type), self.nodes.get(end_type))
                else {
                    continue;
                };
                writer.write_edge(
                    &plan.color,
                    start.start_node(&plan.color, &mut rng),
                    end.target_node(&plan.color, &mut rng),
                )?;
            }
            Ok(())
        })
    }
}

fn scale_count(observed: Count, scale: f64) -> Count {
    (observed as f64 * scale).floor() as Count
}

// Transitions that touch a type no node record ever declared (the
// empty-string type of dangling edge endpoints) cannot be sampled; they
// are dropped here with a warning rather than poisoning generation.
fn usable_transitions(model: &InputModel, color: &str) -> BTreeMap<(String, String), Count> {
    let Some(sbm) = model.sbm_matrix(color) else {
        return BTreeMap::new();
    };
    let mut usable = BTreeMap::new();
    let mut dropped: Count = 0;
    for ((start_type, end_type), &count) in sbm {
        if model.node_types().contains_key(start_type) && model.node_types().contains_key(end_type)
        {
            usable.insert((start_type.clone(), end_type.clone()), count);
        } else {
            dropped += count;
        }
    }
    if dropped > 0 {
        warn!(
            color,
            dropped, "dropped edges whose endpoint types were never declared"
        );
    }
    usable
}

/// Scales every degree bucket by `scale`, flooring counts and dropping
/// zero-degree and emptied buckets; the zero bucket is reintroduced as
/// padding during [`NodeType`] construction.
fn scale_histograms(
    histograms: Option<&HashMap<String, DegreeHistogram>>,
    scale: f64,
) -> HashMap<String, Vec<(Degree, Count)>> {
    let mut scaled = HashMap::new();
    let Some(histograms) = histograms else {
        return scaled;
    };
    for (color, histogram) in histograms {
        let mut buckets: Vec<(Degree, Count)> = histogram
            .iter()
            .map(|(&degree, &count)| (degree, scale_count(count, scale)))
            .filter(|&(degree, count)| degree > 0 && count > 0)
            .collect();
        if buckets.is_empty() {
            continue;
        }
        buckets.sort_by_key(|&(degree, _)| degree);
        scaled.insert(color.clone(), buckets);
    }
    scaled
}
