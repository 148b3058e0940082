//! Streaming accumulator for the observed input graph.
//!
//! Ingest feeds nodes and edges one record at a time; [`preprocess`]
//! pivots the raw per-node degree counters into the `(type, color)` bucket
//! histograms the model construction consumes.
//!
//! [`preprocess`]: InputModel::preprocess

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, warn};

use crate::{Count, Degree};

/// Degree histogram for one `(node type, edge color)` pair: degree → number
/// of nodes observed with that degree.
pub type DegreeHistogram = HashMap<Degree, Count>;

/// Statistical summary of the observed graph, accumulated record by record.
///
/// # Examples
/// ```
/// use graphscale_core::InputModel;
///
/// let mut model = InputModel::new();
/// model.read_node("n1", "A");
/// model.read_node("n2", "B");
/// model.read_edge("n1", "n2", "r");
/// model.preprocess();
/// assert_eq!(model.node_count(), 2);
/// assert_eq!(model.edge_count().get("r"), Some(&1));
/// ```
#[derive(Debug, Default)]
pub struct InputModel {
    preprocessed: bool,
    node_count: Count,

    node_types: HashMap<String, Count>,
    edge_count: HashMap<String, Count>,

    // Type-pair transition counts per edge color. The inner map is ordered
    // so that model construction iterates pairs deterministically.
    sbm_matrix: HashMap<String, BTreeMap<(String, String), Count>>,

    // Derived by `preprocess`: node type -> edge color -> degree histogram.
    in_distribution: HashMap<String, HashMap<String, DegreeHistogram>>,
    out_distribution: HashMap<String, HashMap<String, DegreeHistogram>>,

    // Raw accumulators, kept so `preprocess` stays idempotent.
    node_to_type: HashMap<String, String>,
    in_degrees: HashMap<String, HashMap<String, Count>>,
    out_degrees: HashMap<String, HashMap<String, Count>>,
}

impl InputModel {
    /// Creates an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one node record.
    pub fn read_node(&mut self, id: &str, node_type: &str) {
        self.node_count += 1;
        *self.node_types.entry(node_type.to_owned()).or_default() += 1;
        self.node_to_type
            .insert(id.to_owned(), node_type.to_owned());
    }

    /// Registers one edge record.
    ///
    /// An endpoint that was never registered as a node resolves to the
    /// empty-string type; the record is still counted so the edge totals
    /// stay faithful to the input.
    pub fn read_edge(&mut self, start: &str, end: &str, color: &str) {
        *self.edge_count.entry(color.to_owned()).or_default() += 1;

        let start_type = self.resolve_type(start);
        let end_type = self.resolve_type(end);
        *self
            .sbm_matrix
            .entry(color.to_owned())
            .or_default()
            .entry((start_type, end_type))
            .or_default() += 1;

        *self
            .out_degrees
            .entry(color.to_owned())
            .or_default()
            .entry(start.to_owned())
            .or_default() += 1;
        *self
            .in_degrees
            .entry(color.to_owned())
            .or_default()
            .entry(end.to_owned())
            .or_default() += 1;
    }

    /// Pivots the raw degree counters into `(type, color)` histograms and
    /// pads each non-empty histogram with a zero-degree bucket so it sums
    /// to the full type population.
    ///
    /// Idempotent: previously derived state is discarded and rebuilt.
    pub fn preprocess(&mut self) {
        if self.preprocessed {
            self.in_distribution.clear();
            self.out_distribution.clear();
        }

        pivot_degrees(
            &self.in_degrees,
            &self.node_to_type,
            &mut self.in_distribution,
        );
        pivot_degrees(
            &self.out_degrees,
            &self.node_to_type,
            &mut self.out_distribution,
        );

        pad_zero_degrees(&mut self.in_distribution, &self.node_types);
        pad_zero_degrees(&mut self.out_distribution, &self.node_types);

        self.preprocessed = true;
        debug!(
            nodes = self.node_count,
            types = self.node_types.len(),
            colors = self.edge_count.len(),
            "input model preprocessed"
        );
    }

    /// `true` once [`preprocess`](Self::preprocess) has sealed the model.
    #[must_use]
    pub fn is_preprocessed(&self) -> bool {
        self.preprocessed
    }

    /// Total number of node records read.
    #[must_use]
    pub fn node_count(&self) -> Count {
        self.node_count
    }

    /// Population per node type.
    #[must_use]
    pub fn node_types(&self) -> &HashMap<String, Count> {
        &self.node_types
    }

    /// Edge totals per color.
    #[must_use]
    pub fn edge_count(&self) -> &HashMap<String, Count> {
        &self.edge_count
    }

    /// Type-pair transition counts for `color`, if any edge of that color
    /// was read.
    #[must_use]
    pub fn sbm_matrix(&self, color: &str) -> Option<&BTreeMap<(String, String), Count>> {
        self.sbm_matrix.get(color)
    }

    /// Per-color in-degree histograms for `node_type`, once preprocessed.
    #[must_use]
    pub fn in_distribution(&self, node_type: &str) -> Option<&HashMap<String, DegreeHistogram>> {
        self.in_distribution.get(node_type)
    }

    /// Per-color out-degree histograms for `node_type`, once preprocessed.
    #[must_use]
    pub fn out_distribution(&self, node_type: &str) -> Option<&HashMap<String, DegreeHistogram>> {
        self.out_distribution.get(node_type)
    }

    // Looks up the type of an edge endpoint, registering unknown ids under
    // the empty-string type so repeated references only warn once.
    fn resolve_type(&mut self, id: &str) -> String {
        if let Some(node_type) = self.node_to_type.get(id) {
            return node_type.clone();
        }
        warn!(
            node = id,
            "edge references a node that was never read; treating its type as empty"
        );
        self.node_to_type.insert(id.to_owned(), String::new());
        String::new()
    }
}

fn pivot_degrees(
    degrees: &HashMap<String, HashMap<String, Count>>,
    node_to_type: &HashMap<String, String>,
    distribution: &mut HashMap<String, HashMap<String, DegreeHistogram>>,
) {
    for (color, nodes) in degrees {
        for (id, &count) in nodes {
            let Some(node_type) = node_to_type.get(id) else {
                continue;
            };
            *distribution
                .entry(node_type.clone())
                .or_default()
                .entry(color.clone())
                .or_default()
                .entry(count)
                .or_default() += 1;
        }
    }
}

// Nodes that never appeared in an edge of a given color still exist; the
// histogram records them as a zero-degree bucket so it sums to the type
// population.
fn pad_zero_degrees(
    distribution: &mut HashMap<String, HashMap<String, DegreeHistogram>>,
    node_types: &HashMap<String, Count>,
) {
    for (node_type, by_color) in distribution {
        let population = node_types.get(node_type).copied().unwrap_or(0);
        for histogram in by_color.values_mut() {
            if histogram.is_empty() {
                continue;
            }
            let covered: Count = histogram.values().sum();
            if population > covered {
                histogram.insert(0, population - covered);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::InputModel;

    fn observed_social_graph() -> InputModel {
        let mut model = InputModel::new();
        model.read_node("u1", "user");
        model.read_node("u2", "user");
        model.read_node("u3", "user");
        model.read_node("p1", "post");
        model.read_edge("u1", "p1", "likes");
        model.read_edge("u2", "p1", "likes");
        model.read_edge("u1", "u2", "follows");
        model
    }

    #[test]
    fn accumulates_populations_and_edge_totals() {
        let model = observed_social_graph();
        assert_eq!(model.node_count(), 4);
        assert_eq!(model.node_types().get("user"), Some(&3));
        assert_eq!(model.node_types().get("post"), Some(&1));
        assert_eq!(model.edge_count().get("likes"), Some(&2));
        assert_eq!(model.edge_count().get("follows"), Some(&1));
    }

    #[test]
    fn sbm_matrix_counts_type_pairs_per_color() {
        let model = observed_social_graph();
        let likes = model.sbm_matrix("likes").expect("likes edges were read");
        assert_eq!(
            likes.get(&("user".to_owned(), "post".to_owned())),
            Some(&2)
        );
        let follows = model.sbm_matrix("follows").expect("follows edges were read");
        assert_eq!(
            follows.get(&("user".to_owned(), "user".to_owned())),
            Some(&1)
        );
    }

    #[test]
    fn preprocess_buckets_degrees_and_pads_with_zero_degree_nodes() {
        let mut model = observed_social_graph();
        model.preprocess();
        assert!(model.is_preprocessed());

        // u1 has out-degree 1 for likes, u2 has out-degree 1; u3 never
        // liked anything and lands in the zero bucket.
        let user_out = model
            .out_distribution("user")
            .and_then(|by_color| by_color.get("likes"))
            .expect("user/likes histogram");
        assert_eq!(user_out.get(&1), Some(&2));
        assert_eq!(user_out.get(&0), Some(&1));
        let total: i64 = user_out.values().sum();
        assert_eq!(total, 3);

        // p1 collected both likes.
        let post_in = model
            .in_distribution("post")
            .and_then(|by_color| by_color.get("likes"))
            .expect("post/likes histogram");
        assert_eq!(post_in.get(&2), Some(&1));
        assert_eq!(post_in.get(&0), None);
    }

    #[test]
    fn preprocess_is_idempotent() {
        let mut model = observed_social_graph();
        model.preprocess();
        let first = model
            .out_distribution("user")
            .and_then(|by_color| by_color.get("likes"))
            .cloned()
            .expect("histogram exists");
        model.preprocess();
        let second = model
            .out_distribution("user")
            .and_then(|by_color| by_color.get("likes"))
            .cloned()
            .expect("histogram survives re-preprocessing");
        assert_eq!(first, second);
    }

    #[test]
    fn unknown_edge_endpoints_count_under_the_empty_type() {
        let mut model = InputModel::new();
        model.read_node("a", "A");
        model.read_edge("a", "phantom", "r");
        assert_eq!(model.edge_count().get("r"), Some(&1));
        let sbm = model.sbm_matrix("r").expect("edge was counted");
        assert_eq!(sbm.get(&("A".to_owned(), String::new())), Some(&1));
    }
}
