//! Type-pair transition sampling for a single edge color.
//!
//! Models the stochastic-block-model layer of generation: which
//! `(source type, target type)` pair an edge of this color connects. A
//! random outgoing endpoint is chosen proportionally to its type
//! population, then transitions to the target type at the observed rate,
//! so the weights multiply out to a distribution that sums to one over the
//! observed pairs.

use std::collections::{BTreeMap, HashMap, HashSet};

use rand::Rng;

use crate::{Count, alias::AliasSampler, error::ModelError};

/// Alias-backed sampler over the observed `(source type, target type)`
/// pairs of one edge color.
#[derive(Clone, Debug)]
pub struct EdgeDistribution {
    transitions: AliasSampler<(String, String)>,
}

impl EdgeDistribution {
    /// Builds the transition sampler from type populations and per-pair
    /// edge counts.
    ///
    /// Types without any outgoing edge of this color do not participate in
    /// the population normalisation. Pairs with a zero count are ignored.
    ///
    /// # Errors
    /// Returns [`ModelError::EmptyDistribution`] when no pair has a
    /// positive count, or when every participating source type has a zero
    /// population.
    pub fn new(
        populations: &HashMap<String, Count>,
        edges: &BTreeMap<(String, String), Count>,
    ) -> Result<Self, ModelError> {
        let mut population_sum: Count = 0;
        let mut counted: HashSet<&str> = HashSet::new();
        let mut outgoing_totals: HashMap<&str, Count> = HashMap::new();

        for ((start_type, _), &count) in edges {
            if count <= 0 {
                continue;
            }
            if counted.insert(start_type.as_str()) {
                population_sum += populations.get(start_type).copied().unwrap_or(0);
            }
            *outgoing_totals.entry(start_type.as_str()).or_default() += count;
        }

        if population_sum <= 0 {
            return Err(ModelError::EmptyDistribution);
        }

        // P(A -> B) = P(start of type A) * P(transition to B | type A).
        let mut weighted = Vec::new();
        for ((start_type, end_type), &count) in edges {
            if count <= 0 {
                continue;
            }
            let population = populations.get(start_type).copied().unwrap_or(0);
            let type_probability = population as f64 / population_sum as f64;
            let transition_probability = count as f64 / outgoing_totals[start_type.as_str()] as f64;
            weighted.push((
                type_probability * transition_probability,
                (start_type.clone(), end_type.clone()),
            ));
        }

        Ok(Self {
            transitions: AliasSampler::new(weighted)?,
        })
    }

    /// Draws one `(source type, target type)` pair.
    pub fn transition<R: Rng + ?Sized>(&self, rng: &mut R) -> &(String, String) {
        self.transitions.draw(rng)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashMap};

    use rand::{SeedableRng, rngs::SmallRng};

    use super::EdgeDistribution;
    use crate::error::ModelError;

    fn pair(a: &str, b: &str) -> (String, String) {
        (a.to_owned(), b.to_owned())
    }

    #[test]
    fn rejects_edges_without_positive_counts() {
        let populations = HashMap::from([("A".to_owned(), 10)]);
        let edges = BTreeMap::from([(pair("A", "A"), 0)]);
        let result = EdgeDistribution::new(&populations, &edges);
        assert!(matches!(result, Err(ModelError::EmptyDistribution)));
    }

    #[test]
    fn rejects_source_types_with_no_population() {
        let populations = HashMap::from([("A".to_owned(), 0)]);
        let edges = BTreeMap::from([(pair("A", "A"), 5)]);
        let result = EdgeDistribution::new(&populations, &edges);
        assert!(matches!(result, Err(ModelError::EmptyDistribution)));
    }

    #[test]
    fn transition_frequencies_follow_observed_mixing() {
        // All sources are type A, so the conditional transition rates are
        // 10% A->A and 90% A->B.
        let populations = HashMap::from([("A".to_owned(), 100), ("B".to_owned(), 100)]);
        let edges = BTreeMap::from([(pair("A", "A"), 10), (pair("A", "B"), 90)]);
        let distribution =
            EdgeDistribution::new(&populations, &edges).expect("valid distribution");

        let mut rng = SmallRng::seed_from_u64(5);
        let mut to_a = 0_u32;
        let mut to_b = 0_u32;
        let trials = 100_000;
        for _ in 0..trials {
            match distribution.transition(&mut rng) {
                (_, end) if end == "A" => to_a += 1,
                _ => to_b += 1,
            }
        }

        let a_rate = f64::from(to_a) / f64::from(trials);
        let b_rate = f64::from(to_b) / f64::from(trials);
        assert!((a_rate - 0.1).abs() < 0.01, "A->A rate {a_rate}");
        assert!((b_rate - 0.9).abs() < 0.01, "A->B rate {b_rate}");
    }

    #[test]
    fn source_types_are_weighted_by_population() {
        // Types A and B both emit edges; A has three times the population,
        // so three quarters of transitions must start at A.
        let populations = HashMap::from([("A".to_owned(), 300), ("B".to_owned(), 100)]);
        let edges = BTreeMap::from([(pair("A", "B"), 50), (pair("B", "A"), 50)]);
        let distribution =
            EdgeDistribution::new(&populations, &edges).expect("valid distribution");

        let mut rng = SmallRng::seed_from_u64(17);
        let mut from_a = 0_u32;
        let trials = 100_000;
        for _ in 0..trials {
            if distribution.transition(&mut rng).0 == "A" {
                from_a += 1;
            }
        }
        let a_rate = f64::from(from_a) / f64::from(trials);
        assert!((a_rate - 0.75).abs() < 0.01, "source-A rate {a_rate}");
    }
}
