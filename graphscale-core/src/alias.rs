//! O(1) weighted discrete sampling with the alias method.
//!
//! Tables are built in O(n) with the numerically stable formulation by Vose,
//! as described by Schwarz in "Darts, Dice, and Coins". Every draw consumes
//! exactly two uniform variates and performs no data-dependent loops, which
//! keeps the per-edge cost of generation constant.

use std::collections::VecDeque;

use rand::{Rng, distributions::Standard};
use tracing::warn;

use crate::{Probability, error::ModelError};

/// Samples elements of type `T` from a fixed discrete distribution in O(1).
///
/// The input weights are expected to sum to 1; small rounding residue is
/// absorbed by the queue-draining step of the construction.
#[derive(Clone, Debug)]
pub struct AliasSampler<T> {
    prob: Vec<Probability>,
    primary: Vec<T>,
    alias: Vec<Option<T>>,
}

impl<T: Clone> AliasSampler<T> {
    /// Builds the probability and alias tables from `(weight, item)` pairs.
    ///
    /// # Errors
    /// Returns [`ModelError::EmptyDistribution`] for an empty input and
    /// [`ModelError::InvalidWeight`] when any weight is negative or not
    /// finite.
    ///
    /// # Examples
    /// ```
    /// use graphscale_core::AliasSampler;
    ///
    /// let sampler = AliasSampler::new(vec![(0.5, "a"), (0.5, "b")])?;
    /// assert_eq!(sampler.len(), 2);
    /// # Ok::<(), graphscale_core::ModelError>(())
    /// ```
    pub fn new(entries: Vec<(Probability, T)>) -> Result<Self, ModelError> {
        if entries.is_empty() {
            return Err(ModelError::EmptyDistribution);
        }
        for &(weight, _) in &entries {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ModelError::InvalidWeight { weight });
            }
        }

        let expected = entries.len();
        let average = 1.0 / expected as f64;

        // Partition into queues around the average weight 1/n.
        let mut small: VecDeque<(Probability, T)> = VecDeque::new();
        let mut large: VecDeque<(Probability, T)> = VecDeque::new();
        for (weight, item) in entries {
            if weight < average {
                small.push_back((weight, item));
            } else {
                large.push_back((weight, item));
            }
        }

        let mut prob = Vec::with_capacity(expected);
        let mut primary = Vec::with_capacity(expected);
        let mut alias = Vec::with_capacity(expected);

        // Pair one under-average entry with one over-average entry per slot;
        // the large entry keeps its residue and is reclassified.
        loop {
            let Some((small_weight, small_item)) = small.pop_front() else {
                break;
            };
            let Some((large_weight, large_item)) = large.pop_front() else {
                small.push_front((small_weight, small_item));
                break;
            };

            prob.push(small_weight / average);
            primary.push(small_item);
            alias.push(Some(large_item.clone()));

            let residue = (large_weight + small_weight) - average;
            if residue < average {
                small.push_back((residue, large_item));
            } else {
                large.push_back((residue, large_item));
            }
        }

        // Whatever remains holds exactly the average weight up to rounding;
        // entries stranded in `small` can only appear through that rounding.
        for (_, item) in large.drain(..).chain(small.drain(..)) {
            prob.push(1.0);
            primary.push(item);
            alias.push(None);
        }

        if prob.len() != expected {
            warn!(
                expected,
                actual = prob.len(),
                "alias table size diverged from the input length"
            );
        }

        Ok(Self {
            prob,
            primary,
            alias,
        })
    }

    /// Builds a degenerate sampler that always returns `item`.
    #[must_use]
    pub fn single(item: T) -> Self {
        Self {
            prob: vec![1.0],
            primary: vec![item],
            alias: vec![None],
        }
    }
}

impl<T> AliasSampler<T> {
    /// Number of table slots (equal to the number of input entries).
    #[must_use]
    pub fn len(&self) -> usize {
        self.prob.len()
    }

    /// Returns `true` when the sampler has no slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prob.is_empty()
    }

    /// Draws one element: two uniforms, one comparison.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> &T {
        let slot_roll: f64 = rng.sample(Standard);
        let bias_roll: f64 = rng.sample(Standard);

        // slot_roll < 1.0, so the index stays in bounds; min() guards the
        // pathological rounding of len * roll up to len.
        let index = ((self.prob.len() as f64 * slot_roll) as usize).min(self.prob.len() - 1);

        if bias_roll < self.prob[index] {
            &self.primary[index]
        } else {
            self.alias[index].as_ref().unwrap_or(&self.primary[index])
        }
    }
}
