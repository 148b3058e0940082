//! Per-type node population model.
//!
//! A [`NodeType`] owns, for every edge color, a pair of alias samplers over
//! degree buckets and a universal hash `(a, b)` that permutes bucket-local
//! identifiers across the whole population. Composing the two yields node
//! identifiers that follow the observed degree distribution without
//! concentrating on a small identifier prefix.
//!
//! The permutation domain is padded to the smallest prime `p >= size`; a
//! drawn identifier landing in the overflow range `[size, p)` is rejected
//! and redrawn. The expected number of retries per draw stays below
//! `1 + 1/size` because prime gaps are tiny relative to the population.

use std::collections::HashMap;

use rand::Rng;
use tracing::warn;

use crate::{Count, Degree, NodeId, alias::AliasSampler, error::ModelError, prime::next_prime};

/// Half-open slice `[lo, hi)` of the permutation domain owned by one degree
/// bucket.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct IdRange {
    lo: i64,
    hi: i64,
}

/// Samplers and hash coefficients for a single edge color.
#[derive(Debug)]
struct ColorSamplers {
    hash_a: i64,
    hash_b: i64,
    in_sampler: AliasSampler<IdRange>,
    out_sampler: AliasSampler<IdRange>,
}

/// Degree-correct, identifier-permuting sampler for one node type.
///
/// Immutable after construction; all sampling state lives in the caller's
/// RNG, so a `NodeType` may be shared freely across generation threads.
#[derive(Debug)]
pub struct NodeType {
    name: String,
    offset: NodeId,
    size: Count,
    prime: i64,
    colors: HashMap<String, ColorSamplers>,
}

impl NodeType {
    /// Builds the per-color samplers for a type population of `size` nodes
    /// occupying the identifier range `[offset, offset + size)`.
    ///
    /// `in_degrees` and `out_degrees` map edge colors to degree buckets
    /// `(degree, count)`. A color present on only one side receives a
    /// uniform unit-degree fallback on the other. Buckets whose counts sum
    /// below `size` are topped up with a zero-degree bucket, then padded to
    /// the prime domain by round-robin increments in descending
    /// `degree * count` order.
    ///
    /// # Errors
    /// Returns [`ModelError`] when a bucket list degenerates to an invalid
    /// distribution.
    pub fn new(
        name: impl Into<String>,
        offset: NodeId,
        size: Count,
        in_degrees: HashMap<String, Vec<(Degree, Count)>>,
        out_degrees: HashMap<String, Vec<(Degree, Count)>>,
        rng: &mut impl Rng,
    ) -> Result<Self, ModelError> {
        let name = name.into();
        let mut colors = HashMap::new();

        if size == 0 {
            // No identifier can satisfy the range invariant for an empty
            // population; sampling such a type degrades to the bare offset.
            warn!(node_type = %name, "node type scaled to zero nodes");
            return Ok(Self {
                name,
                offset,
                size,
                prime: next_prime(2),
                colors,
            });
        }

        let prime = next_prime(size);

        let mut color_union: Vec<&String> = in_degrees.keys().chain(out_degrees.keys()).collect();
        color_union.sort();
        color_union.dedup();

        for color in color_union {
            let in_buckets = prepare_buckets(in_degrees.get(color), size, prime);
            let out_buckets = prepare_buckets(out_degrees.get(color), size, prime);

            let samplers = ColorSamplers {
                hash_a: rng.gen_range(1..prime),
                hash_b: rng.gen_range(0..prime),
                in_sampler: build_range_sampler(&in_buckets, prime)?,
                out_sampler: build_range_sampler(&out_buckets, prime)?,
            };
            colors.insert(color.clone(), samplers);
        }

        Ok(Self {
            name,
            offset,
            size,
            prime,
            colors,
        })
    }

    /// Draws the source endpoint of a `color` edge.
    pub fn start_node<R: Rng + ?Sized>(&self, color: &str, rng: &mut R) -> NodeId {
        match self.colors.get(color) {
            Some(samplers) => self.draw_permuted(&samplers.out_sampler, samplers, rng),
            None => self.uniform_node(rng),
        }
    }

    /// Draws the target endpoint of a `color` edge.
    pub fn target_node<R: Rng + ?Sized>(&self, color: &str, rng: &mut R) -> NodeId {
        match self.colors.get(color) {
            Some(samplers) => self.draw_permuted(&samplers.in_sampler, samplers, rng),
            None => self.uniform_node(rng),
        }
    }

    /// The type label this population was built for.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// First identifier owned by this type.
    #[must_use]
    pub fn offset(&self) -> NodeId {
        self.offset
    }

    /// Number of nodes in this population.
    #[must_use]
    pub fn size(&self) -> Count {
        self.size
    }

    fn draw_permuted<R: Rng + ?Sized>(
        &self,
        sampler: &AliasSampler<IdRange>,
        samplers: &ColorSamplers,
        rng: &mut R,
    ) -> NodeId {
        loop {
            let range = *sampler.draw(rng);
            let local = rng.gen_range(range.lo..range.hi);
            let shuffled = permute(samplers.hash_a, samplers.hash_b, local, self.prime);
            if shuffled < self.size {
                return self.offset + shuffled;
            }
        }
    }

    // Colors never observed for this type fall back to a uniform pick; by
    // construction the samplers cover every color the edge distributions
    // can transition with, so this is a safety net, not a hot path.
    fn uniform_node<R: Rng + ?Sized>(&self, rng: &mut R) -> NodeId {
        if self.size == 0 {
            return self.offset;
        }
        self.offset + rng.gen_range(0..self.size)
    }
}

/// Universal hash `x -> (a*x + b) mod p`; a permutation of `[0, p)` for
/// prime `p` and `a` in `[1, p)`.
fn permute(a: i64, b: i64, x: i64, p: i64) -> i64 {
    // The product can exceed 64 bits for populations near 10^9.
    let value = (i128::from(a) * i128::from(x) + i128::from(b)) % i128::from(p);
    value as i64
}

/// Normalizes one side's buckets for a color: fallback, zero-fill to the
/// population size, then prime padding.
fn prepare_buckets(
    buckets: Option<&Vec<(Degree, Count)>>,
    size: Count,
    prime: i64,
) -> Vec<(Degree, Count)> {
    let mut prepared: Vec<(Degree, Count)> = buckets
        .map(|list| {
            list.iter()
                .copied()
                .filter(|&(_, count)| count > 0)
                .collect()
        })
        .unwrap_or_default();

    // Missing side: every node pretends to have degree one.
    if prepared.is_empty() {
        prepared.push((1, size));
    }

    // Top up to the full population with zero-degree nodes, which absorb
    // scaling floor losses without ever being drawn.
    let total: Count = prepared.iter().map(|&(_, count)| count).sum();
    if total < size {
        prepared.push((0, size - total));
    }

    sort_and_pad(&mut prepared, prime);
    prepared
}

/// Sorts buckets by descending `degree * count` and distributes the surplus
/// up to `target` by round-robin count increments in that order, keeping
/// high-weight buckets proportionally dominant.
fn sort_and_pad(buckets: &mut [(Degree, Count)], target: Count) {
    buckets.sort_by(|left, right| {
        let left_weight = i128::from(left.0) * i128::from(left.1);
        let right_weight = i128::from(right.0) * i128::from(right.1);
        right_weight.cmp(&left_weight)
    });

    let total: Count = buckets.iter().map(|&(_, count)| count).sum();
    let mut surplus = target - total;
    let mut index = 0;
    while surplus > 0 {
        buckets[index].1 += 1;
        index = (index + 1) % buckets.len();
        surplus -= 1;
    }
}

/// Builds the alias sampler over contiguous identifier ranges, weighted by
/// `degree * count`.
fn build_range_sampler(
    buckets: &[(Degree, Count)],
    prime: i64,
) -> Result<AliasSampler<IdRange>, ModelError> {
    let weighted_total: i128 = buckets
        .iter()
        .map(|&(degree, count)| i128::from(degree) * i128::from(count))
        .sum();

    // All-zero weight can only be handed in directly; scaled histograms
    // always retain at least one positive degree.
    if weighted_total <= 0 {
        return Ok(AliasSampler::single(IdRange { lo: 0, hi: prime }));
    }

    let mut entries = Vec::with_capacity(buckets.len());
    let mut lower = 0;
    for &(degree, count) in buckets {
        let weight = (i128::from(degree) * i128::from(count)) as f64 / weighted_total as f64;
        entries.push((
            weight,
            IdRange {
                lo: lower,
                hi: lower + count,
            },
        ));
        lower += count;
    }
    debug_assert_eq!(lower, prime, "padded buckets must partition [0, p)");

    AliasSampler::new(entries)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use proptest::prelude::*;
    use rand::{SeedableRng, rngs::SmallRng};
    use rstest::rstest;

    use super::{NodeType, permute, sort_and_pad};

    fn buckets(color: &str, list: &[(i64, i64)]) -> HashMap<String, Vec<(i64, i64)>> {
        HashMap::from([(color.to_owned(), list.to_vec())])
    }

    #[test]
    fn universal_hash_image_is_a_known_permutation() {
        // 3x + 2 mod 7 over [0, 7).
        let image: Vec<i64> = (0..7).map(|x| permute(3, 2, x, 7)).collect();
        assert_eq!(image, vec![2, 5, 1, 4, 0, 3, 6]);
    }

    #[test]
    fn universal_hash_covers_a_large_prime_domain() {
        let p = 1_000_003_i64;
        let (a, b) = (736_211, 42_999);
        let mut seen = vec![false; p as usize];
        for x in 0..p {
            let y = permute(a, b, x, p);
            assert!(!seen[y as usize], "collision at x={x}");
            seen[y as usize] = true;
        }
    }

    proptest! {
        #[test]
        fn universal_hash_permutes_small_prime_domains(
            p in proptest::sample::select(vec![2_i64, 3, 5, 7, 101, 997]),
            a_seed in 1_u64..10_000,
            b_seed in 0_u64..10_000,
        ) {
            let a = 1 + (a_seed as i64) % (p - 1).max(1);
            let b = (b_seed as i64) % p;
            let mut seen = vec![false; p as usize];
            for x in 0..p {
                let y = permute(a, b, x, p);
                prop_assert!(!seen[y as usize]);
                seen[y as usize] = true;
            }
        }
    }

    #[test]
    fn padding_distributes_surplus_in_weight_order() {
        let mut list = vec![(3_i64, 5_i64), (1, 3), (5, 2)];
        sort_and_pad(&mut list, 11);
        // Sorted by degree*count: 15, 10, 3; one surplus element lands on
        // the heaviest bucket.
        assert_eq!(list, vec![(3, 6), (5, 2), (1, 3)]);
        let total: i64 = list.iter().map(|&(_, count)| count).sum();
        assert_eq!(total, 11);
    }

    #[test]
    fn padding_round_robins_across_buckets() {
        let mut list = vec![(2_i64, 10_i64), (1, 10)];
        sort_and_pad(&mut list, 23);
        assert_eq!(list, vec![(2, 12), (1, 11)]);
    }

    #[rstest]
    #[case::start(true)]
    #[case::target(false)]
    fn sampled_ids_stay_inside_the_population_range(#[case] start: bool) {
        let node_type = NodeType::new(
            "account",
            1000,
            100,
            buckets("follows", &[(7, 10), (2, 40), (1, 50)]),
            buckets("follows", &[(3, 30), (1, 70)]),
            &mut SmallRng::seed_from_u64(11),
        )
        .expect("valid buckets");

        let mut rng = SmallRng::seed_from_u64(99);
        for _ in 0..100_000 {
            let id = if start {
                node_type.start_node("follows", &mut rng)
            } else {
                node_type.target_node("follows", &mut rng)
            };
            assert!((1000..1100).contains(&id), "id {id} escaped the range");
        }
    }

    #[test]
    fn one_sided_color_uses_the_uniform_fallback_side() {
        // "likes" only has in-degrees; the out side falls back to uniform
        // unit degree and must still produce in-range sources.
        let node_type = NodeType::new(
            "post",
            0,
            50,
            buckets("likes", &[(4, 25), (1, 25)]),
            HashMap::new(),
            &mut SmallRng::seed_from_u64(3),
        )
        .expect("valid buckets");

        let mut rng = SmallRng::seed_from_u64(4);
        for _ in 0..10_000 {
            let id = node_type.start_node("likes", &mut rng);
            assert!((0..50).contains(&id));
        }
    }

    #[test]
    fn every_identifier_is_eventually_emitted() {
        // A single unit-degree bucket makes the draw uniform over the
        // population; with 20k draws over 97 ids every slot must be hit.
        let node_type = NodeType::new(
            "city",
            0,
            97,
            buckets("road", &[(1, 97)]),
            buckets("road", &[(1, 97)]),
            &mut SmallRng::seed_from_u64(21),
        )
        .expect("valid buckets");

        let mut rng = SmallRng::seed_from_u64(22);
        let mut hits = vec![0_u32; 97];
        for _ in 0..20_000 {
            let id = node_type.target_node("road", &mut rng);
            hits[id as usize] += 1;
        }
        assert!(hits.iter().all(|&count| count > 0));
    }

    #[test]
    fn draw_frequencies_follow_bucket_weights() {
        // A prime-sized population needs no padding and no rejection, so
        // the per-id frequencies are exactly the bucket weights spread
        // over the bucket widths: one id carries degree 10 (weight 1/2),
        // ten ids carry degree 1 (weight 1/20 each).
        let node_type = NodeType::new(
            "host",
            0,
            11,
            buckets("link", &[(10, 1), (1, 10)]),
            buckets("link", &[(10, 1), (1, 10)]),
            &mut SmallRng::seed_from_u64(31),
        )
        .expect("valid buckets");

        let mut rng = SmallRng::seed_from_u64(32);
        let trials = 200_000_u32;
        let mut hits = vec![0_u32; 11];
        for _ in 0..trials {
            hits[node_type.start_node("link", &mut rng) as usize] += 1;
        }

        let mut frequencies: Vec<f64> = hits
            .iter()
            .map(|&count| f64::from(count) / f64::from(trials))
            .collect();
        frequencies.sort_by(f64::total_cmp);

        let top = frequencies[10];
        assert!((top - 0.5).abs() < 0.01, "hub frequency {top}");
        for &low in &frequencies[..10] {
            assert!((low - 0.05).abs() < 0.01, "leaf frequency {low}");
        }
    }

    #[test]
    fn unknown_color_degrades_to_a_uniform_pick() {
        let node_type = NodeType::new(
            "user",
            10,
            5,
            buckets("follows", &[(1, 5)]),
            buckets("follows", &[(1, 5)]),
            &mut SmallRng::seed_from_u64(8),
        )
        .expect("valid buckets");

        let mut rng = SmallRng::seed_from_u64(9);
        for _ in 0..1000 {
            let id = node_type.start_node("never-seen", &mut rng);
            assert!((10..15).contains(&id));
        }
    }

    #[test]
    fn zero_sized_type_reports_its_offset() {
        let node_type = NodeType::new(
            "ghost",
            7,
            0,
            HashMap::new(),
            HashMap::new(),
            &mut SmallRng::seed_from_u64(1),
        )
        .expect("constructible");
        assert_eq!(node_type.size(), 0);
        let mut rng = SmallRng::seed_from_u64(2);
        assert_eq!(node_type.start_node("any", &mut rng), 7);
    }
}
