//! Local search improvement heuristics for the QAP.
//!
//! This module implements two hill climbers that share the [`LocalSearch`] contract
//! (the returned assignment is never worse than the input):
//! - [`TwoOptSearch`]: exhaustive first-improvement segment reversal, full cost recomputation
//! - [`SampledSwapSearch`]: best-of-sample pairwise swaps scored with the O(n) swap delta
//!
//! [`LocalSearchStrategy`] wraps either one so the genetic algorithm can choose at runtime.

use crate::instance::QAPInstance;
use ordered_float::OrderedFloat;
use rand::prelude::*;
use serde::{Deserialize, Serialize};

/// Minimum cost decrease for a swap to count as an improvement.
pub const IMPROVEMENT_EPS: f64 = 1e-9;

/// Result of one local search invocation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalSearchOutcome {
    /// Cost of the returned permutation
    pub cost: f64,
    /// Number of accepted moves
    pub moves: usize,
}

impl LocalSearchOutcome {
    pub fn improved(&self) -> bool {
        self.moves > 0
    }
}

/// Trait for local search improvement methods
pub trait LocalSearch {
    fn improve(
        &self,
        instance: &QAPInstance,
        permutation: &mut [usize],
        rng: &mut dyn RngCore,
    ) -> LocalSearchOutcome;
    fn name(&self) -> &str;
}

/// 2-Opt Local Search
///
/// Reverses the segment `[i, j)` for `1 <= i < j <= n - 1`, so the first and last
/// positions stay in place. The first reversal that strictly lowers the cost is
/// kept and the scan restarts from the top; the search ends when a full scan finds
/// nothing or `max_moves` moves have been accepted.
#[derive(Debug, Clone)]
pub struct TwoOptSearch {
    /// Upper bound on accepted moves per call
    pub max_moves: usize,
}

impl TwoOptSearch {
    pub fn new() -> Self {
        TwoOptSearch { max_moves: 10_000 }
    }

    pub fn with_max_moves(max_moves: usize) -> Self {
        TwoOptSearch { max_moves }
    }
}

impl Default for TwoOptSearch {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalSearch for TwoOptSearch {
    fn improve(
        &self,
        instance: &QAPInstance,
        permutation: &mut [usize],
        _rng: &mut dyn RngCore,
    ) -> LocalSearchOutcome {
        let n = permutation.len();
        let mut current = instance.cost(permutation);
        let mut moves = 0;

        'scan: while moves < self.max_moves {
            for i in 1..n.saturating_sub(1) {
                // j = i + 1 would reverse a single element
                for j in i + 2..n {
                    permutation[i..j].reverse();
                    let candidate = instance.cost(permutation);
                    if candidate < current {
                        current = candidate;
                        moves += 1;
                        continue 'scan;
                    }
                    permutation[i..j].reverse();
                }
            }
            break;
        }

        LocalSearchOutcome { cost: current, moves }
    }

    fn name(&self) -> &str {
        "2-Opt-FI"
    }
}

/// Sampled swap hill climbing with incremental cost updates.
///
/// Each iteration draws up to `max_neighbors` swap pairs that have not been applied
/// yet, scores them with [`QAPInstance::swap_delta`] and applies the most negative
/// one. A sample without an improving swap ends the search.
#[derive(Debug, Clone)]
pub struct SampledSwapSearch {
    pub max_iterations: usize,
    pub max_neighbors: usize,
}

impl SampledSwapSearch {
    pub fn new() -> Self {
        SampledSwapSearch {
            max_iterations: 100,
            max_neighbors: 200,
        }
    }

    pub fn with_params(max_iterations: usize, max_neighbors: usize) -> Self {
        SampledSwapSearch {
            max_iterations,
            max_neighbors,
        }
    }

    pub(crate) fn search(
        &self,
        instance: &QAPInstance,
        permutation: &mut [usize],
        rng: &mut dyn RngCore,
    ) -> (LocalSearchOutcome, SwapMemory) {
        let n = permutation.len();
        let start_cost = instance.cost(permutation);
        let original = permutation.to_vec();
        let mut memory = SwapMemory::new(n);
        let mut running_cost = start_cost;
        let mut moves = 0;

        for _ in 0..self.max_iterations {
            let mut candidates = memory.untried_pairs();
            if candidates.is_empty() {
                break;
            }
            candidates.shuffle(rng);
            candidates.truncate(self.max_neighbors);

            let best = candidates
                .iter()
                .filter(|&&(r, s)| memory.is_open(r, s))
                .map(|&(r, s)| (r, s, instance.swap_delta(permutation, r, s)))
                .min_by_key(|&(_, _, delta)| OrderedFloat(delta));

            match best {
                Some((r, s, delta)) if delta < -IMPROVEMENT_EPS => {
                    permutation.swap(r, s);
                    running_cost += delta;
                    memory.record_move(r, s);
                    moves += 1;
                }
                _ => {
                    memory.lock_all();
                    break;
                }
            }
        }

        let final_cost = instance.cost(permutation);
        if (final_cost - running_cost).abs() > 1e-6 {
            log::debug!(
                "[LS] incremental cost drifted: tracked {:.6}, recomputed {:.6}",
                running_cost,
                final_cost
            );
        }

        if final_cost > start_cost {
            permutation.copy_from_slice(&original);
            return (LocalSearchOutcome { cost: start_cost, moves: 0 }, memory);
        }

        (LocalSearchOutcome { cost: final_cost, moves }, memory)
    }
}

impl Default for SampledSwapSearch {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalSearch for SampledSwapSearch {
    fn improve(
        &self,
        instance: &QAPInstance,
        permutation: &mut [usize],
        rng: &mut dyn RngCore,
    ) -> LocalSearchOutcome {
        self.search(instance, permutation, rng).0
    }

    fn name(&self) -> &str {
        "Sampled-Swap"
    }
}

/// Per-call bookkeeping for [`SampledSwapSearch`].
#[derive(Debug, Clone)]
pub(crate) struct SwapMemory {
    n: usize,
    /// `tried[r * n + s]` for `r < s`: the swap was already applied in this call
    tried: Vec<bool>,
    unlocked: Vec<bool>,
}

impl SwapMemory {
    fn new(n: usize) -> Self {
        SwapMemory {
            n,
            tried: vec![false; n * n],
            unlocked: vec![true; n],
        }
    }

    fn untried_pairs(&self) -> Vec<(usize, usize)> {
        let n = self.n;
        (0..n)
            .flat_map(|r| (r + 1..n).map(move |s| (r, s)))
            .filter(|&(r, s)| !self.tried[r * n + s])
            .collect()
    }

    fn is_open(&self, r: usize, s: usize) -> bool {
        self.unlocked[r] && self.unlocked[s]
    }

    fn record_move(&mut self, r: usize, s: usize) {
        self.tried[r * self.n + s] = true;
        self.unlocked[r] = true;
        self.unlocked[s] = true;
    }

    fn lock_all(&mut self) {
        self.unlocked.iter_mut().for_each(|u| *u = false);
    }

    pub(crate) fn all_locked(&self) -> bool {
        self.unlocked.iter().all(|&u| !u)
    }
}

/// Which local search to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LocalSearchKind {
    TwoOpt,
    SampledSwap,
}

impl std::fmt::Display for LocalSearchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LocalSearchKind::TwoOpt => write!(f, "two-opt"),
            LocalSearchKind::SampledSwap => write!(f, "sampled-swap"),
        }
    }
}

/// Runtime choice between the two local searches
#[derive(Debug, Clone)]
pub enum LocalSearchStrategy {
    TwoOpt(TwoOptSearch),
    SampledSwap(SampledSwapSearch),
}

impl LocalSearchStrategy {
    /// `max_iterations` bounds accepted 2-opt moves or sampled-swap iterations.
    pub fn from_kind(kind: LocalSearchKind, max_iterations: usize, max_neighbors: usize) -> Self {
        match kind {
            LocalSearchKind::TwoOpt => {
                LocalSearchStrategy::TwoOpt(TwoOptSearch::with_max_moves(max_iterations))
            }
            LocalSearchKind::SampledSwap => LocalSearchStrategy::SampledSwap(
                SampledSwapSearch::with_params(max_iterations, max_neighbors),
            ),
        }
    }
}

impl LocalSearch for LocalSearchStrategy {
    fn improve(
        &self,
        instance: &QAPInstance,
        permutation: &mut [usize],
        rng: &mut dyn RngCore,
    ) -> LocalSearchOutcome {
        match self {
            LocalSearchStrategy::TwoOpt(search) => search.improve(instance, permutation, rng),
            LocalSearchStrategy::SampledSwap(search) => search.improve(instance, permutation, rng),
        }
    }

    fn name(&self) -> &str {
        match self {
            LocalSearchStrategy::TwoOpt(search) => search.name(),
            LocalSearchStrategy::SampledSwap(search) => search.name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand_chacha::ChaCha8Rng;

    fn create_test_instance() -> QAPInstance {
        QAPInstance::from_matrices(
            "four",
            vec![
                vec![0.0, 1.0, 2.0, 3.0],
                vec![1.0, 0.0, 4.0, 5.0],
                vec![2.0, 4.0, 0.0, 6.0],
                vec![3.0, 5.0, 6.0, 0.0],
            ],
            vec![
                vec![0.0, 1.0, 2.0, 3.0],
                vec![1.0, 0.0, 1.5, 2.5],
                vec![2.0, 1.5, 0.0, 1.0],
                vec![3.0, 2.5, 1.0, 0.0],
            ],
        )
        .unwrap()
    }

    fn random_permutation(n: usize, rng: &mut ChaCha8Rng) -> Vec<usize> {
        let mut p: Vec<usize> = (0..n).collect();
        p.shuffle(rng);
        p
    }

    #[test]
    fn test_two_opt_improves_swapped_middle() {
        let instance = create_test_instance();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut p = vec![0, 2, 1, 3];
        let before = instance.cost(&p);

        let outcome = TwoOptSearch::new().improve(&instance, &mut p, &mut rng);

        assert!(outcome.cost < before);
        assert_eq!(outcome.cost, instance.cost(&p));
        assert_eq!(p, vec![0, 1, 2, 3]);
        assert!(outcome.improved());
    }

    #[test]
    fn test_two_opt_keeps_local_optimum() {
        let instance = create_test_instance();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut p = vec![0, 1, 2, 3];
        let before = instance.cost(&p);

        let outcome = TwoOptSearch::new().improve(&instance, &mut p, &mut rng);

        assert_eq!(p, vec![0, 1, 2, 3]);
        assert_eq!(outcome.cost, before);
        assert_eq!(outcome.moves, 0);
    }

    #[test]
    fn test_two_opt_respects_move_budget() {
        let instance = QAPInstance::random(15, 9).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut p = random_permutation(15, &mut rng);

        let outcome = TwoOptSearch::with_max_moves(1).improve(&instance, &mut p, &mut rng);
        assert!(outcome.moves <= 1);

        let outcome = TwoOptSearch::with_max_moves(0).improve(&instance, &mut p.clone(), &mut rng);
        assert_eq!(outcome.moves, 0);
    }

    #[test]
    fn test_two_opt_reaches_reversal_optimum() {
        let instance = QAPInstance::random(10, 4).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut p = random_permutation(10, &mut rng);

        let outcome = TwoOptSearch::new().improve(&instance, &mut p, &mut rng);

        for i in 1..9 {
            for j in i + 2..10 {
                let mut q = p.clone();
                q[i..j].reverse();
                assert!(instance.cost(&q) >= outcome.cost);
            }
        }
    }

    #[test]
    fn test_sampled_swap_locks_on_stagnation() {
        let instance = create_test_instance();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        // global optimum of the 4x4 instance
        let mut p = vec![3, 0, 1, 2];

        let search = SampledSwapSearch::with_params(50, 100);
        let (outcome, memory) = search.search(&instance, &mut p, &mut rng);

        assert_eq!(outcome.moves, 0);
        assert_eq!(outcome.cost, 68.0);
        assert_eq!(p, vec![3, 0, 1, 2]);
        assert!(memory.all_locked());
    }

    #[test]
    fn test_sampled_swap_improves() {
        let instance = QAPInstance::random(20, 8).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut p = random_permutation(20, &mut rng);
        let before = instance.cost(&p);

        let outcome = SampledSwapSearch::new().improve(&instance, &mut p, &mut rng);

        assert!(outcome.improved());
        assert!(outcome.cost < before);
        assert_eq!(outcome.cost, instance.cost(&p));
    }

    #[test]
    fn test_swap_memory_excludes_applied_pairs() {
        let mut memory = SwapMemory::new(4);
        assert_eq!(memory.untried_pairs().len(), 6);
        memory.record_move(1, 3);
        let pairs = memory.untried_pairs();
        assert_eq!(pairs.len(), 5);
        assert!(!pairs.contains(&(1, 3)));
        assert!(memory.is_open(1, 3));
        memory.lock_all();
        assert!(!memory.is_open(0, 1));
    }

    #[test]
    fn test_strategy_dispatch() {
        let two_opt = LocalSearchStrategy::from_kind(LocalSearchKind::TwoOpt, 5, 5);
        let sampled = LocalSearchStrategy::from_kind(LocalSearchKind::SampledSwap, 5, 5);
        assert_eq!(two_opt.name(), "2-Opt-FI");
        assert_eq!(sampled.name(), "Sampled-Swap");

        let instance = create_test_instance();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut p = vec![0, 2, 1, 3];
        assert_eq!(two_opt.improve(&instance, &mut p, &mut rng).cost, 77.0);
    }

    proptest! {
        #[test]
        fn prop_two_opt_never_worsens(seed in any::<u64>(), n in 1usize..12) {
            let instance = QAPInstance::random(n, seed).unwrap();
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut p = random_permutation(n, &mut rng);
            let before = instance.cost(&p);

            let outcome = TwoOptSearch::new().improve(&instance, &mut p, &mut rng);

            prop_assert!(outcome.cost <= before);
            prop_assert_eq!(outcome.cost, instance.cost(&p));
        }

        #[test]
        fn prop_sampled_swap_never_worsens(
            seed in any::<u64>(),
            n in 1usize..16,
            neighbors in 1usize..30,
        ) {
            let instance = QAPInstance::random(n, seed).unwrap();
            let mut rng = ChaCha8Rng::seed_from_u64(seed ^ 0xA5A5);
            let mut p = random_permutation(n, &mut rng);
            let before = instance.cost(&p);

            let outcome = SampledSwapSearch::with_params(20, neighbors).improve(&instance, &mut p, &mut rng);

            prop_assert!(outcome.cost <= before);
            prop_assert_eq!(outcome.cost, instance.cost(&p));
            prop_assert!(crate::error::ensure_permutation(&p, "test").is_ok());
        }
    }
}
