//! Swap mutation.

use rand::seq::index;
use rand::Rng;

/// With probability `rate`, exchange two distinct uniformly chosen positions.
///
/// One Bernoulli trial per call. Returns whether a swap was applied; permutations
/// shorter than two are never changed.
pub fn swap_mutation<R: Rng + ?Sized>(permutation: &mut [usize], rate: f64, rng: &mut R) -> bool {
    let n = permutation.len();
    if n < 2 || rng.gen::<f64>() >= rate {
        return false;
    }

    let picks = index::sample(rng, n, 2);
    permutation.swap(picks.index(0), picks.index(1));
    true
}
