//! Partially Mapped Crossover (PMX).
//!
//! Each child inherits a contiguous segment `[lo, hi)` from its primary parent
//! verbatim. The secondary parent's genes from that segment are relocated along
//! the PMX mapping chain, and every slot still empty afterwards is copied from the
//! secondary parent at the same position. Children are permutations of the same
//! set of values as their parents.

use crate::error::{QapError, QapResult};
use rand::seq::index;
use rand::Rng;

/// PMX with random cut points.
///
/// Cut points `lo < hi` are drawn uniformly among all pairs of positions. Parents
/// shorter than two genes are returned unchanged.
pub fn pmx_crossover<R: Rng + ?Sized>(
    parent1: &[usize],
    parent2: &[usize],
    rng: &mut R,
) -> QapResult<(Vec<usize>, Vec<usize>)> {
    check_parents(parent1, parent2)?;
    let n = parent1.len();
    if n < 2 {
        return Ok((parent1.to_vec(), parent2.to_vec()));
    }

    let cuts = index::sample(rng, n, 2);
    let (a, b) = (cuts.index(0), cuts.index(1));
    let (lo, hi) = if a < b { (a, b) } else { (b, a) };

    pmx_with_cuts(parent1, parent2, lo, hi)
}

/// PMX with explicit cut points; the copied segment is `[lo, hi)`.
pub fn pmx_with_cuts(
    parent1: &[usize],
    parent2: &[usize],
    lo: usize,
    hi: usize,
) -> QapResult<(Vec<usize>, Vec<usize>)> {
    check_parents(parent1, parent2)?;
    if lo > hi || hi > parent1.len() {
        return Err(QapError::Config(format!(
            "invalid PMX cut points [{}, {}) for length {}",
            lo,
            hi,
            parent1.len()
        )));
    }

    let child1 = build_child(parent1, parent2, lo, hi)?;
    let child2 = build_child(parent2, parent1, lo, hi)?;
    Ok((child1, child2))
}

/// Child with `primary[lo..hi]` fixed and the rest taken from `secondary`.
fn build_child(primary: &[usize], secondary: &[usize], lo: usize, hi: usize) -> QapResult<Vec<usize>> {
    let n = primary.len();

    // position of every value inside `secondary`
    let mut position_in_secondary = vec![None; n];
    for (pos, &value) in secondary.iter().enumerate() {
        let slot = position_in_secondary.get_mut(value).ok_or_else(|| out_of_range(value, n))?;
        *slot = Some(pos);
    }

    let mut child: Vec<Option<usize>> = vec![None; n];
    let mut placed = vec![false; n];
    for pos in lo..hi {
        let value = primary[pos];
        let seen = placed.get_mut(value).ok_or_else(|| out_of_range(value, n))?;
        child[pos] = Some(value);
        *seen = true;
    }

    for i in lo..hi {
        let value = secondary[i];
        if placed[value] {
            continue;
        }

        let mut pos = i;
        let mut steps = 0;
        loop {
            let mapped = primary[pos];
            pos = position_in_secondary
                .get(mapped)
                .copied()
                .flatten()
                .ok_or_else(|| QapError::InvariantViolation {
                    stage: "crossover",
                    detail: format!("PMX mapping lost value {}: not present in the second parent", mapped),
                })?;
            if child[pos].is_none() {
                child[pos] = Some(value);
                placed[value] = true;
                break;
            }
            steps += 1;
            if steps > n {
                return Err(QapError::InvariantViolation {
                    stage: "crossover",
                    detail: format!("PMX mapping chain for value {} does not terminate", value),
                });
            }
        }
    }

    Ok(child
        .into_iter()
        .enumerate()
        .map(|(pos, slot)| slot.unwrap_or(secondary[pos]))
        .collect())
}

fn check_parents(parent1: &[usize], parent2: &[usize]) -> QapResult<()> {
    if parent1.len() != parent2.len() {
        return Err(QapError::ShapeMismatch(format!(
            "PMX parents differ in length ({} vs {})",
            parent1.len(),
            parent2.len()
        )));
    }
    Ok(())
}

fn out_of_range(value: usize, n: usize) -> QapError {
    QapError::InvariantViolation {
        stage: "crossover",
        detail: format!("gene {} is out of range 0..{}", value, n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ensure_permutation;
    use proptest::prelude::*;
    use rand::prelude::*;
    use rand_chacha::ChaCha8Rng;

    fn get_sorted(vec: &[usize]) -> Vec<usize> {
        let mut v = vec.to_vec();
        v.sort();
        v
    }

    #[test]
    fn test_textbook_example() {
        let p1 = vec![0, 1, 2, 3, 4, 5, 6, 7];
        let p2 = vec![2, 5, 0, 6, 7, 1, 3, 4];

        let (c1, c2) = pmx_with_cuts(&p1, &p2, 3, 6).unwrap();

        assert_eq!(&c1[3..6], &p1[3..6]);
        assert_eq!(&c2[3..6], &p2[3..6]);
        // 6 and 7 and 1 of p2 are relocated through the 3<->6, 4<->7, 5<->1 mapping
        assert_eq!(c1, vec![2, 1, 0, 3, 4, 5, 6, 7]);
        assert_eq!(c2, vec![0, 5, 2, 6, 7, 1, 3, 4]);
    }

    #[test]
    fn test_identical_parents() {
        let p = vec![3, 1, 0, 2];
        let (c1, c2) = pmx_with_cuts(&p, &p, 1, 3).unwrap();
        assert_eq!(c1, p);
        assert_eq!(c2, p);
    }

    #[test]
    fn test_empty_segment_copies_secondary() {
        let p1 = vec![0, 1, 2, 3];
        let p2 = vec![3, 2, 1, 0];
        let (c1, c2) = pmx_with_cuts(&p1, &p2, 2, 2).unwrap();
        assert_eq!(c1, p2);
        assert_eq!(c2, p1);
    }

    #[test]
    fn test_short_parents() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let (c1, c2) = pmx_crossover(&[0], &[0], &mut rng).unwrap();
        assert_eq!(c1, vec![0]);
        assert_eq!(c2, vec![0]);
    }

    #[test]
    fn test_invalid_input() {
        assert!(pmx_with_cuts(&[0, 1, 2], &[0, 1], 0, 1).is_err());
        assert!(pmx_with_cuts(&[0, 1, 2], &[2, 1, 0], 2, 1).is_err());
        assert!(pmx_with_cuts(&[0, 1, 2], &[2, 1, 0], 0, 4).is_err());
        // parents over different value sets break the mapping
        assert!(matches!(
            pmx_with_cuts(&[0, 1, 2], &[0, 1, 5], 0, 2),
            Err(QapError::InvariantViolation { .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_children_are_permutations(
            seed in any::<u64>(),
            n in 2usize..40,
        ) {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut p1: Vec<usize> = (0..n).collect();
            let mut p2 = p1.clone();
            p1.shuffle(&mut rng);
            p2.shuffle(&mut rng);

            let (c1, c2) = pmx_crossover(&p1, &p2, &mut rng).unwrap();

            prop_assert!(ensure_permutation(&c1, "test").is_ok());
            prop_assert!(ensure_permutation(&c2, "test").is_ok());
            prop_assert_eq!(get_sorted(&c1), get_sorted(&p1));
            prop_assert_eq!(get_sorted(&c2), get_sorted(&p2));
        }

        #[test]
        fn prop_any_cuts_preserve_values(
            seed in any::<u64>(),
            n in 1usize..25,
            a in 0usize..25,
            b in 0usize..25,
        ) {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut p1: Vec<usize> = (0..n).collect();
            let mut p2 = p1.clone();
            p1.shuffle(&mut rng);
            p2.shuffle(&mut rng);
            let (lo, hi) = (a.min(b).min(n), a.max(b).min(n));

            let (c1, c2) = pmx_with_cuts(&p1, &p2, lo, hi).unwrap();

            prop_assert_eq!(&c1[lo..hi], &p1[lo..hi]);
            prop_assert_eq!(get_sorted(&c1), get_sorted(&p1));
            prop_assert_eq!(get_sorted(&c2), get_sorted(&p2));
        }
    }
}
