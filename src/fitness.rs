//! Cost evaluation for QAP assignments.
//!
//! The objective of a permutation `p` (facility `i` placed at location `p[i]`) is
//! `sum_ij F[i][j] * D[p[i]][p[j]]`. Three entry points are provided:
//! - [`cost`]: the O(n^2) double sum for one permutation
//! - [`batch_cost`]: the same kernel mapped over a population, evaluated with rayon
//! - [`swap_delta`]: the O(n) change in cost caused by exchanging two positions
//!
//! The checked functions validate shapes first. [`crate::instance::QAPInstance`]
//! exposes unchecked variants for the engine's hot loops.

use crate::error::{QapError, QapResult};
use rayon::prelude::*;

/// Dense row-major square matrix.
pub type Matrix = Vec<Vec<f64>>;

/// Cost of a single permutation.
pub fn cost(permutation: &[usize], flow: &[Vec<f64>], distance: &[Vec<f64>]) -> QapResult<f64> {
    check_matrices(permutation.len(), flow, distance)?;
    check_permutation_shape(permutation, flow.len())?;
    Ok(cost_kernel(permutation, flow, distance))
}

/// Cost of every row of `population`, in order.
///
/// Each row is evaluated with the same kernel as [`cost`], so the results are
/// bit-identical to calling [`cost`] in a loop.
pub fn batch_cost(
    population: &[Vec<usize>],
    flow: &[Vec<f64>],
    distance: &[Vec<f64>],
) -> QapResult<Vec<f64>> {
    let n = flow.len();
    check_matrices(n, flow, distance)?;
    for permutation in population {
        check_permutation_shape(permutation, n)?;
    }
    Ok(batch_cost_kernel(population, flow, distance))
}

/// Change in cost when the facilities at positions `r` and `s` are exchanged.
///
/// Exact for asymmetric matrices and non-zero diagonals; for a symmetric distance
/// matrix with a zero diagonal the `r`/`s` cross terms cancel.
pub fn swap_delta(
    permutation: &[usize],
    r: usize,
    s: usize,
    flow: &[Vec<f64>],
    distance: &[Vec<f64>],
) -> QapResult<f64> {
    let n = permutation.len();
    check_matrices(n, flow, distance)?;
    check_permutation_shape(permutation, n)?;
    if r >= n || s >= n {
        return Err(QapError::ShapeMismatch(format!(
            "swap positions ({}, {}) out of range for n = {}",
            r, s, n
        )));
    }
    Ok(swap_delta_kernel(permutation, r, s, flow, distance))
}

pub(crate) fn cost_kernel(permutation: &[usize], flow: &[Vec<f64>], distance: &[Vec<f64>]) -> f64 {
    let mut total = 0.0;
    for (i, flow_row) in flow.iter().enumerate() {
        let distance_row = &distance[permutation[i]];
        for (j, &f) in flow_row.iter().enumerate() {
            total += f * distance_row[permutation[j]];
        }
    }
    total
}

pub(crate) fn batch_cost_kernel(
    population: &[Vec<usize>],
    flow: &[Vec<f64>],
    distance: &[Vec<f64>],
) -> Vec<f64> {
    population
        .par_iter()
        .map(|permutation| cost_kernel(permutation, flow, distance))
        .collect()
}

pub(crate) fn swap_delta_kernel(
    permutation: &[usize],
    r: usize,
    s: usize,
    flow: &[Vec<f64>],
    distance: &[Vec<f64>],
) -> f64 {
    if r == s {
        return 0.0;
    }

    let pr = permutation[r];
    let ps = permutation[s];
    let mut delta = 0.0;

    for (k, &pk) in permutation.iter().enumerate() {
        if k == r || k == s {
            continue;
        }
        delta += flow[r][k] * (distance[ps][pk] - distance[pr][pk])
            + flow[s][k] * (distance[pr][pk] - distance[ps][pk])
            + flow[k][r] * (distance[pk][ps] - distance[pk][pr])
            + flow[k][s] * (distance[pk][pr] - distance[pk][ps]);
    }

    delta
        + flow[r][r] * (distance[ps][ps] - distance[pr][pr])
        + flow[s][s] * (distance[pr][pr] - distance[ps][ps])
        + flow[r][s] * (distance[ps][pr] - distance[pr][ps])
        + flow[s][r] * (distance[pr][ps] - distance[ps][pr])
}

/// Both matrices must be `n x n`.
pub(crate) fn check_matrices(n: usize, flow: &[Vec<f64>], distance: &[Vec<f64>]) -> QapResult<()> {
    for (label, matrix) in [("flow", flow), ("distance", distance)] {
        if matrix.len() != n {
            return Err(QapError::ShapeMismatch(format!(
                "{} matrix has {} rows, expected {}",
                label,
                matrix.len(),
                n
            )));
        }
        if let Some((row, bad)) = matrix.iter().enumerate().find(|(_, r)| r.len() != n) {
            return Err(QapError::ShapeMismatch(format!(
                "{} matrix row {} has {} columns, expected {}",
                label,
                row,
                bad.len(),
                n
            )));
        }
    }
    Ok(())
}

fn check_permutation_shape(permutation: &[usize], n: usize) -> QapResult<()> {
    if permutation.len() != n {
        return Err(QapError::ShapeMismatch(format!(
            "permutation has length {}, matrices are {}x{}",
            permutation.len(),
            n,
            n
        )));
    }
    if let Some(&bad) = permutation.iter().find(|&&v| v >= n) {
        return Err(QapError::ShapeMismatch(format!(
            "permutation entry {} is out of range 0..{}",
            bad, n
        )));
    }
    Ok(())
}
