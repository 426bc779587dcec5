//! Module for parsing and representing QAP instances.
//!
//! This module handles QAPLIB-style data files: the problem size `n` followed by the
//! `n x n` flow matrix and the `n x n` distance matrix. Values are read as a flat
//! stream of whitespace-separated numbers, so line wrapping inside a matrix row
//! does not matter.

use crate::error::{QapError, QapResult};
use crate::fitness::{self, Matrix};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;

/// A complete QAP instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QAPInstance {
    /// Name of the instance (file stem when loaded from disk)
    pub name: String,
    /// Number of facilities (equal to the number of locations)
    pub dimension: usize,
    /// Flow between facilities, `flow[i][j]`
    pub flow: Matrix,
    /// Distance between locations, `distance[a][b]`
    pub distance: Matrix,
}

impl QAPInstance {
    /// Build an instance from in-memory matrices, validating their shapes.
    pub fn from_matrices(name: &str, flow: Matrix, distance: Matrix) -> QapResult<Self> {
        let dimension = flow.len();
        if dimension == 0 {
            return Err(QapError::Instance("instance has no facilities".to_string()));
        }
        fitness::check_matrices(dimension, &flow, &distance)?;

        for (label, matrix) in [("flow", &flow), ("distance", &distance)] {
            for (i, row) in matrix.iter().enumerate() {
                if let Some(j) = row.iter().position(|v| !v.is_finite()) {
                    return Err(QapError::Instance(format!(
                        "{} matrix entry ({}, {}) is not finite",
                        label, i, j
                    )));
                }
            }
        }

        Ok(QAPInstance {
            name: name.to_string(),
            dimension,
            flow,
            distance,
        })
    }

    /// Parse an instance file: `n`, then `n*n` flow values, then `n*n` distance values.
    pub fn from_file<P: AsRef<Path>>(path: P) -> QapResult<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(QapError::Instance(format!(
                "file {} does not exist",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "unnamed".to_string());

        Self::parse(&name, &content)
    }

    /// Parse instance data from a string (see [`QAPInstance::from_file`]).
    pub fn parse(name: &str, content: &str) -> QapResult<Self> {
        let mut tokens = content.split_whitespace();

        let header = tokens
            .next()
            .ok_or_else(|| QapError::Instance("empty instance data".to_string()))?;
        let dimension: usize = header
            .parse()
            .map_err(|_| QapError::Instance(format!("invalid dimension '{}'", header)))?;
        if dimension == 0 {
            return Err(QapError::Instance("dimension must be positive".to_string()));
        }

        let values = tokens
            .enumerate()
            .map(|(idx, tok)| {
                tok.parse::<f64>().map_err(|_| {
                    QapError::Instance(format!("invalid number '{}' at value {}", tok, idx + 1))
                })
            })
            .collect::<QapResult<Vec<f64>>>()?;

        let expected = 2 * dimension * dimension;
        if values.len() != expected {
            return Err(QapError::Instance(format!(
                "expected {} matrix values for n = {} (two {}x{} matrices), found {}",
                expected,
                dimension,
                dimension,
                dimension,
                values.len()
            )));
        }

        let (flow_values, distance_values) = values.split_at(dimension * dimension);
        let to_matrix = |slice: &[f64]| -> Matrix {
            slice.chunks(dimension).map(|row| row.to_vec()).collect()
        };

        Self::from_matrices(name, to_matrix(flow_values), to_matrix(distance_values))
    }

    /// Write the instance in the same format [`QAPInstance::from_file`] reads.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> QapResult<()> {
        let mut out = String::new();
        let _ = writeln!(out, "{}", self.dimension);
        for matrix in [&self.flow, &self.distance] {
            out.push('\n');
            for row in matrix {
                let line: Vec<String> = row.iter().map(|v| v.to_string()).collect();
                let _ = writeln!(out, "{}", line.join(" "));
            }
        }
        std::fs::write(path, out)?;
        Ok(())
    }

    /// Generate a reproducible synthetic instance.
    ///
    /// Locations are random points on a 100x100 grid with rounded Euclidean
    /// distances. Flows are integers in `0..10` with about a third of the pairs
    /// left empty; the flow matrix is symmetric with a zero diagonal.
    pub fn random(dimension: usize, seed: u64) -> QapResult<Self> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let points: Vec<(f64, f64)> = (0..dimension)
            .map(|_| (rng.gen_range(0.0..100.0), rng.gen_range(0.0..100.0)))
            .collect();
        let distance = Self::compute_distance_matrix(&points);

        let mut flow = vec![vec![0.0; dimension]; dimension];
        for i in 0..dimension {
            for j in i + 1..dimension {
                if rng.gen::<f64>() < 0.66 {
                    let f = rng.gen_range(1..10) as f64;
                    flow[i][j] = f;
                    flow[j][i] = f;
                }
            }
        }

        Self::from_matrices(&format!("rand{}-s{}", dimension, seed), flow, distance)
    }

    /// Rounded Euclidean distance matrix between points
    fn compute_distance_matrix(points: &[(f64, f64)]) -> Matrix {
        let n = points.len();
        let mut matrix = vec![vec![0.0; n]; n];

        for i in 0..n {
            for j in 0..n {
                if i != j {
                    let dx = points[i].0 - points[j].0;
                    let dy = points[i].1 - points[j].1;
                    matrix[i][j] = (dx * dx + dy * dy).sqrt().round();
                }
            }
        }

        matrix
    }

    /// Cost of an assignment. The permutation must have length `dimension`.
    #[inline]
    pub fn cost(&self, permutation: &[usize]) -> f64 {
        debug_assert_eq!(permutation.len(), self.dimension);
        fitness::cost_kernel(permutation, &self.flow, &self.distance)
    }

    /// Cost of every permutation in a population (parallel).
    pub fn batch_cost(&self, population: &[Vec<usize>]) -> Vec<f64> {
        fitness::batch_cost_kernel(population, &self.flow, &self.distance)
    }

    /// Cost change of exchanging positions `r` and `s`.
    #[inline]
    pub fn swap_delta(&self, permutation: &[usize], r: usize, s: usize) -> f64 {
        fitness::swap_delta_kernel(permutation, r, s, &self.flow, &self.distance)
    }

    /// Total outgoing flow of each facility
    pub fn flow_row_sums(&self) -> Vec<f64> {
        self.flow.iter().map(|row| row.iter().sum()).collect()
    }

    /// Total distance from each location to every other
    pub fn distance_row_sums(&self) -> Vec<f64> {
        self.distance.iter().map(|row| row.iter().sum()).collect()
    }

    fn is_symmetric(matrix: &Matrix) -> bool {
        let n = matrix.len();
        (0..n).all(|i| (i + 1..n).all(|j| matrix[i][j] == matrix[j][i]))
    }

    /// Get statistics about the instance
    pub fn statistics(&self) -> InstanceStatistics {
        let n = self.dimension;

        let mut off_diagonal_flow = Vec::with_capacity(n * n.saturating_sub(1));
        let mut off_diagonal_distance = Vec::with_capacity(n * n.saturating_sub(1));
        for i in 0..n {
            for j in 0..n {
                if i != j {
                    off_diagonal_flow.push(self.flow[i][j]);
                    off_diagonal_distance.push(self.distance[i][j]);
                }
            }
        }

        let pairs = off_diagonal_flow.len().max(1) as f64;
        let nonzero_flows = off_diagonal_flow.iter().filter(|&&f| f != 0.0).count();

        InstanceStatistics {
            name: self.name.clone(),
            dimension: n,
            flow_density: nonzero_flows as f64 / pairs,
            avg_flow: off_diagonal_flow.iter().sum::<f64>() / pairs,
            max_flow: off_diagonal_flow.iter().cloned().fold(0.0, f64::max),
            avg_distance: off_diagonal_distance.iter().sum::<f64>() / pairs,
            max_distance: off_diagonal_distance.iter().cloned().fold(0.0, f64::max),
            flow_symmetric: Self::is_symmetric(&self.flow),
            distance_symmetric: Self::is_symmetric(&self.distance),
        }
    }
}

/// Statistics about a QAP instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceStatistics {
    pub name: String,
    pub dimension: usize,
    /// Fraction of off-diagonal facility pairs with non-zero flow
    pub flow_density: f64,
    pub avg_flow: f64,
    pub max_flow: f64,
    pub avg_distance: f64,
    pub max_distance: f64,
    pub flow_symmetric: bool,
    pub distance_symmetric: bool,
}

impl std::fmt::Display for InstanceStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Instance: {}", self.name)?;
        writeln!(f, "  Facilities / locations: {}", self.dimension)?;
        writeln!(f, "  Flow density: {:.1}%", self.flow_density * 100.0)?;
        writeln!(f, "  Avg flow: {:.2} (max {:.2})", self.avg_flow, self.max_flow)?;
        writeln!(f, "  Avg distance: {:.2} (max {:.2})", self.avg_distance, self.max_distance)?;
        writeln!(f, "  Symmetric flow: {}", self.flow_symmetric)?;
        writeln!(f, "  Symmetric distance: {}", self.distance_symmetric)
    }
}
