//! Solution representation for the QAP.
//!
//! A [`Solution`] is the result record of a solver run: the best assignment found,
//! its cost and the per-generation history of best costs.

use crate::error::{ensure_permutation, QapResult};
use crate::instance::QAPInstance;
use serde::{Deserialize, Serialize};

/// Represents a solution to the QAP
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution {
    /// Facility `i` is assigned to location `permutation[i]`
    pub permutation: Vec<usize>,
    /// Objective value of the assignment
    pub cost: f64,
    /// Algorithm that generated this solution
    pub algorithm: String,
    /// Computation time in seconds
    pub computation_time: f64,
    /// Number of generations run (if applicable)
    pub generations: Option<usize>,
    /// Best cost per generation, index 0 being the initial population
    #[serde(default)]
    pub history: Vec<f64>,
}

impl Solution {
    /// Create a new empty solution
    pub fn new() -> Self {
        Solution {
            permutation: Vec::new(),
            cost: f64::INFINITY,
            algorithm: String::new(),
            computation_time: 0.0,
            generations: None,
            history: Vec::new(),
        }
    }

    /// Create a solution from a permutation, computing its cost
    pub fn from_permutation(instance: &QAPInstance, permutation: Vec<usize>, algorithm: &str) -> Self {
        let cost = instance.cost(&permutation);
        Solution {
            permutation,
            cost,
            algorithm: algorithm.to_string(),
            ..Self::new()
        }
    }

    /// Check the permutation and recompute the cost from scratch
    pub fn validate(&mut self, instance: &QAPInstance) -> QapResult<()> {
        ensure_permutation(&self.permutation, "solution validation")?;
        self.cost = crate::fitness::cost(&self.permutation, &instance.flow, &instance.distance)?;
        Ok(())
    }

    /// Location assigned to a facility
    pub fn location_of(&self, facility: usize) -> Option<usize> {
        self.permutation.get(facility).copied()
    }

    /// Relative improvement between the first and last recorded generation, in percent
    pub fn improvement_ratio(&self) -> Option<f64> {
        let first = *self.history.first()?;
        let last = *self.history.last()?;
        if first == 0.0 {
            return None;
        }
        Some((first - last) / first.abs() * 100.0)
    }
}

impl Default for Solution {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for Solution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Solution ({})", self.algorithm)?;
        writeln!(f, "  Cost: {:.2}", self.cost)?;
        writeln!(f, "  Time: {:.4}s", self.computation_time)?;
        if let Some(gens) = self.generations {
            writeln!(f, "  Generations: {}", gens)?;
        }
        writeln!(f, "  Permutation: {:?}", self.permutation)
    }
}
