//! QAP Solver Library
//!
//! A hybrid genetic algorithm for the Quadratic Assignment Problem (QAP): assign
//! `n` facilities to `n` locations so that the sum of flow times distance over all
//! facility pairs is minimal.
//!
//! # Features
//!
//! - Instance loading in the QAPLIB text layout and random instance generation
//! - Sequential and rayon-parallel cost evaluation, O(n) swap deltas
//! - Tournament selection, PMX crossover and swap mutation
//! - Local search (first-improvement 2-opt, sampled best-improvement swaps)
//! - Standard, Baldwinian and Lamarckian GA variants
//! - Multi-run variant comparison, history charts and result export
//!
//! # Example
//!
//! ```no_run
//! use qap_solver::instance::QAPInstance;
//! use qap_solver::heuristics::genetic::{GAConfig, GeneticAlgorithm, Variant};
//!
//! // Load instance
//! let instance = QAPInstance::from_file("tai12a.dat").unwrap();
//!
//! // Run the Lamarckian variant with its default settings
//! let config = GAConfig::for_variant(Variant::Lamarckian);
//! let mut ga = GeneticAlgorithm::new(instance, config);
//! let solution = ga.run().unwrap();
//!
//! println!("Solution cost: {:.2}", solution.cost);
//! ```

pub mod error;
pub mod fitness;
pub mod instance;
pub mod solution;
pub mod heuristics;
pub mod output;
pub mod benchmark;
pub mod visualization;

pub use error::{QapError, QapResult};
pub use instance::QAPInstance;
pub use solution::Solution;
