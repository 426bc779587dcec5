//! Heuristics module for the QAP.
//!
//! This module exports the genetic operators, the local searches and the
//! hybrid genetic algorithm built on top of them.

pub mod construction;
pub mod crossover;
pub mod genetic;
pub mod local_search;
pub mod mutation;
pub mod selection;

pub use construction::*;
pub use crossover::*;
pub use genetic::*;
pub use local_search::*;
pub use mutation::*;
pub use selection::*;
