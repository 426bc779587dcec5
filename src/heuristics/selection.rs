//! Tournament selection.

use crate::error::{QapError, QapResult};
use rand::seq::index;
use rand::Rng;

/// Index of the tournament winner.
///
/// Draws `tournament_size` distinct indices uniformly without replacement and
/// returns the one with the lowest fitness. Ties go to the index drawn first.
/// With `tournament_size == fitness.len()` this is always a global minimum.
pub fn tournament_index<R: Rng + ?Sized>(
    fitness: &[f64],
    tournament_size: usize,
    rng: &mut R,
) -> QapResult<usize> {
    let population_size = fitness.len();
    if tournament_size == 0 || tournament_size > population_size {
        return Err(QapError::Config(format!(
            "tournament size {} must be in 1..={}",
            tournament_size, population_size
        )));
    }

    let mut winner: Option<usize> = None;
    for idx in index::sample(rng, population_size, tournament_size).iter() {
        match winner {
            Some(best) if fitness[idx] >= fitness[best] => {}
            _ => winner = Some(idx),
        }
    }

    winner.ok_or_else(|| QapError::Config("empty tournament".to_string()))
}

/// Tournament winner from `population`, with `fitness[i]` the cost of `population[i]`.
pub fn tournament_select<'a, R: Rng + ?Sized>(
    population: &'a [Vec<usize>],
    fitness: &[f64],
    tournament_size: usize,
    rng: &mut R,
) -> QapResult<&'a [usize]> {
    if population.len() != fitness.len() {
        return Err(QapError::Config(format!(
            "population has {} individuals but {} fitness values",
            population.len(),
            fitness.len()
        )));
    }
    let idx = tournament_index(fitness, tournament_size, rng)?;
    Ok(&population[idx])
}
