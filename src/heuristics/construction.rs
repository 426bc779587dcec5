use crate::instance::QAPInstance;
use crate::solution::Solution;
use ordered_float::OrderedFloat;
use rand::prelude::*;

pub trait ConstructionHeuristic {
    fn construct(&self, instance: &QAPInstance, rng: &mut dyn RngCore) -> Solution;
    fn name(&self) -> &str;
}

/// Uniformly random assignment
pub struct RandomAssignment;

impl ConstructionHeuristic for RandomAssignment {
    fn construct(&self, instance: &QAPInstance, rng: &mut dyn RngCore) -> Solution {
        let mut permutation: Vec<usize> = (0..instance.dimension).collect();
        permutation.shuffle(rng);
        Solution::from_permutation(instance, permutation, self.name())
    }

    fn name(&self) -> &str {
        "Random"
    }
}

/// Flow/distance rank matching
///
/// Facilities sorted by decreasing total flow are placed on locations sorted by
/// increasing total distance, so the busiest facilities land on the most central
/// locations. Deterministic; ties keep index order.
pub struct GreedyAssignment;

impl GreedyAssignment {
    pub fn assignment(instance: &QAPInstance) -> Vec<usize> {
        let flow_totals = instance.flow_row_sums();
        let distance_totals = instance.distance_row_sums();

        let mut facilities: Vec<usize> = (0..instance.dimension).collect();
        facilities.sort_by_key(|&f| OrderedFloat(-flow_totals[f]));

        let mut locations: Vec<usize> = (0..instance.dimension).collect();
        locations.sort_by_key(|&l| OrderedFloat(distance_totals[l]));

        let mut permutation = vec![0; instance.dimension];
        for (&facility, &location) in facilities.iter().zip(locations.iter()) {
            permutation[facility] = location;
        }
        permutation
    }
}

impl ConstructionHeuristic for GreedyAssignment {
    fn construct(&self, instance: &QAPInstance, _rng: &mut dyn RngCore) -> Solution {
        let start = std::time::Instant::now();
        let mut solution = Solution::from_permutation(instance, Self::assignment(instance), self.name());
        solution.computation_time = start.elapsed().as_secs_f64();
        solution
    }

    fn name(&self) -> &str {
        "Greedy"
    }
}
