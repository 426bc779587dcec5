//! Genetic Algorithm for the QAP.
//!
//! This module implements a generational genetic algorithm with:
//! - Tournament selection, PMX crossover and swap mutation
//! - Single-individual elitism
//! - Three ways of combining evolution with local search:
//!   - `Standard`: no local search
//!   - `Baldwinian`: every individual is improved before evaluation, but only the
//!     fitness of the improved phenotype is kept; genotypes are not modified,
//!     and elitism carries the best individual's genotype
//!   - `Lamarckian`: improved individuals replace their genotypes
//!
//! All randomness comes from one `ChaCha8Rng` seeded from the configuration, so a
//! fixed seed reproduces the run exactly.

use crate::error::{ensure_permutation, QapError, QapResult};
use crate::heuristics::construction::{ConstructionHeuristic, GreedyAssignment, RandomAssignment};
use crate::heuristics::crossover::pmx_crossover;
use crate::heuristics::local_search::{LocalSearch, LocalSearchKind, LocalSearchStrategy};
use crate::heuristics::mutation::swap_mutation;
use crate::heuristics::selection::tournament_select;
use crate::instance::QAPInstance;
use crate::solution::Solution;
use ordered_float::OrderedFloat;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How local search is combined with evolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Standard,
    Baldwinian,
    Lamarckian,
}

impl Variant {
    pub const ALL: [Variant; 3] = [Variant::Standard, Variant::Baldwinian, Variant::Lamarckian];

    pub fn name(&self) -> &'static str {
        match self {
            Variant::Standard => "standard",
            Variant::Baldwinian => "baldwinian",
            Variant::Lamarckian => "lamarckian",
        }
    }

    pub fn uses_local_search(&self) -> bool {
        !matches!(self, Variant::Standard)
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Genetic Algorithm configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GAConfig {
    /// Hybridization variant
    pub variant: Variant,
    /// Population size (at least 2)
    pub population_size: usize,
    /// Number of generations
    pub generations: usize,
    /// Probability of applying PMX to a selected pair
    pub crossover_rate: f64,
    /// Probability of one swap per child
    pub mutation_rate: f64,
    /// Carry the best individual into every new generation
    pub elitism: bool,
    /// Tournament size for selection
    pub tournament_size: usize,
    /// Random seed
    pub seed: u64,
    /// Build the second half of the initial population with the greedy assignment
    pub greedy_seeding: bool,
    /// Local search used by the Baldwinian and Lamarckian variants
    pub local_search: LocalSearchKind,
    /// Number of initial individuals improved by the Lamarckian variant
    pub local_search_subset: usize,
    /// Accepted-move bound for 2-opt, iteration bound for the sampled search
    pub local_search_max_iterations: usize,
    /// Swap pairs sampled per iteration by the sampled search
    pub local_search_max_neighbors: usize,
    /// Baldwinian only: write the improved phenotypes back into the population
    pub baldwinian_write_back: bool,
}

impl Default for GAConfig {
    fn default() -> Self {
        GAConfig {
            variant: Variant::Standard,
            population_size: 100,
            generations: 500,
            crossover_rate: 0.8,
            mutation_rate: 0.02,
            elitism: true,
            tournament_size: 3,
            seed: 42,
            greedy_seeding: false,
            local_search: LocalSearchKind::TwoOpt,
            local_search_subset: 20,
            local_search_max_iterations: 100,
            local_search_max_neighbors: 200,
            baldwinian_write_back: false,
        }
    }
}

impl GAConfig {
    /// Defaults tuned per variant: greedy seeding for Standard, 2-opt for
    /// Baldwinian, sampled swaps for Lamarckian.
    pub fn for_variant(variant: Variant) -> Self {
        let mut config = GAConfig {
            variant,
            ..Default::default()
        };
        match variant {
            Variant::Standard => config.greedy_seeding = true,
            Variant::Baldwinian => config.local_search = LocalSearchKind::TwoOpt,
            Variant::Lamarckian => config.local_search = LocalSearchKind::SampledSwap,
        }
        config
    }

    /// Load a configuration from JSON; missing fields take the defaults of the
    /// file's variant (see [`GAConfig::for_variant`]).
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> QapResult<Self> {
        Self::from_json_file_as(path, None)
    }

    /// Like [`GAConfig::from_json_file`], with `variant` replacing the file's variant
    /// before the defaults are filled in.
    pub fn from_json_file_as<P: AsRef<Path>>(path: P, variant: Option<Variant>) -> QapResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content, variant)
    }

    pub fn from_json_str(content: &str, variant: Option<Variant>) -> QapResult<Self> {
        let mut fields = match serde_json::from_str::<serde_json::Value>(content)? {
            serde_json::Value::Object(fields) => fields,
            other => {
                return Err(QapError::Config(format!(
                    "configuration must be a JSON object, got {}",
                    other
                )))
            }
        };
        if let Some(variant) = variant {
            fields.insert("variant".to_string(), serde_json::to_value(variant)?);
        }

        let variant = match fields.get("variant") {
            Some(value) => serde_json::from_value(value.clone())?,
            None => Variant::Standard,
        };

        let mut merged = serde_json::to_value(Self::for_variant(variant))?;
        if let serde_json::Value::Object(defaults) = &mut merged {
            defaults.extend(fields);
        }
        Ok(serde_json::from_value(merged)?)
    }

    /// Reject configurations the algorithm cannot run with.
    pub fn validate(&self) -> QapResult<()> {
        if self.population_size < 2 {
            return Err(QapError::Config(format!(
                "population size must be at least 2, got {}",
                self.population_size
            )));
        }
        if self.tournament_size == 0 || self.tournament_size > self.population_size {
            return Err(QapError::Config(format!(
                "tournament size must be in 1..={}, got {}",
                self.population_size, self.tournament_size
            )));
        }
        for (label, rate) in [
            ("crossover rate", self.crossover_rate),
            ("mutation rate", self.mutation_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(QapError::Config(format!("{} must be in [0, 1], got {}", label, rate)));
            }
        }
        for (label, value) in [
            ("local search subset", self.local_search_subset),
            ("local search max iterations", self.local_search_max_iterations),
            ("local search max neighbors", self.local_search_max_neighbors),
        ] {
            if value == 0 {
                return Err(QapError::Config(format!("{} must be positive", label)));
            }
        }
        Ok(())
    }
}

type GenerationObserver = Box<dyn FnMut(usize, f64)>;

/// Genetic Algorithm implementation
pub struct GeneticAlgorithm {
    config: GAConfig,
    instance: QAPInstance,
    local_search: Option<LocalSearchStrategy>,
    population: Vec<Vec<usize>>,
    /// Improved copies of `population` (Baldwinian only)
    phenotypes: Vec<Vec<usize>>,
    fitness: Vec<f64>,
    /// Best phenotype seen and its cost
    best: Option<(Vec<usize>, f64)>,
    /// Genotype that produced `best`; differs from it only for Baldwinian runs
    best_genotype: Option<Vec<usize>>,
    history: Vec<f64>,
    rng: ChaCha8Rng,
    generation: usize,
    observer: Option<GenerationObserver>,
}

impl GeneticAlgorithm {
    pub fn new(instance: QAPInstance, config: GAConfig) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        let local_search = config.variant.uses_local_search().then(|| {
            LocalSearchStrategy::from_kind(
                config.local_search,
                config.local_search_max_iterations,
                config.local_search_max_neighbors,
            )
        });

        GeneticAlgorithm {
            config,
            instance,
            local_search,
            population: Vec::new(),
            phenotypes: Vec::new(),
            fitness: Vec::new(),
            best: None,
            best_genotype: None,
            history: Vec::new(),
            rng,
            generation: 0,
            observer: None,
        }
    }

    /// Register a callback invoked after every generation with `(generation, best_cost)`.
    pub fn on_generation<F>(&mut self, observer: F)
    where
        F: FnMut(usize, f64) + 'static,
    {
        self.observer = Some(Box::new(observer));
    }

    /// Random permutations, with the greedy assignment filling the second half when
    /// `greedy_seeding` is set. The Lamarckian variant then improves the first
    /// `local_search_subset` individuals in place.
    fn initialize_population(&mut self) -> QapResult<()> {
        let size = self.config.population_size;
        let random_count = if self.config.greedy_seeding { size / 2 } else { size };

        self.population.clear();
        for _ in 0..random_count {
            let individual = RandomAssignment.construct(&self.instance, &mut self.rng);
            self.population.push(individual.permutation);
        }
        if random_count < size {
            let greedy = GreedyAssignment::assignment(&self.instance);
            self.population.resize(size, greedy);
        }

        if self.config.variant == Variant::Lamarckian {
            if let Some(ls) = &self.local_search {
                let subset = self.config.local_search_subset.min(size);
                for individual in self.population.iter_mut().take(subset) {
                    improve_in_place(ls, &self.instance, individual, &mut self.rng)?;
                }
            }
        }

        for individual in &self.population {
            ensure_permutation(individual, "initialization")?;
        }

        log::info!(
            "[GA] Initialized {} population: {} individuals ({} greedy)",
            self.config.variant,
            self.population.len(),
            size - random_count
        );
        Ok(())
    }

    /// Fitness of the current population. Baldwinian runs score the improved phenotypes.
    fn evaluate(&mut self) -> QapResult<()> {
        match (self.config.variant, &self.local_search) {
            (Variant::Baldwinian, Some(ls)) => {
                let mut phenotypes = self.population.clone();
                for phenotype in phenotypes.iter_mut() {
                    improve_in_place(ls, &self.instance, phenotype, &mut self.rng)?;
                }
                self.fitness = self.instance.batch_cost(&phenotypes);
                if self.config.baldwinian_write_back {
                    self.population = phenotypes.clone();
                }
                self.phenotypes = phenotypes;
            }
            _ => {
                self.fitness = self.instance.batch_cost(&self.population);
                self.phenotypes.clear();
            }
        }
        Ok(())
    }

    /// Replace the tracked best if the generation improved on it and record the
    /// best cost so far. Returns the generation's own best cost.
    fn update_best(&mut self) -> QapResult<f64> {
        let (idx, generation_best) = self
            .fitness
            .iter()
            .enumerate()
            .min_by_key(|&(_, &f)| OrderedFloat(f))
            .map(|(idx, &f)| (idx, f))
            .ok_or_else(|| QapError::Config("cannot evaluate an empty population".to_string()))?;

        let improved = match &self.best {
            Some((_, cost)) => generation_best < *cost,
            None => true,
        };
        if improved {
            let candidate = if self.phenotypes.is_empty() {
                &self.population[idx]
            } else {
                &self.phenotypes[idx]
            };
            self.best = Some((candidate.clone(), generation_best));
            self.best_genotype = Some(self.population[idx].clone());
        }

        // an unimproved Baldwinian elite can score worse after a stochastic local search
        let best_cost = self.best_cost().unwrap_or(generation_best);
        self.history.push(best_cost);
        Ok(generation_best)
    }

    /// Create new generation
    fn evolve(&mut self) -> QapResult<()> {
        let size = self.config.population_size;
        let mut offspring: Vec<Vec<usize>> = Vec::with_capacity(size + 1);

        if self.config.elitism {
            if let Some(elite) = self.elite() {
                offspring.push(elite.to_vec());
            }
        }

        while offspring.len() < size {
            let parent1 = tournament_select(
                &self.population,
                &self.fitness,
                self.config.tournament_size,
                &mut self.rng,
            )?
            .to_vec();
            let parent2 = tournament_select(
                &self.population,
                &self.fitness,
                self.config.tournament_size,
                &mut self.rng,
            )?
            .to_vec();

            let (mut child1, mut child2) = if self.rng.gen::<f64>() < self.config.crossover_rate {
                let children = pmx_crossover(&parent1, &parent2, &mut self.rng)?;
                ensure_permutation(&children.0, "crossover")?;
                ensure_permutation(&children.1, "crossover")?;
                children
            } else {
                (parent1, parent2)
            };

            for child in [&mut child1, &mut child2] {
                swap_mutation(child, self.config.mutation_rate, &mut self.rng);
                ensure_permutation(child, "mutation")?;

                if self.config.variant == Variant::Lamarckian {
                    if let Some(ls) = &self.local_search {
                        improve_in_place(ls, &self.instance, child, &mut self.rng)?;
                    }
                }
            }

            offspring.push(child1);
            offspring.push(child2);
        }

        offspring.truncate(size);
        self.population = offspring;
        self.evaluate()?;
        self.generation += 1;

        let generation_best = self.update_best()?;
        let best_cost = self.best_cost().unwrap_or(generation_best);

        if self.generation == 1 || self.generation % 100 == 0 {
            log::info!(
                "[GA] Gen {}  Best cost {:.3}  Diversity {:.2}",
                self.generation,
                best_cost,
                self.population_diversity()
            );
        } else {
            log::debug!(
                "[GA] Gen {}  Generation best {:.3}  Best cost {:.3}",
                self.generation,
                generation_best,
                best_cost
            );
        }

        if let Some(observer) = self.observer.as_mut() {
            observer(self.generation, best_cost);
        }

        Ok(())
    }

    /// Run the genetic algorithm
    pub fn run(&mut self) -> QapResult<Solution> {
        let start = std::time::Instant::now();
        self.config.validate()?;

        self.generation = 0;
        self.history.clear();
        self.best = None;
        self.best_genotype = None;

        self.initialize_population()?;
        self.evaluate()?;
        let initial_best = self.update_best()?;
        log::info!(
            "[GA] Gen 0  Best cost {:.3}  (local search: {})",
            initial_best,
            self.local_search.as_ref().map(|ls| ls.name()).unwrap_or("none")
        );

        while self.generation < self.config.generations {
            self.evolve()?;
        }

        let (permutation, cost) = self
            .best
            .clone()
            .ok_or_else(|| QapError::Config("no individual was evaluated".to_string()))?;
        ensure_permutation(&permutation, "run")?;

        let elapsed = start.elapsed().as_secs_f64();
        log::info!(
            "[GA] Finished {} run: best cost {:.3} after {} generations in {:.2}s",
            self.config.variant,
            cost,
            self.generation,
            elapsed
        );

        Ok(Solution {
            permutation,
            cost,
            algorithm: format!("GA-{}", self.config.variant),
            computation_time: elapsed,
            generations: Some(self.generation),
            history: self.history.clone(),
        })
    }

    /// Individual copied into the next generation by elitism: the best genotype
    /// for Baldwinian runs without write-back, the best phenotype otherwise.
    fn elite(&self) -> Option<&[usize]> {
        if self.config.variant == Variant::Baldwinian && !self.config.baldwinian_write_back {
            self.best_genotype.as_deref()
        } else {
            self.best.as_ref().map(|(permutation, _)| permutation.as_slice())
        }
    }

    pub fn best_cost(&self) -> Option<f64> {
        self.best.as_ref().map(|(_, cost)| *cost)
    }

    pub fn history(&self) -> &[f64] {
        &self.history
    }

    pub fn population(&self) -> &[Vec<usize>] {
        &self.population
    }

    pub fn fitness(&self) -> &[f64] {
        &self.fitness
    }

    /// Get population diversity (average number of differing positions between individuals)
    pub fn population_diversity(&self) -> f64 {
        if self.population.len() < 2 {
            return 0.0;
        }

        let mut total_diff = 0.0;
        let mut count = 0;

        for i in 0..self.population.len().min(20) {
            for j in i + 1..self.population.len().min(20) {
                let diff = self.population[i]
                    .iter()
                    .zip(self.population[j].iter())
                    .filter(|(a, b)| a != b)
                    .count();
                total_diff += diff as f64;
                count += 1;
            }
        }

        if count > 0 {
            total_diff / count as f64
        } else {
            0.0
        }
    }
}

fn improve_in_place(
    local_search: &LocalSearchStrategy,
    instance: &QAPInstance,
    permutation: &mut [usize],
    rng: &mut ChaCha8Rng,
) -> QapResult<()> {
    local_search.improve(instance, permutation, rng);
    ensure_permutation(permutation, "local search")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heuristics::local_search::TwoOptSearch;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn create_test_instance() -> QAPInstance {
        QAPInstance::random(9, 17).unwrap()
    }

    fn small_config(variant: Variant) -> GAConfig {
        GAConfig {
            population_size: 12,
            generations: 15,
            local_search_max_iterations: 20,
            local_search_max_neighbors: 20,
            local_search_subset: 4,
            ..GAConfig::for_variant(variant)
        }
    }

    fn assert_non_increasing(history: &[f64]) {
        for pair in history.windows(2) {
            assert!(pair[1] <= pair[0], "history increased: {:?}", pair);
        }
    }

    #[test]
    fn test_genetic_algorithm() {
        let instance = create_test_instance();
        let mut ga = GeneticAlgorithm::new(instance.clone(), small_config(Variant::Standard));
        let solution = ga.run().unwrap();

        assert_eq!(solution.permutation.len(), 9);
        assert!(ensure_permutation(&solution.permutation, "test").is_ok());
        assert_eq!(solution.cost, instance.cost(&solution.permutation));
        assert_eq!(solution.generations, Some(15));
        assert_eq!(solution.algorithm, "GA-standard");
    }

    #[test]
    fn test_history_is_monotone_for_every_variant() {
        let instance = create_test_instance();
        for variant in Variant::ALL {
            let mut ga = GeneticAlgorithm::new(instance.clone(), small_config(variant));
            let solution = ga.run().unwrap();

            assert_eq!(solution.history.len(), 16, "{}", variant);
            assert_non_increasing(&solution.history);
            assert_eq!(*solution.history.last().unwrap(), solution.cost, "{}", variant);
            assert_eq!(solution.cost, instance.cost(&solution.permutation), "{}", variant);
        }
    }

    #[test]
    fn test_zero_generations() {
        let instance = create_test_instance();
        let config = GAConfig {
            generations: 0,
            ..small_config(Variant::Standard)
        };
        let solution = GeneticAlgorithm::new(instance, config).run().unwrap();
        assert_eq!(solution.history.len(), 1);
        assert_eq!(solution.generations, Some(0));
    }

    #[test]
    fn test_same_seed_same_result() {
        let instance = create_test_instance();
        for variant in Variant::ALL {
            let a = GeneticAlgorithm::new(instance.clone(), small_config(variant)).run().unwrap();
            let b = GeneticAlgorithm::new(instance.clone(), small_config(variant)).run().unwrap();
            assert_eq!(a.permutation, b.permutation);
            assert_eq!(a.history, b.history);
        }
    }

    #[test]
    fn test_greedy_seeding_bounds_result() {
        let instance = create_test_instance();
        let greedy_cost = instance.cost(&GreedyAssignment::assignment(&instance));
        let solution = GeneticAlgorithm::new(instance, small_config(Variant::Standard))
            .run()
            .unwrap();
        assert!(solution.cost <= greedy_cost);
    }

    #[test]
    fn test_baldwinian_keeps_genotypes() {
        let instance = create_test_instance();
        let config = GAConfig {
            generations: 0,
            ..small_config(Variant::Baldwinian)
        };
        let mut ga = GeneticAlgorithm::new(instance.clone(), config);
        ga.run().unwrap();

        let genotype_costs: Vec<f64> = ga.population().iter().map(|p| instance.cost(p)).collect();
        let fitness = ga.fitness();
        assert!(genotype_costs.iter().zip(fitness).all(|(g, f)| f <= g));
        assert!(genotype_costs.iter().zip(fitness).any(|(g, f)| f < g));
    }

    #[test]
    fn test_baldwinian_write_back() {
        let instance = create_test_instance();
        let config = GAConfig {
            generations: 0,
            baldwinian_write_back: true,
            ..small_config(Variant::Baldwinian)
        };
        let mut ga = GeneticAlgorithm::new(instance.clone(), config);
        ga.run().unwrap();

        for (p, &f) in ga.population().iter().zip(ga.fitness()) {
            assert_eq!(instance.cost(p), f);
        }
    }

    #[test]
    fn test_lamarckian_improves_initial_subset() {
        let instance = create_test_instance();
        let config = GAConfig {
            generations: 0,
            local_search: LocalSearchKind::TwoOpt,
            local_search_max_iterations: 10_000,
            ..small_config(Variant::Lamarckian)
        };
        let mut ga = GeneticAlgorithm::new(instance.clone(), config);
        ga.run().unwrap();

        let mut rng = ChaCha8Rng::seed_from_u64(0);
        for individual in ga.population().iter().take(4) {
            assert!(is_two_opt_optimal(&instance, individual, &mut rng));
        }
    }

    fn is_two_opt_optimal(instance: &QAPInstance, individual: &[usize], rng: &mut ChaCha8Rng) -> bool {
        let mut candidate = individual.to_vec();
        TwoOptSearch::new().improve(instance, &mut candidate, rng).moves == 0
    }

    /// Run initialization and the first evaluation without any generation.
    fn start(ga: &mut GeneticAlgorithm) {
        ga.config.validate().unwrap();
        ga.initialize_population().unwrap();
        ga.evaluate().unwrap();
        ga.update_best().unwrap();
    }

    #[test]
    fn test_lamarckian_offspring_are_local_optima() {
        let instance = create_test_instance();
        let config = GAConfig {
            local_search: LocalSearchKind::TwoOpt,
            local_search_max_iterations: 10_000,
            ..small_config(Variant::Lamarckian)
        };
        let mut ga = GeneticAlgorithm::new(instance.clone(), config);
        start(&mut ga);

        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..4 {
            ga.evolve().unwrap();
            // index 0 is the elite, every other member is an improved child
            for child in ga.population().iter().skip(1) {
                assert!(is_two_opt_optimal(&instance, child, &mut rng));
            }
        }
    }

    #[test]
    fn test_baldwinian_elite_keeps_its_genotype() {
        let instance = create_test_instance();
        let mut ga = GeneticAlgorithm::new(instance.clone(), small_config(Variant::Baldwinian));
        start(&mut ga);

        let mut rng = ChaCha8Rng::seed_from_u64(2);
        for _ in 0..5 {
            let genotype = ga.best_genotype.clone().unwrap();
            ga.evolve().unwrap();
            assert_eq!(ga.population()[0], genotype);

            // 2-opt is deterministic, so improving the genotype gives back the tracked best
            let mut improved = ga.best_genotype.clone().unwrap();
            let ls = ga.local_search.as_ref().unwrap();
            let outcome = ls.improve(&instance, &mut improved, &mut rng);
            let (phenotype, cost) = ga.best.clone().unwrap();
            assert_eq!(improved, phenotype);
            assert_eq!(outcome.cost, cost);
        }

        let genotype_costs: Vec<f64> = ga.population().iter().map(|p| instance.cost(p)).collect();
        assert!(genotype_costs.iter().zip(ga.fitness()).any(|(g, f)| f < g));
    }

    #[test]
    fn test_baldwinian_write_back_carries_phenotype() {
        let instance = create_test_instance();
        let config = GAConfig {
            baldwinian_write_back: true,
            local_search_max_iterations: 10_000,
            ..small_config(Variant::Baldwinian)
        };
        let mut ga = GeneticAlgorithm::new(instance.clone(), config);
        start(&mut ga);

        for _ in 0..3 {
            let (phenotype, _) = ga.best.clone().unwrap();
            ga.evolve().unwrap();
            assert_eq!(ga.population()[0], phenotype);
            for (p, &f) in ga.population().iter().zip(ga.fitness()) {
                assert_eq!(instance.cost(p), f);
            }
        }
    }

    #[test]
    fn test_observer_sees_every_generation() {
        let instance = create_test_instance();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);

        let mut ga = GeneticAlgorithm::new(instance, small_config(Variant::Standard));
        ga.on_generation(move |generation, cost| sink.borrow_mut().push((generation, cost)));
        let solution = ga.run().unwrap();

        let seen = seen.borrow();
        assert_eq!(seen.len(), 15);
        assert_eq!(seen[0].0, 1);
        assert_eq!(seen.last().unwrap().1, solution.cost);
    }

    #[test]
    fn test_config_validation() {
        let valid = GAConfig::default();
        assert!(valid.validate().is_ok());

        let invalid = [
            GAConfig { population_size: 1, ..GAConfig::default() },
            GAConfig { tournament_size: 0, ..GAConfig::default() },
            GAConfig { population_size: 4, tournament_size: 5, ..GAConfig::default() },
            GAConfig { crossover_rate: 1.5, ..GAConfig::default() },
            GAConfig { mutation_rate: -0.1, ..GAConfig::default() },
            GAConfig { mutation_rate: f64::NAN, ..GAConfig::default() },
            GAConfig { local_search_max_iterations: 0, ..GAConfig::default() },
            GAConfig { local_search_max_neighbors: 0, ..GAConfig::default() },
            GAConfig { local_search_subset: 0, ..GAConfig::default() },
        ];
        for config in invalid {
            assert!(matches!(config.validate(), Err(QapError::Config(_))), "{:?}", config);
        }
    }

    #[test]
    fn test_invalid_config_stops_run() {
        let instance = create_test_instance();
        let config = GAConfig {
            population_size: 1,
            ..GAConfig::default()
        };
        let mut ga = GeneticAlgorithm::new(instance, config);
        assert!(ga.run().is_err());
        assert!(ga.history().is_empty());
    }

    #[test]
    fn test_config_from_json_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "variant": "lamarckian", "population_size": 30 }"#).unwrap();

        let config = GAConfig::from_json_file(&path).unwrap();
        assert_eq!(config.variant, Variant::Lamarckian);
        assert_eq!(config.population_size, 30);
        assert_eq!(config.generations, 500);
        assert_eq!(config.tournament_size, 3);
        assert_eq!(config.local_search, LocalSearchKind::SampledSwap);
    }

    #[test]
    fn test_config_from_json_follows_variant_defaults() {
        let standard = GAConfig::from_json_str(r#"{ "variant": "standard" }"#, None).unwrap();
        assert!(standard.greedy_seeding);

        let empty = GAConfig::from_json_str("{}", None).unwrap();
        assert_eq!(empty.variant, Variant::Standard);
        assert!(empty.greedy_seeding);

        // explicit keys still win over the variant defaults
        let explicit = GAConfig::from_json_str(
            r#"{ "variant": "lamarckian", "local_search": "two-opt" }"#,
            None,
        )
        .unwrap();
        assert_eq!(explicit.local_search, LocalSearchKind::TwoOpt);

        // a variant given on top of the file takes that variant's defaults
        let switched = GAConfig::from_json_str(
            r#"{ "variant": "baldwinian", "generations": 7 }"#,
            Some(Variant::Lamarckian),
        )
        .unwrap();
        assert_eq!(switched.variant, Variant::Lamarckian);
        assert_eq!(switched.local_search, LocalSearchKind::SampledSwap);
        assert_eq!(switched.generations, 7);

        assert!(matches!(
            GAConfig::from_json_str("[1, 2]", None),
            Err(QapError::Config(_))
        ));
        assert!(GAConfig::from_json_str(r#"{ "variant": "unknown" }"#, None).is_err());
    }

    #[test]
    fn test_variant_defaults() {
        assert!(GAConfig::for_variant(Variant::Standard).greedy_seeding);
        assert_eq!(
            GAConfig::for_variant(Variant::Lamarckian).local_search,
            LocalSearchKind::SampledSwap
        );
        assert!(!Variant::Standard.uses_local_search());
        assert!(Variant::Baldwinian.uses_local_search());
    }
}
