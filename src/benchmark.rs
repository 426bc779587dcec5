//! Benchmarking and experimentation module for the QAP.
//!
//! Runs every GA variant several times per instance, collects statistics
//! and compares variant performance.

use crate::error::QapResult;
use crate::heuristics::genetic::{GAConfig, GeneticAlgorithm, Variant};
use crate::instance::QAPInstance;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

/// Result of a single GA run on an instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantResult {
    /// GA variant
    pub variant: Variant,
    /// Instance name
    pub instance: String,
    /// Instance dimension
    pub dimension: usize,
    /// Run index
    pub run: usize,
    /// Seed used for this run
    pub seed: u64,
    /// Best cost found
    pub cost: f64,
    /// Computation time in seconds
    pub time: f64,
    /// Generations run
    pub generations: usize,
}

/// Aggregated statistics for a variant on one instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantStatistics {
    pub instance: String,
    pub variant: Variant,
    /// Number of runs
    pub num_runs: usize,
    /// Best cost
    pub best_cost: f64,
    /// Worst cost
    pub worst_cost: f64,
    /// Mean cost
    pub mean_cost: f64,
    /// Sample standard deviation of cost (0 for a single run)
    pub std_cost: f64,
    /// Average time
    pub avg_time: f64,
}

/// Benchmark configuration
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Number of runs per variant
    pub num_runs: usize,
    /// Run `r` uses seed `base_seed + r`, wrapping at `u64::MAX`
    pub base_seed: u64,
    /// Run in parallel
    pub parallel: bool,
    /// One configuration per compared variant; their seeds are overridden
    pub configs: Vec<GAConfig>,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        BenchmarkConfig {
            num_runs: 5,
            base_seed: 42,
            parallel: true,
            configs: Variant::ALL.iter().map(|&v| GAConfig::for_variant(v)).collect(),
        }
    }
}

/// Benchmarking engine
pub struct Benchmark {
    config: BenchmarkConfig,
    results: Vec<VariantResult>,
    /// First-run history per (instance, variant)
    histories: BTreeMap<(String, Variant), Vec<f64>>,
}

impl Benchmark {
    pub fn new(config: BenchmarkConfig) -> Self {
        Benchmark {
            config,
            results: Vec::new(),
            histories: BTreeMap::new(),
        }
    }

    /// Run every configured variant `num_runs` times on an instance
    pub fn compare_variants(&mut self, instance: &QAPInstance) -> QapResult<()> {
        for config in &self.config.configs {
            config.validate()?;
        }

        log::info!(
            "Running benchmark on instance: {} ({} variants x {} runs)",
            instance.name,
            self.config.configs.len(),
            self.config.num_runs
        );

        let jobs: Vec<(usize, usize)> = (0..self.config.configs.len())
            .flat_map(|c| (0..self.config.num_runs).map(move |run| (c, run)))
            .collect();

        let configs = &self.config.configs;
        let base_seed = self.config.base_seed;
        let run_job = |&(c, run): &(usize, usize)| -> QapResult<(VariantResult, Vec<f64>)> {
            let seed = base_seed.wrapping_add(run as u64);
            let config = GAConfig {
                seed,
                ..configs[c].clone()
            };
            let variant = config.variant;
            let solution = GeneticAlgorithm::new(instance.clone(), config).run()?;

            log::debug!("{} run {} on {}: {:.3}", variant, run, instance.name, solution.cost);
            let result = VariantResult {
                variant,
                instance: instance.name.clone(),
                dimension: instance.dimension,
                run,
                seed,
                cost: solution.cost,
                time: solution.computation_time,
                generations: solution.generations.unwrap_or(0),
            };
            Ok((result, solution.history))
        };

        let outcomes: Vec<(VariantResult, Vec<f64>)> = if self.config.parallel {
            jobs.par_iter().map(&run_job).collect::<QapResult<_>>()?
        } else {
            jobs.iter().map(&run_job).collect::<QapResult<_>>()?
        };

        for (result, history) in outcomes {
            if result.run == 0 {
                self.histories
                    .insert((result.instance.clone(), result.variant), history);
            }
            self.results.push(result);
        }
        Ok(())
    }

    /// Run the comparison on multiple instances
    pub fn run_on_instances(&mut self, instances: &[QAPInstance]) -> QapResult<()> {
        for instance in instances {
            self.compare_variants(instance)?;
        }
        Ok(())
    }

    /// Labelled first-run histories of an instance, ready for a comparison chart
    pub fn histories_for(&self, instance: &str) -> Vec<(String, Vec<f64>)> {
        self.histories
            .iter()
            .filter(|((name, _), _)| name == instance)
            .map(|((_, variant), history)| (variant.to_string(), history.clone()))
            .collect()
    }

    /// Compute statistics for each (instance, variant) pair
    pub fn compute_statistics(&self) -> Vec<VariantStatistics> {
        let mut groups: BTreeMap<(String, Variant), Vec<&VariantResult>> = BTreeMap::new();

        for result in &self.results {
            groups
                .entry((result.instance.clone(), result.variant))
                .or_default()
                .push(result);
        }

        groups
            .into_iter()
            .map(|((instance, variant), results)| {
                let costs: Vec<f64> = results.iter().map(|r| r.cost).collect();
                let times: Vec<f64> = results.iter().map(|r| r.time).collect();

                let std_cost = if costs.len() < 2 { 0.0 } else { costs.iter().std_dev() };

                VariantStatistics {
                    instance,
                    variant,
                    num_runs: results.len(),
                    best_cost: costs.iter().cloned().fold(f64::INFINITY, f64::min),
                    worst_cost: costs.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
                    mean_cost: costs.iter().mean(),
                    std_cost,
                    avg_time: times.iter().mean(),
                }
            })
            .collect()
    }

    /// Export results to CSV
    pub fn export_to_csv<P: AsRef<Path>>(&self, path: P) -> QapResult<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for result in &self.results {
            writer.serialize(result)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Export statistics to CSV
    pub fn export_statistics_csv<P: AsRef<Path>>(&self, path: P) -> QapResult<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for stat in self.compute_statistics() {
            writer.serialize(stat)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Generate summary report
    pub fn generate_report(&self) -> String {
        let mut report = String::new();

        report.push_str("========================================\n");
        report.push_str("      QAP Variant Comparison Report\n");
        report.push_str("========================================\n\n");

        let stats = self.compute_statistics();

        report.push_str("Variant Performance Summary:\n");
        report.push_str("-".repeat(90).as_str());
        report.push('\n');
        report.push_str(&format!(
            "{:<15} {:<12} {:>5} {:>12} {:>12} {:>10} {:>12} {:>10}\n",
            "Instance", "Variant", "Runs", "Best", "Mean", "Std", "Worst", "Avg Time"
        ));
        report.push_str("-".repeat(90).as_str());
        report.push('\n');

        for stat in &stats {
            report.push_str(&format!(
                "{:<15} {:<12} {:>5} {:>12.2} {:>12.2} {:>10.2} {:>12.2} {:>10.4}\n",
                stat.instance,
                stat.variant.name(),
                stat.num_runs,
                stat.best_cost,
                stat.mean_cost,
                stat.std_cost,
                stat.worst_cost,
                stat.avg_time
            ));
        }

        report.push_str("-".repeat(90).as_str());
        report.push('\n');

        report.push_str("\nBest Solutions per Instance:\n");
        let mut instance_best: BTreeMap<&str, &VariantResult> = BTreeMap::new();
        for result in &self.results {
            let entry = instance_best.entry(result.instance.as_str()).or_insert(result);
            if result.cost < entry.cost {
                *entry = result;
            }
        }

        for (instance, best) in &instance_best {
            report.push_str(&format!(
                "  {}: {:.2} ({}, seed {})\n",
                instance, best.cost, best.variant, best.seed
            ));
        }

        report
    }

    /// Get all results
    pub fn results(&self) -> &[VariantResult] {
        &self.results
    }
}

/// Helper function to load `.dat` instances from a directory, sorted by file name
pub fn load_instances_from_dir<P: AsRef<Path>>(dir: P) -> QapResult<Vec<QAPInstance>> {
    let mut paths: Vec<_> = std::fs::read_dir(dir)?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.extension().map(|e| e == "dat").unwrap_or(false))
        .collect();
    paths.sort();

    let mut instances = Vec::new();
    for path in paths {
        match QAPInstance::from_file(&path) {
            Ok(instance) => instances.push(instance),
            Err(e) => log::warn!("Skipping {}: {}", path.display(), e),
        }
    }

    Ok(instances)
}
