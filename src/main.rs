//! QAP Solver - Command Line Interface
//!
//! Hybrid genetic / local-search solver for the Quadratic Assignment Problem.

use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use qap_solver::benchmark::{load_instances_from_dir, Benchmark, BenchmarkConfig};
use qap_solver::heuristics::construction::{ConstructionHeuristic, GreedyAssignment, RandomAssignment};
use qap_solver::heuristics::genetic::{GAConfig, GeneticAlgorithm, Variant};
use qap_solver::heuristics::local_search::{LocalSearch, LocalSearchKind, TwoOptSearch};
use qap_solver::instance::QAPInstance;
use qap_solver::output::{self, RunRecord};
use qap_solver::visualization::Visualizer;
use qap_solver::QapResult;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "qap-solver")]
#[command(author = "M2 AI2D Student")]
#[command(version = "1.0")]
#[command(about = "Hybrid genetic algorithm for the Quadratic Assignment Problem")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Debug-level logging (RUST_LOG still takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Also append log lines to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve an instance with one GA variant
    Solve {
        #[arg(short, long)]
        instance: PathBuf,

        /// GA variant
        #[arg(long, value_enum)]
        variant: Option<VariantArg>,

        /// JSON configuration file; command-line options override its values
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Population size
        #[arg(short, long)]
        population: Option<usize>,

        /// Number of generations
        #[arg(short, long)]
        generations: Option<usize>,

        /// Crossover probability
        #[arg(long)]
        crossover_rate: Option<f64>,

        /// Mutation probability
        #[arg(long)]
        mutation_rate: Option<f64>,

        /// Disable elitism
        #[arg(long)]
        no_elitism: bool,

        /// Tournament size
        #[arg(short = 'k', long)]
        tournament_size: Option<usize>,

        /// Random seed
        #[arg(short, long)]
        seed: Option<u64>,

        /// Local search for the Baldwinian and Lamarckian variants
        #[arg(long, value_enum)]
        local_search: Option<LocalSearchArg>,

        /// Initial individuals improved by the Lamarckian variant
        #[arg(long)]
        ls_subset: Option<usize>,

        /// Local search move / iteration budget
        #[arg(long)]
        ls_max_iterations: Option<usize>,

        /// Swap pairs sampled per iteration
        #[arg(long)]
        ls_max_neighbors: Option<usize>,

        /// Seed half of the initial population with the greedy assignment
        #[arg(long)]
        greedy_seeding: bool,

        /// Baldwinian: write improved phenotypes back into the population
        #[arg(long)]
        write_back: bool,

        /// Output directory for result files
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Skip the fitness history chart
        #[arg(long)]
        no_plot: bool,
    },

    /// Compare the three GA variants on an instance
    Compare {
        /// Path to the instance file
        #[arg(short, long)]
        instance: PathBuf,

        /// Number of runs per variant
        #[arg(short, long, default_value = "5")]
        runs: usize,

        /// Population size for every variant
        #[arg(short, long)]
        population: Option<usize>,

        /// Generations for every variant
        #[arg(short, long)]
        generations: Option<usize>,

        /// Seed of the first run
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Run sequentially instead of in parallel
        #[arg(long)]
        sequential: bool,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,
    },

    /// Run the variant comparison on a directory of instances
    Benchmark {
        /// Directory containing `.dat` instance files
        #[arg(short, long)]
        dir: PathBuf,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Number of runs per variant
        #[arg(short, long, default_value = "5")]
        runs: usize,

        /// Population size for every variant
        #[arg(short, long)]
        population: Option<usize>,

        /// Generations for every variant
        #[arg(short, long)]
        generations: Option<usize>,

        /// Maximum instance size
        #[arg(long)]
        max_size: Option<usize>,
    },

    /// Analyze an instance
    Analyze {
        /// Path to the instance file
        #[arg(short, long)]
        instance: PathBuf,
    },

    /// Write a random instance
    Generate {
        /// Number of facilities
        #[arg(short = 'n', long)]
        size: usize,

        /// Random seed
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum VariantArg {
    /// Plain GA, greedy-seeded
    Standard,
    /// Fitness from locally improved copies, genotypes unchanged
    Baldwinian,
    /// Locally improved individuals replace their genotypes
    Lamarckian,
}

impl From<VariantArg> for Variant {
    fn from(arg: VariantArg) -> Self {
        match arg {
            VariantArg::Standard => Variant::Standard,
            VariantArg::Baldwinian => Variant::Baldwinian,
            VariantArg::Lamarckian => Variant::Lamarckian,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum LocalSearchArg {
    /// First-improvement segment reversal
    TwoOpt,
    /// Best of a random sample of swaps
    SampledSwap,
}

impl From<LocalSearchArg> for LocalSearchKind {
    fn from(arg: LocalSearchArg) -> Self {
        match arg {
            LocalSearchArg::TwoOpt => LocalSearchKind::TwoOpt,
            LocalSearchArg::SampledSwap => LocalSearchKind::SampledSwap,
        }
    }
}

/// Command-line overrides applied on top of a base configuration
struct SolveOverrides {
    population: Option<usize>,
    generations: Option<usize>,
    crossover_rate: Option<f64>,
    mutation_rate: Option<f64>,
    no_elitism: bool,
    tournament_size: Option<usize>,
    seed: Option<u64>,
    local_search: Option<LocalSearchArg>,
    ls_subset: Option<usize>,
    ls_max_iterations: Option<usize>,
    ls_max_neighbors: Option<usize>,
    greedy_seeding: bool,
    write_back: bool,
}

impl SolveOverrides {
    fn apply(&self, config: &mut GAConfig) {
        if let Some(v) = self.population {
            config.population_size = v;
        }
        if let Some(v) = self.generations {
            config.generations = v;
        }
        if let Some(v) = self.crossover_rate {
            config.crossover_rate = v;
        }
        if let Some(v) = self.mutation_rate {
            config.mutation_rate = v;
        }
        if self.no_elitism {
            config.elitism = false;
        }
        if let Some(v) = self.tournament_size {
            config.tournament_size = v;
        }
        if let Some(v) = self.seed {
            config.seed = v;
        }
        if let Some(v) = self.local_search {
            config.local_search = v.into();
        }
        if let Some(v) = self.ls_subset {
            config.local_search_subset = v;
        }
        if let Some(v) = self.ls_max_iterations {
            config.local_search_max_iterations = v;
        }
        if let Some(v) = self.ls_max_neighbors {
            config.local_search_max_neighbors = v;
        }
        if self.greedy_seeding {
            config.greedy_seeding = true;
        }
        if self.write_back {
            config.baldwinian_write_back = true;
        }
    }
}

/// Writes every log line to stderr and to a file
struct TeeWriter {
    file: File,
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        std::io::stderr().write_all(buf)?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        std::io::stderr().flush()?;
        self.file.flush()
    }
}

fn init_logging(verbose: bool, log_file: Option<&Path>) -> QapResult<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level));

    if let Some(path) = log_file {
        let file = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
        builder.target(env_logger::Target::Pipe(Box::new(TeeWriter { file })));
    }

    builder.init();
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose, cli.log_file.as_deref()) {
        eprintln!("Error opening log file: {}", e);
        std::process::exit(1);
    }

    let result = match cli.command {
        Commands::Solve {
            instance,
            variant,
            config,
            population,
            generations,
            crossover_rate,
            mutation_rate,
            no_elitism,
            tournament_size,
            seed,
            local_search,
            ls_subset,
            ls_max_iterations,
            ls_max_neighbors,
            greedy_seeding,
            write_back,
            output,
            no_plot,
        } => {
            let overrides = SolveOverrides {
                population,
                generations,
                crossover_rate,
                mutation_rate,
                no_elitism,
                tournament_size,
                seed,
                local_search,
                ls_subset,
                ls_max_iterations,
                ls_max_neighbors,
                greedy_seeding,
                write_back,
            };
            solve_instance(
                &instance,
                variant.map(Variant::from),
                config.as_deref(),
                &overrides,
                &output,
                !no_plot,
                cli.verbose,
            )
        }

        Commands::Compare {
            instance,
            runs,
            population,
            generations,
            seed,
            sequential,
            output,
        } => compare_variants(&instance, runs, population, generations, seed, !sequential, &output),

        Commands::Benchmark {
            dir,
            output,
            runs,
            population,
            generations,
            max_size,
        } => run_benchmark(&dir, &output, runs, population, generations, max_size),

        Commands::Analyze { instance } => analyze_instance(&instance),

        Commands::Generate { size, seed, output } => generate_instance(size, seed, &output),
    };

    if let Err(e) = result {
        log::error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load_instance(path: &Path) -> QapResult<QAPInstance> {
    println!("Loading instance from {:?}...", path);
    let instance = QAPInstance::from_file(path)?;
    log::info!("Loaded {} (n={})", instance.name, instance.dimension);
    Ok(instance)
}

/// Save a chart as PNG, falling back to SVG when no renderer is available
fn save_chart(viz: &Visualizer, svg: &str, base: &Path) -> QapResult<PathBuf> {
    let png_path = base.with_extension("png");
    match viz.save_png(svg, &png_path) {
        Ok(()) => Ok(png_path),
        Err(e) => {
            let svg_path = base.with_extension("svg");
            viz.save_svg(svg, &svg_path)?;
            log::warn!("PNG conversion failed ({}), saved SVG instead", e);
            Ok(svg_path)
        }
    }
}

fn solve_instance(
    path: &Path,
    variant: Option<Variant>,
    config_path: Option<&Path>,
    overrides: &SolveOverrides,
    output: &Path,
    visualize: bool,
    verbose: bool,
) -> QapResult<()> {
    let instance = load_instance(path)?;

    let mut config = match config_path {
        Some(file) => GAConfig::from_json_file_as(file, variant)?,
        None => GAConfig::for_variant(variant.unwrap_or(Variant::Standard)),
    };
    overrides.apply(&mut config);
    config.validate()?;

    if verbose {
        println!("{}", instance.statistics());
        println!("Configuration: {:?}", config);
    }

    let progress = if verbose {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(config.generations as u64)
    };
    progress.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} gen  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let mut ga = GeneticAlgorithm::new(instance.clone(), config.clone());
    let bar = progress.clone();
    ga.on_generation(move |generation, best| {
        bar.set_position(generation as u64);
        bar.set_message(format!("best {:.2}", best));
    });

    let result = ga.run();
    progress.finish_and_clear();
    let mut solution = result?;
    solution.validate(&instance)?;

    println!("\n========== Results ==========");
    println!("Instance: {} (n={})", instance.name, instance.dimension);
    println!("Algorithm: {}", solution.algorithm);
    println!("Cost: {:.2}", solution.cost);
    println!("Time: {:.4}s", solution.computation_time);
    if let Some(generations) = solution.generations {
        println!("Generations: {}", generations);
    }
    if let Some(ratio) = solution.improvement_ratio() {
        println!("Improvement over initial population: {:.2}%", ratio);
    }
    if verbose {
        println!("\nPermutation: {:?}", solution.permutation);
    }

    let record = RunRecord::new(&instance.name, &config, &solution);
    let written = output::write_run(output, &record)?;
    for path in &written {
        println!("Saved {:?}", path);
    }

    if visualize {
        let viz = Visualizer::new();
        let title = format!("{} - {} GA", instance.name, config.variant);
        let svg = viz.generate_history_svg(&solution.history, &title);
        let base = output.join(format!("history_{}", config.variant));
        let chart = save_chart(&viz, &svg, &base)?;
        println!("Visualization saved to {:?}", chart);
    }

    Ok(())
}

fn variant_configs(population: Option<usize>, generations: Option<usize>) -> Vec<GAConfig> {
    Variant::ALL
        .iter()
        .map(|&v| {
            let mut config = GAConfig::for_variant(v);
            if let Some(p) = population {
                config.population_size = p;
            }
            if let Some(g) = generations {
                config.generations = g;
            }
            config
        })
        .collect()
}

fn print_summary(benchmark: &Benchmark) {
    println!("\n========== Summary ==========");
    println!(
        "{:<15} {:<12} {:>10} {:>10} {:>10} {:>10} {:>10}",
        "Instance", "Variant", "Best", "Mean", "Std", "Worst", "Avg Time"
    );
    println!("{}", "-".repeat(83));

    for stat in benchmark.compute_statistics() {
        println!(
            "{:<15} {:<12} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>10.4}",
            stat.instance,
            stat.variant,
            stat.best_cost,
            stat.mean_cost,
            stat.std_cost,
            stat.worst_cost,
            stat.avg_time
        );
    }
}

fn save_benchmark_files(benchmark: &Benchmark, output: &Path) -> QapResult<()> {
    std::fs::create_dir_all(output)?;

    let results_path = output.join("results.csv");
    benchmark.export_to_csv(&results_path)?;
    println!("\nResults exported to {:?}", results_path);

    let stats_path = output.join("statistics.csv");
    benchmark.export_statistics_csv(&stats_path)?;
    println!("Statistics exported to {:?}", stats_path);

    let report_path = output.join("report.txt");
    std::fs::write(&report_path, benchmark.generate_report())?;
    println!("Report saved to {:?}", report_path);
    Ok(())
}

fn compare_variants(
    path: &Path,
    runs: usize,
    population: Option<usize>,
    generations: Option<usize>,
    seed: u64,
    parallel: bool,
    output: &Path,
) -> QapResult<()> {
    let instance = load_instance(path)?;
    println!(
        "Comparing variants on {} (n={}), {} runs each...",
        instance.name, instance.dimension, runs
    );

    let config = BenchmarkConfig {
        num_runs: runs,
        base_seed: seed,
        parallel,
        configs: variant_configs(population, generations),
    };
    let mut benchmark = Benchmark::new(config);
    benchmark.compare_variants(&instance)?;

    print_summary(&benchmark);
    save_benchmark_files(&benchmark, output)?;

    let series = benchmark.histories_for(&instance.name);
    for (label, history) in &series {
        output::write_history_json(history, output.join(format!("history_{}.json", label)))?;
    }

    let viz = Visualizer::new();
    let title = format!("{} - fitness history comparison", instance.name);
    let svg = viz.generate_comparison_svg(&series, &title);
    let chart = save_chart(&viz, &svg, &output.join("comparison_history"))?;
    println!("Comparison chart saved to {:?}", chart);

    std::fs::write(output.join("comparison_history.csv"), viz.export_plot_data(&series))?;
    Ok(())
}

fn run_benchmark(
    dir: &Path,
    output: &Path,
    runs: usize,
    population: Option<usize>,
    generations: Option<usize>,
    max_size: Option<usize>,
) -> QapResult<()> {
    println!("Loading instances from {:?}...", dir);
    let mut instances = load_instances_from_dir(dir)?;
    if let Some(max) = max_size {
        instances.retain(|i| i.dimension <= max);
    }
    println!("Found {} instances", instances.len());

    let config = BenchmarkConfig {
        num_runs: runs,
        configs: variant_configs(population, generations),
        ..Default::default()
    };
    let mut benchmark = Benchmark::new(config);
    benchmark.run_on_instances(&instances)?;

    print!("\n{}", benchmark.generate_report());
    save_benchmark_files(&benchmark, output)
}

fn analyze_instance(path: &Path) -> QapResult<()> {
    let instance = load_instance(path)?;

    println!("========== Instance Analysis ==========\n");
    println!("{}", instance.statistics());

    let mut rng = ChaCha8Rng::seed_from_u64(0);
    let random_costs: Vec<f64> = (0..100)
        .map(|_| RandomAssignment.construct(&instance, &mut rng).cost)
        .collect();
    let avg_random = random_costs.iter().sum::<f64>() / random_costs.len() as f64;
    let best_random = random_costs.iter().cloned().fold(f64::INFINITY, f64::min);

    let greedy = GreedyAssignment.construct(&instance, &mut rng);
    let mut improved = greedy.permutation.clone();
    let outcome = TwoOptSearch::new().improve(&instance, &mut improved, &mut rng);

    println!("\nQuick Solution Estimates:");
    println!("  Random (100 samples): avg {:.2}, best {:.2}", avg_random, best_random);
    println!("  Greedy: {:.2}", greedy.cost);
    println!("  Greedy + 2-opt: {:.2} ({} moves)", outcome.cost, outcome.moves);
    Ok(())
}

fn generate_instance(size: usize, seed: u64, output: &Path) -> QapResult<()> {
    let instance = QAPInstance::random(size, seed)?;
    instance.to_file(output)?;
    println!("Random instance {} written to {:?}", instance.name, output);
    Ok(())
}
