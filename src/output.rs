//! Result files written after a run.
//!
//! Layout of an output directory after `solve`:
//! - `best_solution.txt`: cost and permutation in plain text
//! - `solution_{variant}.json`: full [`RunRecord`]
//! - `history_{variant}.json` / `history_{variant}.csv`: best cost per generation

use crate::error::QapResult;
use crate::heuristics::genetic::{GAConfig, Variant};
use crate::solution::Solution;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Everything needed to reproduce and inspect one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub instance: String,
    pub variant: Variant,
    pub config: GAConfig,
    pub solution: Solution,
    pub created_at: DateTime<Local>,
}

impl RunRecord {
    pub fn new(instance: &str, config: &GAConfig, solution: &Solution) -> Self {
        RunRecord {
            instance: instance.to_string(),
            variant: config.variant,
            config: config.clone(),
            solution: solution.clone(),
            created_at: Local::now(),
        }
    }
}

/// One row of a history CSV
#[derive(Debug, Serialize, Deserialize)]
struct HistoryRow {
    generation: usize,
    best_cost: f64,
}

pub fn history_file_name(variant: Variant, extension: &str) -> String {
    format!("history_{}.{}", variant, extension)
}

/// Plain-text best solution: the cost on the first line, then the permutation.
pub fn write_solution_text<P: AsRef<Path>>(solution: &Solution, path: P) -> QapResult<()> {
    let mut file = File::create(path)?;
    writeln!(file, "{}", solution.cost)?;
    let permutation: Vec<String> = solution.permutation.iter().map(|l| l.to_string()).collect();
    writeln!(file, "Permutation: {}", permutation.join(" "))?;
    Ok(())
}

pub fn write_solution_json<P: AsRef<Path>>(record: &RunRecord, path: P) -> QapResult<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, record)?;
    Ok(())
}

pub fn write_history_json<P: AsRef<Path>>(history: &[f64], path: P) -> QapResult<()> {
    let file = File::create(path)?;
    serde_json::to_writer(file, history)?;
    Ok(())
}

pub fn read_history_json<P: AsRef<Path>>(path: P) -> QapResult<Vec<f64>> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Export a history to CSV with a `generation,best_cost` header
pub fn write_history_csv<P: AsRef<Path>>(history: &[f64], path: P) -> QapResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for (generation, &best_cost) in history.iter().enumerate() {
        writer.serialize(HistoryRow {
            generation,
            best_cost,
        })?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the text, JSON and history files of a run into `dir`; returns the paths written.
pub fn write_run(dir: &Path, record: &RunRecord) -> QapResult<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let variant = record.variant;

    let paths = vec![
        dir.join("best_solution.txt"),
        dir.join(format!("solution_{}.json", variant)),
        dir.join(history_file_name(variant, "json")),
        dir.join(history_file_name(variant, "csv")),
    ];

    write_solution_text(&record.solution, &paths[0])?;
    write_solution_json(record, &paths[1])?;
    write_history_json(&record.solution.history, &paths[2])?;
    write_history_csv(&record.solution.history, &paths[3])?;

    log::info!("Results written to {}", dir.display());
    Ok(paths)
}
