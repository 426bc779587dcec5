use clap::Parser;
use qap_solver::output::read_history_json;
use qap_solver::visualization::Visualizer;
use std::path::PathBuf;

/// Render saved fitness histories as one comparison chart
#[derive(Parser)]
#[command(name = "plot-history")]
#[command(about = "Plot history_*.json files written by qap-solver")]
struct Args {
    /// History JSON files
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Output path without extension
    #[arg(short, long, default_value = "comparison_history")]
    output: PathBuf,

    /// Chart title
    #[arg(short, long, default_value = "Fitness history comparison")]
    title: String,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let mut series = Vec::new();
    for path in &args.files {
        match read_history_json(path) {
            Ok(history) => {
                let stem = path.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_default();
                let label = stem.strip_prefix("history_").unwrap_or(&stem).to_string();
                series.push((label, history));
            }
            Err(e) => eprintln!("Failed to read {:?}: {}", path, e),
        }
    }

    if series.is_empty() {
        eprintln!("No history could be read");
        std::process::exit(1);
    }

    let viz = Visualizer::new();
    let svg = viz.generate_comparison_svg(&series, &args.title);
    let png_path = args.output.with_extension("png");
    match viz.save_png(&svg, &png_path) {
        Ok(()) => println!("Chart saved to {:?}", png_path),
        Err(e) => {
            let svg_path = args.output.with_extension("svg");
            if let Err(write_err) = viz.save_svg(&svg, &svg_path) {
                eprintln!("Failed to save chart: {}", write_err);
                std::process::exit(1);
            }
            println!("PNG conversion failed ({}). Saved SVG to {:?}", e, svg_path);
        }
    }
}
