//! Visualization utilities for GA runs.
//!
//! Generates SVG line charts of best-cost histories and exports for plotting.

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::process::Command;
#[cfg(feature = "png")]
use resvg::render;
#[cfg(feature = "png")]
use resvg::tiny_skia::{Pixmap, Transform};
#[cfg(feature = "png")]
use resvg::usvg;
#[cfg(feature = "png")]
use resvg::usvg::TreeParsing;
#[cfg(feature = "png")]
use resvg::FitTo;

const PALETTE: [&str; 6] = ["#3498db", "#e74c3c", "#2ecc71", "#f39c12", "#9b59b6", "#1abc9c"];

/// SVG chart generator
pub struct Visualizer {
    /// Canvas width
    pub width: f64,
    /// Canvas height
    pub height: f64,
    /// Margin
    pub margin: f64,
    /// Stroke width of the history lines
    pub line_width: f64,
}

impl Default for Visualizer {
    fn default() -> Self {
        Visualizer {
            width: 800.0,
            height: 500.0,
            margin: 60.0,
            line_width: 2.0,
        }
    }
}

/// Value range covered by the plotted series
struct PlotBounds {
    generations: usize,
    min_cost: f64,
    max_cost: f64,
}

impl PlotBounds {
    fn from_series<'a, I>(series: I) -> Self
    where
        I: IntoIterator<Item = &'a [f64]>,
    {
        let mut generations = 0;
        let mut min_cost = f64::INFINITY;
        let mut max_cost = f64::NEG_INFINITY;

        for history in series {
            generations = generations.max(history.len().saturating_sub(1));
            for &cost in history.iter().filter(|c| c.is_finite()) {
                min_cost = min_cost.min(cost);
                max_cost = max_cost.max(cost);
            }
        }

        if !min_cost.is_finite() {
            min_cost = 0.0;
            max_cost = 1.0;
        } else if max_cost - min_cost < f64::EPSILON {
            min_cost -= 1.0;
            max_cost += 1.0;
        }

        PlotBounds {
            generations,
            min_cost,
            max_cost,
        }
    }
}

impl Visualizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate an SVG chart of one best-cost history
    pub fn generate_history_svg(&self, history: &[f64], title: &str) -> String {
        let bounds = PlotBounds::from_series([history]);
        let mut svg = self.chart_frame(title, &bounds);
        svg.push_str(&self.polyline(history, &bounds, PALETTE[0]));
        svg.push_str("</svg>");
        svg
    }

    /// Generate an SVG chart overlaying several labelled histories
    pub fn generate_comparison_svg(&self, series: &[(String, Vec<f64>)], title: &str) -> String {
        let bounds = PlotBounds::from_series(series.iter().map(|(_, h)| h.as_slice()));
        let mut svg = self.chart_frame(title, &bounds);

        for (i, (label, history)) in series.iter().enumerate() {
            let color = PALETTE[i % PALETTE.len()];
            svg.push_str(&self.polyline(history, &bounds, color));

            let legend_x = self.width - self.margin - 150.0;
            let legend_y = self.margin + 10.0 + i as f64 * 20.0;
            svg.push_str(&format!(
                r##"<rect x="{:.2}" y="{:.2}" width="15" height="4" fill="{}"/>
<text x="{:.2}" y="{:.2}" class="label">{}</text>
"##,
                legend_x,
                legend_y,
                color,
                legend_x + 20.0,
                legend_y + 5.0,
                escape_xml(label)
            ));
        }

        svg.push_str("</svg>");
        svg
    }

    /// Header, background, axes and tick labels; the caller closes the `<svg>` tag.
    fn chart_frame(&self, title: &str, bounds: &PlotBounds) -> String {
        let mut svg = String::new();

        svg.push_str(&format!(
            r##"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">
<style>
    .axis {{ stroke: #2c3e50; stroke-width: 1; }}
    .grid {{ stroke: #bdc3c7; stroke-width: 1; stroke-dasharray: 4,4; }}
    .label {{ font-family: Arial; font-size: 12px; fill: #2c3e50; }}
    .title {{ font-family: Arial; font-size: 14px; fill: #2c3e50; font-weight: bold; }}
</style>
<rect width="100%" height="100%" fill="#ecf0f1"/>
<text x="{}" y="25" class="title">{}</text>
"##,
            self.width,
            self.height,
            self.width,
            self.height,
            self.margin,
            escape_xml(title)
        ));

        let (left, right) = (self.margin, self.width - self.margin);
        let (top, bottom) = (self.margin, self.height - self.margin);

        svg.push_str(&format!(
            r##"<line x1="{}" y1="{}" x2="{}" y2="{}" class="axis"/>
<line x1="{}" y1="{}" x2="{}" y2="{}" class="axis"/>
"##,
            left, bottom, right, bottom, left, top, left, bottom
        ));

        for tick in 0..=4 {
            let fraction = tick as f64 / 4.0;
            let cost = bounds.min_cost + fraction * (bounds.max_cost - bounds.min_cost);
            let y = bottom - fraction * (bottom - top);
            svg.push_str(&format!(
                r##"<line x1="{}" y1="{:.2}" x2="{}" y2="{:.2}" class="grid"/>
<text x="{}" y="{:.2}" class="label" text-anchor="end">{:.0}</text>
"##,
                left,
                y,
                right,
                y,
                left - 5.0,
                y + 4.0,
                cost
            ));
        }

        svg.push_str(&format!(
            r##"<text x="{}" y="{}" class="label" text-anchor="middle">0</text>
<text x="{}" y="{}" class="label" text-anchor="middle">{}</text>
<text x="{}" y="{}" class="label" text-anchor="middle">Generation</text>
<text x="15" y="{}" class="label" transform="rotate(-90 15 {})" text-anchor="middle">Best cost</text>
"##,
            left,
            bottom + 18.0,
            right,
            bottom + 18.0,
            bounds.generations,
            (left + right) / 2.0,
            bottom + 35.0,
            (top + bottom) / 2.0,
            (top + bottom) / 2.0
        ));

        svg
    }

    fn polyline(&self, history: &[f64], bounds: &PlotBounds, color: &str) -> String {
        let plot_width = self.width - 2.0 * self.margin;
        let plot_height = self.height - 2.0 * self.margin;
        let x_scale = plot_width / bounds.generations.max(1) as f64;
        let y_scale = plot_height / (bounds.max_cost - bounds.min_cost);

        let points: Vec<String> = history
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_finite())
            .map(|(generation, &cost)| {
                let x = self.margin + generation as f64 * x_scale;
                let y = self.height - self.margin - (cost - bounds.min_cost) * y_scale;
                format!("{:.2},{:.2}", x, y)
            })
            .collect();

        format!(
            r##"<polyline points="{}" fill="none" stroke="{}" stroke-width="{}"/>
"##,
            points.join(" "),
            color,
            self.line_width
        )
    }

    /// Save SVG to file
    pub fn save_svg<P: AsRef<Path>>(&self, svg: &str, path: P) -> std::io::Result<()> {
        let mut file = File::create(path)?;
        file.write_all(svg.as_bytes())?;
        Ok(())
    }

    /// Save SVG as PNG, natively when the `png` feature is on, otherwise through
    /// `rsvg-convert`, `magick convert` or `inkscape`, in that order.
    pub fn save_png<P: AsRef<Path>>(&self, svg: &str, path: P) -> std::io::Result<()> {
        Self::svg_to_png_file(svg, path.as_ref())
    }

    /// Render an SVG string directly to PNG file using available renderer.
    pub fn svg_to_png_file(svg: &str, out: &Path) -> std::io::Result<()> {
        #[cfg(feature = "png")]
        let result = render_native(svg, out);
        #[cfg(not(feature = "png"))]
        let result = convert_external(svg, out);
        result
    }

    /// Export histories as CSV for external plotting (e.g., matplotlib)
    pub fn export_plot_data(&self, series: &[(String, Vec<f64>)]) -> String {
        let mut data = String::new();

        data.push_str("generation");
        for (label, _) in series {
            data.push(',');
            data.push_str(label);
        }
        data.push('\n');

        let rows = series.iter().map(|(_, h)| h.len()).max().unwrap_or(0);
        for generation in 0..rows {
            data.push_str(&generation.to_string());
            for (_, history) in series {
                data.push(',');
                if let Some(cost) = history.get(generation) {
                    data.push_str(&format!("{:.4}", cost));
                }
            }
            data.push('\n');
        }

        data
    }
}

/// Escape text placed inside SVG elements or attributes
fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Canvas size from the `width`/`height` attributes, falling back to 800x500.
fn svg_canvas_size(svg: &str) -> (u32, u32) {
    let attribute = |name: &str| -> Option<u32> {
        let (_, rest) = svg.split_once(&format!(" {}=\"", name))?;
        let (value, _) = rest.split_once('"')?;
        value.parse::<f64>().ok().map(|v| v as u32)
    };
    (
        attribute("width").unwrap_or(800).max(1),
        attribute("height").unwrap_or(500).max(1),
    )
}

#[cfg(feature = "png")]
fn render_native(svg: &str, out: &Path) -> std::io::Result<()> {
    let other = |msg: String| std::io::Error::new(std::io::ErrorKind::Other, msg);

    let opt = usvg::Options::default();
    let rtree = usvg::Tree::from_str(svg, &opt).map_err(|e| other(format!("usvg parse error: {}", e)))?;
    let (w, h) = svg_canvas_size(svg);
    let mut pixmap = Pixmap::new(w, h).ok_or_else(|| other("Failed to create pixmap".to_string()))?;
    render(&rtree, FitTo::Original, Transform::default(), pixmap.as_mut())
        .ok_or_else(|| other("resvg render failed".to_string()))?;
    pixmap
        .save_png(out)
        .map_err(|e| other(format!("save_png failed: {}", e)))
}

#[cfg_attr(feature = "png", allow(dead_code))]
fn convert_external(svg: &str, out: &Path) -> std::io::Result<()> {
    let tmp_svg = out.with_extension("svg.tmp");
    std::fs::write(&tmp_svg, svg)?;

    let input = tmp_svg.to_string_lossy().to_string();
    let output = out.to_string_lossy().to_string();
    let (w, h) = svg_canvas_size(svg);
    log::debug!("Converting {}x{} chart to {}", w, h, output);

    let attempts: [(&str, Vec<&str>); 3] = [
        ("rsvg-convert", vec!["-o", output.as_str(), input.as_str()]),
        ("magick", vec!["convert", input.as_str(), output.as_str()]),
        (
            "inkscape",
            vec![input.as_str(), "--export-type=png", "--export-filename", output.as_str()],
        ),
    ];

    for (program, args) in attempts.iter() {
        if let Ok(status) = Command::new(program).args(args).status() {
            if status.success() {
                let _ = std::fs::remove_file(&tmp_svg);
                return Ok(());
            }
        }
    }

    let _ = std::fs::remove_file(&tmp_svg);
    Err(std::io::Error::new(
        std::io::ErrorKind::Other,
        "No SVG->PNG converter succeeded (tried rsvg-convert, magick, inkscape)",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_svg() {
        let viz = Visualizer::new();
        let svg = viz.generate_history_svg(&[120.0, 110.0, 110.0, 95.0], "tai12a standard");

        assert!(svg.starts_with("<?xml"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains("tai12a standard"));
        assert_eq!(svg.matches("<polyline").count(), 1);
    }

    #[test]
    fn test_comparison_svg_has_one_line_per_series() {
        let viz = Visualizer::new();
        let series = vec![
            ("standard".to_string(), vec![10.0, 9.0, 8.0]),
            ("baldwinian".to_string(), vec![9.0, 8.0]),
            ("lamarckian".to_string(), vec![7.0, 7.0, 6.0, 5.0]),
        ];
        let svg = viz.generate_comparison_svg(&series, "comparison");

        assert_eq!(svg.matches("<polyline").count(), 3);
        assert!(svg.contains("baldwinian"));
        assert!(svg.contains("lamarckian"));
    }

    #[test]
    fn test_flat_and_empty_histories() {
        let viz = Visualizer::new();
        let flat = viz.generate_history_svg(&[5.0, 5.0, 5.0], "flat");
        assert!(!flat.contains("NaN"));
        assert!(!flat.contains("inf"));

        let empty = viz.generate_history_svg(&[], "empty");
        assert!(empty.ends_with("</svg>"));
    }

    #[test]
    fn test_titles_and_labels_are_escaped() {
        let viz = Visualizer::new();
        let series = vec![("a<b".to_string(), vec![2.0, 1.0])];
        let svg = viz.generate_comparison_svg(&series, "R&D \"tai\" <12>");

        assert!(svg.contains("R&amp;D &quot;tai&quot; &lt;12&gt;"));
        assert!(svg.contains("a&lt;b"));
        assert!(!svg.contains("a<b"));
        assert!(!svg.contains("R&D"));
    }

    #[test]
    fn test_export_plot_data() {
        let viz = Visualizer::new();
        let series = vec![
            ("a".to_string(), vec![3.0, 2.0]),
            ("b".to_string(), vec![4.0]),
        ];
        let csv = viz.export_plot_data(&series);
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "generation,a,b");
        assert_eq!(lines[1], "0,3.0000,4.0000");
        assert_eq!(lines[2], "1,2.0000,");
    }

    #[test]
    fn test_canvas_size() {
        let viz = Visualizer::new();
        let svg = viz.generate_history_svg(&[1.0, 0.5], "size");
        assert_eq!(svg_canvas_size(&svg), (800, 500));
    }

    #[test]
    fn test_save_svg() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.svg");
        let viz = Visualizer::new();
        let svg = viz.generate_history_svg(&[2.0, 1.0], "save");

        viz.save_svg(&svg, &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), svg);
    }
}
