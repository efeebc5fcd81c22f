//! visualdiff CLI - visual regression comparison
//!
//! Compare two screenshots and report a pixel mismatch count or an RMS
//! similarity ratio, optionally writing a diff artifact.

use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ColorChoice, Parser, ValueEnum};
use colored::Colorize;
use image::GenericImageView;
use serde::Serialize;
use visualdiff::{pixel_diff, render_highlight, rgba_from_dynamic, similarity_ratio, DiffParams};

/// Visual regression comparison for screenshots
///
/// Compares an expected (baseline) image against an actual capture.
/// The default metric is a pixel mismatch count: 0 means identical.
/// The similarity metric yields a [0, 1] ratio instead: 1.0 means
/// identical.
///
/// The tool itself renders no judgment unless a threshold is given;
/// thresholds turn the exit code into a pass/fail signal for CI.
#[derive(Parser, Debug)]
#[command(name = "visualdiff")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    Count mismatched pixels:
        visualdiff baseline.png capture.png

    Write the diff artifact:
        visualdiff --diff diff.png baseline.png capture.png

    CI mode - fail if more than 500 pixels differ:
        visualdiff --max-mismatch 500 baseline.png capture.png

    RMS similarity ratio with a threshold:
        visualdiff --metric similarity --min-similarity 0.95 baseline.png capture.png

    Compare all PNGs in two directories:
        visualdiff --batch baselines/ captures/

    Output JSON for scripting:
        visualdiff --json baseline.png capture.png

EXIT CODES:
    0 - Success (within threshold if one was specified)
    1 - Threshold exceeded (--max-mismatch / --min-similarity)
    2 - Error (file not found, invalid image, incompatible dimensions, etc.)")]
struct Cli {
    /// Expected image or directory (the baseline)
    #[arg(value_name = "EXPECTED")]
    expected: PathBuf,

    /// Actual image or directory (the new capture)
    #[arg(value_name = "ACTUAL")]
    actual: PathBuf,

    /// Metric to compute
    #[arg(short, long, value_enum, default_value = "pixels")]
    metric: Metric,

    /// Write the diff artifact to this file (directory in batch mode)
    #[arg(short, long, value_name = "FILE")]
    diff: Option<PathBuf>,

    /// Color-distance threshold for the pixel metric (0 to 1)
    ///
    /// Smaller values are more sensitive.
    #[arg(long, default_value = "0.1", value_name = "T")]
    threshold: f64,

    /// Detect anti-aliased pixels and exclude them from the count
    ///
    /// By default softened edge pixels are counted as mismatches.
    #[arg(long)]
    detect_aa: bool,

    /// Render the diff over a grayed copy of the expected image
    /// instead of a transparent mask
    #[arg(long)]
    overlay: bool,

    /// Maximum acceptable mismatch count (exit code 1 if exceeded)
    #[arg(long, value_name = "N")]
    max_mismatch: Option<u64>,

    /// Minimum acceptable similarity ratio (exit code 1 if not met)
    #[arg(long, value_name = "RATIO")]
    min_similarity: Option<f64>,

    /// Output JSON
    #[arg(long)]
    json: bool,

    /// Quiet mode - only output the score number
    #[arg(long, short = 'q')]
    quiet: bool,

    /// Control color output
    #[arg(long, value_enum, default_value = "auto")]
    color: ColorChoice,

    /// Batch mode: compare matching files in two directories
    #[arg(long, short = 'b')]
    batch: bool,

    /// File extensions to include in batch mode (comma-separated)
    #[arg(long, default_value = "png,jpg,jpeg,bmp", value_delimiter = ',')]
    extensions: Vec<String>,

    /// Continue on errors in batch mode
    #[arg(long)]
    keep_going: bool,

    /// Show summary statistics in batch mode
    #[arg(long)]
    summary: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Metric {
    /// Pixel mismatch count (0 = identical)
    Pixels,
    /// RMS similarity ratio in [0, 1] (1.0 = identical)
    Similarity,
}

/// Scalar outcome of one comparison, in the selected metric's domain.
#[derive(Copy, Clone, Debug)]
enum Score {
    Mismatch(u64),
    Similarity(f64),
}

impl Score {
    fn display_value(self) -> String {
        match self {
            Score::Mismatch(n) => n.to_string(),
            Score::Similarity(s) => format!("{s:.6}"),
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Score::Mismatch(n) => n as f64,
            Score::Similarity(s) => s,
        }
    }

    fn exceeds(self, cli: &Cli) -> bool {
        match self {
            Score::Mismatch(n) => cli.max_mismatch.is_some_and(|max| n > max),
            Score::Similarity(s) => cli.min_similarity.is_some_and(|min| s < min),
        }
    }

    fn has_threshold(cli: &Cli) -> bool {
        cli.max_mismatch.is_some() || cli.min_similarity.is_some()
    }
}

struct PairOutcome {
    score: Score,
    width: u32,
    height: u32,
}

struct BatchEntry {
    expected: PathBuf,
    outcome: Result<PairOutcome, String>,
}

#[derive(Serialize)]
struct JsonOutput {
    metric: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    mismatched: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    similarity: Option<f64>,
    expected: String,
    actual: String,
    width: u32,
    height: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    diff: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    threshold_exceeded: Option<bool>,
}

#[derive(Serialize)]
struct BatchJsonOutput {
    results: Vec<JsonOutput>,
    summary: BatchSummary,
}

#[derive(Serialize)]
struct BatchSummary {
    total: usize,
    passed: usize,
    failed: usize,
    errors: usize,
    min_score: f64,
    max_score: f64,
    mean_score: f64,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    setup_colors(&cli);

    if cli.batch || (cli.expected.is_dir() && cli.actual.is_dir()) {
        run_batch(&cli)
    } else {
        run_single(&cli)
    }
}

fn setup_colors(cli: &Cli) {
    match cli.color {
        ColorChoice::Always => colored::control::set_override(true),
        ColorChoice::Never => colored::control::set_override(false),
        ColorChoice::Auto => {
            if !io::stdout().is_terminal() {
                colored::control::set_override(false);
            }
        }
    }
}

fn diff_params(cli: &Cli, render: bool) -> DiffParams {
    DiffParams::default()
        .with_threshold(cli.threshold)
        .with_include_aa(!cli.detect_aa)
        .with_diff_mask(!cli.overlay)
        .with_render_diff(render)
}

fn compare_pair(
    cli: &Cli,
    expected: &Path,
    actual: &Path,
    diff: Option<&Path>,
) -> Result<PairOutcome, String> {
    let exp = image::open(expected)
        .map_err(|e| format!("failed to load '{}': {}", expected.display(), e))?;
    let act =
        image::open(actual).map_err(|e| format!("failed to load '{}': {}", actual.display(), e))?;

    let (width, height) = (exp.width(), exp.height());

    let score = match cli.metric {
        Metric::Pixels => {
            let a = rgba_from_dynamic(&exp);
            let b = rgba_from_dynamic(&act);
            let params = diff_params(cli, diff.is_some());
            let result = pixel_diff(a.as_ref(), b.as_ref(), &params).map_err(|e| e.to_string())?;
            if let (Some(path), Some(canvas)) = (diff, result.diff.as_ref()) {
                visualdiff::save_rgba(canvas.as_ref(), path).map_err(|e| e.to_string())?;
            }
            Score::Mismatch(result.mismatched)
        }
        Metric::Similarity => {
            let ratio = similarity_ratio(&exp, &act);
            if let Some(path) = diff {
                render_highlight(&exp, &act, path).map_err(|e| e.to_string())?;
            }
            Score::Similarity(ratio)
        }
    };

    Ok(PairOutcome {
        score,
        width,
        height,
    })
}

fn run_single(cli: &Cli) -> ExitCode {
    match compare_pair(cli, &cli.expected, &cli.actual, cli.diff.as_deref()) {
        Ok(outcome) => {
            if let Err(e) = output_single(cli, &outcome) {
                if !cli.quiet {
                    eprintln!("{}: {}", "error".red().bold(), e);
                }
                return ExitCode::from(2);
            }

            if outcome.score.exceeds(cli) {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            if !cli.quiet {
                eprintln!("{}: {}", "error".red().bold(), e);
            }
            ExitCode::from(2)
        }
    }
}

fn score_color(score: Score, cli: &Cli) -> colored::Color {
    use colored::Color;
    if score.exceeds(cli) {
        Color::Red
    } else {
        match score {
            Score::Mismatch(0) => Color::Green,
            Score::Similarity(s) if s >= 0.999 => Color::Green,
            _ if Score::has_threshold(cli) => Color::Green,
            _ => Color::Yellow,
        }
    }
}

fn output_single(cli: &Cli, outcome: &PairOutcome) -> Result<(), String> {
    if cli.quiet {
        println!("{}", outcome.score.display_value());
        return Ok(());
    }

    if cli.json {
        let threshold_exceeded = if Score::has_threshold(cli) {
            Some(outcome.score.exceeds(cli))
        } else {
            None
        };
        let (mismatched, similarity) = match outcome.score {
            Score::Mismatch(n) => (Some(n), None),
            Score::Similarity(s) => (None, Some(s)),
        };
        let output = JsonOutput {
            metric: metric_name(cli.metric),
            mismatched,
            similarity,
            expected: cli.expected.display().to_string(),
            actual: cli.actual.display().to_string(),
            width: outcome.width,
            height: outcome.height,
            diff: cli.diff.as_ref().map(|p| p.display().to_string()),
            threshold_exceeded,
        };
        let json = serde_json::to_string_pretty(&output)
            .map_err(|e| format!("failed to serialize JSON: {e}"))?;
        println!("{json}");
        return Ok(());
    }

    let color = score_color(outcome.score, cli);
    let value = outcome.score.display_value();
    let label = match cli.metric {
        Metric::Pixels => "Pixel mismatch",
        Metric::Similarity => "Similarity",
    };

    if outcome.score.exceeds(cli) {
        let bound = match outcome.score {
            Score::Mismatch(_) => cli
                .max_mismatch
                .map(|m| m.to_string())
                .unwrap_or_default(),
            Score::Similarity(_) => cli
                .min_similarity
                .map(|m| m.to_string())
                .unwrap_or_default(),
        };
        println!(
            "{label}: {} (threshold {} not met)",
            value.color(color),
            bound
        );
    } else {
        println!("{label}: {}", value.color(color));
    }

    if let Some(diff) = &cli.diff {
        eprintln!("Diff written to: {}", diff.display());
    }

    Ok(())
}

fn metric_name(metric: Metric) -> &'static str {
    match metric {
        Metric::Pixels => "pixels",
        Metric::Similarity => "similarity",
    }
}

fn run_batch(cli: &Cli) -> ExitCode {
    if !cli.expected.is_dir() {
        eprintln!(
            "{}: expected path '{}' is not a directory",
            "error".red().bold(),
            cli.expected.display()
        );
        return ExitCode::from(2);
    }
    if !cli.actual.is_dir() {
        eprintln!(
            "{}: actual path '{}' is not a directory",
            "error".red().bold(),
            cli.actual.display()
        );
        return ExitCode::from(2);
    }

    let pairs = match find_matching_files(&cli.expected, &cli.actual, &cli.extensions) {
        Ok(pairs) => pairs,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            return ExitCode::from(2);
        }
    };

    if pairs.is_empty() {
        eprintln!(
            "{}: no matching image files found",
            "warning".yellow().bold()
        );
        return ExitCode::from(2);
    }

    let mut entries: Vec<BatchEntry> = Vec::new();
    let mut had_errors = false;
    let mut threshold_exceeded = false;

    for (exp_path, act_path) in &pairs {
        let diff_path = cli.diff.as_ref().and_then(|dir| {
            exp_path
                .file_name()
                .map(|name| dir.join(name))
        });
        let outcome = compare_pair(cli, exp_path, act_path, diff_path.as_deref());

        match &outcome {
            Err(e) => {
                had_errors = true;
                if !cli.keep_going {
                    eprintln!("{}: {}: {}", "error".red().bold(), exp_path.display(), e);
                    return ExitCode::from(2);
                }
            }
            Ok(result) => {
                if result.score.exceeds(cli) {
                    threshold_exceeded = true;
                }
            }
        }

        entries.push(BatchEntry {
            expected: exp_path.clone(),
            outcome,
        });
    }

    if let Err(e) = output_batch(cli, &entries) {
        eprintln!("{}: {}", "error".red().bold(), e);
        return ExitCode::from(2);
    }

    if threshold_exceeded {
        ExitCode::from(1)
    } else if had_errors {
        ExitCode::from(2)
    } else {
        ExitCode::SUCCESS
    }
}

fn find_matching_files(
    expected_dir: &Path,
    actual_dir: &Path,
    extensions: &[String],
) -> Result<Vec<(PathBuf, PathBuf)>, String> {
    let extensions: Vec<String> = extensions.iter().map(|e| e.to_lowercase()).collect();

    let mut pairs = Vec::new();

    let entries = std::fs::read_dir(expected_dir).map_err(|e| {
        format!(
            "failed to read directory '{}': {}",
            expected_dir.display(),
            e
        )
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| format!("failed to read directory entry: {e}"))?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        if !extensions.contains(&ext) {
            continue;
        }

        let Some(filename) = path.file_name() else {
            continue;
        };
        let actual_path = actual_dir.join(filename);

        if actual_path.exists() {
            pairs.push((path, actual_path));
        }
    }

    pairs.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(pairs)
}

fn output_batch(cli: &Cli, entries: &[BatchEntry]) -> Result<(), String> {
    let mut scores: Vec<f64> = Vec::new();
    let mut passed = 0;
    let mut failed = 0;
    let mut errors = 0;

    for entry in entries {
        match &entry.outcome {
            Ok(outcome) => {
                scores.push(outcome.score.as_f64());
                if outcome.score.exceeds(cli) {
                    failed += 1;
                } else {
                    passed += 1;
                }
            }
            Err(_) => errors += 1,
        }
    }

    let min_score = scores.iter().copied().fold(f64::INFINITY, f64::min);
    let max_score = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mean_score = if scores.is_empty() {
        0.0
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    };

    if cli.quiet {
        for entry in entries {
            if let Ok(outcome) = &entry.outcome {
                println!("{}", outcome.score.display_value());
            }
        }
        return Ok(());
    }

    if cli.json {
        let mut results = Vec::new();
        for entry in entries {
            if let Ok(outcome) = &entry.outcome {
                let threshold_exceeded = if Score::has_threshold(cli) {
                    Some(outcome.score.exceeds(cli))
                } else {
                    None
                };
                let (mismatched, similarity) = match outcome.score {
                    Score::Mismatch(n) => (Some(n), None),
                    Score::Similarity(s) => (None, Some(s)),
                };
                results.push(JsonOutput {
                    metric: metric_name(cli.metric),
                    mismatched,
                    similarity,
                    expected: entry.expected.display().to_string(),
                    actual: cli
                        .actual
                        .join(entry.expected.file_name().unwrap_or_default())
                        .display()
                        .to_string(),
                    width: outcome.width,
                    height: outcome.height,
                    diff: None,
                    threshold_exceeded,
                });
            }
        }

        let batch = BatchJsonOutput {
            results,
            summary: BatchSummary {
                total: entries.len(),
                passed,
                failed,
                errors,
                min_score: if min_score.is_finite() { min_score } else { 0.0 },
                max_score: if max_score.is_finite() { max_score } else { 0.0 },
                mean_score,
            },
        };

        let json = serde_json::to_string_pretty(&batch)
            .map_err(|e| format!("failed to serialize JSON: {e}"))?;
        println!("{json}");
        return Ok(());
    }

    // plain text table
    let name_width = entries
        .iter()
        .map(|e| e.expected.file_name().unwrap_or_default().len())
        .max()
        .unwrap_or(20);

    for entry in entries {
        let filename = entry
            .expected
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("?");

        match &entry.outcome {
            Ok(outcome) => {
                let color = score_color(outcome.score, cli);
                let status = if Score::has_threshold(cli) {
                    if outcome.score.exceeds(cli) {
                        "FAIL".red().bold()
                    } else {
                        "PASS".green().bold()
                    }
                } else {
                    "-".normal()
                };

                println!(
                    "{:name_width$}  {:>10}  {}",
                    filename,
                    outcome.score.display_value().color(color),
                    status,
                );
            }
            Err(e) => {
                println!(
                    "{:name_width$}  {:>10}  {}",
                    filename,
                    "-".dimmed(),
                    format!("ERROR: {e}").red(),
                );
            }
        }
    }

    if cli.summary || entries.len() > 1 {
        println!();
        println!("{}", "Summary:".bold());
        println!(
            "  Total: {}  Passed: {}  Failed: {}  Errors: {}",
            entries.len(),
            passed.to_string().green(),
            if failed > 0 {
                failed.to_string().red()
            } else {
                failed.to_string().normal()
            },
            if errors > 0 {
                errors.to_string().red()
            } else {
                errors.to_string().normal()
            }
        );
        if !scores.is_empty() {
            println!(
                "  Scores: min={min_score:.2}  max={max_score:.2}  mean={mean_score:.2}"
            );
        }
    }

    let _ = io::stdout().flush();

    Ok(())
}
