//! Batch command - classify every PDF matching a glob pattern.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use doctype_core::models::PredictionOutcome;
use doctype_core::{DocumentPipeline, StatsStore};

use super::{is_pdf, load_config, record_stats};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern of input PDFs
    #[arg(required = true)]
    input: String,

    /// Directory for one JSON record per file
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Continue after a file fails
    #[arg(long)]
    continue_on_error: bool,

    /// Classifier model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Do not record results in usage statistics
    #[arg(long)]
    no_stats: bool,
}

/// Outcome of one file.
struct FileOutcome {
    path: PathBuf,
    outcome: PredictionOutcome,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if let Some(dir) = &args.model_dir {
        config.classifier.model_dir = dir.clone();
    }

    let files = matching_pdfs(&args.input)?;
    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let pipeline = DocumentPipeline::from_config(&config).with_context(|| {
        format!(
            "Failed to load classifier from {}",
            config.classifier.model_dir.display()
        )
    })?;
    let stats = (!args.no_stats).then(|| StatsStore::from_config(&config.stats));

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let mut results = Vec::with_capacity(files.len());

    for path in files {
        let file_start = Instant::now();
        let outcome = pipeline.predict(&path);
        let processing_time_ms = file_start.elapsed().as_millis() as u64;

        match &outcome {
            PredictionOutcome::Success(result) => {
                if let Some(store) = &stats {
                    record_stats(store, &path, result);
                }
            }
            PredictionOutcome::Failure { error: message } => {
                if args.continue_on_error {
                    warn!("Failed to classify {}: {}", path.display(), message);
                } else {
                    error!("Failed to classify {}: {}", path.display(), message);
                    overall_pb.abandon();
                    anyhow::bail!("Processing failed for {}: {}", path.display(), message);
                }
            }
        }

        if let Some(output_dir) = &args.output_dir {
            let output_path = output_dir.join(format!("{}.json", file_stem(&path)));
            fs::write(&output_path, serde_json::to_string_pretty(&outcome)?)?;
            debug!("Wrote output to {}", output_path.display());
        }

        results.push(FileOutcome {
            path,
            outcome,
            processing_time_ms,
        });
        overall_pb.inc(1);
    }

    overall_pb.finish_with_message("Complete");

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let failed: Vec<_> = results.iter().filter(|r| !r.outcome.is_success()).collect();

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(results.len() - failed.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.outcome.error().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

/// Expand `pattern`, keeping `.pdf` files in glob order.
fn matching_pdfs(pattern: &str) -> anyhow::Result<Vec<PathBuf>> {
    Ok(glob(pattern)?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file() && is_pdf(p))
        .collect())
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string())
}

fn write_summary(path: &Path, results: &[FileOutcome]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "predicted_class",
        "confidence",
        "text_length",
        "original_text_length",
        "processing_time_ms",
        "error",
    ])?;

    for result in results {
        let filename = result
            .path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let time_ms = result.processing_time_ms.to_string();

        match &result.outcome {
            PredictionOutcome::Success(r) => wtr.write_record([
                filename.as_str(),
                "success",
                &r.predicted_class,
                &format!("{:.3}", r.confidence),
                &r.text_length.to_string(),
                &r.original_text_length.to_string(),
                &time_ms,
                "",
            ])?,
            PredictionOutcome::Failure { error } => wtr.write_record([
                filename.as_str(),
                "error",
                "",
                "",
                "",
                "",
                &time_ms,
                error,
            ])?,
        }
    }

    wtr.flush()?;
    Ok(())
}
