//! Predict command - classify a single PDF.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use doctype_core::models::{ExtractedFields, FieldValue, PredictionOutcome};
use doctype_core::{DocumentPipeline, StatsStore};

use super::{is_pdf, load_config, record_stats};

/// Arguments for the predict command.
#[derive(Args)]
pub struct PredictArgs {
    /// Input PDF
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Classifier model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Do not record the result in usage statistics
    #[arg(long)]
    no_stats: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON record
    Json,
    /// Plain text summary
    Text,
}

pub async fn run(args: PredictArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if let Some(dir) = &args.model_dir {
        config.classifier.model_dir = dir.clone();
    }

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }
    if !is_pdf(&args.input) {
        anyhow::bail!("Not a PDF file: {}", args.input.display());
    }

    info!("Classifying file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")?,
    );
    pb.set_message("Loading classifier...");

    let pipeline = DocumentPipeline::from_config(&config).with_context(|| {
        format!(
            "Failed to load classifier from {}",
            config.classifier.model_dir.display()
        )
    })?;

    pb.set_message("Classifying...");
    let outcome = pipeline.predict(&args.input);
    pb.finish_and_clear();

    if let Some(result) = outcome.result() {
        if !args.no_stats {
            record_stats(&StatsStore::from_config(&config.stats), &args.input, result);
        }
    }

    let output = format_outcome(&outcome, &args.input, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    if let Some(error) = outcome.error() {
        anyhow::bail!("{}", error);
    }

    Ok(())
}

pub fn format_outcome(
    outcome: &PredictionOutcome,
    input: &std::path::Path,
    format: OutputFormat,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(outcome)?),
        OutputFormat::Text => Ok(format_text(outcome, input)),
    }
}

fn format_text(outcome: &PredictionOutcome, input: &std::path::Path) -> String {
    let mut output = format!("Document: {}\n", input.display());

    let result = match outcome {
        PredictionOutcome::Success(result) => result,
        PredictionOutcome::Failure { error } => {
            output.push_str(&format!("Error: {}\n", error));
            return output;
        }
    };

    output.push_str(&format!("Type: {}\n", result.predicted_class));
    output.push_str(&format!("Confidence: {:.1}%\n", result.confidence * 100.0));
    output.push_str(&format!(
        "Text length: {} (original {})\n",
        result.text_length, result.original_text_length
    ));

    if !result.extracted_info.is_empty() {
        output.push('\n');
        output.push_str("Fields:\n");
        push_fields(&mut output, &result.extracted_info);
    }

    output
}

fn push_fields(output: &mut String, fields: &ExtractedFields) {
    for (name, value) in fields.iter() {
        match value {
            None => output.push_str(&format!("  {}: -\n", name)),
            Some(FieldValue::Text(text)) => output.push_str(&format!("  {}: {}\n", name, text)),
            Some(FieldValue::Rows(rows)) => {
                output.push_str(&format!("  {}: {} rows\n", name, rows.len()));
                for row in rows {
                    output.push_str(&format!("    {}\n", row.join(" | ")));
                }
            }
        }
    }
}
