//! Attrition CLI: predicts whether an employee is likely to leave
//!
//! This is the main entrypoint that loads the model artifacts once and then
//! runs a single prediction, a batch prediction or prints the answer schema.

use anyhow::{Context, Result};
use attrition::{
    load_answers_csv, write_results_csv, Args, CategoryCodec, Command, Error, Feature,
    PipelineConfig, PredictArgs, PredictionContext,
};
use clap::Parser;
use std::path::Path;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = args
        .pipeline_config()
        .context("failed to resolve configuration")?;

    match &args.command {
        Command::Predict(answers) => run_prediction_mode(&config, answers),
        Command::Batch { input, output } => run_batch_mode(&config, input, output),
        Command::Schema => {
            print_schema(&CategoryCodec::standard(), &config);
            Ok(())
        }
    }
}

/// Logs go to stderr; `RUST_LOG` overrides the level chosen by `--verbose`
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_context(config: &PipelineConfig) -> Result<PredictionContext> {
    let start_time = Instant::now();
    let context = PredictionContext::load(config).with_context(|| {
        format!(
            "cannot serve predictions without {} and {}",
            config.model_path.display(),
            config.columns_path.display()
        )
    })?;
    info!(
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        "model artifacts loaded"
    );
    Ok(context)
}

/// Run prediction mode for a single employee
fn run_prediction_mode(config: &PipelineConfig, answers: &PredictArgs) -> Result<()> {
    let context = load_context(config)?;
    let input = answers.to_raw_input();

    let outcome = match context.predict(&input) {
        Ok(outcome) => outcome,
        Err(Error::MissingField(field)) => {
            anyhow::bail!("Please fill in all the input fields (missing {field})")
        }
        Err(err) if err.is_validation() => anyhow::bail!("Invalid answer: {err}"),
        Err(err) => return Err(err.into()),
    };

    if answers.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    println!("=== Prediction ===");
    println!(
        "Predicted label: {} ({})",
        outcome.label.code(),
        outcome.label
    );
    println!("Probability of leaving: {:.1}%", outcome.probability * 100.0);
    println!("\n{}", outcome.label.headline());
    println!("{}", outcome.label.guidance());

    Ok(())
}

/// Run batch mode over a CSV of answers
fn run_batch_mode(config: &PipelineConfig, input: &Path, output: &Path) -> Result<()> {
    let context = load_context(config)?;
    let start_time = Instant::now();

    let inputs = load_answers_csv(input)
        .with_context(|| format!("failed to read answers from {}", input.display()))?;
    let results = context.predict_batch(&inputs);
    write_results_csv(output, &results)
        .with_context(|| format!("failed to write results to {}", output.display()))?;

    let leaving = results
        .iter()
        .filter(|result| matches!(result, Ok(outcome) if outcome.label.code() == 1))
        .count();
    let rejected = results.iter().filter(|result| result.is_err()).count();

    println!("=== Batch Prediction ===");
    println!("Rows scored: {}", results.len() - rejected);
    println!("Predicted to leave: {leaving}");
    println!("Rejected rows: {rejected}");
    println!("Processing time: {:.2}s", start_time.elapsed().as_secs_f64());
    println!("Results saved to: {}", output.display());

    Ok(())
}

/// Print every survey field with its accepted answers
fn print_schema(codec: &CategoryCodec, config: &PipelineConfig) {
    println!("=== Answer Schema ===");
    for feature in Feature::ALL {
        let nominal = config.nominal_fields.iter().any(|name| name == feature.name());
        let suffix = if nominal { ", one-hot" } else { "" };
        match codec.vocabulary(feature) {
            Ok(vocabulary) => {
                println!("{} ({:?}{suffix})", feature, feature.kind());
                for (label, code) in vocabulary.entries() {
                    println!("  {code}  {label}");
                }
            }
            Err(_) => {
                let range = config.bounds.range(feature);
                match range {
                    Some(range) => println!(
                        "{} (Numeric, {} to {})",
                        feature, range.min, range.max
                    ),
                    None => println!("{} (Numeric)", feature),
                }
            }
        }
    }
}
