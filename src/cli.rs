//! Command-line interface definitions and argument parsing

use crate::codec::Feature;
use crate::config::PipelineConfig;
use crate::features::RawInput;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Employee attrition prediction from survey answers
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// JSON configuration file; command-line flags take precedence
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the model artifact (JSON tree ensemble)
    #[arg(short, long, global = true)]
    pub model: Option<PathBuf>,

    /// Path to the training column manifest CSV
    #[arg(short, long, global = true)]
    pub columns: Option<PathBuf>,

    /// Lowest accepted monthly income
    #[arg(long, global = true)]
    pub income_min: Option<f64>,

    /// Probability above which an employee is predicted to leave
    #[arg(long, global = true)]
    pub threshold: Option<f64>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Predict attrition for a single employee
    Predict(PredictArgs),

    /// Predict attrition for every row of a CSV of answers
    Batch {
        /// CSV with one column per survey field
        #[arg(short, long)]
        input: PathBuf,

        /// Where to write the results CSV
        #[arg(short, long, default_value = "predictions.csv")]
        output: PathBuf,
    },

    /// Print every field with its accepted answers and codes
    Schema,
}

/// Survey answers, exactly as they appear in the form
#[derive(clap::Args, Debug, Default, Clone)]
pub struct PredictArgs {
    /// Male or Female
    #[arg(long)]
    pub gender: Option<String>,

    /// e.g. "Adult (26-44)"
    #[arg(long)]
    pub age_profile: Option<String>,

    /// Entry-Level, Junior, Middle, Senior or Executive
    #[arg(long)]
    pub job_level: Option<String>,

    #[arg(long)]
    pub monthly_income: Option<f64>,

    /// Rarely, Frequently or Non-Travel
    #[arg(long)]
    pub business_travel: Option<String>,

    /// Yes or No
    #[arg(long)]
    pub over_time: Option<String>,

    /// Bad, Good, Better or Best
    #[arg(long)]
    pub work_life_balance: Option<String>,

    /// Low, Medium, High or Very High
    #[arg(long)]
    pub job_satisfaction: Option<String>,

    /// Low, Medium, High or Very High
    #[arg(long)]
    pub environment_satisfaction: Option<String>,

    /// None, 1-2, 3-4, 5-6, 7-8, 9-10 or "More than 10"
    #[arg(long)]
    pub training_times_last_year: Option<String>,

    /// Tenure in years
    #[arg(long)]
    pub years_at_company: Option<f64>,

    /// Print the outcome as JSON
    #[arg(long)]
    pub json: bool,
}

impl PredictArgs {
    /// Collect the supplied answers; omitted flags stay absent
    pub fn to_raw_input(&self) -> RawInput {
        let labels = [
            (Feature::Gender, &self.gender),
            (Feature::AgeProfile, &self.age_profile),
            (Feature::JobLevel, &self.job_level),
            (Feature::BusinessTravel, &self.business_travel),
            (Feature::OverTime, &self.over_time),
            (Feature::WorkLifeBalance, &self.work_life_balance),
            (Feature::JobSatisfaction, &self.job_satisfaction),
            (Feature::EnvironmentSatisfaction, &self.environment_satisfaction),
            (Feature::TrainingTimesLastYear, &self.training_times_last_year),
        ];
        let numbers = [
            (Feature::MonthlyIncome, self.monthly_income),
            (Feature::YearsAtCompany, self.years_at_company),
        ];

        let mut input = RawInput::new();
        for (feature, label) in labels {
            if let Some(label) = label {
                input = input.with_label(feature, label.as_str());
            }
        }
        for (feature, value) in numbers {
            if let Some(value) = value {
                input = input.with_number(feature, value);
            }
        }
        input
    }
}

impl Args {
    /// Resolve the configuration: defaults, then the config file, then flags
    pub fn pipeline_config(&self) -> crate::Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_file(path)?,
            None => PipelineConfig::default(),
        };
        if let Some(model) = &self.model {
            config.model_path = model.clone();
        }
        if let Some(columns) = &self.columns {
            config.columns_path = columns.clone();
        }
        if let Some(min) = self.income_min {
            config.bounds.monthly_income.min = min;
        }
        if let Some(threshold) = self.threshold {
            config.threshold = threshold;
        }
        config.validate()?;
        Ok(config)
    }
}
