//! Pipeline configuration: artifact locations, nominal fields, bounds and threshold

use crate::error::{Error, Result};
use crate::features::InputBounds;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings fixed for the lifetime of a [`crate::PredictionContext`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// JSON export of the fitted model
    pub model_path: PathBuf,
    /// CSV manifest of training columns
    pub columns_path: PathBuf,
    /// Fields expanded into one indicator column per code
    pub nominal_fields: Vec<String>,
    pub bounds: InputBounds,
    /// Probability above which an employee is labelled as leaving
    pub threshold: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("model/model_gbm.json"),
            columns_path: PathBuf::from("model/training_cols.csv"),
            nominal_fields: vec!["Age_Profile".to_string(), "BusinessTravel".to_string()],
            bounds: InputBounds::default(),
            threshold: 0.5,
        }
    }
}

impl PipelineConfig {
    /// Read a JSON configuration file; absent keys keep their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|err| Error::Config(format!("{}: {err}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, range) in [
            ("MonthlyIncome", self.bounds.monthly_income),
            ("YearsAtCompany", self.bounds.years_at_company),
        ] {
            if !(range.min.is_finite() && range.max.is_finite()) || range.min > range.max {
                return Err(Error::Config(format!(
                    "bounds for {name} must satisfy min <= max, got [{}, {}]",
                    range.min, range.max
                )));
            }
        }
        if !(self.threshold > 0.0 && self.threshold < 1.0) {
            return Err(Error::Config(format!(
                "threshold {} must lie strictly between 0 and 1",
                self.threshold
            )));
        }
        Ok(())
    }
}
