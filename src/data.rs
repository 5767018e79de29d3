//! CSV input and output using Polars: column manifest, batch answers and batch results

use crate::align::TrainingColumnSet;
use crate::codec::Feature;
use crate::error::{Error, Result};
use crate::features::RawInput;
use crate::model::Outcome;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};

/// Header of the column that lists the training column names
pub const MANIFEST_COLUMN: &str = "0";

/// Optional header carrying one training-time median per column
pub const MEDIAN_COLUMN: &str = "median";

/// Training columns plus any reference statistics shipped alongside them
#[derive(Debug, Clone)]
pub struct ColumnManifest {
    pub columns: TrainingColumnSet,
    pub medians: Option<Vec<f64>>,
}

fn read_csv(path: &Path) -> PolarsResult<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()
}

/// Load the ordered training column names from a manifest CSV
///
/// # Arguments
/// * `path` - CSV file with a `0` column of names and an optional `median` column
///
/// # Returns
/// * `ColumnManifest`, or [`Error::ModelLoad`] when the file is unusable
pub fn load_column_manifest(path: impl AsRef<Path>) -> Result<ColumnManifest> {
    let path = path.as_ref();
    let df = read_csv(path).map_err(|err| {
        Error::ModelLoad(format!("cannot read column manifest {}: {err}", path.display()))
    })?;

    let names = df.column(MANIFEST_COLUMN).map_err(|_| {
        Error::ModelLoad(format!(
            "column manifest {} has no '{MANIFEST_COLUMN}' column",
            path.display()
        ))
    })?;
    let names = names.cast(&DataType::String)?;
    let columns = names
        .str()?
        .into_iter()
        .enumerate()
        .map(|(row, name)| {
            name.map(str::to_string).ok_or_else(|| {
                Error::ModelLoad(format!("column manifest row {row} has no column name"))
            })
        })
        .collect::<Result<Vec<_>>>()?;
    let columns = TrainingColumnSet::new(columns)?;

    let medians = match df.column(MEDIAN_COLUMN) {
        Ok(series) => {
            let series = series.cast(&DataType::Float64)?;
            let medians = series
                .f64()?
                .into_iter()
                .enumerate()
                .map(|(row, median)| {
                    median.ok_or_else(|| {
                        Error::ModelLoad(format!("column manifest row {row} has no median"))
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            Some(medians)
        }
        Err(_) => None,
    };

    info!(
        path = %path.display(),
        columns = columns.len(),
        reference_medians = medians.is_some(),
        "loaded training column manifest"
    );
    Ok(ColumnManifest { columns, medians })
}

/// Read raw answers, one employee per row, headed by the canonical field names.
///
/// Empty cells become absent answers; unknown headers are ignored.
///
/// # Arguments
/// * `path` - CSV file of answers
///
/// # Returns
/// * One `RawInput` per data row, in file order
pub fn load_answers_csv(path: impl AsRef<Path>) -> Result<Vec<RawInput>> {
    let path = path.as_ref();
    let df = read_csv(path)?;
    let mut inputs = vec![RawInput::new(); df.height()];

    for name in df.get_column_names() {
        if Feature::from_name(name).is_err() {
            debug!(column = %name, "ignoring column that is not a model feature");
        }
    }

    for feature in Feature::ALL {
        let Ok(series) = df.column(feature.name()) else {
            debug!(%feature, "answers file has no column for feature");
            continue;
        };
        let series = series.cast(&DataType::String)?;
        for (input, value) in inputs.iter_mut().zip(series.str()?.into_iter()) {
            if let Some(text) = value {
                *input = std::mem::take(input).with_label(feature, text);
            }
        }
    }

    info!(path = %path.display(), rows = inputs.len(), "loaded answers");
    Ok(inputs)
}

/// Write one line per input row: its prediction or the reason it was rejected
///
/// # Arguments
/// * `path` - Destination CSV file, overwritten if present
/// * `results` - Outcome or error per input row, in input order
///
/// # Returns
/// * Result indicating success or failure
pub fn write_results_csv(path: impl AsRef<Path>, results: &[Result<Outcome>]) -> Result<()> {
    let mut rows = Vec::with_capacity(results.len());
    let mut codes = Vec::with_capacity(results.len());
    let mut labels = Vec::with_capacity(results.len());
    let mut probabilities = Vec::with_capacity(results.len());
    let mut errors = Vec::with_capacity(results.len());

    for (row, result) in results.iter().enumerate() {
        rows.push(row as u64);
        match result {
            Ok(outcome) => {
                codes.push(Some(outcome.label.code() as u32));
                labels.push(Some(outcome.label.to_string()));
                probabilities.push(Some(outcome.probability));
                errors.push(None);
            }
            Err(err) => {
                codes.push(None);
                labels.push(None);
                probabilities.push(None);
                errors.push(Some(err.to_string()));
            }
        }
    }

    let mut df = DataFrame::new(vec![
        Series::new("row", rows),
        Series::new("prediction", codes),
        Series::new("label", labels),
        Series::new("probability", probabilities),
        Series::new("error", errors),
    ])?;

    let path = path.as_ref();
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).finish(&mut df)?;
    info!(path = %path.display(), rows = results.len(), "wrote results");
    Ok(())
}
