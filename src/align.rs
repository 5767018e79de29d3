//! Column alignment: one-hot expansion and reconciliation with the training schema

use crate::codec::{CategoryCodec, Feature};
use crate::error::{Error, Result};
use crate::features::EncodedRecord;
use ndarray::Array1;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

/// Ordered column names the model was fitted on
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingColumnSet {
    columns: Arc<[String]>,
}

impl TrainingColumnSet {
    /// Rejects an empty manifest, blank names and duplicates
    pub fn new(columns: Vec<String>) -> Result<Self> {
        if columns.is_empty() {
            return Err(Error::ModelLoad("column manifest is empty".into()));
        }
        let mut seen = HashSet::with_capacity(columns.len());
        for column in &columns {
            if column.trim().is_empty() {
                return Err(Error::ModelLoad("column manifest contains a blank name".into()));
            }
            if !seen.insert(column.as_str()) {
                return Err(Error::ModelLoad(format!(
                    "column manifest lists {column} more than once"
                )));
            }
        }
        Ok(Self {
            columns: columns.into(),
        })
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.columns
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(String::as_str)
    }
}

/// A model-ready row whose columns are exactly the training columns, in order
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedVector {
    columns: Arc<[String]>,
    values: Array1<f64>,
}

impl AlignedVector {
    /// Wrap values that are already in training column order
    pub fn new(training: &TrainingColumnSet, values: Array1<f64>) -> Result<Self> {
        if values.len() != training.len() {
            return Err(Error::ColumnMismatch {
                expected: training.len(),
                found: values.len(),
            });
        }
        Ok(Self {
            columns: Arc::clone(&training.columns),
            values,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &Array1<f64> {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut Array1<f64> {
        &mut self.values
    }

    pub fn get(&self, column: &str) -> Option<f64> {
        self.columns
            .iter()
            .position(|name| name == column)
            .map(|idx| self.values[idx])
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Differences between what the codec can produce and what the manifest expects
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaReport {
    /// Manifest columns no legal answer can ever set; always zero-filled
    pub unreachable: Vec<String>,
    /// Columns the codec produces that the model never saw; always dropped
    pub unused: Vec<String>,
}

impl SchemaReport {
    pub fn is_consistent(&self) -> bool {
        self.unreachable.is_empty()
    }
}

/// Expands nominal features into indicator columns and aligns them to the manifest
#[derive(Debug, Clone)]
pub struct ColumnAligner {
    nominal: Vec<(Feature, Vec<i64>)>,
}

impl ColumnAligner {
    /// Indicator columns for each nominal field come from the codec's declared codes.
    ///
    /// The nominal field list is configuration, so a bad entry is an [`Error::Config`].
    pub fn new<S: AsRef<str>>(codec: &CategoryCodec, nominal_fields: &[S]) -> Result<Self> {
        let mut nominal = Vec::with_capacity(nominal_fields.len());
        for name in nominal_fields {
            let name = name.as_ref();
            let feature = Feature::from_name(name)
                .map_err(|_| Error::Config(format!("unknown nominal field {name}")))?;
            if !feature.is_categorical() {
                return Err(Error::Config(format!(
                    "{feature} is numeric and cannot be one-hot expanded"
                )));
            }
            if nominal.iter().any(|(seen, _)| *seen == feature) {
                continue;
            }
            let codes = codec.vocabulary(feature)?.codes().collect();
            nominal.push((feature, codes));
        }
        Ok(Self { nominal })
    }

    pub fn indicator_name(feature: Feature, code: i64) -> String {
        format!("{}_{}", feature.name(), code)
    }

    pub fn is_nominal(&self, feature: Feature) -> bool {
        self.nominal.iter().any(|(nominal, _)| *nominal == feature)
    }

    /// Every column name some legal input can produce
    pub fn producible_columns(&self) -> Vec<String> {
        let mut columns = Vec::new();
        for feature in Feature::ALL {
            match self.nominal.iter().find(|(nominal, _)| *nominal == feature) {
                Some((_, codes)) => columns.extend(
                    codes
                        .iter()
                        .map(|code| Self::indicator_name(feature, *code)),
                ),
                None => columns.push(feature.name().to_string()),
            }
        }
        columns
    }

    /// One-hot expand the nominal features; only the selected indicator is present
    pub fn expand(&self, record: &EncodedRecord) -> BTreeMap<String, f64> {
        record
            .iter()
            .map(|(feature, value)| {
                if self.is_nominal(feature) {
                    (Self::indicator_name(feature, value as i64), 1.0)
                } else {
                    (feature.name().to_string(), value)
                }
            })
            .collect()
    }

    /// Produce a row with exactly the training columns, in training order.
    ///
    /// Columns the record does not carry are zero-filled; columns the model
    /// was not trained on are discarded.
    ///
    /// # Arguments
    /// * `record` - Encoded answers before one-hot expansion
    /// * `training` - Column manifest the model was fitted on
    ///
    /// # Returns
    /// * `AlignedVector` whose columns equal `training` in name and order
    pub fn align(&self, record: &EncodedRecord, training: &TrainingColumnSet) -> AlignedVector {
        let expanded = self.expand(record);
        let values: Array1<f64> = training
            .iter()
            .map(|column| expanded.get(column).copied().unwrap_or(0.0))
            .collect();

        for column in expanded.keys() {
            if training.position(column).is_none() {
                debug!(%column, "dropping column absent from training manifest");
            }
        }

        AlignedVector {
            columns: Arc::clone(&training.columns),
            values,
        }
    }

    /// Compare the manifest against everything the codec can produce.
    ///
    /// Unreachable manifest columns are logged once here; predictions still
    /// proceed with those columns zero-filled.
    pub fn check_schema(&self, training: &TrainingColumnSet) -> SchemaReport {
        let producible = self.producible_columns();
        let producible_set: HashSet<&str> = producible.iter().map(String::as_str).collect();

        let unreachable: Vec<String> = training
            .iter()
            .filter(|column| !producible_set.contains(column))
            .map(str::to_string)
            .collect();
        let unused: Vec<String> = producible
            .iter()
            .filter(|column| training.position(column).is_none())
            .cloned()
            .collect();

        for column in &unreachable {
            warn!(
                %column,
                "schema drift: manifest column can never be produced by the codec and will always be zero"
            );
        }
        if !unused.is_empty() {
            debug!(?unused, "codec columns not present in the training manifest");
        }

        SchemaReport {
            unreachable,
            unused,
        }
    }
}
