//! Median imputation for values that are still missing after alignment

use crate::align::{AlignedVector, TrainingColumnSet};
use crate::error::{Error, Result};
use ndarray::{Array1, ArrayViewMut1};
use tracing::debug;

/// Column-wise median substitution for NaN entries
///
/// With reference medians (computed at training time and shipped in the
/// column manifest) those are used directly. Without them the only
/// statistic available is the row itself: present values are their own
/// median and a missing one has none, so it is reported as a missing field.
#[derive(Debug, Clone, Default)]
pub struct Imputer {
    reference: Option<Array1<f64>>,
}

impl Imputer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use fixed training-time medians, one per training column
    pub fn with_reference(medians: Vec<f64>, columns: &TrainingColumnSet) -> Result<Self> {
        if medians.len() != columns.len() {
            return Err(Error::ColumnMismatch {
                expected: columns.len(),
                found: medians.len(),
            });
        }
        if let Some(idx) = medians.iter().position(|median| !median.is_finite()) {
            return Err(Error::ModelLoad(format!(
                "reference median for {} is not a finite number",
                columns.names()[idx]
            )));
        }
        Ok(Self {
            reference: Some(Array1::from(medians)),
        })
    }

    pub fn has_reference(&self) -> bool {
        self.reference.is_some()
    }

    /// Fill the missing entries of one aligned row
    ///
    /// # Arguments
    /// * `vector` - Row in training column order, NaN marking a missing value
    ///
    /// # Returns
    /// * The filled row, or [`Error::MissingField`] for a missing value with no median to use
    pub fn impute(&self, mut vector: AlignedVector) -> Result<AlignedVector> {
        let columns = vector.columns().to_vec();
        self.fill(vector.values_mut().view_mut(), &columns)?;
        Ok(vector)
    }

    fn fill(&self, mut row: ArrayViewMut1<f64>, columns: &[String]) -> Result<()> {
        if let Some(reference) = &self.reference {
            if reference.len() != row.len() {
                return Err(Error::ColumnMismatch {
                    expected: reference.len(),
                    found: row.len(),
                });
            }
        }

        for (idx, value) in row.iter_mut().enumerate() {
            if !value.is_nan() {
                continue;
            }
            let fill = match &self.reference {
                Some(reference) => reference[idx],
                None => return Err(Error::MissingField(columns[idx].clone())),
            };
            debug!(column = %columns[idx], fill, "imputing missing value");
            *value = fill;
        }

        Ok(())
    }
}
