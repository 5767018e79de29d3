//! The prediction context: everything loaded once and shared by every request

use crate::align::{AlignedVector, ColumnAligner, SchemaReport, TrainingColumnSet};
use crate::codec::CategoryCodec;
use crate::config::PipelineConfig;
use crate::data::load_column_manifest;
use crate::error::{Error, Result};
use crate::features::{encode_input, EncodedRecord, InputBounds, RawInput};
use crate::impute::Imputer;
use crate::model::{Classifier, GradientBoostingModel, Outcome, Predictor};
use std::sync::Arc;
use tracing::{debug, info};

/// Immutable state for turning answers into predictions.
///
/// Built once at startup and passed by reference; no method mutates it, so a
/// single instance can serve any number of threads.
#[derive(Debug, Clone)]
pub struct PredictionContext {
    codec: CategoryCodec,
    bounds: InputBounds,
    columns: TrainingColumnSet,
    aligner: ColumnAligner,
    imputer: Imputer,
    predictor: Predictor,
    schema: SchemaReport,
}

impl PredictionContext {
    pub fn new(
        codec: CategoryCodec,
        config: &PipelineConfig,
        columns: TrainingColumnSet,
        imputer: Imputer,
        model: Arc<dyn Classifier>,
    ) -> Result<Self> {
        config.validate()?;
        if model.n_features() != columns.len() {
            return Err(Error::ModelLoad(format!(
                "model expects {} features but the column manifest lists {}",
                model.n_features(),
                columns.len()
            )));
        }

        let aligner = ColumnAligner::new(&codec, &config.nominal_fields)?;
        let predictor = Predictor::new(model, config.threshold)?;
        let schema = aligner.check_schema(&columns);

        Ok(Self {
            codec,
            bounds: config.bounds,
            columns,
            aligner,
            imputer,
            predictor,
            schema,
        })
    }

    /// Load the manifest and model named by `config`.
    ///
    /// Any failure here is fatal: a context that cannot be built must not serve.
    ///
    /// # Arguments
    /// * `config` - Artifact paths, nominal fields, bounds and threshold
    ///
    /// # Returns
    /// * A ready context, or [`Error::ModelLoad`] / [`Error::Config`] on failure
    pub fn load(config: &PipelineConfig) -> Result<Self> {
        let manifest = load_column_manifest(&config.columns_path)?;
        let imputer = match manifest.medians {
            Some(medians) => Imputer::with_reference(medians, &manifest.columns)?,
            None => Imputer::new(),
        };
        let model = GradientBoostingModel::load(&config.model_path)?;
        let context = Self::new(
            CategoryCodec::standard(),
            config,
            manifest.columns,
            imputer,
            Arc::new(model),
        )?;
        info!(
            columns = context.columns.len(),
            schema_consistent = context.schema.is_consistent(),
            "prediction context ready"
        );
        Ok(context)
    }

    pub fn codec(&self) -> &CategoryCodec {
        &self.codec
    }

    pub fn columns(&self) -> &TrainingColumnSet {
        &self.columns
    }

    pub fn schema_report(&self) -> &SchemaReport {
        &self.schema
    }

    pub fn threshold(&self) -> f64 {
        self.predictor.threshold()
    }

    pub fn encode(&self, input: &RawInput) -> Result<EncodedRecord> {
        encode_input(&self.codec, &self.bounds, input)
    }

    /// Encode, align and impute a single set of answers
    pub fn prepare(&self, input: &RawInput) -> Result<AlignedVector> {
        let record = self.encode(input)?;
        let aligned = self.aligner.align(&record, &self.columns);
        self.imputer.impute(aligned)
    }

    /// Predict attrition for one set of answers
    ///
    /// # Arguments
    /// * `input` - Raw answers as supplied by the caller
    ///
    /// # Returns
    /// * `Outcome` with label and probability, or the validation error for the answers
    pub fn predict(&self, input: &RawInput) -> Result<Outcome> {
        let vector = self.prepare(input)?;
        self.predictor.predict(&vector)
    }

    /// Score many rows, each one independently of the others
    ///
    /// # Arguments
    /// * `inputs` - One set of answers per employee
    ///
    /// # Returns
    /// * One entry per input, in order: the outcome, or the error that row failed with
    pub fn predict_batch(&self, inputs: &[RawInput]) -> Vec<Result<Outcome>> {
        debug!(rows = inputs.len(), "scoring batch");
        inputs.iter().map(|input| self.predict(input)).collect()
    }
}
