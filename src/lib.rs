//! Attrition: employee attrition prediction from survey answers
//!
//! Turns human-readable answers into the exact feature row a pre-trained
//! gradient boosting classifier expects, then scores it:
//! category codec, feature vector builder, column aligner, imputer, predictor.

pub mod align;
pub mod cli;
pub mod codec;
pub mod config;
pub mod data;
pub mod error;
pub mod features;
pub mod impute;
pub mod model;
pub mod pipeline;

// Re-export public items for easier access
pub use align::{AlignedVector, ColumnAligner, SchemaReport, TrainingColumnSet};
pub use cli::{Args, Command, PredictArgs};
pub use codec::{CategoryCodec, Feature, FieldKind, Vocabulary};
pub use config::PipelineConfig;
pub use data::{load_answers_csv, load_column_manifest, write_results_csv, ColumnManifest};
pub use error::{Error, Result};
pub use features::{encode_input, Answer, EncodedRecord, FeatureVectorBuilder, InputBounds, RawInput};
pub use impute::Imputer;
pub use model::{Attrition, Classifier, GradientBoostingModel, Outcome, Predictor};
pub use pipeline::PredictionContext;
