//! Classification model: the opaque artifact and the predictor wrapped around it

use crate::align::AlignedVector;
use crate::error::{Error, Result};
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Anything that can score an aligned feature row
pub trait Classifier: Send + Sync + fmt::Debug {
    /// Width of the rows the model accepts
    fn n_features(&self) -> usize;

    /// Probability of the positive class (employee leaves)
    fn predict_proba(&self, features: ArrayView1<'_, f64>) -> Result<f64>;
}

/// One node of a regression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    /// Go to `left` when `x[feature] <= threshold`, otherwise `right`
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<TreeNode>,
}

impl RegressionTree {
    pub fn new(nodes: Vec<TreeNode>) -> Self {
        Self { nodes }
    }

    fn validate(&self, tree_idx: usize, n_features: usize) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(Error::ModelLoad(format!("tree {tree_idx} has no nodes")));
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            match *node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if feature >= n_features {
                        return Err(Error::ModelLoad(format!(
                            "tree {tree_idx} node {idx} splits on feature {feature} but the model has {n_features}"
                        )));
                    }
                    if !threshold.is_finite() {
                        return Err(Error::ModelLoad(format!(
                            "tree {tree_idx} node {idx} has a non-finite threshold"
                        )));
                    }
                    // children must point forward so evaluation always terminates
                    for child in [left, right] {
                        if child <= idx || child >= self.nodes.len() {
                            return Err(Error::ModelLoad(format!(
                                "tree {tree_idx} node {idx} has invalid child {child}"
                            )));
                        }
                    }
                }
                TreeNode::Leaf { value } => {
                    if !value.is_finite() {
                        return Err(Error::ModelLoad(format!(
                            "tree {tree_idx} leaf {idx} has a non-finite value"
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    fn evaluate(&self, features: &ArrayView1<'_, f64>) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes[idx] {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => idx = if features[feature] <= threshold { left } else { right },
                TreeNode::Leaf { value } => return value,
            }
        }
    }
}

/// Binary gradient-boosted tree ensemble exported as JSON
///
/// The raw score is `init_score + learning_rate * sum(tree outputs)` in
/// log-odds space; the probability of leaving is its logistic transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostingModel {
    n_features: usize,
    learning_rate: f64,
    init_score: f64,
    trees: Vec<RegressionTree>,
}

impl GradientBoostingModel {
    pub fn new(
        n_features: usize,
        learning_rate: f64,
        init_score: f64,
        trees: Vec<RegressionTree>,
    ) -> Result<Self> {
        let model = Self {
            n_features,
            learning_rate,
            init_score,
            trees,
        };
        model.validate()?;
        Ok(model)
    }

    /// Load and validate a model artifact
    ///
    /// # Arguments
    /// * `path` - Path to the JSON export of the fitted ensemble
    ///
    /// # Returns
    /// * The validated model, or [`Error::ModelLoad`] if it is unreadable or malformed
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|err| {
            Error::ModelLoad(format!("cannot read model {}: {err}", path.display()))
        })?;
        let model = Self::from_json(&text)?;
        info!(
            path = %path.display(),
            trees = model.trees.len(),
            n_features = model.n_features,
            "loaded gradient boosting model"
        );
        Ok(model)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let model: Self = serde_json::from_str(text)
            .map_err(|err| Error::ModelLoad(format!("malformed model artifact: {err}")))?;
        model.validate()?;
        Ok(model)
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    fn validate(&self) -> Result<()> {
        if self.n_features == 0 {
            return Err(Error::ModelLoad("model declares zero features".into()));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(Error::ModelLoad(format!(
                "learning rate {} must be a positive number",
                self.learning_rate
            )));
        }
        if !self.init_score.is_finite() {
            return Err(Error::ModelLoad("init score is not finite".into()));
        }
        if self.trees.is_empty() {
            return Err(Error::ModelLoad("model has no trees".into()));
        }
        for (idx, tree) in self.trees.iter().enumerate() {
            tree.validate(idx, self.n_features)?;
        }
        Ok(())
    }

    /// Raw log-odds score
    pub fn decision_function(&self, features: ArrayView1<'_, f64>) -> Result<f64> {
        if features.len() != self.n_features {
            return Err(Error::ColumnMismatch {
                expected: self.n_features,
                found: features.len(),
            });
        }
        let boost: f64 = self
            .trees
            .iter()
            .map(|tree| tree.evaluate(&features))
            .sum();
        Ok(self.init_score + self.learning_rate * boost)
    }
}

impl Classifier for GradientBoostingModel {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_proba(&self, features: ArrayView1<'_, f64>) -> Result<f64> {
        let score = self.decision_function(features)?;
        Ok(1.0 / (1.0 + (-score).exp()))
    }
}

/// Predicted attrition outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Attrition {
    Stay,
    Leave,
}

impl Attrition {
    /// 0 = predicted to stay, 1 = predicted to leave
    pub fn code(self) -> u8 {
        match self {
            Attrition::Stay => 0,
            Attrition::Leave => 1,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Attrition::Stay),
            1 => Some(Attrition::Leave),
            _ => None,
        }
    }

    pub fn headline(self) -> &'static str {
        match self {
            Attrition::Stay => "Great news! The employee is likely to stay with the company.",
            Attrition::Leave => {
                "Uh-oh, it looks like the employee may be at risk of leaving the company."
            }
        }
    }

    pub fn guidance(self) -> &'static str {
        match self {
            Attrition::Stay => {
                "This is an opportunity to provide the employee with growth opportunities that can \
                 help them feel more engaged and committed to the company. Consider offering training \
                 programs, mentorship, and other development opportunities to help the employee \
                 advance in their career."
            }
            Attrition::Leave => {
                "A lack of career growth opportunities is a common reason for leaving. Consider \
                 providing a clear career path, mentorship, and training programs, and review the \
                 employee's compensation and workload to make sure they are fair and reasonable. \
                 Work-life balance and incentives such as travel opportunities can also help retain \
                 the employee."
            }
        }
    }
}

impl fmt::Display for Attrition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attrition::Stay => f.write_str("stay"),
            Attrition::Leave => f.write_str("leave"),
        }
    }
}

/// Label plus the probability it was derived from
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Outcome {
    pub label: Attrition,
    /// Probability of leaving
    pub probability: f64,
}

/// Thin wrapper over a loaded [`Classifier`]; holds no mutable state
#[derive(Debug, Clone)]
pub struct Predictor {
    model: Arc<dyn Classifier>,
    threshold: f64,
}

impl Predictor {
    /// Probabilities strictly above `threshold` are labelled [`Attrition::Leave`]
    pub fn new(model: Arc<dyn Classifier>, threshold: f64) -> Result<Self> {
        if !(threshold > 0.0 && threshold < 1.0) {
            return Err(Error::ModelLoad(format!(
                "decision threshold {threshold} must lie strictly between 0 and 1"
            )));
        }
        Ok(Self { model, threshold })
    }

    pub fn n_features(&self) -> usize {
        self.model.n_features()
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn predict(&self, vector: &AlignedVector) -> Result<Outcome> {
        self.predict_row(vector.values().view())
    }

    /// Score a row that is already in training column order
    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> Result<Outcome> {
        let probability = self.model.predict_proba(row)?;
        let label = if probability > self.threshold {
            Attrition::Leave
        } else {
            Attrition::Stay
        };
        debug!(%label, probability, "scored aligned vector");
        Ok(Outcome { label, probability })
    }
}
