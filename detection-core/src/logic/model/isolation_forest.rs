//! Isolation Forest - Native Scorer
//!
//! Evaluates an isolation forest exported from scikit-learn as plain tree
//! arrays. Scores follow sklearn's `decision_function`:
//!
//! ```text
//! score_samples(x) = -2^(-E[h(x)] / c(max_samples))
//! decision(x)      = score_samples(x) - offset
//! ```
//!
//! Lower is more anomalous; a row is anomalous iff `decision <= 0`.

use std::path::Path;

use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use super::inference::InferenceError;
use crate::logic::artifact::{self, ArtifactError};

/// Euler–Mascheroni constant, used by the average path length
const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Decision boundary of `decision_function`
pub const DECISION_BOUNDARY: f64 = 0.0;

// ============================================================================
// VERDICT
// ============================================================================

/// Per-row outcome, encoded as sklearn's `predict` labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnomalyVerdict {
    Anomalous,
    Normal,
}

impl AnomalyVerdict {
    /// `-1` anomalous, `1` normal
    pub fn as_label(&self) -> i8 {
        match self {
            AnomalyVerdict::Anomalous => -1,
            AnomalyVerdict::Normal => 1,
        }
    }

    pub fn is_anomalous(&self) -> bool {
        matches!(self, AnomalyVerdict::Anomalous)
    }
}

// ============================================================================
// MODEL TRAIT
// ============================================================================

/// Read-only anomaly scorer
pub trait AnomalyModel: Send + Sync {
    /// Columns the model was fit on, in order
    fn feature_names(&self) -> &[String];

    /// Continuous score per row; lower = more anomalous
    fn decision_scores(&self, matrix: &Array2<f64>) -> Result<Vec<f64>, InferenceError>;

    fn boundary(&self) -> f64 {
        DECISION_BOUNDARY
    }

    /// Verdict derived from a score with the model's own boundary rule
    fn verdict(&self, score: f64) -> AnomalyVerdict {
        if score <= self.boundary() {
            AnomalyVerdict::Anomalous
        } else {
            AnomalyVerdict::Normal
        }
    }
}

// ============================================================================
// TREES
// ============================================================================

/// One isolation tree in sklearn's array layout.
/// `children_left[i] < 0` marks a leaf.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsolationTree {
    /// Column subset the tree was fit on (`estimators_features_`); empty = all
    #[serde(default)]
    pub features: Vec<usize>,
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub n_node_samples: Vec<u64>,
}

impl IsolationTree {
    fn validate(&self, index: usize, width: usize) -> Result<(), ArtifactError> {
        let n = self.children_left.len();
        let invalid = |msg: String| ArtifactError::Invalid(format!("tree {}: {}", index, msg));

        if n == 0 {
            return Err(invalid("no nodes".to_string()));
        }
        if [
            self.children_right.len(),
            self.feature.len(),
            self.threshold.len(),
            self.n_node_samples.len(),
        ]
        .iter()
        .any(|&len| len != n)
        {
            return Err(invalid("node arrays differ in length".to_string()));
        }
        if let Some(&col) = self.features.iter().find(|&&c| c >= width) {
            return Err(invalid(format!("feature subset index {} out of range", col)));
        }

        for node in 0..n {
            let left = self.children_left[node];
            let right = self.children_right[node];
            if left < 0 {
                continue;
            }
            // Children always come after their parent, so traversal terminates
            if left as usize <= node || right as usize <= node || left as usize >= n || right as usize >= n {
                return Err(invalid(format!("node {} has invalid children", node)));
            }
            let local = self.feature[node];
            let limit = if self.features.is_empty() { width } else { self.features.len() };
            if local < 0 || local as usize >= limit {
                return Err(invalid(format!("node {} splits on unknown feature {}", node, local)));
            }
        }
        Ok(())
    }

    /// Depth of the leaf reached by `row` plus the leaf's average path length
    fn path_length(&self, row: ArrayView1<f64>) -> f64 {
        let mut node = 0usize;
        let mut depth = 0.0;

        while self.children_left[node] >= 0 {
            let local = self.feature[node] as usize;
            let column = if self.features.is_empty() { local } else { self.features[local] };
            // Trees were fit on float32 inputs; compare the same way
            let value = row[column] as f32 as f64;
            node = if value <= self.threshold[node] {
                self.children_left[node] as usize
            } else {
                self.children_right[node] as usize
            };
            depth += 1.0;
        }

        depth + average_path_length(self.n_node_samples[node])
    }
}

/// Average path length of an unsuccessful BST search over `n` points, c(n)
pub fn average_path_length(n: u64) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

// ============================================================================
// FOREST
// ============================================================================

/// Fitted isolation forest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsolationForest {
    /// Column-order contract recorded at fit time (`feature_names_in_`)
    pub feature_names: Vec<String>,
    /// `offset_`: shifts `score_samples` so the boundary sits at 0
    pub offset: f64,
    /// `max_samples_` used to normalise path lengths
    pub max_samples: u64,
    pub estimators: Vec<IsolationTree>,
}

impl IsolationForest {
    pub fn new(
        feature_names: Vec<String>,
        offset: f64,
        max_samples: u64,
        estimators: Vec<IsolationTree>,
    ) -> Result<Self, ArtifactError> {
        let forest = Self {
            feature_names,
            offset,
            max_samples,
            estimators,
        };
        forest.validate()?;
        Ok(forest)
    }

    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        let forest: Self = artifact::read_json(path)?;
        forest.validate()?;
        log::info!(
            "Isolation forest loaded: {} trees, {} features, max_samples={}",
            forest.estimators.len(),
            forest.feature_names.len(),
            forest.max_samples
        );
        Ok(forest)
    }

    fn validate(&self) -> Result<(), ArtifactError> {
        if self.estimators.is_empty() {
            return Err(ArtifactError::Invalid("isolation forest has no trees".to_string()));
        }
        // c(1) = 0 would divide the mean depth by zero
        if self.max_samples < 2 {
            return Err(ArtifactError::Invalid(format!(
                "max_samples must be at least 2, got {}",
                self.max_samples
            )));
        }
        let width = self.feature_names.len();
        for (i, tree) in self.estimators.iter().enumerate() {
            tree.validate(i, width)?;
        }
        Ok(())
    }

    /// sklearn `score_samples` for one row (before the offset)
    pub fn score_sample(&self, row: ArrayView1<f64>) -> f64 {
        let total: f64 = self.estimators.iter().map(|t| t.path_length(row)).sum();
        let mean_depth = total / self.estimators.len() as f64;
        -(2f64.powf(-mean_depth / average_path_length(self.max_samples)))
    }
}

impl AnomalyModel for IsolationForest {
    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn decision_scores(&self, matrix: &Array2<f64>) -> Result<Vec<f64>, InferenceError> {
        if matrix.ncols() != self.feature_names.len() {
            return Err(InferenceError::Shape {
                expected: self.feature_names.len(),
                actual: matrix.ncols(),
            });
        }

        Ok(matrix
            .rows()
            .into_iter()
            .map(|row| self.score_sample(row) - self.offset)
            .collect())
    }
}
