use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

use crate::error::{artifact_error, AppError};

/// A trained classifier over a single feature row.
pub trait Classifier: Send + Sync {
    fn n_features(&self) -> usize;

    fn n_classes(&self) -> usize;

    /// Per-class probabilities, indexed like the label encoder's classes.
    fn predict_proba(&self, row: &[f64]) -> Result<Vec<f64>, AppError>;

    /// Index of the most probable class; the first one wins ties.
    fn predict(&self, row: &[f64]) -> Result<usize, AppError> {
        let proba = self.predict_proba(row)?;
        argmax(&proba).ok_or_else(|| AppError::ModelInference("empty probability vector".into()))
    }
}

fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

const LEAF: i64 = -1;

/// Fitted CART tree stored as parallel node arrays.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub n_features: usize,
    pub n_classes: usize,
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    /// Class weights per node; only leaf rows are read.
    pub value: Vec<Vec<f64>>,
}

impl DecisionTree {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            artifact_error(format!("failed to read model {}: {}", path.display(), e))
        })?;
        let tree: DecisionTree = serde_json::from_str(&content)
            .map_err(|e| artifact_error(format!("invalid model {}: {}", path.display(), e)))?;
        tree.validate()?;
        info!(
            "Loaded decision tree from {}: {} nodes, {} features, {} classes",
            path.display(),
            tree.node_count(),
            tree.n_features,
            tree.n_classes
        );
        Ok(tree)
    }

    pub fn node_count(&self) -> usize {
        self.children_left.len()
    }

    pub fn validate(&self) -> Result<(), AppError> {
        let n = self.node_count();
        if n == 0 {
            return Err(artifact_error("decision tree has no nodes"));
        }
        if self.n_classes == 0 {
            return Err(artifact_error("decision tree has no classes"));
        }
        if [
            self.children_right.len(),
            self.feature.len(),
            self.threshold.len(),
            self.value.len(),
        ]
        .iter()
        .any(|&len| len != n)
        {
            return Err(artifact_error("decision tree node arrays differ in length"));
        }

        for node in 0..n {
            let (left, right) = (self.children_left[node], self.children_right[node]);
            if left == LEAF && right == LEAF {
                let row = &self.value[node];
                if row.len() != self.n_classes {
                    return Err(artifact_error(format!(
                        "leaf {} has {} class weights, expected {}",
                        node,
                        row.len(),
                        self.n_classes
                    )));
                }
                let negative = row.iter().any(|w| !w.is_finite() || *w < 0.0);
                if negative || row.iter().sum::<f64>() <= 0.0 {
                    return Err(artifact_error(format!(
                        "leaf {} has invalid class weights",
                        node
                    )));
                }
                continue;
            }

            // Children always follow their parent, which rules out cycles.
            for child in [left, right] {
                if child <= node as i64 || child >= n as i64 {
                    return Err(artifact_error(format!(
                        "node {} points to invalid child {}",
                        node, child
                    )));
                }
            }
            let feature = self.feature[node];
            if feature < 0 || feature as usize >= self.n_features {
                return Err(artifact_error(format!(
                    "node {} splits on unknown feature {}",
                    node, feature
                )));
            }
            if !self.threshold[node].is_finite() {
                return Err(artifact_error(format!("node {} has a non-finite threshold", node)));
            }
        }
        Ok(())
    }

    fn leaf_for(&self, row: &[f64]) -> usize {
        let mut node = 0usize;
        loop {
            let left = self.children_left[node];
            if left == LEAF {
                return node;
            }
            let feature = self.feature[node] as usize;
            node = if row[feature] <= self.threshold[node] {
                left as usize
            } else {
                self.children_right[node] as usize
            };
        }
    }
}

impl Classifier for DecisionTree {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn predict_proba(&self, row: &[f64]) -> Result<Vec<f64>, AppError> {
        if row.len() != self.n_features {
            return Err(AppError::ModelInference(format!(
                "expected {} features, got {}",
                self.n_features,
                row.len()
            )));
        }
        if row.iter().any(|v| !v.is_finite()) {
            return Err(AppError::ModelInference("feature row contains non-finite values".into()));
        }

        let leaf = self.leaf_for(row);
        let weights = &self.value[leaf];
        let total: f64 = weights.iter().sum();
        debug!("Row reached leaf {}", leaf);
        Ok(weights.iter().map(|w| w / total).collect())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Stump on feature 0: `<= 1.5` is mostly class 1, otherwise mostly class 0.
    pub(crate) fn stump(n_features: usize) -> DecisionTree {
        DecisionTree {
            n_features,
            n_classes: 2,
            children_left: vec![1, LEAF, LEAF],
            children_right: vec![2, LEAF, LEAF],
            feature: vec![0, -2, -2],
            threshold: vec![1.5, -2.0, -2.0],
            value: vec![vec![5.0, 5.0], vec![1.0, 3.0], vec![8.0, 2.0]],
        }
    }

    /// Returns a fixed distribution regardless of input.
    pub(crate) struct FixedClassifier {
        pub n_features: usize,
        pub proba: Vec<f64>,
    }

    impl Classifier for FixedClassifier {
        fn n_features(&self) -> usize {
            self.n_features
        }

        fn n_classes(&self) -> usize {
            self.proba.len()
        }

        fn predict_proba(&self, _row: &[f64]) -> Result<Vec<f64>, AppError> {
            Ok(self.proba.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::stump;
    use super::*;
    use std::io::Write;

    #[test]
    fn goes_left_on_equal_threshold() {
        let tree = stump(2);
        assert_eq!(tree.predict_proba(&[1.5, 0.0]).unwrap(), vec![0.25, 0.75]);
        assert_eq!(tree.predict(&[1.5, 0.0]).unwrap(), 1);
    }

    #[test]
    fn goes_right_above_threshold() {
        let tree = stump(2);
        assert_eq!(tree.predict_proba(&[2.0, 0.0]).unwrap(), vec![0.8, 0.2]);
        assert_eq!(tree.predict(&[2.0, 0.0]).unwrap(), 0);
    }

    #[test]
    fn argmax_prefers_first_on_ties() {
        assert_eq!(argmax(&[0.5, 0.5]), Some(0));
        assert_eq!(argmax(&[0.1, 0.6, 0.3]), Some(1));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn rejects_wrong_row_width() {
        let err = stump(2).predict_proba(&[1.0]).unwrap_err();
        assert!(matches!(err, AppError::ModelInference(_)));
    }

    #[test]
    fn rejects_backward_child_pointer() {
        let mut tree = stump(2);
        tree.children_right[0] = 0;
        assert!(tree.validate().is_err());
    }

    #[test]
    fn rejects_split_on_unknown_feature() {
        let mut tree = stump(2);
        tree.feature[0] = 7;
        assert!(tree.validate().is_err());
    }

    #[test]
    fn rejects_leaf_with_wrong_class_count() {
        let mut tree = stump(2);
        tree.value[2] = vec![1.0];
        assert!(tree.validate().is_err());
    }

    #[test]
    fn loads_from_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", serde_json::to_string(&stump(6)).unwrap()).unwrap();
        let tree = DecisionTree::load(file.path()).unwrap();
        assert_eq!(tree.node_count(), 3);
        assert_eq!(tree.n_features(), 6);
    }

    #[test]
    fn corrupt_model_is_a_load_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{\"n_features\": 3}}").unwrap();
        assert!(matches!(
            DecisionTree::load(file.path()).unwrap_err(),
            AppError::ArtifactLoad(_)
        ));
    }
}
