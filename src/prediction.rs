use std::sync::Arc;
use tracing::debug;

use crate::{
    error::{artifact_error, AppError},
    features::FeatureVector,
    labels::LabelEncoder,
    model::Classifier,
    types::ClassProbability,
};

const PROBABILITY_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    pub label: String,
    /// One entry per label encoder class, in label encoder order.
    pub probabilities: Vec<ClassProbability>,
}

impl PredictionResult {
    pub fn probability_of(&self, class: &str) -> Result<f64, AppError> {
        self.probabilities
            .iter()
            .find(|p| p.class == class)
            .map(|p| p.probability)
            .ok_or_else(|| {
                AppError::ModelInference(format!("class '{}' missing from prediction", class))
            })
    }
}

/// Runs the classifier and names its output.
#[derive(Clone)]
pub struct PredictionService {
    classifier: Arc<dyn Classifier>,
    labels: LabelEncoder,
}

impl PredictionService {
    pub fn new(classifier: Arc<dyn Classifier>, labels: LabelEncoder) -> Result<Self, AppError> {
        if classifier.n_classes() != labels.len() {
            return Err(artifact_error(format!(
                "classifier predicts {} classes but label encoder has {}",
                classifier.n_classes(),
                labels.len()
            )));
        }
        Ok(Self { classifier, labels })
    }

    pub fn labels(&self) -> &LabelEncoder {
        &self.labels
    }

    pub fn n_features(&self) -> usize {
        self.classifier.n_features()
    }

    pub fn predict(&self, vector: &FeatureVector) -> Result<PredictionResult, AppError> {
        let proba = self.classifier.predict_proba(vector.values())?;
        self.check_distribution(&proba)?;

        let index = self.classifier.predict(vector.values())?;
        let label = self.labels.decode(index)?.to_string();

        let probabilities = self
            .labels
            .classes()
            .iter()
            .zip(proba)
            .map(|(class, probability)| ClassProbability {
                class: class.clone(),
                probability,
            })
            .collect();

        debug!("Predicted class {} ({})", index, label);
        Ok(PredictionResult {
            label,
            probabilities,
        })
    }

    fn check_distribution(&self, proba: &[f64]) -> Result<(), AppError> {
        if proba.len() != self.labels.len() {
            return Err(AppError::ModelInference(format!(
                "classifier returned {} probabilities for {} classes",
                proba.len(),
                self.labels.len()
            )));
        }
        if proba
            .iter()
            .any(|p| !p.is_finite() || *p < 0.0 || *p > 1.0)
        {
            return Err(AppError::ModelInference(format!(
                "probabilities out of range: {:?}",
                proba
            )));
        }
        let total: f64 = proba.iter().sum();
        if (total - 1.0).abs() > PROBABILITY_TOLERANCE {
            return Err(AppError::ModelInference(format!(
                "probabilities sum to {}, expected 1",
                total
            )));
        }
        Ok(())
    }
}
