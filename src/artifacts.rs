use std::sync::Arc;
use tracing::info;

use crate::{
    config::ArtifactConfig,
    error::{artifact_error, AppError},
    labels::LabelEncoder,
    model::{Classifier, DecisionTree},
    prediction::PredictionService,
    schema::FeatureSchema,
};

/// The trained artifacts, loaded once and read-only afterwards.
#[derive(Clone)]
pub struct ModelArtifacts {
    schema: FeatureSchema,
    predictor: PredictionService,
}

impl ModelArtifacts {
    pub fn new(
        schema: FeatureSchema,
        classifier: Arc<dyn Classifier>,
        labels: LabelEncoder,
    ) -> Result<Self, AppError> {
        if classifier.n_features() != schema.len() {
            return Err(artifact_error(format!(
                "classifier expects {} features but schema lists {}",
                classifier.n_features(),
                schema.len()
            )));
        }
        let predictor = PredictionService::new(classifier, labels)?;
        Ok(Self { schema, predictor })
    }

    pub fn load(config: &ArtifactConfig) -> Result<Self, AppError> {
        info!("Loading model artifacts...");
        let schema = FeatureSchema::load(&config.schema_path)?;
        let tree = DecisionTree::load(&config.model_path)?;
        let labels = LabelEncoder::load(&config.label_encoder_path)?;
        Self::new(schema, Arc::new(tree), labels)
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn predictor(&self) -> &PredictionService {
        &self.predictor
    }
}
