use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    artifacts::ModelArtifacts,
    config::Config,
    error::{artifact_error, validation_error, AppError},
    features::FeatureEncoder,
    metrics::Metrics,
    types::*,
};

pub struct AdmissionEngine {
    config: Config,
    artifacts: ModelArtifacts,
    metrics: Metrics,
}

impl AdmissionEngine {
    pub fn new(config: Config) -> Result<Self, AppError> {
        info!("Initializing Admission Engine...");
        let artifacts = ModelArtifacts::load(&config.artifacts)?;
        let engine = Self::with_artifacts(config, artifacts)?;
        info!("Admission Engine initialized successfully");
        Ok(engine)
    }

    pub fn with_artifacts(config: Config, artifacts: ModelArtifacts) -> Result<Self, AppError> {
        let labels = artifacts.predictor().labels();
        if labels.index_of(&config.model.accepted_class).is_none() {
            return Err(artifact_error(format!(
                "accepted class '{}' is not one of {:?}",
                config.model.accepted_class,
                labels.classes()
            )));
        }

        Ok(Self {
            config,
            artifacts,
            metrics: Metrics::new(),
        })
    }

    pub fn predict(&self, request: PredictionRequest) -> Result<PredictionResponse, AppError> {
        let start_time = Instant::now();

        if let Err(e) = self.validate_request(&request) {
            self.metrics.observe_rejection();
            warn!("Rejected prediction request: {}", e);
            return Err(e);
        }

        let result = FeatureEncoder::new(self.artifacts.schema())
            .encode(&request.criteria)
            .and_then(|vector| self.artifacts.predictor().predict(&vector));
        let result = match result {
            Ok(result) => result,
            Err(e) => {
                self.metrics.observe_failure();
                return Err(e);
            }
        };

        let elapsed = start_time.elapsed();
        self.metrics.observe_prediction(&result.label, elapsed);

        let accepted = result.label == self.config.model.accepted_class;
        let accepted_probability = match result.probability_of(&self.config.model.accepted_class) {
            Ok(p) => p,
            Err(e) => {
                self.metrics.observe_failure();
                return Err(e);
            }
        };
        let latency_ms = elapsed.as_secs_f64() * 1000.0;
        info!(
            "Prediction completed: {} (accepted: {}, latency: {:.3}ms)",
            result.label, accepted, latency_ms
        );

        Ok(PredictionResponse {
            decision_id: Uuid::new_v4(),
            label: result.label,
            accepted,
            accepted_probability,
            probabilities: result.probabilities,
            applicant: ApplicantIdentity {
                name: request.name,
                student_id: request.student_id,
            },
            criteria: request.criteria,
            model_version: self.config.model.version.clone(),
            latency_ms,
        })
    }

    pub fn options(&self) -> OptionsResponse {
        let schema = self.artifacts.schema();
        OptionsResponse {
            criteria: Criterion::ALL
                .iter()
                .map(|&criterion| CriterionOptions {
                    criterion,
                    options: schema.options(criterion),
                })
                .collect(),
        }
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn model_version(&self) -> &str {
        &self.config.model.version
    }

    fn validate_request(&self, request: &PredictionRequest) -> Result<(), AppError> {
        if !self.config.validation.require_identity {
            return Ok(());
        }

        let is_blank =
            |field: &Option<String>| field.as_deref().map_or(true, |s| s.trim().is_empty());
        if is_blank(&request.name) {
            return Err(validation_error("Applicant name cannot be empty"));
        }
        if is_blank(&request.student_id) {
            return Err(validation_error("Student ID cannot be empty"));
        }

        Ok(())
    }
}
