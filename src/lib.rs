//! Admission prediction service.
//!
//! Loads a trained decision tree with its label encoder and feature schema,
//! encodes an applicant's six categorical criteria into the model's feature
//! row and reports the predicted admission class with per-class
//! probabilities.

pub mod artifacts;
pub mod config;
pub mod engine;
pub mod error;
pub mod features;
pub mod labels;
pub mod metrics;
pub mod model;
pub mod prediction;
pub mod routes;
pub mod schema;
pub mod types;

pub use artifacts::ModelArtifacts;
pub use config::Config;
pub use engine::AdmissionEngine;
pub use error::AppError;
pub use features::{FeatureEncoder, FeatureVector};
pub use labels::LabelEncoder;
pub use model::{Classifier, DecisionTree};
pub use prediction::{PredictionResult, PredictionService};
pub use schema::{EncodingLayout, FeatureSchema};
