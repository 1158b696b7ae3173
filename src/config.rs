use serde::Deserialize;
use std::env;

use crate::error::AppError;

const DEFAULT_CONFIG_FILE: &str = "admission";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub artifacts: ArtifactConfig,
    pub model: ModelConfig,
    pub validation: ValidationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
}

/// Locations of the three trained artifacts.
#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactConfig {
    pub model_path: String,
    pub label_encoder_path: String,
    pub schema_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    pub version: String,
    /// Label encoder class that counts as an admission.
    pub accepted_class: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValidationConfig {
    pub require_identity: bool,
}

impl Config {
    /// Defaults, then `admission.{toml,json,..}` (or the file named by
    /// `ADMISSION_CONFIG`), then `ADMISSION_*` environment variables.
    pub fn load() -> Result<Self, AppError> {
        let file = env::var("ADMISSION_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());

        let settings = Self::builder()?
            .add_source(config::File::with_name(&file).required(false))
            .add_source(
                config::Environment::with_prefix("ADMISSION")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, AppError> {
        Ok(config::Config::builder()
            .set_default("server.bind_addr", "0.0.0.0:8000")?
            .set_default("artifacts.model_path", "artifacts/decision_tree_model.json")?
            .set_default("artifacts.label_encoder_path", "artifacts/label_encoder.json")?
            .set_default("artifacts.schema_path", "artifacts/feature_names.json")?
            .set_default("model.version", "v1.0.0")?
            .set_default("model.accepted_class", "Diterima")?
            .set_default("validation.require_identity", true)?)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind_addr: "0.0.0.0:8000".to_string(),
            },
            artifacts: ArtifactConfig {
                model_path: "artifacts/decision_tree_model.json".to_string(),
                label_encoder_path: "artifacts/label_encoder.json".to_string(),
                schema_path: "artifacts/feature_names.json".to_string(),
            },
            model: ModelConfig {
                version: "v1.0.0".to_string(),
                accepted_class: "Diterima".to_string(),
            },
            validation: ValidationConfig {
                require_identity: true,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_match_default_impl() {
        let built: Config = Config::builder()
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        let default = Config::default();

        assert_eq!(built.server.bind_addr, default.server.bind_addr);
        assert_eq!(built.artifacts.model_path, default.artifacts.model_path);
        assert_eq!(built.artifacts.schema_path, default.artifacts.schema_path);
        assert_eq!(built.model.accepted_class, default.model.accepted_class);
        assert!(built.validation.require_identity);
    }

    #[test]
    fn overrides_take_precedence_over_defaults() {
        let built: Config = Config::builder()
            .unwrap()
            .set_override("model.accepted_class", "Accepted")
            .unwrap()
            .set_override("validation.require_identity", false)
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(built.model.accepted_class, "Accepted");
        assert!(!built.validation.require_identity);
    }
}
