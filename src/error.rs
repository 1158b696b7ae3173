use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Artifact load error: {0}")]
    ArtifactLoad(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Contract violation: {0}")]
    ContractViolation(String),

    #[error("Model inference error: {0}")]
    ModelInference(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::InvalidInput(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::ContractViolation(_) => {
                tracing::error!("Rejected request: {}", self);
                (StatusCode::UNPROCESSABLE_ENTITY, self.to_string())
            }
            _ => {
                tracing::error!("Internal server error: {}", self);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }));

        (status, body).into_response()
    }
}

// Helper function for creating validation errors
pub fn validation_error(msg: &str) -> AppError {
    AppError::InvalidInput(msg.to_string())
}

// Helper function for creating artifact errors
pub fn artifact_error(msg: impl Into<String>) -> AppError {
    AppError::ArtifactLoad(msg.into())
}
