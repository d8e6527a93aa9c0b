use crate::config::ConfigError;
use crate::models::ModelName;
use crate::pipeline::PipelineError;
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Pipeline(PipelineError),
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Pipeline(err) => write!(f, "{}", err),
            AppError::BadRequest(message) => write!(f, "{}", message),
            AppError::NotFound(message) => write!(f, "{}", message),
            AppError::Internal(message) => write!(f, "internal error: {}", message),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Pipeline(err) => Some(err),
            AppError::BadRequest(_) | AppError::NotFound(_) | AppError::Internal(_) => None,
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Pipeline(PipelineError::InvalidInput(_)) | AppError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Pipeline(PipelineError::UnknownModel(_)) | AppError::NotFound(_) => {
                StatusCode::NOT_FOUND
            }
            AppError::Pipeline(PipelineError::Unavailable { .. }) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Pipeline(PipelineError::EncodingInconsistency(_))
            | AppError::Pipeline(PipelineError::Inference { .. })
            | AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match &self {
            AppError::Pipeline(PipelineError::Unavailable { available, .. }) => {
                let available: Vec<&'static str> =
                    available.iter().copied().map(ModelName::as_str).collect();
                json!({ "error": self.to_string(), "available": available })
            }
            AppError::Pipeline(err @ PipelineError::EncodingInconsistency(_))
            | AppError::Pipeline(err @ PipelineError::Inference { .. }) => {
                tracing::error!(error = %err, "prediction failed");
                json!({ "error": self.to_string() })
            }
            _ => json!({ "error": self.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<PipelineError> for AppError {
    fn from(value: PipelineError) -> Self {
        Self::Pipeline(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_errors_map_to_http_statuses() {
        let unknown = AppError::from(PipelineError::UnknownModel("SVM".to_string()));
        assert_eq!(unknown.status(), StatusCode::NOT_FOUND);

        let unavailable = AppError::from(PipelineError::Unavailable {
            model: ModelName::RandomForest,
            available: vec![ModelName::XGBoost],
        });
        assert_eq!(unavailable.status(), StatusCode::SERVICE_UNAVAILABLE);

        let encoding = AppError::from(PipelineError::EncodingInconsistency(
            crate::features::EncodingError::FamilyUnavailable(
                crate::features::ModelFamily::Neural,
            ),
        ));
        assert_eq!(encoding.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let unknown_category = AppError::from(PipelineError::EncodingInconsistency(
            crate::features::EncodingError::UnknownCategory {
                field: crate::domain::CategoricalField::Region,
                value: "Antioquia".to_string(),
            },
        ));
        assert_eq!(unknown_category.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let non_finite = AppError::from(PipelineError::Inference {
            model: ModelName::Deep,
            source: crate::models::ArtifactError::NonFinite(f32::NAN),
        });
        assert_eq!(non_finite.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
