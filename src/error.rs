//! Request-level errors for the prediction endpoint

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Errors raised while serving a single prediction request.
///
/// None of these are fatal: the handler turns them into a 500 response and
/// leaves the prediction log untouched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictError {
    #[error("could not convert feature '{name}' to float: {reason}")]
    InvalidFeature { name: String, reason: String },

    #[error("model inference failed: {0}")]
    Inference(String),
}

impl PredictError {
    pub fn invalid_feature(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidFeature {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<anyhow::Error> for PredictError {
    fn from(err: anyhow::Error) -> Self {
        Self::Inference(format!("{:#}", err))
    }
}

impl IntoResponse for PredictError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": self.to_string() })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = PredictError::invalid_feature("Open", "'abc' is not a number");
        assert_eq!(
            err.to_string(),
            "could not convert feature 'Open' to float: 'abc' is not a number"
        );

        let err: PredictError = anyhow::anyhow!("session poisoned").into();
        assert_eq!(err.to_string(), "model inference failed: session poisoned");
    }

    #[test]
    fn test_error_response_status() {
        let response = PredictError::Inference("boom".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
