use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::embedding::EmbedError;
use crate::ingest::LoaderError;
use crate::llm_client::LlmError;
use crate::retrieval::IndexError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Please upload your resume first")]
    MissingDocument,

    #[error("Please enter both API keys")]
    MissingCredentials,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Document could not be read: {0}")]
    DocumentParse(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::MissingDocument => "MISSING_DOCUMENT",
            AppError::MissingCredentials => "MISSING_CREDENTIALS",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::DocumentParse(_) => "DOCUMENT_PARSE_ERROR",
            AppError::Embedding(_) => "EMBEDDING_ERROR",
            AppError::Llm(_) => "LLM_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// The message shown to the user. External-service failures are opaque.
    pub fn user_message(&self) -> String {
        match self {
            AppError::MissingDocument | AppError::MissingCredentials => self.to_string(),
            AppError::Validation(msg) => msg.clone(),
            AppError::DocumentParse(msg) => format!("Could not read the resume PDF: {msg}"),
            AppError::Embedding(_) => "An embedding service error occurred".to_string(),
            AppError::Llm(_) => "An AI processing error occurred".to_string(),
            AppError::Internal(_) => "An internal server error occurred".to_string(),
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::MissingDocument
            | AppError::MissingCredentials
            | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::DocumentParse(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Embedding(_) | AppError::Llm(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<LoaderError> for AppError {
    fn from(e: LoaderError) -> Self {
        AppError::DocumentParse(e.to_string())
    }
}

impl From<EmbedError> for AppError {
    fn from(e: EmbedError) -> Self {
        AppError::Embedding(e.to_string())
    }
}

impl From<IndexError> for AppError {
    fn from(e: IndexError) -> Self {
        AppError::Internal(anyhow::Error::new(e))
    }
}

impl From<LlmError> for AppError {
    fn from(e: LlmError) -> Self {
        AppError::Llm(e.to_string())
    }
}

/// Rejected bodies never echo serde's message: it can quote submitted values.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        let message = match rejection {
            JsonRejection::JsonDataError(_) => "Request body has a missing or invalid field",
            JsonRejection::JsonSyntaxError(_) => "Request body is not valid JSON",
            JsonRejection::MissingJsonContentType(_) => "Expected a JSON request body",
            _ => "Request body could not be read",
        };
        AppError::Validation(message.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Embedding(msg) => tracing::error!("Embedding error: {msg}"),
            AppError::Llm(msg) => tracing::error!("LLM error: {msg}"),
            AppError::Internal(e) => tracing::error!("Internal error: {e:?}"),
            AppError::DocumentParse(msg) => tracing::warn!("Document parse error: {msg}"),
            _ => {}
        }

        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": self.user_message()
            }
        }));

        (self.status(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_llm_error_message_is_opaque() {
        let err = AppError::Llm("401 invalid api key gsk_secret".to_string());
        assert_eq!(err.user_message(), "An AI processing error occurred");
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_precondition_errors_are_bad_requests() {
        assert_eq!(AppError::MissingDocument.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::MissingCredentials.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::MissingCredentials.code(), "MISSING_CREDENTIALS");
    }

    #[test]
    fn test_loader_error_maps_to_document_parse() {
        let err: AppError = LoaderError::NotPdf.into();
        assert_eq!(err.code(), "DOCUMENT_PARSE_ERROR");
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
