//! Axum route handlers for the session: credentials, resume upload, history.

use axum::{
    extract::{multipart::MultipartError, rejection::JsonRejection, Multipart, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::ingest::looks_like_pdf;
use crate::llm_client::MODEL;
use crate::session::models::{HistoryEntry, SessionPhase, UploadedResume};
use crate::state::AppState;

const UPLOAD_FIELD: &str = "file";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

/// Omitted fields keep their current value; blank strings clear them.
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub groq_api_key: Option<SecretString>,
    pub hf_token: Option<SecretString>,
}

#[derive(Debug, Serialize)]
pub struct CredentialsResponse {
    pub has_groq_api_key: bool,
    pub has_hf_token: bool,
}

#[derive(Debug, Serialize)]
pub struct SessionStatusResponse {
    pub phase: SessionPhase,
    pub has_resume: bool,
    pub resume_file_name: Option<String>,
    pub has_groq_api_key: bool,
    pub has_hf_token: bool,
    pub history_len: usize,
    pub history_limit: usize,
    pub embedding_model: String,
    pub generation_model: &'static str,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub file_name: String,
    pub size_bytes: usize,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub entries: Vec<HistoryEntry>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/session
pub async fn handle_get_session(State(state): State<AppState>) -> Json<SessionStatusResponse> {
    let session = state.session.lock().await;
    Json(SessionStatusResponse {
        phase: session.phase.clone(),
        has_resume: session.resume.is_some(),
        resume_file_name: session.resume.as_ref().map(|r| r.file_name.clone()),
        has_groq_api_key: session.credentials.has_groq_api_key(),
        has_hf_token: session.credentials.has_hf_token(),
        history_len: session.history.len(),
        history_limit: session.history.limit(),
        embedding_model: state.embedder.model_name().to_string(),
        generation_model: MODEL,
    })
}

/// PUT /api/v1/session/credentials
///
/// Secrets stay in memory for this process only and are never echoed back.
pub async fn handle_set_credentials(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Json<CredentialsResponse>, AppError> {
    let Json(req) = payload?;
    let mut session = state.session.lock().await;
    if let Some(key) = req.groq_api_key {
        session.credentials.set_groq_api_key(key);
    }
    if let Some(token) = req.hf_token {
        session.credentials.set_hf_token(token);
    }
    session.inputs_changed();

    info!(
        "Session credentials updated (groq: {}, hf: {})",
        session.credentials.has_groq_api_key(),
        session.credentials.has_hf_token()
    );

    Ok(Json(CredentialsResponse {
        has_groq_api_key: session.credentials.has_groq_api_key(),
        has_hf_token: session.credentials.has_hf_token(),
    }))
}

/// DELETE /api/v1/session
///
/// Ends the session: credentials, resume, and history are dropped.
pub async fn handle_end_session(State(state): State<AppState>) -> StatusCode {
    state.session.lock().await.reset();
    info!("Session ended");
    StatusCode::NO_CONTENT
}

/// POST /api/v1/resume
///
/// Multipart upload with a single PDF in the `file` field. Replaces any
/// previous upload. Text extraction happens at submit time.
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let limit = state.config.max_upload_bytes;
    let mut upload: Option<(String, bytes::Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| upload_error(e, limit))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or("resume.pdf").to_string();
        let declared_pdf = field.content_type() == Some("application/pdf")
            || file_name.to_ascii_lowercase().ends_with(".pdf");
        if !declared_pdf {
            return Err(AppError::Validation(
                "Only PDF resumes are accepted".to_string(),
            ));
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| upload_error(e, limit))?;
        upload = Some((file_name, bytes));
        break;
    }

    let (file_name, bytes) = upload.ok_or_else(|| {
        AppError::Validation(format!("Missing '{UPLOAD_FIELD}' field in upload"))
    })?;
    if bytes.is_empty() {
        return Err(AppError::Validation("Uploaded file is empty".to_string()));
    }
    if !looks_like_pdf(&bytes) {
        return Err(AppError::Validation(
            "Uploaded file is not a PDF document".to_string(),
        ));
    }

    let resume = UploadedResume {
        file_name,
        bytes,
        uploaded_at: Utc::now(),
    };
    let response = UploadResponse {
        file_name: resume.file_name.clone(),
        size_bytes: resume.bytes.len(),
        uploaded_at: resume.uploaded_at,
    };

    let mut session = state.session.lock().await;
    session.resume = Some(resume);
    session.inputs_changed();
    info!(
        "Resume uploaded: {} ({} bytes)",
        response.file_name, response.size_bytes
    );

    Ok(Json(response))
}

fn upload_error(e: MultipartError, limit: usize) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::Validation(format!("Upload exceeds {limit} bytes"))
    } else {
        AppError::Validation(format!("Malformed upload: {}", e.body_text()))
    }
}

/// GET /api/v1/resume
///
/// Returns the uploaded PDF for preview.
pub async fn handle_preview_resume(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let session = state.session.lock().await;
    let resume = session.resume.as_ref().ok_or(AppError::MissingDocument)?;

    let disposition = format!(
        "inline; filename=\"{}\"",
        resume.file_name.replace('"', "")
    );
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        resume.bytes.clone(),
    ))
}

/// GET /api/v1/history
///
/// Ordered oldest first. Reading the history acknowledges a displayed result.
pub async fn handle_get_history(State(state): State<AppState>) -> Json<HistoryResponse> {
    let mut session = state.session.lock().await;
    session.acknowledge_result();
    Json(HistoryResponse {
        entries: session.history.entries().cloned().collect(),
    })
}
