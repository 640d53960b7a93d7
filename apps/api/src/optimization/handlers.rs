//! Axum route handlers for the Optimization API.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

use crate::errors::AppError;
use crate::optimization::focus::{describe_all, FocusDescriptor};
use crate::optimization::pipeline::{run_optimization, OptimizationOutcome, OptimizeRequest};
use crate::state::AppState;

/// GET /api/v1/focuses
pub async fn handle_list_focuses() -> Json<Vec<FocusDescriptor>> {
    Json(describe_all())
}

/// POST /api/v1/optimize
///
/// Full pipeline: load PDF → chunk → embed → retrieve → LLM generate.
/// Concurrent submits queue up on the submit lock.
pub async fn handle_optimize(
    State(state): State<AppState>,
    payload: Result<Json<OptimizeRequest>, JsonRejection>,
) -> Result<Json<OptimizationOutcome>, AppError> {
    let Json(request) = payload?;
    let settings = state.pipeline_settings();
    let _submit = state.submit_lock.lock().await;

    let outcome = run_optimization(
        &state.session,
        state.embedder.as_ref(),
        state.generator.as_ref(),
        settings,
        request,
    )
    .await?;

    Ok(Json(outcome))
}
