//! Resume optimization: orchestrates one submit from start to finish.
//!
//! Flow: preconditions → load PDF text → chunk → embed + index →
//!       retrieve top-k → LLM generate → strip reasoning markers → history.
//!
//! The session lock is only held to check preconditions and to commit the
//! result, so `processing` is visible to status reads while the model runs.
//! Callers serialize submits with `AppState::submit_lock`. History is only
//! touched after every step has succeeded.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::embedding::Embedder;
use crate::errors::AppError;
use crate::ingest::chunker::{chunk_document, ChunkConfig};
use crate::ingest::{load_resume_text, LoaderError};
use crate::llm_client::prompts::{CONTEXT_SEPARATOR, RESUME_COACH_SYSTEM, RETRIEVAL_QA_TEMPLATE};
use crate::llm_client::{strip_reasoning_markers, Generator};
use crate::optimization::focus::OptimizationFocus;
use crate::optimization::prompts::OPTIMIZATION_PROMPT_TEMPLATE;
use crate::retrieval::{Retriever, ScoredUnit};
use crate::session::models::{HistoryEntry, Session, SessionPhase, UploadedResume};

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

/// Request body for `POST /api/v1/optimize`.
#[derive(Debug, Clone, Deserialize)]
pub struct OptimizeRequest {
    #[serde(default)]
    pub job_title: String,
    #[serde(default)]
    pub job_description: String,
    pub focus: OptimizationFocus,
}

/// Result of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct OptimizationOutcome {
    pub entry: HistoryEntry,
    pub indexed_units: usize,
    pub retrieved_units: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct PipelineSettings {
    pub chunking: ChunkConfig,
    pub top_k: usize,
}

/// What a run needs from the session, taken while the lock is held.
struct SubmitInputs {
    resume: UploadedResume,
    groq_api_key: SecretString,
    hf_token: SecretString,
    epoch: u64,
}

struct Generated {
    content: String,
    indexed_units: usize,
    retrieved_units: usize,
}

// ────────────────────────────────────────────────────────────────────────────
// Pipeline
// ────────────────────────────────────────────────────────────────────────────

/// Runs one optimization request against the session.
///
/// Missing resume or credentials short-circuit to the failed state before any
/// work starts. Any later error also lands in the failed state. Either way
/// nothing is appended to history.
pub async fn run_optimization(
    session: &Mutex<Session>,
    embedder: &dyn Embedder,
    generator: &dyn Generator,
    settings: PipelineSettings,
    request: OptimizeRequest,
) -> Result<OptimizationOutcome, AppError> {
    let inputs = begin(&mut *session.lock().await, &request)?;

    let result = process(&inputs, embedder, generator, settings, &request).await;

    let mut session = session.lock().await;
    if session.epoch() != inputs.epoch {
        info!("Session ended during processing; result discarded");
        return Err(AppError::Validation(
            "The session ended before processing finished".to_string(),
        ));
    }

    match result {
        Ok(generated) => {
            let entry =
                HistoryEntry::assistant(generated.content, request.focus, request.job_title);
            if let Some(evicted) = session.history.push(entry.clone()) {
                info!("History limit reached; evicted entry {}", evicted.id);
            }
            session.phase = SessionPhase::DisplayingResult;
            info!(
                "Optimization complete: {} of {} units used, history size {}",
                generated.retrieved_units,
                generated.indexed_units,
                session.history.len()
            );
            Ok(OptimizationOutcome {
                entry,
                indexed_units: generated.indexed_units,
                retrieved_units: generated.retrieved_units,
            })
        }
        Err(e) => {
            warn!("Optimization failed: {e}");
            session.fail(e.user_message());
            Err(e)
        }
    }
}

/// Checks preconditions and moves the session to `processing`.
fn begin(session: &mut Session, request: &OptimizeRequest) -> Result<SubmitInputs, AppError> {
    let Some(resume) = session.resume.clone() else {
        return Err(reject(session, AppError::MissingDocument));
    };
    let Some((groq_api_key, hf_token)) = session
        .credentials
        .ready()
        .map(|(groq, hf)| (copy_secret(groq), copy_secret(hf)))
    else {
        return Err(reject(session, AppError::MissingCredentials));
    };

    session.phase = SessionPhase::Processing;
    info!(
        "Optimizing '{}' for focus {}",
        resume.file_name,
        request.focus.label()
    );

    Ok(SubmitInputs {
        resume,
        groq_api_key,
        hf_token,
        epoch: session.epoch(),
    })
}

fn copy_secret(secret: &SecretString) -> SecretString {
    SecretString::new(secret.expose_secret().clone())
}

fn reject(session: &mut Session, error: AppError) -> AppError {
    session.fail(error.user_message());
    error
}

async fn process(
    inputs: &SubmitInputs,
    embedder: &dyn Embedder,
    generator: &dyn Generator,
    settings: PipelineSettings,
    request: &OptimizeRequest,
) -> Result<Generated, AppError> {
    let hf_token = &inputs.hf_token;

    // Step 1: Load
    let resume_text = load_resume_text(inputs.resume.bytes.clone()).await?;

    // Step 2: Chunk
    let units = chunk_document(&resume_text, settings.chunking);
    if units.is_empty() {
        return Err(LoaderError::NoText.into());
    }

    // Step 3: Embed + index
    let retriever = Retriever::build(embedder, units, hf_token, settings.top_k).await?;

    // Step 4: Retrieve with the instruction itself as the query
    let question = build_optimization_prompt(request);
    let hits = retriever.retrieve(&question, hf_token).await?;
    info!("Retrieved {} of {} units", hits.len(), retriever.len());

    // Step 5: Generate
    let prompt = build_retrieval_prompt(&hits, &question);
    let raw = generator
        .generate(RESUME_COACH_SYSTEM, &prompt, &inputs.groq_api_key)
        .await?;

    Ok(Generated {
        content: strip_reasoning_markers(&raw),
        indexed_units: retriever.len(),
        retrieved_units: hits.len(),
    })
}

/// Fills the coaching template with the job and focus.
pub fn build_optimization_prompt(request: &OptimizeRequest) -> String {
    OPTIMIZATION_PROMPT_TEMPLATE
        .replace("{job_title}", request.job_title.trim())
        .replace("{job_description}", request.job_description.trim())
        .replace("{focus_label}", request.focus.label())
        .replace("{task}", request.focus.instruction())
}

/// Places the retrieved units in front of the question.
pub fn build_retrieval_prompt(hits: &[ScoredUnit], question: &str) -> String {
    let context = hits
        .iter()
        .map(|hit| hit.unit.content.as_str())
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR);

    RETRIEVAL_QA_TEMPLATE
        .replace("{context}", &context)
        .replace("{question}", question)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────


#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use bytes::Bytes;
    use chrono::Utc;

    use super::fakes::FakeGenerator;
    use super::*;
    use crate::embedding::hashing::HashingEmbedder;
    use crate::ingest::test_pdf;
    use crate::llm_client::LlmError;

    const RESUME_TEXT: &str = "Experienced engineer with 5 years Python.";

    fn settings() -> PipelineSettings {
        PipelineSettings {
            chunking: ChunkConfig {
                max_chars: 2000,
                overlap_chars: 200,
            },
            top_k: 5,
        }
    }

    fn request() -> OptimizeRequest {
        OptimizeRequest {
            job_title: "Backend Engineer".to_string(),
            job_description: "Build Python services on AWS.".to_string(),
            focus: OptimizationFocus::AtsKeywords,
        }
    }

    fn ready_session() -> Session {
        let mut session = Session::new(10);
        session
            .credentials
            .set_groq_api_key(SecretString::new("gsk_test".to_string()));
        session
            .credentials
            .set_hf_token(SecretString::new("hf_test".to_string()));
        session.resume = Some(UploadedResume {
            file_name: "resume.pdf".to_string(),
            bytes: Bytes::from(test_pdf::build(&[RESUME_TEXT])),
            uploaded_at: Utc::now(),
        });
        session
    }

    /// Looks at the session from inside the model call, optionally ending it.
    struct SessionObservingGenerator {
        session: Arc<Mutex<Session>>,
        end_session: bool,
        seen: std::sync::Mutex<Option<SessionPhase>>,
    }

    #[async_trait]
    impl Generator for SessionObservingGenerator {
        async fn generate(
            &self,
            _system: &str,
            _prompt: &str,
            _api_key: &SecretString,
        ) -> Result<String, LlmError> {
            if let Ok(mut session) = self.session.try_lock() {
                *self.seen.lock().unwrap() = Some(session.phase.clone());
                if self.end_session {
                    session.reset();
                }
            }
            Ok("## Key Findings".to_string())
        }
    }

    #[tokio::test]
    async fn test_prompt_carries_resume_job_and_focus_and_markers_are_stripped() {
        let session = Mutex::new(ready_session());
        let embedder = HashingEmbedder::new(64);
        let generator =
            FakeGenerator::replying("<think>scanning</think>## Key Findings\n• Python matches");

        let outcome = run_optimization(&session, &embedder, &generator, settings(), request())
            .await
            .unwrap();

        let prompt = generator.last_prompt().unwrap();
        assert!(prompt.contains("Experienced engineer"));
        assert!(prompt.contains("Python"));
        assert!(prompt.contains("Backend Engineer"));
        assert!(prompt.contains("ATS Keyword Optimizer"));
        assert!(prompt.contains("Build Python services on AWS."));
        assert!(prompt.contains("Identify missing ATS keywords and suggest improvements."));

        assert!(!outcome.entry.content.contains("<think>"));
        assert!(!outcome.entry.content.contains("</think>"));
        assert_eq!(outcome.indexed_units, 1);
        assert_eq!(outcome.retrieved_units, 1);
    }

    #[tokio::test]
    async fn test_success_appends_exactly_one_entry() {
        let session = Mutex::new(ready_session());
        let embedder = HashingEmbedder::new(64);
        let generator = FakeGenerator::replying("## Improvements");

        run_optimization(&session, &embedder, &generator, settings(), request())
            .await
            .unwrap();

        let session = session.lock().await;
        assert_eq!(session.history.len(), 1);
        assert_eq!(session.phase, SessionPhase::DisplayingResult);
        let entry = session.history.entries().next().unwrap();
        assert_eq!(entry.job_title, "Backend Engineer");
        assert_eq!(entry.focus, OptimizationFocus::AtsKeywords);
    }

    #[tokio::test]
    async fn test_processing_phase_is_visible_while_generating() {
        let session = Arc::new(Mutex::new(ready_session()));
        let generator = SessionObservingGenerator {
            session: session.clone(),
            end_session: false,
            seen: std::sync::Mutex::new(None),
        };

        run_optimization(
            &session,
            &HashingEmbedder::new(16),
            &generator,
            settings(),
            request(),
        )
        .await
        .unwrap();

        assert_eq!(
            *generator.seen.lock().unwrap(),
            Some(SessionPhase::Processing)
        );
        assert_eq!(session.lock().await.phase, SessionPhase::DisplayingResult);
    }

    #[tokio::test]
    async fn test_result_is_discarded_when_session_ends_mid_run() {
        let session = Arc::new(Mutex::new(ready_session()));
        let generator = SessionObservingGenerator {
            session: session.clone(),
            end_session: true,
            seen: std::sync::Mutex::new(None),
        };

        let err = run_optimization(
            &session,
            &HashingEmbedder::new(16),
            &generator,
            settings(),
            request(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        let session = session.lock().await;
        assert!(session.history.is_empty());
        assert_eq!(session.phase, SessionPhase::Idle);
    }

    #[tokio::test]
    async fn test_missing_document_fails_without_side_effects() {
        let mut ready = ready_session();
        ready.resume = None;
        let session = Mutex::new(ready);
        let generator = FakeGenerator::replying("unused");

        let err = run_optimization(
            &session,
            &HashingEmbedder::new(16),
            &generator,
            settings(),
            request(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::MissingDocument));
        assert_eq!(generator.calls(), 0);
        let session = session.lock().await;
        assert!(session.history.is_empty());
        assert!(matches!(session.phase, SessionPhase::Failed { .. }));
    }

    #[tokio::test]
    async fn test_missing_credentials_fails_without_side_effects() {
        let mut ready = ready_session();
        ready.credentials = Default::default();
        ready
            .credentials
            .set_groq_api_key(SecretString::new("gsk_test".to_string()));
        let session = Mutex::new(ready);
        let generator = FakeGenerator::replying("unused");

        let err = run_optimization(
            &session,
            &HashingEmbedder::new(16),
            &generator,
            settings(),
            request(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::MissingCredentials));
        assert!(session.lock().await.history.is_empty());
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_generator_failure_appends_nothing() {
        let session = Mutex::new(ready_session());
        let generator = FakeGenerator::failing();

        let err = run_optimization(
            &session,
            &HashingEmbedder::new(16),
            &generator,
            settings(),
            request(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::Llm(_)));
        let session = session.lock().await;
        assert!(session.history.is_empty());
        assert_eq!(
            session.phase,
            SessionPhase::Failed {
                message: "An AI processing error occurred".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_corrupt_pdf_fails_before_generation() {
        let mut ready = ready_session();
        if let Some(resume) = ready.resume.as_mut() {
            resume.bytes = Bytes::from_static(b"%PDF-1.4 truncated");
        }
        let session = Mutex::new(ready);
        let generator = FakeGenerator::replying("unused");

        let err = run_optimization(
            &session,
            &HashingEmbedder::new(16),
            &generator,
            settings(),
            request(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::DocumentParse(_)));
        assert_eq!(generator.calls(), 0);
        assert!(session.lock().await.history.is_empty());
    }

    #[tokio::test]
    async fn test_failure_after_success_keeps_previous_history() {
        let session = Mutex::new(ready_session());
        let embedder = HashingEmbedder::new(16);

        run_optimization(
            &session,
            &embedder,
            &FakeGenerator::replying("first"),
            settings(),
            request(),
        )
        .await
        .unwrap();
        let _ = run_optimization(
            &session,
            &embedder,
            &FakeGenerator::failing(),
            settings(),
            request(),
        )
        .await;

        let session = session.lock().await;
        assert_eq!(session.history.len(), 1);
        assert_eq!(session.history.entries().next().unwrap().content, "first");
    }

    #[test]
    fn test_build_optimization_prompt_fills_every_placeholder() {
        let prompt = build_optimization_prompt(&request());
        assert!(!prompt.contains('{'));
        assert!(prompt.contains("Job Title: Backend Engineer"));
        assert!(prompt.contains("Optimization Focus: ATS Keyword Optimizer"));
        assert!(prompt.contains("## Action Items"));
    }

    #[test]
    fn test_build_retrieval_prompt_includes_context_before_question() {
        let hits = vec![ScoredUnit {
            unit: crate::ingest::chunker::DocumentUnit {
                ordinal: 0,
                content: RESUME_TEXT.to_string(),
            },
            score: 0.42,
        }];
        let prompt = build_retrieval_prompt(&hits, "What is missing?");

        let context_at = prompt.find(RESUME_TEXT).unwrap();
        let question_at = prompt.find("Question: What is missing?").unwrap();
        assert!(context_at < question_at);
    }
}
