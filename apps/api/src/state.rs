use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::Config;
use crate::embedding::Embedder;
use crate::ingest::chunker::ChunkConfig;
use crate::llm_client::Generator;
use crate::optimization::pipeline::PipelineSettings;
use crate::session::models::Session;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// The one user session of this instance. Held only briefly, so status
    /// reads see `processing` while a submit runs.
    pub session: Arc<Mutex<Session>>,
    /// Held for the whole of a submit; requests are processed one at a time.
    pub submit_lock: Arc<Mutex<()>>,
    /// Pluggable embedder, chosen via EMBEDDING_BACKEND.
    pub embedder: Arc<dyn Embedder>,
    /// `LlmClient` in production.
    pub generator: Arc<dyn Generator>,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config, embedder: Arc<dyn Embedder>, generator: Arc<dyn Generator>) -> Self {
        Self {
            session: Arc::new(Mutex::new(Session::new(config.history_limit))),
            submit_lock: Arc::new(Mutex::new(())),
            embedder,
            generator,
            config,
        }
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            chunking: ChunkConfig {
                max_chars: self.config.chunk_max_chars,
                overlap_chars: self.config.chunk_overlap_chars,
            },
            top_k: self.config.retrieval_top_k,
        }
    }
}
