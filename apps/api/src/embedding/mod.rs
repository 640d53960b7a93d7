//! Embedder: maps text units to fixed-length vectors.
//!
//! Pluggable, trait-based like the rest of the pipeline seams. `AppState`
//! carries an `Arc<dyn Embedder>` chosen at startup via `EMBEDDING_BACKEND`:
//! - `local`: fastembed running all-MiniLM-L6-v2 on CPU (feature `local-embeddings`)
//! - `hosted`: Hugging Face Inference feature-extraction, authorised by the session token
//! - `hashing`: deterministic feature hashing, no model and no network

pub mod hashing;
pub mod hosted;
#[cfg(feature = "local-embeddings")]
pub mod local;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use secrecy::SecretString;
use thiserror::Error;
use tracing::info;

use crate::config::Config;

/// Pretrained model used by the `local` and `hosted` backends.
pub const EMBEDDING_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";

#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Embedding API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("expected {expected} embeddings, got {actual}")]
    CountMismatch { expected: usize, actual: usize },

    #[cfg(feature = "local-embeddings")]
    #[error("embedding model error: {0}")]
    Model(String),
}

#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embeds every text, returning one vector per input in the same order.
    /// `token` is the session's embedding-service token; backends that run
    /// locally ignore it.
    async fn embed(&self, texts: &[String], token: &SecretString)
        -> Result<Vec<Vec<f32>>, EmbedError>;

    fn model_name(&self) -> &str;
}

/// Which [`Embedder`] implementation to build at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingBackend {
    Local,
    Hosted,
    Hashing,
}

impl Default for EmbeddingBackend {
    fn default() -> Self {
        if cfg!(feature = "local-embeddings") {
            EmbeddingBackend::Local
        } else {
            EmbeddingBackend::Hosted
        }
    }
}

impl FromStr for EmbeddingBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "local" => Ok(EmbeddingBackend::Local),
            "hosted" => Ok(EmbeddingBackend::Hosted),
            "hashing" => Ok(EmbeddingBackend::Hashing),
            other => Err(format!(
                "unknown embedding backend '{other}' (expected local, hosted or hashing)"
            )),
        }
    }
}

impl fmt::Display for EmbeddingBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EmbeddingBackend::Local => "local",
            EmbeddingBackend::Hosted => "hosted",
            EmbeddingBackend::Hashing => "hashing",
        };
        f.write_str(name)
    }
}

/// Builds the configured embedder. Loading the local model may download it
/// into `EMBEDDING_CACHE_DIR` on first use.
pub async fn build_embedder(
    config: &Config,
    http: reqwest::Client,
) -> anyhow::Result<Arc<dyn Embedder>> {
    let embedder: Arc<dyn Embedder> = match config.embedding_backend {
        EmbeddingBackend::Hashing => {
            Arc::new(hashing::HashingEmbedder::new(config.hashing_dimension))
        }
        EmbeddingBackend::Hosted => Arc::new(hosted::HostedEmbedder::new(
            http,
            config.hf_inference_url.clone(),
        )),
        #[cfg(feature = "local-embeddings")]
        EmbeddingBackend::Local => {
            let cache_dir = config.embedding_cache_dir.clone();
            let model = tokio::task::spawn_blocking(move || local::LocalEmbedder::load(cache_dir))
                .await??;
            Arc::new(model)
        }
        #[cfg(not(feature = "local-embeddings"))]
        EmbeddingBackend::Local => anyhow::bail!(
            "EMBEDDING_BACKEND=local requires building with the `local-embeddings` feature"
        ),
    };

    info!(
        "Embedder initialized (backend: {}, model: {})",
        config.embedding_backend,
        embedder.model_name()
    );
    Ok(embedder)
}

/// Checks that a backend returned exactly one vector per input.
pub(crate) fn ensure_count(expected: usize, vectors: &[Vec<f32>]) -> Result<(), EmbedError> {
    if vectors.len() != expected {
        return Err(EmbedError::CountMismatch {
            expected,
            actual: vectors.len(),
        });
    }
    Ok(())
}
