#[cfg(feature = "local-embeddings")]
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context, Result};

use crate::embedding::EmbeddingBackend;

const DEFAULT_GROQ_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
const DEFAULT_HF_INFERENCE_URL: &str =
    "https://router.huggingface.co/hf-inference/models/sentence-transformers/all-MiniLM-L6-v2/pipeline/feature-extraction";

/// Application configuration loaded from environment variables.
///
/// Credentials are deliberately absent: they are supplied per session through
/// the API and never read from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub rust_log: String,
    pub groq_api_url: String,
    pub embedding_backend: EmbeddingBackend,
    pub hf_inference_url: String,
    #[cfg(feature = "local-embeddings")]
    pub embedding_cache_dir: PathBuf,
    pub hashing_dimension: usize,
    pub chunk_max_chars: usize,
    pub chunk_overlap_chars: usize,
    pub retrieval_top_k: usize,
    pub history_limit: usize,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let config = Config {
            host: env_or("HOST", "127.0.0.1"),
            port: parse_env("PORT", 8080)?,
            rust_log: env_or("RUST_LOG", "info"),
            groq_api_url: env_or("GROQ_API_URL", DEFAULT_GROQ_API_URL),
            embedding_backend: parse_env("EMBEDDING_BACKEND", EmbeddingBackend::default())?,
            hf_inference_url: env_or("HF_INFERENCE_URL", DEFAULT_HF_INFERENCE_URL),
            #[cfg(feature = "local-embeddings")]
            embedding_cache_dir: PathBuf::from(env_or("EMBEDDING_CACHE_DIR", ".fastembed_cache")),
            hashing_dimension: parse_env("HASHING_DIMENSION", 384)?,
            chunk_max_chars: parse_env("CHUNK_MAX_CHARS", 2000)?,
            chunk_overlap_chars: parse_env("CHUNK_OVERLAP_CHARS", 200)?,
            retrieval_top_k: parse_env("RETRIEVAL_TOP_K", 5)?,
            history_limit: parse_env("HISTORY_LIMIT", 50)?,
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.retrieval_top_k == 0 {
            bail!("RETRIEVAL_TOP_K must be at least 1");
        }
        if self.history_limit == 0 {
            bail!("HISTORY_LIMIT must be at least 1");
        }
        if self.hashing_dimension == 0 {
            bail!("HASHING_DIMENSION must be at least 1");
        }
        if self.chunk_max_chars > 0 && self.chunk_overlap_chars >= self.chunk_max_chars {
            bail!("CHUNK_OVERLAP_CHARS must be smaller than CHUNK_MAX_CHARS");
        }
        Ok(())
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
impl Config {
    /// Configuration used by unit tests: hashing embedder, small chunks.
    pub fn for_tests() -> Self {
        Config {
            host: "127.0.0.1".to_string(),
            port: 0,
            rust_log: "debug".to_string(),
            groq_api_url: DEFAULT_GROQ_API_URL.to_string(),
            embedding_backend: EmbeddingBackend::Hashing,
            hf_inference_url: DEFAULT_HF_INFERENCE_URL.to_string(),
            #[cfg(feature = "local-embeddings")]
            embedding_cache_dir: PathBuf::from(".fastembed_cache"),
            hashing_dimension: 64,
            chunk_max_chars: 400,
            chunk_overlap_chars: 40,
            retrieval_top_k: 5,
            history_limit: 3,
            max_upload_bytes: 1024 * 1024,
        }
    }
}
