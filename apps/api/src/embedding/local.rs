use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use secrecy::SecretString;

use super::{ensure_count, EmbedError, Embedder, EMBEDDING_MODEL};

/// all-MiniLM-L6-v2 running in-process on the CPU via ONNX Runtime.
/// No network once the model files are in the cache directory.
pub struct LocalEmbedder {
    model: Arc<Mutex<TextEmbedding>>,
}

impl LocalEmbedder {
    /// Loads (downloading on first use) the model. Blocking.
    pub fn load(cache_dir: PathBuf) -> anyhow::Result<Self> {
        let options = InitOptions::new(EmbeddingModel::AllMiniLML6V2)
            .with_cache_dir(cache_dir)
            .with_show_download_progress(false);
        let model = TextEmbedding::try_new(options)?;
        Ok(Self {
            model: Arc::new(Mutex::new(model)),
        })
    }
}

#[async_trait]
impl Embedder for LocalEmbedder {
    async fn embed(
        &self,
        texts: &[String],
        _token: &SecretString,
    ) -> Result<Vec<Vec<f32>>, EmbedError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let model = Arc::clone(&self.model);
        let inputs = texts.to_vec();
        let vectors = tokio::task::spawn_blocking(move || {
            let mut model = model
                .lock()
                .map_err(|_| EmbedError::Model("embedding model lock poisoned".to_string()))?;
            model
                .embed(inputs, None)
                .map_err(|e| EmbedError::Model(e.to_string()))
        })
        .await
        .map_err(|e| EmbedError::Model(e.to_string()))??;

        ensure_count(texts.len(), &vectors)?;
        Ok(vectors)
    }

    fn model_name(&self) -> &str {
        EMBEDDING_MODEL
    }
}
