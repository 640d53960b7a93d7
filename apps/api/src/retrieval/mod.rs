//! Retriever: embeds document units into a [`VectorIndex`] and answers
//! top-k similarity queries with the same embedder.

pub mod index;

use secrecy::SecretString;
use tracing::info;

pub use index::{IndexError, ScoredUnit, VectorIndex};

use crate::embedding::{EmbedError, Embedder};
use crate::errors::AppError;
use crate::ingest::chunker::DocumentUnit;

pub struct Retriever<'a> {
    embedder: &'a dyn Embedder,
    index: VectorIndex,
    top_k: usize,
}

impl<'a> Retriever<'a> {
    /// Embeds every unit and builds the index.
    pub async fn build(
        embedder: &'a dyn Embedder,
        units: Vec<DocumentUnit>,
        token: &SecretString,
        top_k: usize,
    ) -> Result<Retriever<'a>, AppError> {
        let texts: Vec<String> = units.iter().map(|u| u.content.clone()).collect();
        let vectors = embedder.embed(&texts, token).await?;
        let index = VectorIndex::build(units, vectors)?;
        info!(
            "Indexed {} units with {} (top_k={})",
            index.len(),
            embedder.model_name(),
            top_k
        );

        Ok(Self {
            embedder,
            index,
            top_k,
        })
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns up to `top_k` units most similar to `query`.
    pub async fn retrieve(
        &self,
        query: &str,
        token: &SecretString,
    ) -> Result<Vec<ScoredUnit>, AppError> {
        if self.index.is_empty() {
            return Ok(Vec::new());
        }

        let mut vectors = self.embedder.embed(&[query.to_string()], token).await?;
        let query_vector = vectors.pop().ok_or(EmbedError::CountMismatch {
            expected: 1,
            actual: 0,
        })?;

        Ok(self.index.search(&query_vector, self.top_k)?)
    }
}
