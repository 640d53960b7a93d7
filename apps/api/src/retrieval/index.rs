//! In-memory vector index with brute-force cosine search.

use serde::Serialize;
use thiserror::Error;

use crate::ingest::chunker::DocumentUnit;

#[derive(Debug, Error, PartialEq)]
pub enum IndexError {
    #[error("got {vectors} vectors for {units} units")]
    CountMismatch { units: usize, vectors: usize },

    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// A unit returned by a search, with its similarity to the query.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredUnit {
    pub unit: DocumentUnit,
    pub score: f32,
}

/// Every unit paired with exactly one embedding vector of a single dimension.
#[derive(Debug)]
pub struct VectorIndex {
    entries: Vec<(DocumentUnit, Vec<f32>)>,
    dimension: usize,
}

impl VectorIndex {
    pub fn build(units: Vec<DocumentUnit>, vectors: Vec<Vec<f32>>) -> Result<Self, IndexError> {
        if units.len() != vectors.len() {
            return Err(IndexError::CountMismatch {
                units: units.len(),
                vectors: vectors.len(),
            });
        }

        let dimension = vectors.first().map(Vec::len).unwrap_or(0);
        if let Some(bad) = vectors.iter().find(|v| v.len() != dimension) {
            return Err(IndexError::DimensionMismatch {
                expected: dimension,
                actual: bad.len(),
            });
        }

        Ok(Self {
            entries: units.into_iter().zip(vectors).collect(),
            dimension,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the `k` most similar units, best first. `k` is capped at the
    /// index size; ties keep document order.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredUnit>, IndexError> {
        if self.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        if query.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut scored: Vec<ScoredUnit> = self
            .entries
            .iter()
            .map(|(unit, vector)| ScoredUnit {
                unit: unit.clone(),
                score: cosine_similarity(query, vector),
            })
            .collect();

        // Stable sort: equal scores stay in document order.
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(k.min(self.len()));
        Ok(scored)
    }
}

/// Cosine similarity in [-1, 1]. Zero vectors and length mismatches score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        tracing::warn!(
            a_len = a.len(),
            b_len = b.len(),
            "embedding dimension mismatch; returning zero similarity"
        );
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}
