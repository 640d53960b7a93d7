use async_trait::async_trait;
use secrecy::SecretString;
use siphasher::sip::SipHasher13;
use std::hash::{Hash, Hasher};

use super::{EmbedError, Embedder};

pub const HASHING_MODEL_NAME: &str = "feature-hashing-v1";

// Changing either seed changes every vector; bump HASHING_MODEL_NAME with it.
const HASH_SEED_K0: u64 = 0x0123_4567_89ab_cdef;
const HASH_SEED_K1: u64 = 0xfedc_ba98_7654_3210;

/// Deterministic feature-hashing embedder.
///
/// Each lowercase alphanumeric token is hashed into one of `dimension`
/// buckets with a hashed sign; the result is L2-normalized. Texts sharing
/// vocabulary end up with high cosine similarity.
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0_f32; self.dimension];

        for token in tokenize(text) {
            let idx = (hash(&token) as usize) % self.dimension;
            let sign = if hash(&format!("{token}_sign")) % 2 == 0 {
                1.0
            } else {
                -1.0
            };
            vector[idx] += sign;
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    async fn embed(
        &self,
        texts: &[String],
        _token: &SecretString,
    ) -> Result<Vec<Vec<f32>>, EmbedError> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }

    fn model_name(&self) -> &str {
        HASHING_MODEL_NAME
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

fn hash(token: &str) -> u64 {
    let mut hasher = SipHasher13::new_with_keys(HASH_SEED_K0, HASH_SEED_K1);
    token.hash(&mut hasher);
    hasher.finish()
}
