use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ensure_count, EmbedError, Embedder, EMBEDDING_MODEL};

#[derive(Debug, Serialize)]
struct FeatureExtractionRequest<'a> {
    inputs: &'a [String],
}

#[derive(Debug, Deserialize)]
struct InferenceError {
    error: String,
}

/// Embeds through the Hugging Face Inference feature-extraction pipeline.
/// Authorised with the embedding-service token supplied for the session.
pub struct HostedEmbedder {
    client: Client,
    url: String,
}

impl HostedEmbedder {
    pub fn new(client: Client, url: String) -> Self {
        Self { client, url }
    }
}

#[async_trait]
impl Embedder for HostedEmbedder {
    async fn embed(
        &self,
        texts: &[String],
        token: &SecretString,
    ) -> Result<Vec<Vec<f32>>, EmbedError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(token.expose_secret())
            .json(&FeatureExtractionRequest { inputs: texts })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<InferenceError>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            return Err(EmbedError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let vectors: Vec<Vec<f32>> = response.json().await?;
        ensure_count(texts.len(), &vectors)?;
        debug!("Hosted embedding returned {} vectors", vectors.len());
        Ok(vectors)
    }

    fn model_name(&self) -> &str {
        EMBEDDING_MODEL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serializes_inputs_array() {
        let texts = vec!["a".to_string(), "b".to_string()];
        let body = serde_json::to_value(FeatureExtractionRequest { inputs: &texts }).unwrap();
        assert_eq!(body, serde_json::json!({ "inputs": ["a", "b"] }));
    }

    #[test]
    fn test_inference_error_body_parses() {
        let parsed: InferenceError =
            serde_json::from_str(r#"{"error":"Invalid credentials in Authorization header"}"#)
                .unwrap();
        assert!(parsed.error.contains("Invalid credentials"));
    }

    #[tokio::test]
    async fn test_empty_input_skips_the_network() {
        let embedder = HostedEmbedder::new(Client::new(), "http://127.0.0.1:9/unused".to_string());
        let vectors = embedder
            .embed(&[], &SecretString::new("hf_unused".to_string()))
            .await
            .unwrap();
        assert!(vectors.is_empty());
    }
}
