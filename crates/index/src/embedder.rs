use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use thiserror::Error;

use telassist_core::config::EmbeddingConfig;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding request failed: {0}")]
    Transport(String),
    #[error("embedding endpoint returned status {status}: {body}")]
    Endpoint { status: u16, body: String },
    #[error("embedding response shape mismatch: expected {expected} vectors, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },
}

/// Converts text into vectors. The hosted implementation below is the
/// production path; tests substitute deterministic doubles.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;
}

/// Hosted feature-extraction endpoint speaking the
/// `{"inputs": [...]} -> [[f32]]` convention.
pub struct HttpEmbeddingClient {
    http: reqwest::Client,
    url: String,
    bearer: Option<String>,
}

impl HttpEmbeddingClient {
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| EmbeddingError::Transport(error.to_string()))?;

        let url = format!(
            "{}/{}/pipeline/feature-extraction",
            config.base_url.trim_end_matches('/'),
            config.model
        );
        let bearer = config.api_key.as_ref().map(|key| key.expose_secret().to_string());

        Ok(Self { http, url, bearer })
    }
}

#[async_trait]
impl EmbeddingClient for HttpEmbeddingClient {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut request = self.http.post(&self.url).json(&serde_json::json!({ "inputs": texts }));
        if let Some(bearer) = &self.bearer {
            request = request.bearer_auth(bearer);
        }

        let response = request
            .send()
            .await
            .map_err(|error| EmbeddingError::Transport(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Endpoint { status: status.as_u16(), body });
        }

        let vectors: Vec<Vec<f32>> = response
            .json()
            .await
            .map_err(|error| EmbeddingError::Transport(error.to_string()))?;

        if vectors.len() != texts.len() {
            return Err(EmbeddingError::ShapeMismatch {
                expected: texts.len(),
                actual: vectors.len(),
            });
        }

        Ok(vectors)
    }
}
