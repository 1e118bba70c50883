//! Embeddings from an Ollama server (`POST /api/embed`).

use crate::source::VectorSource;
use domainmap_core::{EmbeddingError, Error, Result, Vector};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_HOST: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "nomic-embed-text";

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

pub struct OllamaVectorSource {
    host: String,
    model: String,
    dimension: usize,
    client: reqwest::blocking::Client,
}

impl OllamaVectorSource {
    /// `dimension` must match the model's output size; mismatching vectors are
    /// rejected by the engine.
    pub fn new(host: &str, model: &str, dimension: usize, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::InvalidConfig(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            host: host.trim_end_matches('/').to_string(),
            model: model.to_string(),
            dimension,
            client,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl VectorSource for OllamaVectorSource {
    fn embed(&self, text: &str) -> std::result::Result<Vector, EmbeddingError> {
        let request = EmbedRequest {
            model: &self.model,
            input: text,
        };

        let response = self
            .client
            .post(format!("{}/api/embed", self.host))
            .json(&request)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    EmbeddingError::Unavailable(format!("cannot connect to Ollama at {}", self.host))
                } else {
                    EmbeddingError::Failed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(EmbeddingError::Failed(format!(
                "Ollama returned {} for model {}",
                status, self.model
            )));
        }

        let body: EmbedResponse = response
            .json()
            .map_err(|e| EmbeddingError::Failed(format!("invalid embedding response: {e}")))?;

        body.embeddings
            .into_iter()
            .next()
            .map(Vector::new)
            .ok_or(EmbeddingError::Empty)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "ollama"
    }
}
