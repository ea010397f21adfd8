//! Ollama HTTP client.
//!
//! Implements both [`EmbeddingProvider`] and [`CompletionProvider`] against a
//! local or remote Ollama server:
//!
//! - `POST /api/embeddings` `{model, prompt}` → `{embedding}`
//! - `POST /api/generate` `{model, prompt, stream: false, options}` → `{response}`
//! - `GET /api/tags` → `{models: [{name}]}` (reachability and model check)
//!
//! Requests are not retried. A failed call surfaces immediately as a
//! [`ProviderError`].

use std::time::Duration;

use async_trait::async_trait;
use ragbase_core::{CompletionProvider, EmbeddingProvider, ProviderError};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{GenerationConfig, OllamaConfig};

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
    top_p: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Deserialize)]
struct ModelTag {
    name: String,
}

/// Client for one Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: String,
    client: reqwest::Client,
    generation: GenerationConfig,
}

impl OllamaClient {
    pub fn new(config: &OllamaConfig, generation: &GenerationConfig) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build()?;
        Ok(Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            client,
            generation: generation.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Names of the models installed on the server.
    pub async fn list_models(&self) -> Result<Vec<String>, ProviderError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self.client.get(&url).send().await.map_err(unavailable)?;
        let tags: TagsResponse = decode(response).await?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    /// Verify that the server answers and has `model` installed.
    ///
    /// A model given without a tag also matches `<model>:latest`.
    pub async fn check_model(&self, model: &str) -> Result<(), ProviderError> {
        let installed = self.list_models().await?;
        if installed.iter().any(|name| model_matches(model, name)) {
            Ok(())
        } else {
            Err(ProviderError::ModelNotFound(model.to_string()))
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaClient {
    async fn embed(&self, model: &str, text: &str) -> Result<Vec<f32>, ProviderError> {
        let url = format!("{}/api/embeddings", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&EmbeddingRequest {
                model,
                prompt: text,
            })
            .send()
            .await
            .map_err(unavailable)?;

        let body: EmbeddingResponse = decode(response).await?;
        debug!("ollama embedding: {} dimensions", body.embedding.len());
        Ok(body.embedding)
    }
}

#[async_trait]
impl CompletionProvider for OllamaClient {
    async fn complete(&self, model: &str, prompt: &str) -> Result<String, ProviderError> {
        let url = format!("{}/api/generate", self.base_url);
        let request = GenerateRequest {
            model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: self.generation.temperature,
                top_p: self.generation.top_p,
                num_predict: self.generation.num_predict,
            },
        };
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(unavailable)?;

        let body: GenerateResponse = decode(response).await?;
        Ok(body.response)
    }
}

fn unavailable(err: reqwest::Error) -> ProviderError {
    ProviderError::Unavailable(err.to_string())
}

async fn decode<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
) -> Result<T, ProviderError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::Status {
            status: status.as_u16(),
            body,
        });
    }
    let bytes = response.bytes().await.map_err(unavailable)?;
    serde_json::from_slice(&bytes).map_err(|e| ProviderError::InvalidResponse(e.to_string()))
}

fn model_matches(wanted: &str, installed: &str) -> bool {
    if wanted == installed {
        return true;
    }
    !wanted.contains(':') && installed == format!("{}:latest", wanted)
}
