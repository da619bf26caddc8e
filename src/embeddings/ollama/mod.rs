
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use super::Embedder;
use crate::config::OllamaConfig;
use crate::{FileVectorError, Result};

/// Blocking client for the Ollama HTTP API.
///
/// Every request is attempted exactly once; callers decide what a failure means.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: Url,
    model: String,
    agent: ureq::Agent,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    #[serde(default)]
    embeddings: Vec<Vec<f32>>,
}

#[derive(Debug, Deserialize)]
struct VersionResponse {
    version: String,
}

/// A model installed on the Ollama server
#[derive(Debug, Deserialize)]
pub struct ModelInfo {
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    models: Vec<ModelInfo>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

impl OllamaClient {
    #[inline]
    pub fn new(config: &OllamaConfig) -> Result<Self> {
        let base_url = config
            .ollama_url()
            .map_err(|e| FileVectorError::Config(format!("Failed to build Ollama URL: {e}")))?;

        Ok(Self {
            base_url,
            model: config.model.clone(),
            agent: Self::build_agent(Duration::from_secs(config.timeout_secs)),
        })
    }

    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = Self::build_agent(timeout);
        self
    }

    fn build_agent(timeout: Duration) -> ureq::Agent {
        ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into()
    }

    #[inline]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Test connection to Ollama server and verify model availability
    #[inline]
    pub fn health_check(&self) -> Result<()> {
        debug!("Performing health check for Ollama at {}", self.base_url);

        let version = self.ping()?;
        self.validate_model()?;

        info!(
            "Health check passed for Ollama {} at {} with model {}",
            version, self.base_url, self.model
        );
        Ok(())
    }

    /// Ping the Ollama server, returning its version string
    #[inline]
    pub fn ping(&self) -> Result<String> {
        let response_text = self.get("/api/version")?;
        let version: VersionResponse = serde_json::from_str(&response_text).map_err(|e| {
            FileVectorError::Network(format!("Unexpected response from Ollama version endpoint: {e}"))
        })?;

        debug!("Ollama server responded with version {}", version.version);
        Ok(version.version)
    }

    /// Validate that the configured model is available
    #[inline]
    pub fn validate_model(&self) -> Result<()> {
        debug!("Validating model: {}", self.model);

        let models = self.list_models()?;
        let tagged = format!("{}:latest", self.model);

        if models
            .iter()
            .any(|m| m.name == self.model || m.name == tagged)
        {
            debug!("Model {} is available", self.model);
            Ok(())
        } else {
            let available_models: Vec<&str> = models.iter().map(|m| m.name.as_str()).collect();
            warn!(
                "Model {} not found. Available models: {:?}",
                self.model, available_models
            );
            Err(FileVectorError::Embedding(format!(
                "Model '{}' is not available. Available models: {:?}",
                self.model, available_models
            )))
        }
    }

    /// List all available models
    #[inline]
    pub fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let response_text = self.get("/api/tags")?;
        let models_response: ModelsResponse = serde_json::from_str(&response_text)
            .map_err(|e| FileVectorError::Network(format!("Failed to parse models response: {e}")))?;

        debug!("Found {} models", models_response.models.len());
        Ok(models_response.models)
    }

    /// Generate the embedding for a single text input.
    ///
    /// An empty `embeddings` array in the response yields an empty vector.
    #[inline]
    pub fn generate_embedding(&self, text: &str) -> Result<Vec<f32>> {
        debug!("Generating embedding for text (length: {})", text.len());

        let request = EmbedRequest {
            model: &self.model,
            input: text,
        };
        let request_json = serde_json::to_string(&request).map_err(|e| {
            FileVectorError::Embedding(format!("Failed to serialize embedding request: {e}"))
        })?;

        let response_text = self.post_json("/api/embed", &request_json)?;
        let embed_response: EmbedResponse = serde_json::from_str(&response_text).map_err(|e| {
            FileVectorError::Embedding(format!("Failed to parse embedding response: {e}"))
        })?;

        let embedding = embed_response
            .embeddings
            .into_iter()
            .next()
            .unwrap_or_default();

        debug!("Generated embedding with {} dimensions", embedding.len());
        Ok(embedding)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| FileVectorError::Config(format!("Failed to build Ollama URL for {path}: {e}")))
    }

    fn get(&self, path: &str) -> Result<String> {
        let url = self.endpoint(path)?;
        debug!("GET {}", url);

        let response = self
            .agent
            .get(url.as_str())
            .call()
            .map_err(|e| transport_error(&url, &e))?;
        read_response(&url, response)
    }

    fn post_json(&self, path: &str, body: &str) -> Result<String> {
        let url = self.endpoint(path)?;
        debug!("POST {}", url);

        let response = self
            .agent
            .post(url.as_str())
            .header("Content-Type", "application/json")
            .send(body)
            .map_err(|e| transport_error(&url, &e))?;
        read_response(&url, response)
    }
}

impl Embedder for OllamaClient {
    #[inline]
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.generate_embedding(text)
    }

    #[inline]
    fn model_name(&self) -> &str {
        &self.model
    }
}

fn read_response(url: &Url, mut response: ureq::http::Response<ureq::Body>) -> Result<String> {
    let status = response.status();
    let body = response
        .body_mut()
        .read_to_string()
        .map_err(|e| transport_error(url, &e))?;

    if status.is_success() {
        return Ok(body);
    }

    let detail = serde_json::from_str::<ErrorResponse>(&body).map_or(body, |e| e.error);
    warn!("Ollama request to {} failed with {}: {}", url, status, detail);
    Err(FileVectorError::Embedding(format!(
        "Ollama returned HTTP {}: {}",
        status.as_u16(),
        detail
    )))
}

fn transport_error(url: &Url, error: &ureq::Error) -> FileVectorError {
    match error {
        ureq::Error::ConnectionFailed
        | ureq::Error::HostNotFound
        | ureq::Error::Timeout(_)
        | ureq::Error::Io(_) => {
            FileVectorError::Network(format!("Could not reach Ollama at {url}: {error}"))
        }
        _ => FileVectorError::Embedding(format!("Request to {url} failed: {error}")),
    }
}
