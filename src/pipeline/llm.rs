//! Model invocation: send a prompt pair and schema to the language model.
//!
//! This is the pipeline's only network I/O and it is intentionally thin: the
//! prompts come from [`crate::prompts`], the schema from [`crate::schema`], and
//! the raw answer goes to [`crate::pipeline::validate`] untouched.
//!
//! Failures are never retried here. A model call is slow and expensive, so the
//! decision to try again is left to whoever called the pipeline.

use crate::error::ExtractError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Default Ollama endpoint.
pub const DEFAULT_OLLAMA_HOST: &str = "http://127.0.0.1:11434";

/// Default model name.
pub const DEFAULT_MODEL: &str = "llama3";

/// Sampling temperature of every model call. Zero keeps answers deterministic.
pub const TEMPERATURE: f32 = 0.0;

/// Environment variable Ollama itself uses for its address.
pub const OLLAMA_HOST_ENV: &str = "OLLAMA_HOST";

/// A language model that answers a system + user prompt under a JSON Schema.
#[async_trait]
pub trait ModelInvoker: Send + Sync {
    /// Return the model's raw response text.
    ///
    /// # Errors
    /// [`ExtractError::Upstream`] or [`ExtractError::ModelNotFound`] when the
    /// endpoint cannot produce an answer.
    async fn generate(&self, system: &str, user: &str, schema: &Value)
        -> Result<String, ExtractError>;
}

/// [`ModelInvoker`] for a local Ollama server (`POST /api/generate`).
#[derive(Debug, Clone)]
pub struct OllamaInvoker {
    host: String,
    model: String,
    client: reqwest::Client,
}

/// Request body for `/api/generate`.
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    system: &'a str,
    prompt: &'a str,
    format: &'a Value,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
}

/// The part of the `/api/generate` response we read.
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

impl OllamaInvoker {
    /// Create an invoker with no request timeout.
    ///
    /// # Errors
    /// [`ExtractError::Internal`] if the HTTP client cannot be built.
    pub fn new(host: &str, model: impl Into<String>) -> Result<Self, ExtractError> {
        Self::with_timeout(host, model, None)
    }

    /// Create an invoker with an optional per-call timeout.
    pub fn with_timeout(
        host: &str,
        model: impl Into<String>,
        timeout_secs: Option<u64>,
    ) -> Result<Self, ExtractError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| ExtractError::Internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            host: normalize_host(host),
            model: model.into(),
            client,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request_body<'a>(&'a self, system: &'a str, user: &'a str, schema: &'a Value) -> GenerateRequest<'a> {
        GenerateRequest {
            model: &self.model,
            system,
            prompt: user,
            format: schema,
            stream: false,
            options: GenerateOptions {
                temperature: TEMPERATURE,
            },
        }
    }
}

#[async_trait]
impl ModelInvoker for OllamaInvoker {
    async fn generate(
        &self,
        system: &str,
        user: &str,
        schema: &Value,
    ) -> Result<String, ExtractError> {
        let url = format!("{}/api/generate", self.host);
        let start = Instant::now();

        let response = self
            .client
            .post(&url)
            .json(&self.request_body(system, user, schema))
            .send()
            .await
            .map_err(|e| {
                let message = if e.is_timeout() {
                    format!("request to {url} timed out: {e}")
                } else if e.is_connect() {
                    format!("could not connect to {url}: {e}")
                } else {
                    format!("request to {url} failed: {e}")
                };
                warn!("{}", message);
                ExtractError::Upstream { message }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ExtractError::ModelNotFound {
                model: self.model.clone(),
            });
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ExtractError::Upstream {
                message: format!("HTTP {status}: {body}"),
            });
        }

        let body: GenerateResponse = response.json().await.map_err(|e| ExtractError::Upstream {
            message: format!("unexpected response body from {url}: {e}"),
        })?;

        debug!(
            "Model {} answered {} bytes in {:?}",
            self.model,
            body.response.len(),
            start.elapsed()
        );
        Ok(body.response)
    }
}

/// Normalise an Ollama address: default when empty, `http://` when no scheme,
/// no trailing slash.
pub fn normalize_host(host: &str) -> String {
    let mut host = host.trim().to_string();
    if host.is_empty() {
        host = DEFAULT_OLLAMA_HOST.to_string();
    }
    if !host.starts_with("http://") && !host.starts_with("https://") {
        host = format!("http://{host}");
    }
    host.trim_end_matches('/').to_string()
}

/// Ollama address from `OLLAMA_HOST`, or the default.
pub fn host_from_env() -> String {
    normalize_host(&std::env::var(OLLAMA_HOST_ENV).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalize_host_variants() {
        assert_eq!(normalize_host(""), DEFAULT_OLLAMA_HOST);
        assert_eq!(normalize_host("localhost:11434"), "http://localhost:11434");
        assert_eq!(normalize_host("http://gpu-box:11434/"), "http://gpu-box:11434");
        assert_eq!(normalize_host(" https://ollama.internal "), "https://ollama.internal");
    }

    #[test]
    fn request_body_is_deterministic_and_constrained() {
        let invoker = OllamaInvoker::new("localhost:11434", "llama3").unwrap();
        let schema = json!({"type": "array"});
        let body = serde_json::to_value(invoker.request_body("sys", "usr", &schema)).unwrap();

        assert_eq!(body["model"], "llama3");
        assert_eq!(body["system"], "sys");
        assert_eq!(body["prompt"], "usr");
        assert_eq!(body["format"], schema);
        assert_eq!(body["stream"], false);
        assert_eq!(body["options"]["temperature"], 0.0);
    }

    #[test]
    fn request_body_temperature_is_always_zero() {
        let schema = json!({"type": "array"});
        for invoker in [
            OllamaInvoker::new("localhost:11434", "llama3").unwrap(),
            OllamaInvoker::with_timeout("localhost:11434", "mistral", Some(30)).unwrap(),
        ] {
            let body = serde_json::to_value(invoker.request_body("s", "u", &schema)).unwrap();
            assert_eq!(body["options"]["temperature"].as_f64(), Some(0.0));
            assert_eq!(body["options"].as_object().unwrap().len(), 1);
        }
    }

    #[test]
    fn accessors() {
        let invoker = OllamaInvoker::new("gpu-box:11434/", "mistral").unwrap();
        assert_eq!(invoker.host(), "http://gpu-box:11434");
        assert_eq!(invoker.model(), "mistral");
    }

    #[tokio::test]
    async fn connection_refused_is_upstream_error() {
        // Port 9 (discard) is not served on loopback in test environments.
        let invoker = OllamaInvoker::with_timeout("http://127.0.0.1:9", "llama3", Some(5)).unwrap();
        let err = invoker
            .generate("sys", "usr", &json!({"type": "array"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::Upstream { .. }), "got {err:?}");
    }
}
