//! Ollama client - the external capability behind classification and
//! generation.
//!
//! Talks to an Ollama instance over its `/api/generate` endpoint. Each call
//! goes through the [`RequestExecutor`], so timeout, retry, and cancellation
//! behavior is uniform across both capabilities. The model only emits a
//! SAFE/UNSAFE token for classification; the confidence score is derived
//! from the label (1.0 for UNSAFE, 0.0 for SAFE).

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::domain::{ClassificationResult, SafetyLabel};
use crate::engine::{ClassifyBackend, GenerateBackend};
use crate::error::GatewayError;
use crate::executor::{CallError, ExecutorError, RequestExecutor, RetryPolicy};

/// Request body for Ollama's generate endpoint.
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

/// Response body from Ollama's generate endpoint.
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// HTTP client for a local Ollama instance.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    executor: RequestExecutor,
}

impl OllamaClient {
    pub fn new(config: &LlmConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| GatewayError::Config(format!("failed to build HTTP client: {}", e)))?;

        let executor = RequestExecutor::new(
            Duration::from_secs(config.request_timeout_secs),
            RetryPolicy {
                max_attempts: config.max_attempts.max(1),
                initial_backoff: Duration::from_millis(config.retry_backoff_ms),
                exponential: true,
            },
        );

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            executor,
        })
    }

    /// Issue one prompt to the model through the executor and return the raw
    /// completion text.
    async fn completion(&self, operation: &str, prompt: &str) -> Result<String, ExecutorError> {
        let url = format!("{}/api/generate", self.base_url);
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        self.executor
            .execute(operation, || {
                let client = &self.client;
                let url = &url;
                let request = &request;
                async move {
                    let response = client
                        .post(url)
                        .json(request)
                        .send()
                        .await
                        .map_err(|e| CallError::Transient(format!("request failed: {}", e)))?;

                    let status = response.status();
                    if status.is_success() {
                        let body: GenerateResponse = response
                            .json()
                            .await
                            .map_err(|e| CallError::Fatal(format!("malformed response: {}", e)))?;
                        Ok(body.response)
                    } else if is_retryable_status(status) {
                        Err(CallError::Transient(format!("server returned {}", status)))
                    } else {
                        let body = response.text().await.unwrap_or_default();
                        Err(CallError::Fatal(format!(
                            "server returned {}: {}",
                            status, body
                        )))
                    }
                }
            })
            .await
    }

    /// Probe backend reachability for the health endpoint.
    pub async fn ping(&self) -> Result<(), String> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(format!("server returned {}", response.status()))
        }
    }
}

/// Retryable server-error statuses, plus 429.
fn is_retryable_status(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 502 | 503 | 504)
}

fn classification_prompt(text: &str) -> String {
    format!(
        "Classify the following input as 'SAFE' or 'UNSAFE' based on whether it contains \
         malicious, harmful, or suspicious content. Respond with only 'SAFE' or 'UNSAFE'.\n\n\
         Input: {}\n\nClassification:",
        text
    )
}

fn response_prompt(text: &str) -> String {
    format!("Respond to the following input:\n\n{}\n\nResponse:", text)
}

#[async_trait]
impl ClassifyBackend for OllamaClient {
    async fn classify(&self, text: &str) -> Result<ClassificationResult, ExecutorError> {
        let raw = self
            .completion("classify", &classification_prompt(text))
            .await?;
        let verdict = raw.trim().to_uppercase();

        if verdict.starts_with("UNSAFE") {
            Ok(ClassificationResult::new(SafetyLabel::Unsafe, 1.0))
        } else if verdict.starts_with("SAFE") {
            Ok(ClassificationResult::new(SafetyLabel::Safe, 0.0))
        } else {
            let snippet: String = raw.trim().chars().take(80).collect();
            Err(ExecutorError::Fatal {
                operation: "classify".to_string(),
                message: format!("unrecognized classification '{}'", snippet),
            })
        }
    }
}

#[async_trait]
impl GenerateBackend for OllamaClient {
    async fn generate(&self, text: &str) -> Result<String, ExecutorError> {
        let raw = self.completion("generate", &response_prompt(text)).await?;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Ok("No response generated.".to_string())
        } else {
            Ok(trimmed.to_string())
        }
    }
}
