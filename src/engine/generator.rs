//! Response Generator - fail-open wrapper over the external generation
//! capability.
//!
//! By the time generation runs the safety decision has already passed, so a
//! generation failure degrades the response instead of blocking the request.

use std::sync::Arc;

use async_trait::async_trait;

use crate::executor::ExecutorError;

/// Placeholder returned when the generation call fails.
pub const GENERATION_FAILED_MESSAGE: &str = "Error generating response.";

/// External generation capability: produce a reply for approved text.
#[async_trait]
pub trait GenerateBackend: Send + Sync {
    async fn generate(&self, text: &str) -> Result<String, ExecutorError>;
}

/// Fail-open generation wrapper.
pub struct ResponseGenerator {
    backend: Arc<dyn GenerateBackend>,
}

impl ResponseGenerator {
    pub fn new(backend: Arc<dyn GenerateBackend>) -> Self {
        Self { backend }
    }

    /// Generate a reply for approved text. Never fails: on backend failure
    /// the fixed placeholder is returned instead.
    pub async fn generate(&self, text: &str) -> String {
        match self.backend.generate(text).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "generation failed, returning placeholder");
                GENERATION_FAILED_MESSAGE.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockBackend {
        fail: bool,
    }

    #[async_trait]
    impl GenerateBackend for MockBackend {
        async fn generate(&self, text: &str) -> Result<String, ExecutorError> {
            if self.fail {
                Err(ExecutorError::Timeout {
                    operation: "generate".to_string(),
                    timeout_secs: 120,
                })
            } else {
                Ok(format!("echo: {}", text))
            }
        }
    }

    #[tokio::test]
    async fn test_passes_through_backend_output() {
        let generator = ResponseGenerator::new(Arc::new(MockBackend { fail: false }));
        assert_eq!(generator.generate("hi").await, "echo: hi");
    }

    #[tokio::test]
    async fn test_failure_returns_placeholder() {
        let generator = ResponseGenerator::new(Arc::new(MockBackend { fail: true }));
        assert_eq!(generator.generate("hi").await, GENERATION_FAILED_MESSAGE);
    }
}
