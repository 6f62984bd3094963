//! Classifier - cached, threshold-gated wrapper over the external
//! classification capability.
//!
//! The fail-closed policy lives here: any failure of the external call
//! (timeout, exhausted retries, malformed response) yields `UNSAFE, 1.0`.
//! Failure results are never cached, so a transient outage cannot poison
//! the cache for the remainder of the process.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::ClassificationResult;
use crate::engine::ClassificationCache;
use crate::executor::ExecutorError;

/// External classification capability: label text safe/unsafe with a
/// confidence score. Implementations are expected to route their calls
/// through [`crate::executor::RequestExecutor`].
#[async_trait]
pub trait ClassifyBackend: Send + Sync {
    async fn classify(&self, text: &str) -> Result<ClassificationResult, ExecutorError>;
}

/// Cached classifier with a confidence threshold for blocking.
pub struct Classifier {
    backend: Arc<dyn ClassifyBackend>,
    cache: ClassificationCache,
    confidence_threshold: f64,
}

impl Classifier {
    pub fn new(
        backend: Arc<dyn ClassifyBackend>,
        cache_capacity: usize,
        confidence_threshold: f64,
    ) -> Self {
        Self {
            backend,
            cache: ClassificationCache::new(cache_capacity),
            confidence_threshold,
        }
    }

    /// Normalization used for both the cache key and the classified payload.
    fn normalize(text: &str) -> String {
        text.trim().to_lowercase()
    }

    /// Classify text, consulting the cache first.
    ///
    /// A cache hit is indistinguishable in shape from a fresh
    /// classification. On backend failure the fail-safe `UNSAFE, 1.0` is
    /// returned and nothing is cached, so the next identical request
    /// retries the external call.
    pub async fn classify(&self, text: &str) -> ClassificationResult {
        let key = Self::normalize(text);

        if let Some(cached) = self.cache.get(&key) {
            tracing::debug!(label = %cached.label, "classification cache hit");
            return cached;
        }

        match self.backend.classify(&key).await {
            Ok(result) => {
                self.cache.put(key, result.clone());
                result
            }
            Err(e) => {
                tracing::warn!(error = %e, "classification failed, failing closed");
                ClassificationResult::fail_closed()
            }
        }
    }

    /// Whether a classification result is grounds to block: an UNSAFE label
    /// with confidence strictly above the threshold. Sub-threshold UNSAFE
    /// passes through by contract.
    pub fn is_blocking(&self, result: &ClassificationResult) -> bool {
        result.is_unsafe() && result.confidence > self.confidence_threshold
    }

    /// The shared cache, exposed for inspection.
    pub fn cache(&self) -> &ClassificationCache {
        &self.cache
    }
}
