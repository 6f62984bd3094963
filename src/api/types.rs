//! Request/response types for the API.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Decision, DecisionStatus};

/// Request body for input checking.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CheckInputRequest {
    /// The raw text to evaluate.
    pub text: String,
    /// Optional caller identity, used for logging only.
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Response body for input checking.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CheckInputResponse {
    /// Final status: allowed or blocked.
    pub status: DecisionStatus,
    /// Diagnostic reason for a block.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Classifier confidence, when classification ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    /// Generated response, or the fixed refusal for blocked input.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
}

impl From<Decision> for CheckInputResponse {
    fn from(decision: Decision) -> Self {
        Self {
            status: decision.status,
            reason: decision.reason,
            score: decision.confidence,
            response: decision.response,
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Reachability of the LLM backend.
    pub llm: String,
    pub timestamp: String,
}
