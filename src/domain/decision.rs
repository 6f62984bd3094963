//! Decision types: the pipeline's externally visible output.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Fixed refusal message returned for every blocked input.
///
/// Deliberately non-revealing: the detailed reason travels separately and
/// disclosure to untrusted callers is a deployment decision.
pub const REFUSAL_MESSAGE: &str = "This prompt is unsafe, can't answer.";

/// Final status of an evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DecisionStatus {
    /// Input passed all checks; a generated response is attached.
    Allowed,
    /// Input was rejected; the response is the fixed refusal message.
    Blocked,
}

impl std::fmt::Display for DecisionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecisionStatus::Allowed => write!(f, "allowed"),
            DecisionStatus::Blocked => write!(f, "blocked"),
        }
    }
}

/// Outcome of running the decision pipeline over one input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    /// Final status.
    pub status: DecisionStatus,
    /// Diagnostic reason (rule hits or classifier verdict). Informational;
    /// not necessarily surfaced verbatim to the caller.
    pub reason: Option<String>,
    /// Classifier confidence, when classification ran.
    pub confidence: Option<f64>,
    /// Generated response (allowed) or the fixed refusal (blocked).
    pub response: Option<String>,
}

impl Decision {
    /// A blocked decision. The response is always the fixed refusal,
    /// never generator output.
    pub fn blocked(reason: String, confidence: Option<f64>) -> Self {
        Self {
            status: DecisionStatus::Blocked,
            reason: Some(reason),
            confidence,
            response: Some(REFUSAL_MESSAGE.to_string()),
        }
    }

    /// An allowed decision carrying the generated response.
    pub fn allowed(confidence: f64, response: String) -> Self {
        Self {
            status: DecisionStatus::Allowed,
            reason: None,
            confidence: Some(confidence),
            response: Some(response),
        }
    }

    pub fn is_blocked(&self) -> bool {
        self.status == DecisionStatus::Blocked
    }
}
