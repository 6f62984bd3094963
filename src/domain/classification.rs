//! Classification-related domain types.

use serde::{Deserialize, Serialize};

/// Safety label produced by the external classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyLabel {
    /// Content appears safe to forward.
    Safe,
    /// Content is flagged as malicious, harmful, or suspicious.
    Unsafe,
}

impl std::fmt::Display for SafetyLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SafetyLabel::Safe => write!(f, "safe"),
            SafetyLabel::Unsafe => write!(f, "unsafe"),
        }
    }
}

/// Result of classifying a piece of input text.
///
/// Invariant: `confidence` is always in [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub label: SafetyLabel,
    pub confidence: f64,
}

impl ClassificationResult {
    pub fn new(label: SafetyLabel, confidence: f64) -> Self {
        Self { label, confidence }
    }

    /// The fail-safe value used when the classifier is unreachable or
    /// returns garbage. An erroring classifier must never be read as safe.
    pub fn fail_closed() -> Self {
        Self {
            label: SafetyLabel::Unsafe,
            confidence: 1.0,
        }
    }

    pub fn is_unsafe(&self) -> bool {
        self.label == SafetyLabel::Unsafe
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fail_closed_is_unsafe_with_full_confidence() {
        let result = ClassificationResult::fail_closed();
        assert!(result.is_unsafe());
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn test_label_serialization() {
        let json = serde_json::to_string(&SafetyLabel::Unsafe).unwrap();
        assert_eq!(json, "\"unsafe\"");
    }
}
