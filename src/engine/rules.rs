//! Rule Filter - fast local checks for dangerous intent.
//!
//! This is the first layer in the pipeline. It is a pure function of the
//! input and static configuration: no side effects, no external calls,
//! sub-millisecond. A single match is enough to block, but all matches are
//! reported so the decision reason stays informative.

use regex::{Regex, RegexBuilder};

use crate::config::SafetyConfig;
use crate::error::GatewayError;

/// Category tag for a rule match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleCategory {
    /// Case-insensitive denylist term.
    BlockedKeyword,
    /// SQL statement keywords combined with table/row verbs.
    InjectionPattern,
    /// Override verb combined with a restriction noun.
    BypassPattern,
    /// Destructive verb aimed at files, data, or systems.
    DestructivePattern,
    /// Command-execution tokens.
    CommandExecution,
    /// System/admin prompt markers.
    SystemToken,
}

impl std::fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleCategory::BlockedKeyword => write!(f, "blocked-keyword"),
            RuleCategory::InjectionPattern => write!(f, "injection-pattern"),
            RuleCategory::BypassPattern => write!(f, "bypass-pattern"),
            RuleCategory::DestructivePattern => write!(f, "destructive-pattern"),
            RuleCategory::CommandExecution => write!(f, "command-execution"),
            RuleCategory::SystemToken => write!(f, "system-token"),
        }
    }
}

impl std::str::FromStr for RuleCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "blocked-keyword" => Ok(RuleCategory::BlockedKeyword),
            "injection-pattern" => Ok(RuleCategory::InjectionPattern),
            "bypass-pattern" => Ok(RuleCategory::BypassPattern),
            "destructive-pattern" => Ok(RuleCategory::DestructivePattern),
            "command-execution" => Ok(RuleCategory::CommandExecution),
            "system-token" => Ok(RuleCategory::SystemToken),
            _ => Err(format!("Unknown rule category: {}", s)),
        }
    }
}

/// A single rule hit: category plus a human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMatch {
    pub category: RuleCategory,
    pub reason: String,
}

/// Stateless rule filter over a denylist and per-category regex patterns.
pub struct RuleFilter {
    denylist: Vec<String>,
    patterns: Vec<(RuleCategory, Regex)>,
}

impl RuleFilter {
    /// Compile a filter from configuration. All regexes are built
    /// case-insensitive.
    pub fn new(config: &SafetyConfig) -> Result<Self, GatewayError> {
        let denylist = config
            .denylist
            .iter()
            .map(|term| term.to_lowercase())
            .collect();

        let mut patterns = Vec::with_capacity(config.patterns.len());
        for entry in &config.patterns {
            let category: RuleCategory = entry
                .category
                .parse()
                .map_err(GatewayError::Config)?;
            let regex = RegexBuilder::new(&entry.pattern)
                .case_insensitive(true)
                .build()
                .map_err(|e| {
                    GatewayError::Config(format!(
                        "invalid pattern for category '{}': {}",
                        entry.category, e
                    ))
                })?;
            patterns.push((category, regex));
        }

        Ok(Self { denylist, patterns })
    }

    /// Check text against every rule and report all matches.
    ///
    /// Empty or whitespace-only input matches nothing.
    pub fn check(&self, text: &str) -> Vec<RuleMatch> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let mut matches = Vec::new();
        let text_lower = text.to_lowercase();

        for term in &self.denylist {
            if text_lower.contains(term) {
                matches.push(RuleMatch {
                    category: RuleCategory::BlockedKeyword,
                    reason: format!("contains blocked term '{}'", term),
                });
            }
        }

        for (category, regex) in &self.patterns {
            if let Some(hit) = regex.find(text) {
                matches.push(RuleMatch {
                    category: *category,
                    reason: format!("matches {} rule: '{}'", category, hit.as_str()),
                });
            }
        }

        matches
    }
}
