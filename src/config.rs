//! Configuration module for Promptgate.
//!
//! Loads configuration from YAML files and environment variables.
//! Every knob the pipeline depends on (denylist, patterns, threshold,
//! cache capacity, timeouts, retries) lives here and is passed into
//! component constructors, so tests can vary them per case.

use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub safety: SafetyConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// LLM backend configuration (Ollama endpoint plus outbound call policy).
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    /// Base URL of the Ollama instance.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model identity used for both classification and generation.
    #[serde(default = "default_model")]
    pub model: String,
    /// Connect timeout for outbound calls, in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Read/processing timeout for outbound calls, in seconds.
    /// Generation latency is backend- and load-dependent, so this is
    /// much longer than the connect timeout.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Maximum attempts per outbound call (1 = no retries).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Initial backoff between retries, in milliseconds.
    #[serde(default = "default_backoff_ms")]
    pub retry_backoff_ms: u64,
}

/// Safety policy configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SafetyConfig {
    /// Terms blocked by case-insensitive substring match.
    #[serde(default = "default_denylist")]
    pub denylist: Vec<String>,
    /// Dangerous-intent regex patterns, grouped by category.
    #[serde(default = "default_patterns")]
    pub patterns: Vec<PatternConfig>,
    /// Minimum classifier confidence for an UNSAFE label to block.
    /// A lower-confidence UNSAFE verdict passes through.
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,
    /// Maximum number of cached classification results.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

/// A single rule pattern: a category tag and a regular expression.
#[derive(Debug, Clone, Deserialize)]
pub struct PatternConfig {
    pub category: String,
    pub pattern: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_base_url() -> String {
    "http://127.0.0.1:11434".to_string()
}

fn default_model() -> String {
    "llama2".to_string()
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_request_timeout() -> u64 {
    120
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_ms() -> u64 {
    1000
}

fn default_confidence_threshold() -> f64 {
    0.8
}

fn default_cache_capacity() -> usize {
    1000
}

fn default_denylist() -> Vec<String> {
    [
        "hack",
        "exploit",
        "malicious",
        "malware",
        "backdoor",
        "rootkit",
        "keylogger",
        "phishing",
        "ransomware",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_patterns() -> Vec<PatternConfig> {
    let patterns = [
        (
            "injection-pattern",
            r"\b(DROP\s+TABLE|UNION\s+SELECT|INSERT\s+INTO|DELETE\s+FROM)\b",
        ),
        (
            "bypass-pattern",
            r"(ignore|override|bypass).*?(instruction|restriction|rule|filter)",
        ),
        (
            "destructive-pattern",
            r"(delete|remove|drop|destroy).*?(file|data|system|database)",
        ),
        (
            "command-execution",
            r"\b(exec|eval|subprocess|cmd|powershell|bash|rm -rf)\b",
        ),
        ("system-token", r"(system:|<\|system\||admin:|root:)"),
    ];

    patterns
        .into_iter()
        .map(|(category, pattern)| PatternConfig {
            category: category.to_string(),
            pattern: pattern.to_string(),
        })
        .collect()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            connect_timeout_secs: default_connect_timeout(),
            request_timeout_secs: default_request_timeout(),
            max_attempts: default_max_attempts(),
            retry_backoff_ms: default_backoff_ms(),
        }
    }
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            denylist: default_denylist(),
            patterns: default_patterns(),
            confidence_threshold: default_confidence_threshold(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

impl Config {
    /// Load configuration from files and environment.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (PROMPTGATE__*)
    /// 2. config/local.yaml (if exists)
    /// 3. config/default.yaml
    pub fn load() -> Result<Self, ConfigError> {
        let config = ConfigLoader::builder()
            // Start with default config
            .add_source(File::with_name("config/default").required(false))
            // Layer on local overrides
            .add_source(File::with_name("config/local").required(false))
            // Layer on environment variables with PROMPTGATE prefix
            .add_source(
                Environment::with_prefix("PROMPTGATE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_safety_config() {
        let config = SafetyConfig::default();
        assert_eq!(config.confidence_threshold, 0.8);
        assert_eq!(config.cache_capacity, 1000);
        assert!(!config.denylist.is_empty());
        assert!(config
            .patterns
            .iter()
            .any(|p| p.category == "injection-pattern"));
    }

    #[test]
    fn test_default_llm_config() {
        let config = LlmConfig::default();
        assert_eq!(config.connect_timeout_secs, 10);
        assert_eq!(config.max_attempts, 3);
        assert!(config.request_timeout_secs > config.connect_timeout_secs);
    }
}
