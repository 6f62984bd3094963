//! Decision engine for Promptgate.
//!
//! This module contains the admission-control pipeline:
//! - Rule Filter: fast local denylist and pattern checks
//! - Classification Cache: bounded LRU over classifier verdicts
//! - Classifier: cached, threshold-gated, fail-closed external classification
//! - Response Generator: fail-open external generation
//! - Ollama Client: the external capability both wrappers call
//! - Decision Pipeline: orchestrates the layers into one decision

mod cache;
mod classifier;
mod generator;
mod ollama;
mod pipeline;
mod rules;

pub use cache::*;
pub use classifier::*;
pub use generator::*;
pub use ollama::*;
pub use pipeline::*;
pub use rules::*;
