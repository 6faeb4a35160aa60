//! Oracle access and the analysis pipeline: risk identification, annotation,
//! and verdict summary over an LLM.

pub mod annotate;
pub mod config;
pub mod extract;
pub mod http;
pub mod identify;
pub mod oracle;
pub mod pipeline;
pub mod prompts;
pub mod verdict;

#[cfg(test)]
mod testing;

pub use config::{ConfigError, OracleConfig, RetryPolicy};
pub use http::ChatClient;
pub use oracle::{Oracle, OracleError, Prompt, Structured};
pub use pipeline::{AnalysisError, Pipeline, Stage};
