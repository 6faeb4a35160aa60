//! Oracle access: the text-generation service every stage consults.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::extract;

#[derive(Error, Debug)]
pub enum OracleError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("response contained no choices")]
    NoChoices,
}

/// One request to the oracle.
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Prompt {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            temperature: 0.2,
            max_tokens: 2048,
        }
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Outcome of a structured request that reached the oracle.
///
/// Transport failures are errors; an answer without a usable payload is not.
#[derive(Debug, Clone, PartialEq)]
pub enum Structured {
    Usable(Value),
    Unusable { raw: String },
}

impl Structured {
    pub fn from_reply(reply: &str) -> Self {
        match extract::parse_payload(reply) {
            Some(value) => Self::Usable(value),
            None => Self::Unusable {
                raw: reply.to_string(),
            },
        }
    }
}

/// A text-generation oracle.
///
/// Implementations own their retry policy: an `Err` means the call is
/// exhausted and the run should stop.
#[async_trait]
pub trait Oracle: Send + Sync {
    async fn complete(&self, prompt: &Prompt) -> Result<String, OracleError>;

    /// Ask for a JSON payload and pull the first well-formed one out of the reply.
    async fn complete_structured(&self, prompt: &Prompt) -> Result<Structured, OracleError> {
        let reply = self.complete(prompt).await?;
        Ok(Structured::from_reply(&reply))
    }
}
