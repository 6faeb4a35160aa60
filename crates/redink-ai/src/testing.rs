//! Deterministic in-memory oracle for stage and pipeline tests.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::oracle::{Oracle, OracleError, Prompt};
use crate::prompts::{QUIP_SYSTEM, RISK_SYSTEM, VERDICT_SYSTEM};

/// Answers each stage's prompt with a fixed reply, routed by system prompt.
///
/// A reply of `None` simulates a call that exhausted its retries.
pub struct ScriptedOracle {
    risks: Option<String>,
    quip: Option<String>,
    verdict: Option<String>,
    calls: Mutex<Vec<Prompt>>,
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self {
            risks: Some("[]".to_string()),
            quip: Some(String::new()),
            verdict: Some("{}".to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn risks(mut self, reply: impl Into<String>) -> Self {
        self.risks = Some(reply.into());
        self
    }

    pub fn quip(mut self, reply: impl Into<String>) -> Self {
        self.quip = Some(reply.into());
        self
    }

    pub fn verdict(mut self, reply: impl Into<String>) -> Self {
        self.verdict = Some(reply.into());
        self
    }

    pub fn failing_risks(mut self) -> Self {
        self.risks = None;
        self
    }

    pub fn failing_quip(mut self) -> Self {
        self.quip = None;
        self
    }

    pub fn failing_verdict(mut self) -> Self {
        self.verdict = None;
        self
    }

    /// System prompts of every call so far, in order.
    pub fn systems(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|p| p.system.clone())
            .collect()
    }

    pub fn calls(&self) -> Vec<Prompt> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Oracle for ScriptedOracle {
    async fn complete(&self, prompt: &Prompt) -> Result<String, OracleError> {
        self.calls.lock().unwrap().push(prompt.clone());
        let reply = match prompt.system.as_str() {
            RISK_SYSTEM => &self.risks,
            QUIP_SYSTEM => &self.quip,
            VERDICT_SYSTEM => &self.verdict,
            other => panic!("unexpected system prompt: {other}"),
        };
        reply.clone().ok_or(OracleError::Server {
            status: 503,
            body: "scripted failure".to_string(),
        })
    }
}
