//! Staged analysis records.
//!
//! A run moves through `Pending → Identified → Annotated → AnalysisState`.
//! Each transition consumes the previous record and adds exactly the fields
//! its stage owns, so nothing is written twice or read before it exists.

use serde::{Deserialize, Serialize};

use crate::finding::{Finding, Verdict};

/// A run that has only its input.
#[derive(Debug, Clone)]
pub struct Pending {
    original_text: String,
}

impl Pending {
    pub fn new(original_text: impl Into<String>) -> Self {
        Self {
            original_text: original_text.into(),
        }
    }

    pub fn original_text(&self) -> &str {
        &self.original_text
    }

    pub fn identified(self, findings: Vec<Finding>) -> Identified {
        Identified {
            original_text: self.original_text,
            findings,
        }
    }
}

/// Findings are known; nothing has been rendered yet.
#[derive(Debug, Clone)]
pub struct Identified {
    original_text: String,
    findings: Vec<Finding>,
}

impl Identified {
    pub fn original_text(&self) -> &str {
        &self.original_text
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    /// Record the annotated markup, replacing the findings with their enriched copies.
    pub fn annotated(self, annotated_html: String, findings: Vec<Finding>) -> Annotated {
        Annotated {
            original_text: self.original_text,
            findings,
            annotated_html,
        }
    }
}

/// Markup is rendered; the verdict is still missing.
#[derive(Debug, Clone)]
pub struct Annotated {
    original_text: String,
    findings: Vec<Finding>,
    annotated_html: String,
}

impl Annotated {
    pub fn original_text(&self) -> &str {
        &self.original_text
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn annotated_html(&self) -> &str {
        &self.annotated_html
    }

    pub fn concluded(self, verdict: Verdict) -> AnalysisState {
        AnalysisState {
            original_text: self.original_text,
            findings: self.findings,
            annotated_html: self.annotated_html,
            verdict,
        }
    }
}

/// The complete record of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisState {
    pub original_text: String,
    pub findings: Vec<Finding>,
    pub annotated_html: String,
    pub verdict: Verdict,
}

impl AnalysisState {
    /// The two artifacts the rendering boundary consumes.
    pub fn into_artifacts(self) -> (String, Verdict) {
        (self.annotated_html, self.verdict)
    }
}
