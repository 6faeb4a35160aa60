//! Risk findings and the final verdict shared between pipeline stages.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Fixed set of risk categories a finding can fall under.
///
/// The oracle answers with the Chinese labels; the serialized form is a
/// kebab-case slug. Deserializing accepts either, through
/// [`RiskCategory::from_label`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", from = "String")]
pub enum RiskCategory {
    DataRights,
    Liability,
    AgreementChanges,
    UsageRestrictions,
    UnfairTerms,
    /// The oracle's label matched none of the known categories.
    Unclassified,
}

impl RiskCategory {
    /// Categories offered to the oracle, in prompt order.
    pub const KNOWN: [RiskCategory; 5] = [
        Self::DataRights,
        Self::Liability,
        Self::AgreementChanges,
        Self::UsageRestrictions,
        Self::UnfairTerms,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DataRights => "data-rights",
            Self::Liability => "liability",
            Self::AgreementChanges => "agreement-changes",
            Self::UsageRestrictions => "usage-restrictions",
            Self::UnfairTerms => "unfair-terms",
            Self::Unclassified => "unclassified",
        }
    }

    /// Label used in prompts and in rendered reports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::DataRights => "数据权利",
            Self::Liability => "责任归属",
            Self::AgreementChanges => "协议变更",
            Self::UsageRestrictions => "软件限制",
            Self::UnfairTerms => "霸王条款",
            Self::Unclassified => "未分类",
        }
    }

    /// Parse an oracle-supplied label.
    ///
    /// Accepts the Chinese labels and the slugs, ignoring case, surrounding
    /// whitespace and the choice of `-`, `_` or space as separator. Anything
    /// else maps to [`RiskCategory::Unclassified`].
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        let slug: String = label
            .chars()
            .map(|c| match c {
                '_' | ' ' => '-',
                c => c.to_ascii_lowercase(),
            })
            .collect();

        Self::KNOWN
            .into_iter()
            .find(|category| category.label() == label || category.as_str() == slug)
            .unwrap_or(Self::Unclassified)
    }
}

impl From<String> for RiskCategory {
    fn from(label: String) -> Self {
        Self::from_label(&label)
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single clause the identifier flagged as adverse to the reader.
///
/// `clause_text` is what the oracle claims appears in the document; it is
/// not guaranteed to occur verbatim. A record without an `id` reads as 0;
/// callers loading findings from outside number them with [`renumber`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    #[serde(default)]
    pub id: usize,
    pub clause_text: String,
    pub risk_category: RiskCategory,
    pub reason: String,
    /// Marginal commentary, filled in by the annotation stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quip: Option<String>,
}

impl Finding {
    pub fn new(
        id: usize,
        clause_text: impl Into<String>,
        risk_category: RiskCategory,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            id,
            clause_text: clause_text.into(),
            risk_category,
            reason: reason.into(),
            quip: None,
        }
    }

    /// The clause with surrounding whitespace removed, or `None` if nothing is left.
    pub fn clause(&self) -> Option<&str> {
        let clause = self.clause_text.trim();
        (!clause.is_empty()).then_some(clause)
    }

    pub fn with_quip(mut self, quip: impl Into<String>) -> Self {
        self.quip = Some(quip.into());
        self
    }
}

/// Give `findings` dense ids in slice order.
pub fn renumber(findings: &mut [Finding]) {
    for (id, finding) in findings.iter_mut().enumerate() {
        finding.id = id;
    }
}

const FALLBACK_STATUS: &str = "分析完成";
const FALLBACK_JUDGMENT: &str = "谨慎对待";
const FALLBACK_RISK_COUNT: usize = 5;
const FALLBACK_RISK_CHARS: usize = 20;

/// Final judgment over all findings of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub status: String,
    pub core_risks: Vec<String>,
    pub judgment: String,
}

impl Verdict {
    /// Locally synthesized verdict used when the oracle's answer is unusable.
    ///
    /// Takes the reasons of the first five findings, each cut to 20
    /// characters. Never fails, whatever `findings` holds.
    pub fn fallback(findings: &[Finding]) -> Self {
        let core_risks = findings
            .iter()
            .take(FALLBACK_RISK_COUNT)
            .map(|f| f.reason.chars().take(FALLBACK_RISK_CHARS).collect())
            .collect();

        Self {
            status: FALLBACK_STATUS.to_string(),
            core_risks,
            judgment: FALLBACK_JUDGMENT.to_string(),
        }
    }
}
