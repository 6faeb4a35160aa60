//! Annotation stage: collect a quip per finding, then merge everything into
//! the document.

use redink_core::{Finding, Lexicon, MatchOutcome, merge};
use tracing::{info, warn};

use crate::oracle::{Oracle, OracleError, Prompt};
use crate::prompts::{QUIP_SYSTEM, quip_user_prompt};

/// Annotate `original_text` with `findings`.
///
/// Returns the rendered markup and copies of the findings carrying their
/// quips. Findings with a blank clause get no quip and no markup.
pub async fn annotate(
    oracle: &dyn Oracle,
    original_text: &str,
    findings: &[Finding],
    lexicon: &Lexicon,
) -> Result<(String, Vec<Finding>), OracleError> {
    let mut enriched = Vec::with_capacity(findings.len());
    for finding in findings {
        let finding = match finding.clause() {
            Some(clause) => {
                let quip = request_quip(oracle, clause, &finding.reason).await?;
                finding.clone().with_quip(quip)
            }
            None => finding.clone(),
        };
        enriched.push(finding);
    }

    let merged = merge(original_text, &enriched, lexicon);
    for (id, outcome) in &merged.outcomes {
        if *outcome == MatchOutcome::Unmatched {
            warn!(finding = id, "clause not found in document, left unannotated");
        }
    }
    info!(
        findings = enriched.len(),
        placed = merged.placed(),
        "annotated document"
    );
    Ok((merged.html, enriched))
}

async fn request_quip(oracle: &dyn Oracle, clause: &str, reason: &str) -> Result<String, OracleError> {
    let prompt = Prompt::new(QUIP_SYSTEM, quip_user_prompt(clause, reason))
        .temperature(0.4)
        .max_tokens(80);
    let reply = oracle.complete(&prompt).await?;
    Ok(clean_quip(&reply))
}

const QUOTE_PAIRS: &[(char, char)] = &[
    ('"', '"'),
    ('\'', '\''),
    ('“', '”'),
    ('‘', '’'),
    ('「', '」'),
    ('『', '』'),
];

/// Trim the reply and drop one pair of wrapping quote marks.
fn clean_quip(reply: &str) -> String {
    let quip = reply.trim();
    for &(open, close) in QUOTE_PAIRS {
        if let Some(inner) = quip.strip_prefix(open).and_then(|s| s.strip_suffix(close)) {
            return inner.trim().to_string();
        }
    }
    quip.to_string()
}
