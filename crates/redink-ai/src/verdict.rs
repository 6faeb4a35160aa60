//! Verdict summary: ask the oracle for a final judgment over all findings.

use redink_core::{Finding, Verdict};
use serde_json::Value;
use tracing::{info, warn};

use crate::oracle::{Oracle, OracleError, Prompt, Structured};
use crate::prompts::{VERDICT_SYSTEM, verdict_user_prompt};

pub async fn summarize(oracle: &dyn Oracle, findings: &[Finding]) -> Result<Verdict, OracleError> {
    let prompt = Prompt::new(VERDICT_SYSTEM, verdict_user_prompt(findings)?).temperature(0.0);
    let reply = oracle.complete_structured(&prompt).await?;
    let verdict = verdict_from_reply(reply, findings);
    info!(status = %verdict.status, core_risks = verdict.core_risks.len(), "verdict ready");
    Ok(verdict)
}

/// Use the oracle's verdict if it is well-formed, else the local fallback.
pub fn verdict_from_reply(reply: Structured, findings: &[Finding]) -> Verdict {
    match reply {
        Structured::Usable(value) => match parse_verdict(&value) {
            Some(verdict) => verdict,
            None => {
                warn!("verdict reply is missing required fields, using fallback");
                Verdict::fallback(findings)
            }
        },
        Structured::Unusable { .. } => {
            warn!("verdict reply held no JSON payload, using fallback");
            Verdict::fallback(findings)
        }
    }
}

/// A verdict needs non-blank `status` and `judgment` strings and a
/// `core_risks` list; non-string and blank list items are dropped.
fn parse_verdict(value: &Value) -> Option<Verdict> {
    let obj = value.as_object()?;
    let status = non_blank(obj.get("status")?)?;
    let judgment = non_blank(obj.get("judgment")?)?;
    let core_risks = obj
        .get("core_risks")?
        .as_array()?
        .iter()
        .filter_map(non_blank)
        .collect();

    Some(Verdict {
        status,
        core_risks,
        judgment,
    })
}

fn non_blank(value: &Value) -> Option<String> {
    let s = value.as_str()?.trim();
    (!s.is_empty()).then(|| s.to_string())
}
