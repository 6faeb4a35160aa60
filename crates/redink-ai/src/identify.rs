//! Risk identification: ask the oracle for adverse clauses and normalize the answer.

use redink_core::{Finding, RiskCategory};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::oracle::{Oracle, OracleError, Prompt, Structured};
use crate::prompts::{RISK_SYSTEM, risk_user_prompt};

pub async fn identify(oracle: &dyn Oracle, text: &str) -> Result<Vec<Finding>, OracleError> {
    let prompt = Prompt::new(RISK_SYSTEM, risk_user_prompt(text)).temperature(0.0);
    let reply = oracle.complete_structured(&prompt).await?;
    let findings = findings_from_reply(reply);
    info!(count = findings.len(), "identified risky clauses");
    Ok(findings)
}

/// Normalize a structured reply into findings.
///
/// Anything but a list yields no findings. List elements that are not
/// well-formed records are dropped; survivors are trimmed and numbered
/// densely in reply order.
pub fn findings_from_reply(reply: Structured) -> Vec<Finding> {
    let items = match reply {
        Structured::Usable(Value::Array(items)) => items,
        Structured::Usable(other) => {
            warn!(kind = kind_of(&other), "risk reply is not a list, treating as no findings");
            return Vec::new();
        }
        Structured::Unusable { raw } => {
            warn!(len = raw.len(), "risk reply held no JSON payload, treating as no findings");
            return Vec::new();
        }
    };

    let total = items.len();
    let findings: Vec<Finding> = items
        .iter()
        .filter_map(|item| item.as_object().and_then(record))
        .enumerate()
        .map(|(id, (clause, category, reason))| {
            Finding::new(id, clause, RiskCategory::from_label(&category), reason)
        })
        .collect();

    if findings.len() < total {
        debug!(dropped = total - findings.len(), "dropped malformed risk records");
    }
    findings
}

/// `(clause_text, risk_category, reason)` when every field is a string, null or absent.
fn record(obj: &Map<String, Value>) -> Option<(String, String, String)> {
    Some((
        text_field(obj, "clause_text")?,
        text_field(obj, "risk_category")?,
        text_field(obj, "reason")?,
    ))
}

fn text_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key) {
        None | Some(Value::Null) => Some(String::new()),
        Some(Value::String(s)) => Some(s.trim().to_string()),
        Some(_) => None,
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
