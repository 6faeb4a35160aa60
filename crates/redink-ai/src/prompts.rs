//! Prompt templates for the three analysis stages.

use redink_core::{Finding, RiskCategory};

pub const RISK_SYSTEM: &str = "\
你是一位对中文法律文本极其敏感的审查专家，专门找出用户协议中对用户不利的条款。";

pub const QUIP_SYSTEM: &str = "\
你是一支毒舌的红墨水笔，看不惯冗长的格式条款。说话尖锐、讽刺、一针见血，但不粗俗。";

pub const VERDICT_SYSTEM: &str = "\
你是一位严谨的审判官，依据已经列出的风险清单下达最终判决。";

pub fn risk_user_prompt(text: &str) -> String {
    let categories = RiskCategory::KNOWN
        .iter()
        .map(|c| format!("'{}'", c.label()))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "请分析下面的文本，以 JSON 列表返回所有风险点。\n\
         每个 JSON 对象包含：\n\
         - clause_text: 条款原文，必须逐字摘自文本\n\
         - risk_category: 从 {categories} 中选择\n\
         - reason: 简述风险\n\
         \n\
         文本：\n\
         {text}\n\
         \n\
         只返回 JSON 列表，不要任何解释。"
    )
}

pub fn quip_user_prompt(clause_text: &str, reason: &str) -> String {
    format!(
        "针对下面的风险条款，用红笔批注的口吻写一句不超过30字的吐槽边注。\n\
         条款原文：{clause_text}\n\
         风险原因：{reason}\n\
         \n\
         只输出吐槽句子本身，不要引号，不要解释。"
    )
}

/// `findings` are embedded as pretty-printed JSON.
pub fn verdict_user_prompt(findings: &[Finding]) -> Result<String, serde_json::Error> {
    let risks = serde_json::to_string_pretty(findings)?;
    Ok(format!(
        "请汇总下面的风险点，以 JSON 对象给出审判报告，包含：\n\
         - status: 总体状态，例如 '存在多项不利条款'\n\
         - core_risks: 核心风险摘要列表，每项不超过20字\n\
         - judgment: 最终判决，例如 '不推荐接受'\n\
         \n\
         风险清单（JSON）：\n\
         {risks}\n\
         \n\
         只返回 JSON 对象，不要任何解释。"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_prompt_lists_categories_and_text() {
        let prompt = risk_user_prompt("第一条 本协议……");
        for category in RiskCategory::KNOWN {
            assert!(prompt.contains(category.label()));
        }
        assert!(prompt.contains("第一条 本协议……"));
    }

    #[test]
    fn quip_prompt_embeds_clause_and_reason() {
        let prompt = quip_user_prompt("保留最终解释权", "单方解释");
        assert!(prompt.contains("条款原文：保留最终解释权"));
        assert!(prompt.contains("风险原因：单方解释"));
    }

    #[test]
    fn verdict_prompt_embeds_findings_json() {
        let findings = vec![Finding::new(0, "免责", RiskCategory::Liability, "免除责任")];
        let prompt = verdict_user_prompt(&findings).unwrap();
        assert!(prompt.contains("\"clause_text\": \"免责\""));
        assert!(prompt.contains("\"risk_category\": \"liability\""));
    }

    #[test]
    fn system_prompts_are_not_empty() {
        for system in [RISK_SYSTEM, QUIP_SYSTEM, VERDICT_SYSTEM] {
            assert!(!system.trim().is_empty());
        }
    }
}
