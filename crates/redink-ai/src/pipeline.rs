//! Pipeline orchestrator: identify → annotate → summarize, strictly in order.

use std::fmt;
use std::sync::Arc;

use redink_core::{AnalysisState, Lexicon, Pending, Verdict};
use thiserror::Error;
use tracing::info;

use crate::annotate::annotate;
use crate::identify::identify;
use crate::oracle::{Oracle, OracleError};
use crate::verdict::summarize;

/// The fixed stages of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    IdentifyRisks,
    GenerateAnnotations,
    CreateSummary,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IdentifyRisks => "identify_risks",
            Self::GenerateAnnotations => "generate_annotations",
            Self::CreateSummary => "create_summary",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("stage {stage} failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: OracleError,
    },
}

impl AnalysisError {
    pub fn stage(&self) -> Stage {
        match self {
            Self::Stage { stage, .. } => *stage,
        }
    }
}

fn at(stage: Stage) -> impl FnOnce(OracleError) -> AnalysisError {
    move |source| AnalysisError::Stage { stage, source }
}

/// Runs documents through the three stages against one oracle.
///
/// Holds no per-run state; concurrent runs share only the oracle and lexicon.
#[derive(Clone)]
pub struct Pipeline {
    oracle: Arc<dyn Oracle>,
    lexicon: Lexicon,
}

impl Pipeline {
    pub fn new(oracle: Arc<dyn Oracle>, lexicon: Lexicon) -> Self {
        Self { oracle, lexicon }
    }

    /// Run all stages and return the complete record.
    pub async fn analyze(&self, original_text: &str) -> Result<AnalysisState, AnalysisError> {
        let oracle = self.oracle.as_ref();
        let pending = Pending::new(original_text);

        info!(stage = %Stage::IdentifyRisks, chars = original_text.chars().count(), "stage started");
        let findings = identify(oracle, pending.original_text())
            .await
            .map_err(at(Stage::IdentifyRisks))?;
        let identified = pending.identified(findings);

        info!(stage = %Stage::GenerateAnnotations, findings = identified.findings().len(), "stage started");
        let (html, enriched) = annotate(
            oracle,
            identified.original_text(),
            identified.findings(),
            &self.lexicon,
        )
        .await
        .map_err(at(Stage::GenerateAnnotations))?;
        let annotated = identified.annotated(html, enriched);

        info!(stage = %Stage::CreateSummary, findings = annotated.findings().len(), "stage started");
        let verdict = summarize(oracle, annotated.findings())
            .await
            .map_err(at(Stage::CreateSummary))?;
        let state = annotated.concluded(verdict);

        info!(findings = state.findings.len(), status = %state.verdict.status, "analysis complete");
        Ok(state)
    }

    /// Run all stages and return the annotated markup and the verdict.
    pub async fn run(&self, original_text: &str) -> Result<(String, Verdict), AnalysisError> {
        Ok(self.analyze(original_text).await?.into_artifacts())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompts::{QUIP_SYSTEM, RISK_SYSTEM, VERDICT_SYSTEM};
    use crate::testing::ScriptedOracle;
    use redink_core::markup::{HIGHLIGHT_CLASS, QUIP_CLASS, STRIKE_CLASS};

    const TEXT: &str = "用户同意后，我们不保证服务可用性，且保留最终解释权。";
    const RISKS: &str = r#"[{"clause_text": "我们不保证服务可用性，且保留最终解释权。", "risk_category": "责任归属", "reason": "免责条款"}]"#;
    const VERDICT: &str = r#"{"status": "存在多项不利条款", "core_risks": ["服务无保障"], "judgment": "不推荐接受"}"#;

    fn pipeline(oracle: ScriptedOracle) -> (Pipeline, Arc<ScriptedOracle>) {
        let oracle = Arc::new(oracle);
        (Pipeline::new(oracle.clone(), Lexicon::default()), oracle)
    }

    #[tokio::test]
    async fn end_to_end_annotates_and_judges() {
        let (pipeline, oracle) =
            pipeline(ScriptedOracle::new().risks(RISKS).quip("锅全甩给你").verdict(VERDICT));

        let (html, verdict) = pipeline.run(TEXT).await.unwrap();

        let expected = format!(
            "用户同意后，<span class=\"{HIGHLIGHT_CLASS}\">\
             <span class=\"{STRIKE_CLASS}\">我们不保证</span>服务可用性，且保留\
             <span class=\"{STRIKE_CLASS}\">最终解释权</span>。</span>\
             <blockquote class=\"{QUIP_CLASS}\">锅全甩给你</blockquote>"
        );
        assert_eq!(html, expected);
        assert_eq!(verdict.status, "存在多项不利条款");
        assert_eq!(verdict.judgment, "不推荐接受");
        assert_eq!(oracle.systems(), vec![RISK_SYSTEM, QUIP_SYSTEM, VERDICT_SYSTEM]);
    }

    #[tokio::test]
    async fn analyze_keeps_enriched_findings() {
        let (pipeline, _) =
            pipeline(ScriptedOracle::new().risks(RISKS).quip("锅全甩给你").verdict(VERDICT));
        let state = pipeline.analyze(TEXT).await.unwrap();
        assert_eq!(state.original_text, TEXT);
        assert_eq!(state.findings.len(), 1);
        assert_eq!(state.findings[0].quip.as_deref(), Some("锅全甩给你"));
        assert_eq!(state.findings[0].reason, "免责条款");
    }

    #[tokio::test]
    async fn verdict_stage_sees_quips() {
        let (pipeline, oracle) =
            pipeline(ScriptedOracle::new().risks(RISKS).quip("锅全甩给你").verdict(VERDICT));
        pipeline.run(TEXT).await.unwrap();
        let calls = oracle.calls();
        assert!(calls[2].user.contains("锅全甩给你"));
    }

    #[tokio::test]
    async fn repeated_runs_are_identical() {
        let (pipeline, _) =
            pipeline(ScriptedOracle::new().risks(RISKS).quip("锅全甩给你").verdict(VERDICT));
        let first = pipeline.run(TEXT).await.unwrap();
        let second = pipeline.run(TEXT).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn malformed_replies_still_complete() {
        let (pipeline, oracle) =
            pipeline(ScriptedOracle::new().risks("我觉得还行").verdict("无可奉告"));
        let (html, verdict) = pipeline.run("第一条\n第二条 <注意>").await.unwrap();
        assert_eq!(html, "第一条<br/>第二条 &lt;注意&gt;");
        assert_eq!(verdict, Verdict::fallback(&[]));
        assert_eq!(oracle.systems(), vec![RISK_SYSTEM, VERDICT_SYSTEM]);
    }

    #[tokio::test]
    async fn hallucinated_clause_falls_back_verdict_keeps_reason() {
        let risks = r#"[{"clause_text": "原文没有的句子", "risk_category": "霸王条款", "reason": "凭空捏造"}]"#;
        let (pipeline, _) = pipeline(ScriptedOracle::new().risks(risks).quip("？").verdict("{}"));
        let (html, verdict) = pipeline.run(TEXT).await.unwrap();
        assert_eq!(html, TEXT);
        assert_eq!(verdict.core_risks, vec!["凭空捏造"]);
    }

    #[tokio::test]
    async fn identify_failure_aborts_run() {
        let (pipeline, oracle) = pipeline(ScriptedOracle::new().failing_risks());
        let err = pipeline.run(TEXT).await.unwrap_err();
        assert_eq!(err.stage(), Stage::IdentifyRisks);
        assert_eq!(oracle.calls().len(), 1);
    }

    #[tokio::test]
    async fn annotation_failure_aborts_before_summary() {
        let (pipeline, oracle) = pipeline(ScriptedOracle::new().risks(RISKS).failing_quip());
        let err = pipeline.run(TEXT).await.unwrap_err();
        assert_eq!(err.stage(), Stage::GenerateAnnotations);
        assert!(!oracle.systems().iter().any(|s| s == VERDICT_SYSTEM));
    }

    #[tokio::test]
    async fn summary_failure_reports_stage() {
        let (pipeline, _) =
            pipeline(ScriptedOracle::new().risks(RISKS).quip("q").failing_verdict());
        let err = pipeline.run(TEXT).await.unwrap_err();
        assert_eq!(err.stage(), Stage::CreateSummary);
        assert!(err.to_string().starts_with("stage create_summary failed"));
    }

    #[tokio::test]
    async fn minimal_lexicon_is_honored() {
        let oracle = Arc::new(ScriptedOracle::new().risks(RISKS).quip("").verdict(VERDICT));
        let pipeline = Pipeline::new(oracle, Lexicon::new(["服务可用性"]));
        let (html, _) = pipeline.run(TEXT).await.unwrap();
        assert_eq!(html.matches(STRIKE_CLASS).count(), 1);
        assert!(html.contains(&format!("<span class=\"{STRIKE_CLASS}\">服务可用性</span>")));
        assert!(!html.contains(QUIP_CLASS));
    }
}
