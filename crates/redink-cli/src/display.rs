//! Output rendering: standalone HTML report and terminal verdict card.

use redink_core::markup::escape;
use redink_core::{AnalysisState, Verdict};

const PAGE_TITLE: &str = "redink · 红墨水审判";

const STYLE: &str = r#"
body { font-family: -apple-system, "PingFang SC", "Noto Sans CJK SC", sans-serif; max-width: 960px; margin: 2rem auto; padding: 0 1rem; }
.redink-highlight { background: #FFF59D; padding: 0.1rem 0.15rem; border-radius: 3px; }
.redink-strike { text-decoration: line-through; color: #D32F2F; font-weight: 600; }
blockquote.redink-quip { border-left: 4px solid #D32F2F; color: #D32F2F; margin: 6px 0 12px 0; padding-left: 10px; }
.redink-verdict { border: 1px solid #eee; border-left: 6px solid #D32F2F; padding: 12px 14px; border-radius: 6px; background: #fff; }
.redink-verdict h3 { margin: 0 0 8px 0; }
.redink-verdict .status { color: #D32F2F; font-weight: 700; }
.redink-verdict .judgment { font-weight: 700; }
.redink-doc { line-height: 1.6; font-size: 15px; white-space: pre-wrap; }
"#;

/// Verdict card markup. Every verdict field is escaped.
pub fn verdict_card(verdict: &Verdict) -> String {
    let items: String = verdict
        .core_risks
        .iter()
        .map(|risk| format!("<li>{}</li>", escape(risk)))
        .collect();

    format!(
        "<div class=\"redink-verdict\">\n\
         <h3>最终审判</h3>\n\
         <div class=\"status\">{status}</div>\n\
         <div>核心风险：</div>\n\
         <ul>{items}</ul>\n\
         <div class=\"judgment\">判决：{judgment}</div>\n\
         </div>",
        status = escape(&verdict.status),
        judgment = escape(&verdict.judgment),
    )
}

/// Self-contained page: the verdict card above the annotated document.
pub fn render_page(state: &AnalysisState) -> String {
    format!(
        "<!DOCTYPE html>\n\
         <html lang=\"zh\">\n\
         <head>\n\
         <meta charset=\"utf-8\">\n\
         <title>{PAGE_TITLE}</title>\n\
         <style>{STYLE}</style>\n\
         </head>\n\
         <body>\n\
         {card}\n\
         <div class=\"redink-doc\">{doc}</div>\n\
         </body>\n\
         </html>\n",
        card = verdict_card(&state.verdict),
        doc = state.annotated_html,
    )
}

/// Plain-text verdict summary for the terminal.
pub fn verdict_text(verdict: &Verdict) -> String {
    let mut out = format!("最终审判：{}\n", verdict.status);
    if verdict.core_risks.is_empty() {
        out.push_str("  （无核心风险）\n");
    }
    for risk in &verdict.core_risks {
        out.push_str(&format!("  - {risk}\n"));
    }
    out.push_str(&format!("判决：{}\n", verdict.judgment));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use redink_core::Pending;

    fn verdict() -> Verdict {
        Verdict {
            status: "存在 <多项> 不利条款".into(),
            core_risks: vec!["免责 & 解释权".into(), "自动续费".into()],
            judgment: "不推荐接受".into(),
        }
    }

    #[test]
    fn card_escapes_verdict_fields() {
        let card = verdict_card(&verdict());
        assert!(card.contains("存在 &lt;多项&gt; 不利条款"));
        assert!(card.contains("<li>免责 &amp; 解释权</li><li>自动续费</li>"));
        assert!(card.contains("判决：不推荐接受"));
    }

    #[test]
    fn page_embeds_markup_unescaped() {
        let state = Pending::new("x")
            .identified(Vec::new())
            .annotated("<span class=\"redink-highlight\">x</span>".into(), Vec::new())
            .concluded(verdict());
        let page = render_page(&state);
        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains("<div class=\"redink-doc\"><span class=\"redink-highlight\">x</span></div>"));
        assert!(page.find("redink-verdict\">").unwrap() < page.find("redink-doc\">").unwrap());
    }

    #[test]
    fn verdict_text_lists_risks() {
        let text = verdict_text(&verdict());
        assert_eq!(
            text,
            "最终审判：存在 <多项> 不利条款\n  - 免责 & 解释权\n  - 自动续费\n判决：不推荐接受\n"
        );
    }

    #[test]
    fn verdict_text_without_risks() {
        let text = verdict_text(&Verdict::fallback(&[]));
        assert!(text.contains("（无核心风险）"));
    }
}
