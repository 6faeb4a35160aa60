//! Markup primitives: escaping, whitespace collapse, and the fragments the
//! merge engine inserts.
//!
//! Class names are the contract with whatever renders the output.

use std::borrow::Cow;

use crate::lexicon::Lexicon;

pub const HIGHLIGHT_CLASS: &str = "redink-highlight";
pub const STRIKE_CLASS: &str = "redink-strike";
pub const QUIP_CLASS: &str = "redink-quip";
pub const LINE_BREAK: &str = "<br/>";

/// Escape `&`, `<`, `>`, `"` and `'`.
pub fn escape(text: &str) -> Cow<'_, str> {
    html_escape::encode_quoted_attribute(text)
}

/// Replace every run of whitespace with a single ASCII space.
pub fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_run = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_run {
                out.push(' ');
                in_run = true;
            }
        } else {
            out.push(c);
            in_run = false;
        }
    }
    out
}

/// Convert literal newlines into line-break markup.
pub fn line_breaks(markup: &str) -> String {
    markup.replace('\n', LINE_BREAK)
}

/// Escape `text`, striking through every lexicon keyword it contains.
///
/// Keywords are matched on the raw text in a single left-to-right pass, so a
/// struck span is never rescanned and markup is never matched.
pub fn strike_keywords(text: &str, lexicon: &Lexicon) -> String {
    let mut out = String::with_capacity(text.len() * 2);
    let mut cursor = 0;
    while let Some((start, end)) = lexicon.find_from(text, cursor) {
        out.push_str(&escape(&text[cursor..start]));
        out.push_str(&format!(
            "<span class=\"{STRIKE_CLASS}\">{}</span>",
            escape(&text[start..end])
        ));
        cursor = end;
    }
    out.push_str(&escape(&text[cursor..]));
    out
}

/// Build the replacement for one clause: the highlighted clause, plus the
/// quip block when there is a non-empty quip.
pub fn clause_fragment(clause: &str, quip: Option<&str>, lexicon: &Lexicon) -> String {
    let mut fragment = format!(
        "<span class=\"{HIGHLIGHT_CLASS}\">{}</span>",
        strike_keywords(clause, lexicon)
    );
    if let Some(quip) = quip.map(str::trim).filter(|q| !q.is_empty()) {
        fragment.push_str(&format!(
            "<blockquote class=\"{QUIP_CLASS}\">{}</blockquote>",
            escape(quip)
        ));
    }
    fragment
}
