//! Merge engine: places findings into the document as markup.
//!
//! The working buffer is the document split into plain-text segments and
//! already inserted fragments. Plain text is kept unescaped and escaped only
//! when rendering; since escaping is per character, matching a raw clause in
//! raw text is the same as matching the escaped clause in the escaped
//! document, except that a match can never split an entity.
//!
//! Each finding is placed with a two-phase matcher:
//!
//! 1. exact: the first literal occurrence of the clause in plain text;
//! 2. normalized: whitespace runs collapsed to one space in the buffer, the
//!    clause and the fragment, then the same single literal replace. The
//!    collapsed buffer is kept only if this succeeds.
//!
//! A finding matched by neither phase leaves the buffer untouched. Inserted
//! fragments are never searched, so a later clause cannot land inside
//! earlier markup.

use serde::Serialize;

use crate::finding::Finding;
use crate::lexicon::Lexicon;
use crate::markup::{clause_fragment, collapse_whitespace, escape, line_breaks};

/// How a single finding was placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchOutcome {
    Exact,
    /// Placed after collapsing whitespace.
    Normalized,
    /// Not found by either phase; the document is unchanged.
    Unmatched,
    /// Clause text was blank.
    EmptyClause,
}

impl MatchOutcome {
    pub fn is_placed(&self) -> bool {
        matches!(self, Self::Exact | Self::Normalized)
    }
}

/// Result of merging findings into a document.
#[derive(Debug, Clone)]
pub struct Merged {
    pub html: String,
    /// `(finding id, outcome)` in finding order.
    pub outcomes: Vec<(usize, MatchOutcome)>,
}

impl Merged {
    pub fn placed(&self) -> usize {
        self.outcomes.iter().filter(|(_, o)| o.is_placed()).count()
    }
}

#[derive(Debug, Clone)]
enum Segment {
    /// Unescaped document text, still open to matching.
    Text(String),
    /// Rendered markup inserted for a finding.
    Fragment(String),
}

#[derive(Debug, Clone)]
struct WorkingBuffer {
    segments: Vec<Segment>,
}

impl WorkingBuffer {
    fn new(original: &str) -> Self {
        Self {
            segments: vec![Segment::Text(original.to_string())],
        }
    }

    /// Replace the leftmost occurrence of `needle` in plain text with `fragment`.
    fn replace_first(&mut self, needle: &str, fragment: String) -> bool {
        if needle.is_empty() {
            return false;
        }
        let hit = self.segments.iter().enumerate().find_map(|(i, seg)| match seg {
            Segment::Text(text) => text.find(needle).map(|at| (i, at)),
            Segment::Fragment(_) => None,
        });
        let Some((index, at)) = hit else {
            return false;
        };

        let Segment::Text(text) = &self.segments[index] else {
            return false;
        };
        let before = text[..at].to_string();
        let after = text[at + needle.len()..].to_string();
        self.segments.splice(
            index..=index,
            [
                Segment::Text(before),
                Segment::Fragment(fragment),
                Segment::Text(after),
            ],
        );
        true
    }

    /// Collapse whitespace in every segment.
    ///
    /// Fragments always start and end with a tag, so collapsing segment by
    /// segment gives the same text as collapsing the concatenation.
    fn collapse_whitespace(&mut self) {
        for seg in &mut self.segments {
            match seg {
                Segment::Text(s) | Segment::Fragment(s) => *s = collapse_whitespace(s),
            }
        }
    }

    fn render(&self) -> String {
        let mut out = String::new();
        for seg in &self.segments {
            match seg {
                Segment::Text(text) => out.push_str(&escape(text)),
                Segment::Fragment(markup) => out.push_str(markup),
            }
        }
        line_breaks(&out)
    }
}

/// Merge `findings` into `original` and render the result.
///
/// Findings are processed in order; each contributes at most one span.
/// Quips already attached to the findings are rendered after their clause.
pub fn merge(original: &str, findings: &[Finding], lexicon: &Lexicon) -> Merged {
    let mut buffer = WorkingBuffer::new(original);
    let mut outcomes = Vec::with_capacity(findings.len());

    for finding in findings {
        let outcome = match finding.clause() {
            None => MatchOutcome::EmptyClause,
            Some(clause) => place(&mut buffer, clause, finding.quip.as_deref(), lexicon),
        };
        tracing::debug!(finding = finding.id, outcome = ?outcome, "merged finding");
        outcomes.push((finding.id, outcome));
    }

    Merged {
        html: buffer.render(),
        outcomes,
    }
}

fn place(
    buffer: &mut WorkingBuffer,
    clause: &str,
    quip: Option<&str>,
    lexicon: &Lexicon,
) -> MatchOutcome {
    let fragment = clause_fragment(clause, quip, lexicon);
    if buffer.replace_first(clause, fragment.clone()) {
        return MatchOutcome::Exact;
    }

    let mut collapsed = buffer.clone();
    collapsed.collapse_whitespace();
    if collapsed.replace_first(&collapse_whitespace(clause), collapse_whitespace(&fragment)) {
        *buffer = collapsed;
        MatchOutcome::Normalized
    } else {
        MatchOutcome::Unmatched
    }
}
