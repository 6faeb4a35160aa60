//! Risk-keyword lexicon used for strike-through inside highlighted clauses.
//!
//! The lexicon is plain data: an ordered list of phrases known to signal
//! one-sided or evasive terms. It is passed to the merge engine as a value,
//! so callers can substitute their own list.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Version of [`BUILTIN_PHRASES`]. Bump whenever the list changes.
pub const BUILTIN_VERSION: u32 = 1;

/// Built-in risk-signaling phrases.
pub const BUILTIN_PHRASES: &[&str] = &[
    "我们不保证",
    "单方面",
    "最终解释权",
    "不承担任何责任",
    "无需另行通知",
    "不另行通知",
    "随时修改",
    "第三方",
    "不可抗力",
    "不退不换",
    "使用即同意",
    "自动续费",
    "最高不超过",
    "责任上限",
    "免责",
];

#[derive(Debug, Error)]
pub enum LexiconError {
    #[error("failed to read lexicon file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// An ordered, duplicate-free list of non-empty phrases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lexicon {
    phrases: Vec<String>,
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::new(BUILTIN_PHRASES.iter().copied())
    }
}

impl Lexicon {
    /// Build a lexicon, trimming phrases and dropping blanks and repeats.
    pub fn new<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut kept: Vec<String> = Vec::new();
        for phrase in phrases {
            let phrase = phrase.as_ref().trim();
            if !phrase.is_empty() && !kept.iter().any(|p| p == phrase) {
                kept.push(phrase.to_string());
            }
        }
        Self { phrases: kept }
    }

    /// A lexicon that strikes nothing.
    pub fn empty() -> Self {
        Self {
            phrases: Vec::new(),
        }
    }

    /// Parse one phrase per line. Blank lines and lines starting with `#` are ignored.
    pub fn parse(text: &str) -> Self {
        Self::new(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.starts_with('#')),
        )
    }

    pub fn from_path(path: &Path) -> Result<Self, LexiconError> {
        let text = std::fs::read_to_string(path).map_err(|source| LexiconError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let lexicon = Self::parse(&text);
        tracing::debug!(path = %path.display(), phrases = lexicon.len(), "loaded lexicon");
        Ok(lexicon)
    }

    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }

    /// Find the next keyword occurrence at or after byte offset `from`.
    ///
    /// Returns `(start, end)` byte offsets. The leftmost match wins; among
    /// matches starting at the same offset the longest phrase wins.
    pub fn find_from(&self, haystack: &str, from: usize) -> Option<(usize, usize)> {
        let rest = haystack.get(from..)?;
        self.phrases
            .iter()
            .filter_map(|phrase| rest.find(phrase.as_str()).map(|at| (at, phrase.len())))
            .min_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)))
            .map(|(at, len)| (from + at, from + at + len))
    }
}
