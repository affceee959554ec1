//! Core annotation types: issue spans, check results and status.

use std::ops::Range;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Kind of issue reported for a span.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueCategory {
    Spelling,
    /// Also the fallback for anything the checker doesn't classify.
    #[default]
    Grammar,
    Typographical,
    Style,
}

impl IssueCategory {
    /// Classify a checker issue type string.
    ///
    /// Unknown or missing types are treated as grammar.
    pub fn from_issue_type(issue_type: Option<&str>) -> Self {
        match issue_type {
            Some("UnknownWord" | "misspelling") => Self::Spelling,
            Some("Other" | "grammar") => Self::Grammar,
            Some("typographical") => Self::Typographical,
            Some("style" | "locale-violation" | "register") => Self::Style,
            _ => Self::Grammar,
        }
    }

    /// Visual class used by the rendering surface.
    pub fn highlight_class(self) -> &'static str {
        match self {
            Self::Spelling => "spell",
            Self::Grammar => "grammar",
            Self::Typographical => "typo",
            Self::Style => "style",
        }
    }

    /// Default error/suggestion split for spans built without a checker
    /// issue type.
    pub fn is_error(self) -> bool {
        matches!(self, Self::Spelling | Self::Grammar)
    }

    /// Whether a checker issue type counts as an error in the summary.
    ///
    /// Narrower than the styling fallback: unrecognised types are styled as
    /// grammar but counted as suggestions.
    pub fn is_error_issue_type(issue_type: Option<&str>) -> bool {
        matches!(issue_type, Some("grammar" | "misspelling" | "UnknownWord"))
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Spelling => "spelling",
            Self::Grammar => "grammar",
            Self::Typographical => "typographical",
            Self::Style => "style",
        }
    }
}

/// A contiguous region of text flagged by the checker.
///
/// Offsets are char offsets into the exact text the check was run on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub offset: usize,
    pub length: usize,
    pub category: IssueCategory,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_message: Option<String>,
    #[serde(default)]
    pub replacements: Vec<SmolStr>,
    /// Counted as an error rather than a suggestion.
    #[serde(default)]
    pub is_error: bool,
}

impl Span {
    pub fn new(offset: usize, length: usize, category: IssueCategory, message: impl Into<String>) -> Self {
        Self {
            offset,
            length,
            category,
            message: message.into(),
            short_message: None,
            replacements: Vec::new(),
            is_error: category.is_error(),
        }
    }

    /// Classify from a raw checker issue type: styling class and whether it
    /// counts as an error.
    pub fn with_issue_type(mut self, issue_type: Option<&str>) -> Self {
        self.category = IssueCategory::from_issue_type(issue_type);
        self.is_error = IssueCategory::is_error_issue_type(issue_type);
        self
    }

    pub fn with_short_message(mut self, short: impl Into<String>) -> Self {
        self.short_message = Some(short.into());
        self
    }

    pub fn with_replacements<I, S>(mut self, replacements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        self.replacements = replacements.into_iter().map(Into::into).collect();
        self
    }

    /// End offset, or `None` if it overflows.
    pub fn end(&self) -> Option<usize> {
        self.offset.checked_add(self.length)
    }

    pub fn char_range(&self) -> Range<usize> {
        self.offset..self.offset + self.length
    }

    /// Whether this span addresses a non-empty region inside a text of
    /// `text_len` chars.
    pub fn fits(&self, text_len: usize) -> bool {
        self.length > 0 && self.end().is_some_and(|end| end <= text_len)
    }
}

/// Ordered, pairwise disjoint spans for one source text.
///
/// Only [`normalize_spans`](crate::normalize::normalize_spans) builds these;
/// an index into the set identifies an annotation for one render cycle.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct NormalizedSpanSet {
    spans: Vec<Span>,
}

/// Shared empty set, for renders without a current result.
pub(crate) static EMPTY_SPANS: NormalizedSpanSet = NormalizedSpanSet { spans: Vec::new() };

impl NormalizedSpanSet {
    pub(crate) fn from_sorted(spans: Vec<Span>) -> Self {
        Self { spans }
    }

    pub fn get(&self, index: usize) -> Option<&Span> {
        self.spans.get(index)
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Span> {
        self.spans.iter()
    }

    pub fn as_slice(&self) -> &[Span] {
        &self.spans
    }
}

impl<'a> IntoIterator for &'a NormalizedSpanSet {
    type Item = &'a Span;
    type IntoIter = std::slice::Iter<'a, Span>;

    fn into_iter(self) -> Self::IntoIter {
        self.spans.iter()
    }
}

/// Spans together with the text that produced them.
///
/// The two are never mixed across checks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckResult {
    spans: NormalizedSpanSet,
    source_text: String,
    language: SmolStr,
    /// Buffer version the check was issued against.
    version: u64,
}

impl CheckResult {
    pub fn new(spans: NormalizedSpanSet, source_text: String, language: SmolStr, version: u64) -> Self {
        Self {
            spans,
            source_text,
            language,
            version,
        }
    }

    pub fn spans(&self) -> &NormalizedSpanSet {
        &self.spans
    }

    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn version(&self) -> u64 {
        self.version
    }
}

/// Check lifecycle for one editor.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum CheckStatus {
    #[default]
    Idle,
    Checking,
    Error(SmolStr),
}

impl CheckStatus {
    pub fn is_checking(&self) -> bool {
        matches!(self, Self::Checking)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error(msg) => Some(msg.as_str()),
            _ => None,
        }
    }
}
