//! LanguageTool `/v2` response shapes and their conversion into spans.
//!
//! LanguageTool reports offsets in UTF-16 code units; everything downstream
//! works in chars, so offsets are remapped here.

use eloquent_core::{IssueCategory, Span};
use serde::Deserialize;
use smol_str::SmolStr;

#[derive(Debug, Deserialize)]
pub(crate) struct CheckResponse {
    #[serde(default)]
    pub matches: Vec<Match>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Match {
    pub message: String,
    #[serde(default)]
    pub short_message: Option<String>,
    pub offset: usize,
    pub length: usize,
    #[serde(default)]
    pub replacements: Vec<Replacement>,
    #[serde(default)]
    pub rule: Option<Rule>,
    #[serde(default, rename = "type")]
    pub kind: Option<MatchType>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Replacement {
    pub value: SmolStr,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Rule {
    #[serde(default)]
    pub issue_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MatchType {
    #[serde(default)]
    pub type_name: Option<String>,
}

impl Match {
    /// `rule.issueType` wins over `type.typeName`; empty strings count as
    /// missing.
    fn issue_type(&self) -> Option<&str> {
        let rule = self.rule.as_ref().and_then(|r| r.issue_type.as_deref());
        let kind = self.kind.as_ref().and_then(|t| t.type_name.as_deref());
        rule.filter(|s| !s.is_empty())
            .or(kind.filter(|s| !s.is_empty()))
    }

    pub fn into_span(self, offsets: &Utf16Map) -> Span {
        let issue_type = self.issue_type();
        let category = IssueCategory::from_issue_type(issue_type);
        let is_error = IssueCategory::is_error_issue_type(issue_type);
        let start = offsets.to_char(self.offset);
        let end = offsets.to_char(self.offset.saturating_add(self.length));
        Span {
            offset: start,
            length: end.saturating_sub(start),
            category,
            message: self.message,
            short_message: self.short_message.filter(|s| !s.is_empty()),
            replacements: self.replacements.into_iter().map(|r| r.value).collect(),
            is_error,
        }
    }
}

/// UTF-16 code unit offset to char offset mapping for one text.
#[derive(Debug)]
pub(crate) struct Utf16Map {
    /// UTF-16 offset of each char start, plus the total length. `None` when
    /// every char is a single code unit and the offsets coincide.
    starts: Option<Vec<usize>>,
}

impl Utf16Map {
    pub fn new(text: &str) -> Self {
        if text.chars().all(|c| c.len_utf16() == 1) {
            return Self { starts: None };
        }
        let mut starts = Vec::with_capacity(text.len() + 1);
        let mut pos = 0;
        for c in text.chars() {
            starts.push(pos);
            pos += c.len_utf16();
        }
        starts.push(pos);
        Self {
            starts: Some(starts),
        }
    }

    /// Char offset for a UTF-16 offset. An offset inside a surrogate pair
    /// rounds up to the next char.
    pub fn to_char(&self, utf16: usize) -> usize {
        match &self.starts {
            None => utf16,
            Some(starts) => starts.partition_point(|&start| start < utf16),
        }
    }
}
