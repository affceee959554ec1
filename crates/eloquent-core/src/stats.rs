//! Footer statistics and the status line.

use serde::Serialize;

use crate::types::{CheckStatus, NormalizedSpanSet};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DocumentStats {
    pub words: usize,
    pub chars: usize,
}

impl DocumentStats {
    pub fn of(text: &str) -> Self {
        Self {
            words: text.split_whitespace().count(),
            chars: text.chars().count(),
        }
    }
}

/// Spans split into errors and suggestions, per [`Span::is_error`](crate::types::Span::is_error).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct IssueSummary {
    pub errors: usize,
    pub suggestions: usize,
}

impl IssueSummary {
    pub fn of(spans: &NormalizedSpanSet) -> Self {
        let errors = spans.iter().filter(|s| s.is_error).count();
        Self {
            errors,
            suggestions: spans.len() - errors,
        }
    }

    pub fn total(&self) -> usize {
        self.errors + self.suggestions
    }
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

/// Text for the status area of the footer.
///
/// `None` when there's nothing worth saying (blank text, or languages still
/// loading with no issues to report).
pub fn status_line(
    status: &CheckStatus,
    summary: IssueSummary,
    text_is_blank: bool,
    languages_ready: bool,
) -> Option<String> {
    match status {
        CheckStatus::Checking => Some("Checking…".to_string()),
        CheckStatus::Error(message) => Some(message.to_string()),
        CheckStatus::Idle if summary.total() > 0 => {
            let mut parts = Vec::new();
            if summary.errors > 0 {
                parts.push(plural(summary.errors, "error"));
            }
            if summary.suggestions > 0 {
                parts.push(plural(summary.suggestions, "suggestion"));
            }
            Some(parts.join(", "))
        }
        CheckStatus::Idle if !text_is_blank && languages_ready => {
            Some("✓ No issues found".to_string())
        }
        CheckStatus::Idle => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize_spans;
    use crate::types::{IssueCategory, Span};

    #[test]
    fn test_document_stats() {
        assert_eq!(DocumentStats::of("   "), DocumentStats { words: 0, chars: 3 });
        assert_eq!(
            DocumentStats::of(" two  wörds\nhere "),
            DocumentStats { words: 3, chars: 17 }
        );
    }

    #[test]
    fn test_unrecognised_issue_types_count_as_suggestions() {
        let spans = normalize_spans(
            vec![
                Span::new(0, 3, IssueCategory::Spelling, "typo")
                    .with_issue_type(Some("misspelling")),
                Span::new(4, 3, IssueCategory::Grammar, "repeat")
                    .with_issue_type(Some("duplication")),
                Span::new(8, 1, IssueCategory::Grammar, "space")
                    .with_issue_type(Some("whitespace")),
            ],
            10,
        );
        assert_eq!(
            IssueSummary::of(&spans),
            IssueSummary {
                errors: 1,
                suggestions: 2
            }
        );
    }

    #[test]
    fn test_status_lines() {
        let none = IssueSummary::default();
        assert_eq!(
            status_line(&CheckStatus::Checking, none, false, true).as_deref(),
            Some("Checking…")
        );
        assert_eq!(
            status_line(&CheckStatus::Idle, none, false, true).as_deref(),
            Some("✓ No issues found")
        );
        assert_eq!(status_line(&CheckStatus::Idle, none, false, false), None);
        assert_eq!(status_line(&CheckStatus::Idle, none, true, true), None);

        let some = IssueSummary {
            errors: 1,
            suggestions: 2,
        };
        assert_eq!(
            status_line(&CheckStatus::Idle, some, false, true).as_deref(),
            Some("1 error, 2 suggestions")
        );
        assert_eq!(
            status_line(&CheckStatus::Error("offline".into()), some, false, true).as_deref(),
            Some("offline")
        );
    }
}
