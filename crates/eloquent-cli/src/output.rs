//! Report formats for `eloquent check`.

use std::fmt::Write;

use clap::ValueEnum;
use eloquent_core::{DocumentStats, EditorSnapshot, IssueSummary, NormalizedSpanSet, Span};
use serde::Serialize;

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Format {
    /// One line per issue, with line:column positions
    #[default]
    Text,
    /// Overlay markup with `<mark>` annotations
    Html,
    /// Spans, stats and summary as JSON
    Json,
}

/// 1-based line and column of a char offset.
pub fn line_col(text: &str, char_offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut col = 1;
    for c in text.chars().take(char_offset) {
        if c == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    (line, col)
}

fn covered(text: &str, span: &Span) -> String {
    text.chars()
        .skip(span.offset)
        .take(span.length)
        .map(|c| if c == '\n' { ' ' } else { c })
        .collect()
}

/// Plain listing of the issues in `snapshot`.
pub fn listing(snapshot: &EditorSnapshot) -> String {
    let mut out = String::new();
    for span in &snapshot.spans {
        let (line, col) = line_col(&snapshot.text, span.offset);
        let _ = write!(
            out,
            "{line}:{col}  {:<13}  \"{}\"  {}",
            span.category.label(),
            covered(&snapshot.text, span),
            span.message
        );
        if !span.replacements.is_empty() {
            let suggestions: Vec<&str> = span.replacements.iter().map(|r| r.as_str()).collect();
            let _ = write!(out, "  → {}", suggestions.join(", "));
        }
        out.push('\n');
    }
    out
}

#[derive(Serialize)]
pub struct JsonReport<'a> {
    pub language: &'a str,
    pub stats: DocumentStats,
    pub summary: IssueSummary,
    pub spans: &'a NormalizedSpanSet,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'a str>,
}

impl<'a> JsonReport<'a> {
    pub fn new(snapshot: &'a EditorSnapshot) -> Self {
        Self {
            language: &snapshot.language,
            stats: snapshot.stats,
            summary: snapshot.summary,
            spans: &snapshot.spans,
            error: snapshot.status.error_message(),
        }
    }
}
