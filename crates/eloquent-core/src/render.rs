//! Merge normalized spans with raw text into renderable segments.
//!
//! The output is a flat list: plain runs of text interleaved with annotated
//! runs that carry the index of the span they came from. Line breaks are
//! split out into explicit [`Run::LineBreak`] markers so a surface that
//! collapses whitespace still shows them.

use smol_str::SmolStr;

use crate::types::{IssueCategory, NormalizedSpanSet};

/// Shown in place of the text when the buffer is empty.
pub const PLACEHOLDER: &str =
    "Start typing or paste your text here to check for grammar and spelling errors…";

/// A piece of segment content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Run {
    Text(SmolStr),
    LineBreak,
}

/// One rendered piece of the document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment {
    Plain {
        runs: Vec<Run>,
    },
    Annotated {
        runs: Vec<Run>,
        /// Index into the span set for this render cycle.
        span_index: usize,
        category: IssueCategory,
        tooltip: String,
    },
    /// Non-interactive prompt for an empty buffer.
    Placeholder {
        text: &'static str,
    },
}

impl Segment {
    pub fn runs(&self) -> &[Run] {
        match self {
            Self::Plain { runs } | Self::Annotated { runs, .. } => runs,
            Self::Placeholder { .. } => &[],
        }
    }

    /// The exact source text this segment covers (empty for the placeholder).
    pub fn source_text(&self) -> String {
        let mut out = String::new();
        for run in self.runs() {
            match run {
                Run::Text(text) => out.push_str(text),
                Run::LineBreak => out.push('\n'),
            }
        }
        out
    }

    pub fn span_index(&self) -> Option<usize> {
        match self {
            Self::Annotated { span_index, .. } => Some(*span_index),
            _ => None,
        }
    }

    /// Visual class for annotated segments.
    pub fn highlight_class(&self) -> Option<&'static str> {
        match self {
            Self::Annotated { category, .. } => Some(category.highlight_class()),
            _ => None,
        }
    }

    pub fn is_interactive(&self) -> bool {
        matches!(self, Self::Annotated { .. })
    }
}

/// Render `text` with the given spans.
///
/// `spans` must have been normalized against this exact text; spans that
/// don't fit are skipped instead of panicking.
pub fn render_annotated(text: &str, spans: &NormalizedSpanSet) -> Vec<Segment> {
    if text.is_empty() {
        return vec![Segment::Placeholder { text: PLACEHOLDER }];
    }

    let mut segments = Vec::with_capacity(spans.len() * 2 + 1);
    let mut cursor = CharCursor::new(text);

    for (span_index, span) in spans.iter().enumerate() {
        if span.offset < cursor.chars {
            continue;
        }
        let gap = cursor.take(span.offset - cursor.chars);
        let slice = cursor.take(span.length);
        if slice.chars().count() != span.length {
            // Ran off the end of the text.
            push_plain(&mut segments, gap);
            push_plain(&mut segments, slice);
            break;
        }
        push_plain(&mut segments, gap);
        segments.push(Segment::Annotated {
            runs: split_runs(slice),
            span_index,
            category: span.category,
            tooltip: span.message.clone(),
        });
    }

    push_plain(&mut segments, cursor.rest());
    segments
}

/// Render the text with no annotations.
pub fn render_plain(text: &str) -> Vec<Segment> {
    render_annotated(text, &NormalizedSpanSet::default())
}

fn push_plain(segments: &mut Vec<Segment>, text: &str) {
    if text.is_empty() {
        return;
    }
    segments.push(Segment::Plain {
        runs: split_runs(text),
    });
}

fn split_runs(text: &str) -> Vec<Run> {
    let mut runs = Vec::new();
    let mut lines = text.split('\n').peekable();
    while let Some(line) = lines.next() {
        if !line.is_empty() {
            runs.push(Run::Text(SmolStr::new(line)));
        }
        if lines.peek().is_some() {
            runs.push(Run::LineBreak);
        }
    }
    runs
}

/// Walks a string by chars while handing out byte slices.
struct CharCursor<'a> {
    text: &'a str,
    byte: usize,
    chars: usize,
}

impl<'a> CharCursor<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            byte: 0,
            chars: 0,
        }
    }

    /// Take up to `n` chars from the current position.
    fn take(&mut self, n: usize) -> &'a str {
        let rest = &self.text[self.byte..];
        let len = rest
            .char_indices()
            .nth(n)
            .map(|(idx, _)| idx)
            .unwrap_or(rest.len());
        let taken = &rest[..len];
        self.byte += len;
        self.chars += taken.chars().count();
        taken
    }

    fn rest(&self) -> &'a str {
        &self.text[self.byte..]
    }
}
