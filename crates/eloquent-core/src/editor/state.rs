//! Pure editor state machine.
//!
//! Owns the text buffer, the current check result, the popover and the check
//! status. Every transition is a method here; the async driver only decides
//! *when* to call them.

use smol_str::SmolStr;
use tracing::{debug, info, warn};
use web_time::Instant;

use crate::config::EditorConfig;
use crate::correction::apply_correction;
use crate::error::{CheckError, CorrectionError};
use crate::interaction::{PointerEvent, PointerOutcome, PopoverState, PopoverView, handle_pointer};
use crate::normalize::normalize_spans;
use crate::render::{Segment, render_annotated};
use crate::service::{Language, LanguageSelector};
use crate::stats::{DocumentStats, IssueSummary, status_line};
use crate::text::{EditorRope, TextBuffer};
use crate::types::{CheckResult, CheckStatus, EMPTY_SPANS, NormalizedSpanSet, Span};

/// How soon a transition wants a check to run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CheckTrigger {
    /// After the debounce delay, restarting any pending delay.
    Debounced,
    /// Right away, cancelling any pending delay.
    Immediate,
}

/// A check that has been issued and not yet resolved.
#[derive(Clone, Debug)]
pub struct PendingCheck {
    /// Buffer version at issue time.
    pub version: u64,
    pub text: String,
    pub language: SmolStr,
    pub issued_at: Instant,
}

/// What happened to a resolved check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckApplied {
    /// Became the current result.
    Applied { spans: usize },
    /// Issued against text or a language that is no longer current.
    Stale,
    /// Failed for the current text; previous result kept.
    Failed(CheckError),
}

/// Immutable view of the editor for a surface to draw.
#[derive(Clone, Debug)]
pub struct EditorSnapshot {
    pub text: String,
    pub version: u64,
    pub language: SmolStr,
    pub segments: Vec<Segment>,
    /// Spans behind the annotated segments, empty when the result is stale.
    pub spans: NormalizedSpanSet,
    pub status: CheckStatus,
    pub status_line: Option<String>,
    pub popover: Option<(PopoverState, PopoverView)>,
    pub stats: DocumentStats,
    pub summary: IssueSummary,
    pub languages: LanguageSelector,
    pub pending_checks: usize,
    pub debounce_pending: bool,
}

impl EditorSnapshot {
    /// No timer armed and no check in flight.
    pub fn is_settled(&self) -> bool {
        !self.debounce_pending && self.pending_checks == 0
    }
}

/// Editor state: buffer, current result, popover and status.
#[derive(Debug)]
pub struct EditorState<T = EditorRope> {
    buffer: T,
    language: SmolStr,
    languages: LanguageSelector,
    result: Option<CheckResult>,
    status: CheckStatus,
    popover: Option<PopoverState>,
    in_flight: usize,
    config: EditorConfig,
}

impl EditorState<EditorRope> {
    pub fn new(config: EditorConfig) -> Self {
        Self::with_buffer(EditorRope::new(), config)
    }
}

impl<T: TextBuffer> EditorState<T> {
    pub fn with_buffer(buffer: T, config: EditorConfig) -> Self {
        Self {
            buffer,
            language: config.default_language.clone(),
            languages: LanguageSelector::default(),
            result: None,
            status: CheckStatus::Idle,
            popover: None,
            in_flight: 0,
            config,
        }
    }

    pub fn buffer(&self) -> &T {
        &self.buffer
    }

    pub fn text(&self) -> String {
        self.buffer.to_string()
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn status(&self) -> &CheckStatus {
        &self.status
    }

    pub fn popover(&self) -> Option<PopoverState> {
        self.popover
    }

    pub fn languages(&self) -> &LanguageSelector {
        &self.languages
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// The last result, if it was produced for exactly the current buffer.
    pub fn current_result(&self) -> Option<&CheckResult> {
        matching_result(&self.buffer, &self.result)
    }

    /// Spans that may be drawn over the current buffer.
    pub fn visible_spans(&self) -> &NormalizedSpanSet {
        spans_of(matching_result(&self.buffer, &self.result))
    }

    // === Edits ===

    /// Replace the buffer with what the user typed.
    pub fn edit(&mut self, text: &str) -> CheckTrigger {
        self.buffer.set_text(text);
        self.popover = None;
        debug!(version = self.buffer.version(), "buffer edited");
        CheckTrigger::Debounced
    }

    /// Switch check language. Returns `None` when nothing changed.
    pub fn set_language(&mut self, language: impl Into<SmolStr>) -> Option<CheckTrigger> {
        let language = language.into();
        if language == self.language {
            return None;
        }
        debug!(from = %self.language, to = %language, "language changed");
        self.language = language;
        Some(CheckTrigger::Debounced)
    }

    // === Checks ===

    /// Start a check of the current buffer.
    ///
    /// Blank text clears annotations and returns `None`: nothing should be
    /// sent to the service.
    pub fn begin_check(&mut self) -> Option<PendingCheck> {
        if self.buffer.is_blank() {
            debug!("blank text, clearing annotations");
            self.result = None;
            self.popover = None;
            self.status = CheckStatus::Idle;
            return None;
        }

        self.in_flight += 1;
        self.status = CheckStatus::Checking;
        let pending = PendingCheck {
            version: self.buffer.version(),
            text: self.buffer.to_string(),
            language: self.language.clone(),
            issued_at: Instant::now(),
        };
        debug!(
            version = pending.version,
            language = %pending.language,
            in_flight = self.in_flight,
            "check issued"
        );
        Some(pending)
    }

    /// Whether a resolved check still describes what's on screen.
    fn is_relevant(&self, pending: &PendingCheck) -> bool {
        self.buffer.content_eq(&pending.text)
            && pending.language == self.language
            && self
                .current_result()
                .is_none_or(|current| pending.version >= current.version())
    }

    /// Resolve a check issued by [`begin_check`](Self::begin_check).
    pub fn finish_check(
        &mut self,
        pending: PendingCheck,
        outcome: Result<Vec<Span>, CheckError>,
    ) -> CheckApplied {
        self.in_flight = self.in_flight.saturating_sub(1);
        let elapsed_ms = pending.issued_at.elapsed().as_millis() as u64;

        if !self.is_relevant(&pending) {
            debug!(version = pending.version, elapsed_ms, "discarding stale check result");
            if self.in_flight == 0 && self.status.is_checking() {
                self.status = CheckStatus::Idle;
            }
            return CheckApplied::Stale;
        }

        match outcome {
            Ok(raw) => {
                let text_len = pending.text.chars().count();
                let raw_count = raw.len();
                let spans = normalize_spans(raw, text_len);
                let kept = spans.len();
                debug!(
                    version = pending.version,
                    elapsed_ms,
                    raw = raw_count,
                    kept,
                    "check applied"
                );
                self.result = Some(CheckResult::new(
                    spans,
                    pending.text,
                    pending.language,
                    pending.version,
                ));
                // The popover indexed into the result just replaced.
                self.popover = None;
                self.status = if self.in_flight > 0 {
                    CheckStatus::Checking
                } else {
                    CheckStatus::Idle
                };
                CheckApplied::Applied { spans: kept }
            }
            Err(e) => {
                warn!(version = pending.version, error = %e, "check failed");
                self.status = CheckStatus::Error(SmolStr::new(e.status_message()));
                CheckApplied::Failed(e)
            }
        }
    }

    /// Clear an error message from the status line.
    pub fn dismiss_status(&mut self) {
        if self.status.is_error() {
            self.status = CheckStatus::Idle;
        }
    }

    /// Record the outcome of the language-list poll.
    pub fn languages_loaded(&mut self, outcome: Result<Vec<Language>, CheckError>) {
        match outcome {
            Ok(languages) => {
                info!(count = languages.len(), "language list loaded");
                self.languages = LanguageSelector::loaded(languages);
            }
            Err(e) => {
                warn!(error = %e, "language list unavailable, keeping default selection");
            }
        }
    }

    // === Interaction ===

    pub fn pointer(&mut self, event: &PointerEvent) -> PointerOutcome {
        // Field-level borrows so the popover can be updated alongside.
        let spans = spans_of(matching_result(&self.buffer, &self.result));
        handle_pointer(&mut self.popover, spans, event, &self.config.popover)
    }

    pub fn dismiss_popover(&mut self) {
        self.popover = None;
    }

    pub fn popover_view(&self) -> Option<PopoverView> {
        let popover = self.popover?;
        let span = self.visible_spans().get(popover.span_index)?;
        Some(PopoverView::for_span(span, self.config.max_suggestions))
    }

    // === Corrections ===

    /// Apply a suggestion to the span the popover is open on.
    pub fn apply_suggestion(&mut self, replacement: &str) -> Result<CheckTrigger, CorrectionError> {
        let popover = self.popover.ok_or(CorrectionError::NoPopover)?;
        self.apply_correction(popover.span_index, replacement)
    }

    /// Replace the text under span `span_index` of the displayed result.
    pub fn apply_correction(
        &mut self,
        span_index: usize,
        replacement: &str,
    ) -> Result<CheckTrigger, CorrectionError> {
        let result = self
            .result
            .as_ref()
            .ok_or(CorrectionError::UnknownSpan { index: span_index })?;
        apply_correction(&mut self.buffer, result, span_index, replacement)?;
        self.popover = None;
        Ok(CheckTrigger::Immediate)
    }

    // === Rendering ===

    /// Segments for the current buffer.
    ///
    /// Annotations are only drawn from a result produced for this exact
    /// text; otherwise the plain buffer is shown.
    pub fn render(&self) -> Vec<Segment> {
        render_annotated(&self.buffer.to_string(), self.visible_spans())
    }

    pub fn snapshot(&self) -> EditorSnapshot {
        let text = self.buffer.to_string();
        let spans = self.visible_spans().clone();
        let summary = IssueSummary::of(&spans);
        let popover = self
            .popover
            .and_then(|state| self.popover_view().map(|view| (state, view)));
        EditorSnapshot {
            segments: render_annotated(&text, &spans),
            status_line: status_line(
                &self.status,
                summary,
                self.buffer.is_blank(),
                self.languages.enabled,
            ),
            stats: DocumentStats::of(&text),
            version: self.buffer.version(),
            language: self.language.clone(),
            status: self.status.clone(),
            languages: self.languages.clone(),
            pending_checks: self.in_flight,
            debounce_pending: false,
            text,
            spans,
            summary,
            popover,
        }
    }
}

/// `result`, if it was produced for exactly the text in `buffer`.
fn matching_result<'a, T: TextBuffer>(
    buffer: &T,
    result: &'a Option<CheckResult>,
) -> Option<&'a CheckResult> {
    result
        .as_ref()
        .filter(|result| buffer.content_eq(result.source_text()))
}

fn spans_of(result: Option<&CheckResult>) -> &NormalizedSpanSet {
    result.map(CheckResult::spans).unwrap_or(&EMPTY_SPANS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::{Rect, Viewport};
    use crate::render::Run;
    use crate::types::IssueCategory;

    const VIEWPORT: Viewport = Viewport {
        width: 1024.0,
        height: 768.0,
    };

    fn state() -> EditorState {
        EditorState::new(EditorConfig::default())
    }

    fn typo(offset: usize, length: usize) -> Span {
        Span::new(offset, length, IssueCategory::Spelling, "typo").with_replacements(["fix"])
    }

    #[test]
    fn test_edit_updates_buffer_and_clears_popover() {
        let mut state = state();
        state.edit("teh cat");
        let pending = state.begin_check().unwrap();
        state.finish_check(pending, Ok(vec![typo(0, 3)]));
        state.pointer(&PointerEvent::on_annotation(0, Rect::default(), VIEWPORT));
        assert!(state.popover().is_some());

        assert_eq!(state.edit("teh cats"), CheckTrigger::Debounced);
        assert_eq!(state.text(), "teh cats");
        assert!(state.popover().is_none());
    }

    #[test]
    fn test_out_of_order_result_rejected() {
        let mut state = state();
        state.edit("ab");
        let a = state.begin_check().unwrap();
        state.edit("abc");
        let b = state.begin_check().unwrap();

        assert_eq!(
            state.finish_check(b, Ok(vec![typo(0, 3)])),
            CheckApplied::Applied { spans: 1 }
        );
        assert_eq!(state.finish_check(a, Ok(vec![typo(0, 1)])), CheckApplied::Stale);

        let current = state.current_result().unwrap();
        assert_eq!(current.source_text(), "abc");
        assert_eq!(current.spans().get(0).map(|s| s.length), Some(3));
        assert_eq!(state.status(), &CheckStatus::Idle);
    }

    #[test]
    fn test_older_result_for_same_text_does_not_replace_newer() {
        let mut state = state();
        state.edit("ab");
        let first = state.begin_check().unwrap();
        state.edit("abc");
        state.edit("ab");
        let second = state.begin_check().unwrap();

        state.finish_check(second, Ok(vec![typo(0, 2)]));
        assert_eq!(state.finish_check(first, Ok(vec![])), CheckApplied::Stale);
        assert_eq!(state.visible_spans().len(), 1);
    }

    #[test]
    fn test_result_for_other_language_is_stale() {
        let mut state = state();
        state.edit("colour");
        let pending = state.begin_check().unwrap();
        state.set_language("en-GB");
        assert_eq!(state.finish_check(pending, Ok(vec![typo(0, 6)])), CheckApplied::Stale);
        assert!(state.current_result().is_none());
    }

    #[test]
    fn test_blank_text_clears_without_check() {
        let mut state = state();
        state.edit("teh");
        let pending = state.begin_check().unwrap();
        state.finish_check(pending, Ok(vec![typo(0, 3)]));

        state.edit("  \n ");
        assert!(state.begin_check().is_none());
        assert!(state.current_result().is_none());
        assert!(state.popover().is_none());
        assert_eq!(state.status(), &CheckStatus::Idle);
        assert_eq!(state.in_flight(), 0);
    }

    #[test]
    fn test_failure_keeps_last_good_result() {
        let mut state = state();
        state.edit("teh");
        let first = state.begin_check().unwrap();
        state.finish_check(first, Ok(vec![typo(0, 3)]));

        let retry = state.begin_check().unwrap();
        let outcome = state.finish_check(
            retry,
            Err(CheckError::Network {
                message: "connection refused".into(),
            }),
        );
        assert!(matches!(outcome, CheckApplied::Failed(_)));
        assert!(state.status().is_error());
        assert_eq!(state.visible_spans().len(), 1);

        state.dismiss_status();
        assert_eq!(state.status(), &CheckStatus::Idle);
    }

    #[test]
    fn test_stale_result_not_rendered_against_new_text() {
        let mut state = state();
        state.edit("teh cat");
        let pending = state.begin_check().unwrap();
        state.finish_check(pending, Ok(vec![typo(0, 3)]));
        state.edit("the cat");

        let segments = state.render();
        assert_eq!(segments.len(), 1);
        assert!(!segments[0].is_interactive());
        assert_eq!(segments[0].runs(), &[Run::Text("the cat".into())]);
    }

    #[test]
    fn test_click_on_stale_annotation_is_ignored() {
        let mut state = state();
        state.edit("teh cat");
        let pending = state.begin_check().unwrap();
        state.finish_check(pending, Ok(vec![typo(0, 3)]));
        state.edit("teh cats");

        let outcome = state.pointer(&PointerEvent::on_annotation(0, Rect::default(), VIEWPORT));
        assert_eq!(outcome, PointerOutcome::Unchanged);
        assert!(state.popover().is_none());
        assert!(state.current_result().is_none());
        assert!(state.visible_spans().is_empty());

        // Typing back to the checked text makes the result usable again.
        state.edit("teh cat");
        assert_eq!(state.visible_spans().len(), 1);
        assert!(matches!(
            state.pointer(&PointerEvent::on_annotation(0, Rect::default(), VIEWPORT)),
            PointerOutcome::Opened(_)
        ));
    }

    #[test]
    fn test_new_result_closes_popover() {
        let mut state = state();
        state.edit("teh cat");
        let pending = state.begin_check().unwrap();
        state.finish_check(pending, Ok(vec![typo(0, 3)]));
        state.pointer(&PointerEvent::on_annotation(0, Rect::default(), VIEWPORT));

        let recheck = state.begin_check().unwrap();
        state.finish_check(recheck, Ok(vec![typo(4, 3)]));
        assert!(state.popover().is_none());
    }

    #[test]
    fn test_apply_suggestion_from_popover() {
        let mut state = state();
        state.edit("I like colour today");
        let pending = state.begin_check().unwrap();
        state.finish_check(pending, Ok(vec![typo(7, 6)]));
        state.pointer(&PointerEvent::on_annotation(0, Rect::default(), VIEWPORT));
        assert_eq!(
            state.popover_view().map(|v| v.message),
            Some("typo".to_string())
        );

        assert_eq!(state.apply_suggestion("color"), Ok(CheckTrigger::Immediate));
        assert_eq!(state.text(), "I like color today");
        assert!(state.popover().is_none());

        let next = state.begin_check().unwrap();
        assert_eq!(next.text, "I like color today");
    }

    #[test]
    fn test_apply_suggestion_requires_popover() {
        let mut state = state();
        state.edit("abc");
        assert_eq!(state.apply_suggestion("x"), Err(CorrectionError::NoPopover));
    }

    #[test]
    fn test_correction_rejected_when_stale() {
        let mut state = state();
        state.edit("teh");
        let pending = state.begin_check().unwrap();
        state.finish_check(pending, Ok(vec![typo(0, 3)]));
        state.edit("teh!");
        assert_eq!(
            state.apply_correction(0, "the"),
            Err(CorrectionError::StaleRender)
        );
        assert_eq!(state.text(), "teh!");
    }

    #[test]
    fn test_snapshot_summary() {
        let mut state = state();
        state.languages_loaded(Ok(vec![]));
        state.edit("teh cat sat");
        let pending = state.begin_check().unwrap();
        state.finish_check(
            pending,
            Ok(vec![
                typo(0, 3),
                Span::new(4, 3, IssueCategory::Style, "style"),
            ]),
        );
        let snapshot = state.snapshot();
        assert_eq!(snapshot.summary, IssueSummary { errors: 1, suggestions: 1 });
        assert_eq!(snapshot.stats, DocumentStats { words: 3, chars: 11 });
        assert_eq!(snapshot.status_line.as_deref(), Some("1 error, 1 suggestion"));
        assert!(snapshot.is_settled());
    }
}
