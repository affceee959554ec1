//! eloquent-core: annotation pipeline for grammar-checked text.
//!
//! This crate provides:
//! - `TextBuffer` trait and the ropey-backed `EditorRope`
//! - Span normalization and segment rendering (plus HTML for overlays)
//! - Popover hit-testing, corrections and footer statistics
//! - `EditorState` and `spawn_editor`, which debounce edits into checks and
//!   discard results for text that has since changed
//!
//! The checker itself is reached through the `CheckService` and
//! `LanguageService` traits; see `eloquent-client` for the LanguageTool one.

pub mod config;
pub mod correction;
pub mod editor;
pub mod error;
pub mod html;
pub mod interaction;
pub mod normalize;
pub mod render;
pub mod retry;
pub mod service;
pub mod stats;
pub mod text;
pub mod types;

pub use config::{DEFAULT_DEBOUNCE, DEFAULT_LANGUAGE, EditorConfig, PopoverGeometry, RetryPolicy};
pub use correction::apply_correction;
pub use editor::{
    CheckApplied, CheckTrigger, EditorCommand, EditorHandle, EditorSnapshot, EditorState,
    PendingCheck, spawn_editor,
};
pub use error::{CheckError, CorrectionError, EditorError};
pub use html::segments_to_html;
pub use interaction::{
    HitNode, PointerEvent, PointerOutcome, PopoverState, PopoverView, Rect, ScreenPoint, Viewport,
    handle_pointer, popover_position,
};
pub use normalize::normalize_spans;
pub use render::{PLACEHOLDER, Run, Segment, render_annotated, render_plain};
pub use retry::{load_languages, retry_fixed};
pub use service::{CheckService, Language, LanguageSelector, LanguageService, sort_languages};
pub use smol_str::SmolStr;
pub use stats::{DocumentStats, IssueSummary, status_line};
pub use text::{EditorRope, TextBuffer};
pub use types::{CheckResult, CheckStatus, IssueCategory, NormalizedSpanSet, Span};
