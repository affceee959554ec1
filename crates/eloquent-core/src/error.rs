//! Error types for the annotation pipeline.
//!
//! Nothing in here is fatal to an editor: check failures become a status
//! message, correction failures leave the buffer untouched.

use miette::Diagnostic;
use thiserror::Error;

/// Failures talking to the checking or language-list service.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[non_exhaustive]
pub enum CheckError {
    #[error("could not reach the grammar checker: {message}")]
    #[diagnostic(
        code(eloquent::check::network),
        help("is the LanguageTool server running?")
    )]
    Network { message: String },

    #[error("grammar checker responded with status {status}")]
    #[diagnostic(code(eloquent::check::status))]
    Status { status: u16, body: String },

    #[error("malformed response from grammar checker: {message}")]
    #[diagnostic(code(eloquent::check::decode))]
    Decode { message: String },
}

impl CheckError {
    /// Short, user-facing text for the status line.
    pub fn status_message(&self) -> String {
        match self {
            Self::Network { .. } => {
                "Could not reach the grammar checker. Is the server running?".to_string()
            }
            other => other.to_string(),
        }
    }
}

/// Reasons a correction could not be spliced into the buffer.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum CorrectionError {
    /// The displayed annotations were produced for a different text.
    #[error("annotations are out of date with the current text")]
    #[diagnostic(code(eloquent::correction::stale))]
    StaleRender,

    #[error("no annotation with index {index}")]
    #[diagnostic(code(eloquent::correction::unknown_span))]
    UnknownSpan { index: usize },

    #[error("no suggestion popover is open")]
    #[diagnostic(code(eloquent::correction::no_popover))]
    NoPopover,
}

/// Errors from the [`EditorHandle`](crate::editor::EditorHandle).
#[derive(Debug, Error, Diagnostic)]
pub enum EditorError {
    #[error("editor task has shut down")]
    #[diagnostic(code(eloquent::editor::closed))]
    Closed,

    #[error(transparent)]
    #[diagnostic(transparent)]
    Check(#[from] CheckError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Correction(#[from] CorrectionError),
}
