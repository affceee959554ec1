//! Splice a chosen replacement into the buffer at a span's offsets.

use tracing::debug;

use crate::error::CorrectionError;
use crate::text::TextBuffer;
use crate::types::CheckResult;

/// Replace the text under `span_index` of `result` with `replacement`.
///
/// Fails without touching the buffer when `result` was produced for a
/// different text, since its offsets would point at the wrong characters.
/// Returns the new buffer contents.
pub fn apply_correction<T: TextBuffer>(
    buffer: &mut T,
    result: &CheckResult,
    span_index: usize,
    replacement: &str,
) -> Result<String, CorrectionError> {
    if !buffer.content_eq(result.source_text()) {
        return Err(CorrectionError::StaleRender);
    }
    let span = result
        .spans()
        .get(span_index)
        .ok_or(CorrectionError::UnknownSpan { index: span_index })?;

    debug!(
        offset = span.offset,
        length = span.length,
        replacement,
        "applying correction"
    );
    buffer.replace(span.char_range(), replacement);
    Ok(buffer.to_string())
}
