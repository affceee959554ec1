//! Reduce raw checker spans to a disjoint, left-to-right covering.

use tracing::trace;

use crate::types::{NormalizedSpanSet, Span};

/// Sort spans by offset and drop anything that overlaps an earlier span.
///
/// The first-starting span wins any overlapping region; ties on offset keep
/// input order. Spans that are empty or run past `text_len` chars are dropped
/// rather than reported, since checker output is untrusted.
pub fn normalize_spans<I>(spans: I, text_len: usize) -> NormalizedSpanSet
where
    I: IntoIterator<Item = Span>,
{
    let mut sorted: Vec<Span> = spans
        .into_iter()
        .filter(|span| {
            let fits = span.fits(text_len);
            if !fits {
                trace!(offset = span.offset, length = span.length, text_len, "dropping out-of-range span");
            }
            fits
        })
        .collect();
    // sort_by_key is stable
    sorted.sort_by_key(|span| span.offset);

    let mut covered_end = 0;
    let mut kept = Vec::with_capacity(sorted.len());
    for span in sorted {
        if span.offset >= covered_end {
            covered_end = span.offset + span.length;
            kept.push(span);
        }
    }

    NormalizedSpanSet::from_sorted(kept)
}
