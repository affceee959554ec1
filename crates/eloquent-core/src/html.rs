//! HTML serialisation of rendered segments for overlay surfaces.
//!
//! Annotated segments become `<mark class="lt-mark lt-{class}" data-idx="{i}">`
//! elements; the `data-idx` attribute is the click handle for the current
//! render cycle.

use std::fmt;

use pulldown_cmark_escape::{StrWrite, escape_html, escape_html_body_text};

use crate::render::{Run, Segment};

/// String-backed writer the escape helpers can write into.
#[derive(Debug, Default)]
struct HtmlWriter {
    out: String,
}

impl StrWrite for HtmlWriter {
    type Error = fmt::Error;

    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.out.push_str(s);
        Ok(())
    }

    fn write_fmt(&mut self, args: fmt::Arguments<'_>) -> fmt::Result {
        fmt::Write::write_fmt(&mut self.out, args)
    }
}

/// Serialise segments to overlay HTML.
pub fn segments_to_html(segments: &[Segment]) -> Result<String, fmt::Error> {
    let mut w = HtmlWriter::default();
    for segment in segments {
        match segment {
            Segment::Placeholder { text } => {
                w.write_str("<span class=\"placeholder\">")?;
                escape_html_body_text(&mut w, text)?;
                w.write_str("</span>")?;
            }
            Segment::Plain { runs } => write_runs(&mut w, runs)?,
            Segment::Annotated {
                runs,
                span_index,
                category,
                tooltip,
            } => {
                write!(
                    w,
                    "<mark class=\"lt-mark lt-{}\" data-idx=\"{}\" title=\"",
                    category.highlight_class(),
                    span_index
                )?;
                escape_html(&mut w, tooltip)?;
                w.write_str("\">")?;
                write_runs(&mut w, runs)?;
                w.write_str("</mark>")?;
            }
        }
    }
    Ok(w.out)
}

fn write_runs(w: &mut HtmlWriter, runs: &[Run]) -> fmt::Result {
    for run in runs {
        match run {
            Run::Text(text) => escape_html_body_text(&mut *w, text)?,
            Run::LineBreak => w.write_str("<br>")?,
        }
    }
    Ok(())
}
