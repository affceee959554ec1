//! Pointer handling for rendered annotations and the suggestion popover.
//!
//! Surfaces report a click as the chain of elements under the pointer,
//! innermost first. The controller walks that chain to the nearest annotation
//! (or the popover itself) and opens, keeps or closes the popover.

use serde::Serialize;
use smol_str::SmolStr;

use crate::config::PopoverGeometry;
use crate::types::{NormalizedSpanSet, Span};

/// Axis-aligned box in surface coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

/// An element in the hit chain of a pointer event.
#[derive(Clone, Debug, PartialEq)]
pub enum HitNode {
    /// A rendered annotation, identified by its `data-idx`.
    Annotation { span_index: usize, bounds: Rect },
    /// Any part of the open popover.
    Popover,
    /// Anything else.
    Other,
}

/// A click, as seen by the surface.
#[derive(Clone, Debug, PartialEq)]
pub struct PointerEvent {
    /// Innermost element first.
    pub path: Vec<HitNode>,
    pub viewport: Viewport,
}

impl PointerEvent {
    pub fn on_annotation(span_index: usize, bounds: Rect, viewport: Viewport) -> Self {
        Self {
            path: vec![HitNode::Annotation { span_index, bounds }],
            viewport,
        }
    }

    pub fn outside(viewport: Viewport) -> Self {
        Self {
            path: vec![HitNode::Other],
            viewport,
        }
    }

    /// Nearest annotation or popover ancestor of the target.
    fn nearest_interactive(&self) -> Option<&HitNode> {
        self.path
            .iter()
            .find(|node| !matches!(node, HitNode::Other))
    }
}

/// Which annotation the popover belongs to and where it sits.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PopoverState {
    pub span_index: usize,
    pub position: ScreenPoint,
}

/// What a pointer event did to the popover.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerOutcome {
    Opened(PopoverState),
    Closed,
    Unchanged,
}

/// Place the popover just below `bounds`, clamped to the viewport width.
pub fn popover_position(bounds: Rect, viewport: Viewport, geometry: &PopoverGeometry) -> ScreenPoint {
    let max_left = (viewport.width - geometry.width).max(0.0);
    ScreenPoint {
        x: bounds.left.clamp(0.0, max_left),
        y: bounds.bottom() + geometry.gap,
    }
}

/// Apply a pointer event to the popover slot.
///
/// `spans` is the set currently on screen; an index that isn't in it leaves
/// the popover alone.
pub fn handle_pointer(
    popover: &mut Option<PopoverState>,
    spans: &NormalizedSpanSet,
    event: &PointerEvent,
    geometry: &PopoverGeometry,
) -> PointerOutcome {
    match event.nearest_interactive() {
        Some(HitNode::Annotation { span_index, bounds }) => {
            if spans.get(*span_index).is_none() {
                return PointerOutcome::Unchanged;
            }
            let state = PopoverState {
                span_index: *span_index,
                position: popover_position(*bounds, event.viewport, geometry),
            };
            *popover = Some(state);
            PointerOutcome::Opened(state)
        }
        Some(HitNode::Popover) if popover.is_some() => PointerOutcome::Unchanged,
        _ => {
            if popover.take().is_some() {
                PointerOutcome::Closed
            } else {
                PointerOutcome::Unchanged
            }
        }
    }
}

/// Content of the suggestion popover.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PopoverView {
    pub message: String,
    /// Only set when it adds something to `message`.
    pub short_message: Option<String>,
    pub suggestions: Vec<SmolStr>,
}

impl PopoverView {
    pub fn for_span(span: &Span, max_suggestions: usize) -> Self {
        let short_message = span
            .short_message
            .as_ref()
            .filter(|short| !short.is_empty() && **short != span.message)
            .cloned();
        Self {
            message: span.message.clone(),
            short_message,
            suggestions: span
                .replacements
                .iter()
                .take(max_suggestions)
                .cloned()
                .collect(),
        }
    }
}
