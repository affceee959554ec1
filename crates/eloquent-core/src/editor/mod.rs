//! Editor orchestration: the state machine and the task that drives it.

mod driver;
mod state;

pub use driver::{EditorCommand, EditorHandle, spawn_editor};
pub use state::{CheckApplied, CheckTrigger, EditorSnapshot, EditorState, PendingCheck};
