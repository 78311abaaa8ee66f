//! The open-document editor: content capture, save status and debounced
//! autosave.

pub mod autosave;
pub mod content;
pub mod status;

pub use autosave::{AutosaveController, DocumentBuffer, SaveOutcome};
pub use content::{
    EditableContent, Snapshot, TextSurface, UserEditSink, delta_from_text, delta_text,
};
pub use status::SaveStatus;
