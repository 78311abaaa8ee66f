use serde::{Deserialize, Serialize};

/// Save state of the open buffer.
///
/// Exactly one of these holds at a time, so "unsent change pending",
/// "request in flight" and "last request's outcome" never overlap.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SaveStatus {
    /// Nothing edited and nothing attempted since the buffer was loaded.
    #[default]
    Idle,
    /// A local change is waiting for its debounce window to close.
    Dirty,
    /// A write request is in flight.
    Saving,
    Saved,
    Error,
}

impl SaveStatus {
    /// Short indicator text for a status line.
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "Auto-save enabled",
            Self::Dirty => "Unsaved changes",
            Self::Saving => "Saving...",
            Self::Saved => "Saved",
            Self::Error => "Save failed",
        }
    }

    pub fn has_unsaved_changes(self) -> bool {
        matches!(self, Self::Dirty | Self::Error)
    }
}
