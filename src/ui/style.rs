use crate::editor::SaveStatus;
use console::style;
use std::fmt::Display;

/// Green bold: success checkmarks, confirmations
pub fn success<D: Display>(text: D) -> String {
    style(text).green().bold().to_string()
}

/// White bold: section headers, document titles
pub fn header<D: Display>(text: D) -> String {
    style(text).white().bold().to_string()
}

/// Dim: ids, timestamps, secondary text
pub fn dim<D: Display>(text: D) -> String {
    style(text).dim().to_string()
}

/// Yellow: shell commands, warnings
pub fn yellow<D: Display>(text: D) -> String {
    style(text).yellow().to_string()
}

/// Green: confirmed values, paths, names
pub fn value<D: Display>(text: D) -> String {
    style(text).green().to_string()
}

/// Cyan bold: bullet points
pub fn accent<D: Display>(text: D) -> String {
    style(text).cyan().bold().to_string()
}

/// Red bold: failures
pub fn error<D: Display>(text: D) -> String {
    style(text).red().bold().to_string()
}

/// Status-line indicator, colored by how worried the user should be.
pub fn save_status(status: SaveStatus) -> String {
    let label = style(status.label());
    match status {
        SaveStatus::Idle => label.dim(),
        SaveStatus::Dirty => label.yellow(),
        SaveStatus::Saving => label.cyan(),
        SaveStatus::Saved => label.green(),
        SaveStatus::Error => label.red().bold(),
    }
    .to_string()
}
