//! Shared presentation helpers.

use crate::error::ApiError;
use owo_colors::OwoColorize;
use serde::Serialize;

/// Format a section heading with bold/underline.
pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ApiError::RenderFailed(format!("JSON encoding failed: {}", e)))
}

/// First line of a text, shortened to `max` characters
pub fn preview(text: &str, max: usize) -> String {
    let first = text.lines().next().unwrap_or("");
    if first.chars().count() > max {
        let cut: String = first.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    } else if text.lines().nth(1).is_some() {
        format!("{} ...", first)
    } else {
        first.to_string()
    }
}
