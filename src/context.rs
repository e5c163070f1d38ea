//! Context windows around detected placeholders.

use serde::Serialize;

/// How many characters of surrounding text to keep on each side.
const CONTEXT_RADIUS: usize = 50;

/// A placeholder together with the text surrounding its first occurrence.
#[derive(Debug, Clone, Serialize)]
pub struct PlaceholderContext {
    pub placeholder: String,
    pub window: String,
}

/// Returns up to 50 characters of context on each side of the first
/// occurrence of `placeholder`, with all whitespace collapsed to single
/// spaces. Returns an empty string when the placeholder is absent.
pub fn extract_context(text: &str, placeholder: &str) -> String {
    context_window(text, placeholder, CONTEXT_RADIUS)
}

pub fn context_window(text: &str, placeholder: &str, radius: usize) -> String {
    let Some(start) = text.find(placeholder) else {
        return String::new();
    };
    let end = start + placeholder.len();

    // Walk char indices so the window never splits a multi-byte character.
    let lo = text[..start]
        .char_indices()
        .rev()
        .take(radius)
        .last()
        .map(|(i, _)| i)
        .unwrap_or(start);
    let hi = text[end..]
        .char_indices()
        .nth(radius)
        .map(|(i, _)| end + i)
        .unwrap_or(text.len());

    let window = &text[lo..hi];
    window.split_whitespace().collect::<Vec<_>>().join(" ")
}
