//! Rough token accounting

/// Characters per token used for budgeting
pub const CHARS_PER_TOKEN: usize = 4;

/// Estimated token count of `text`
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / CHARS_PER_TOKEN
}
