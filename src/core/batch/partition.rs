//! Item compression and greedy batch partitioning

use crate::utils::tokens::estimate_tokens;
use std::borrow::Cow;

const SENTENCE_SEPARATOR: &str = ". ";
const ELLIPSIS: &str = "...";
/// Slack reserved around the middle section when compressing
const COMPRESSION_MARGIN: usize = 10;

/// Shorten `text` to roughly `max_chars`, keeping its first and last sentence
///
/// Texts with three sentences or fewer are cut at `max_chars`. Longer texts
/// keep the first and last sentence and truncate the middle. Newlines are
/// folded into spaces.
pub fn compress_item(text: &str, max_chars: usize) -> Cow<'_, str> {
    let original_len = text.chars().count();
    if original_len <= max_chars {
        return Cow::Borrowed(text);
    }

    let flattened = text.replace('\n', " ");
    let sentences: Vec<&str> = flattened.split(SENTENCE_SEPARATOR).collect();

    if sentences.len() <= 3 {
        return Cow::Owned(hard_truncate(&flattened, max_chars));
    }

    let first = sentences[0];
    let last = sentences[sentences.len() - 1];
    let kept = first.chars().count() + SENTENCE_SEPARATOR.len() * 2 + last.chars().count();
    let remaining = max_chars.saturating_sub(kept + COMPRESSION_MARGIN);

    let middle = sentences[1..sentences.len() - 1].join(SENTENCE_SEPARATOR);
    let middle = if middle.chars().count() > remaining {
        hard_truncate(&middle, remaining)
    } else {
        middle
    };

    let compressed = format!("{first}. {middle}. {last}");

    // A very long first or last sentence defeats the sentence-preserving form
    if compressed.chars().count() >= original_len {
        return Cow::Owned(hard_truncate(&flattened, max_chars));
    }
    Cow::Owned(compressed)
}

fn hard_truncate(text: &str, max_chars: usize) -> String {
    let mut out: String = text.chars().take(max_chars).collect();
    out.push_str(ELLIPSIS);
    out
}

/// Characters removed by compression
pub fn chars_saved(original: &str, compressed: &str) -> usize {
    original
        .chars()
        .count()
        .saturating_sub(compressed.chars().count())
}

/// Greedy, order-preserving partition of `items` into index groups
///
/// A group never holds more than `max_batch_size` items, and its summed
/// token estimate never exceeds `max_tokens_per_batch` unless a single item
/// is over budget on its own, in which case it forms a group by itself.
pub fn partition<S: AsRef<str>>(
    items: &[S],
    max_batch_size: usize,
    max_tokens_per_batch: usize,
) -> Vec<Vec<usize>> {
    let max_batch_size = max_batch_size.max(1);
    let mut groups = Vec::new();
    let mut current: Vec<usize> = Vec::new();
    let mut current_tokens = 0usize;

    for (index, item) in items.iter().enumerate() {
        let tokens = estimate_tokens(item.as_ref());
        let full = current.len() >= max_batch_size;
        let over_budget = current_tokens + tokens > max_tokens_per_batch;

        if !current.is_empty() && (full || over_budget) {
            groups.push(std::mem::take(&mut current));
            current_tokens = 0;
        }

        current.push(index);
        current_tokens += tokens;
    }

    if !current.is_empty() {
        groups.push(current);
    }
    groups
}
