//! Small pure text helpers for token labels.

use unicode_segmentation::UnicodeSegmentation;

/// Truncate to at most `max` grapheme clusters, appending `...` when cut.
///
/// Counts graphemes rather than chars so multi-codepoint emoji are never split.
/// The ellipsis counts toward the budget; `max` is raised to 3 so it fits.
#[must_use]
pub fn truncate_with_ellipsis(raw: &str, max: usize) -> String {
    let raw = raw.trim();
    let max = max.max(3);
    if raw.graphemes(true).count() <= max {
        return raw.to_string();
    }
    let head: String = raw.graphemes(true).take(max - 3).collect();
    format!("{}...", head.trim_end())
}

/// First grapheme cluster of `raw`, ignoring surrounding whitespace.
#[must_use]
pub fn first_grapheme(raw: &str) -> Option<&str> {
    raw.trim().graphemes(true).next()
}
