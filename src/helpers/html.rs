//! HTML helper functions

/// Escape HTML special characters
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Count words in plain text
pub fn count_words(text: &str) -> usize {
    text.split_whitespace()
        .filter(|w| w.chars().any(char::is_alphanumeric))
        .count()
}

/// Estimated reading time in whole minutes, rounded up
pub fn reading_time(words: usize, words_per_minute: usize) -> usize {
    if words == 0 {
        return 0;
    }
    words.div_ceil(words_per_minute.max(1))
}
