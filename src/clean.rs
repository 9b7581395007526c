//! Raw text cleaning.
//!
//! Book text arrives from upstream extractors with inconsistent line endings,
//! tab soup, and stray control characters. Everything downstream (sentence
//! segmentation, break detection, chunking) assumes normalized whitespace, so
//! cleaning runs first and is the only step allowed to rewrite the text.
//!
//! Normalization steps, in order:
//!
//! 1. `\r\n` and bare `\r` become `\n`
//! 2. Runs of spaces/tabs collapse to a single space
//! 3. Three or more newlines collapse to one blank line
//! 4. Non-ASCII runs are replaced by a single space
//! 5. Leading/trailing whitespace is trimmed

use once_cell::sync::Lazy;
use regex::Regex;

static HORIZONTAL_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+").unwrap());
static BLANK_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());
static NON_ASCII: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\x00-\x7F]+").unwrap());

/// Normalize raw extracted text.
///
/// Empty input yields an empty string.
///
/// ```rust
/// let cleaned = abridge::clean_text("One.\r\n\r\n\r\n\r\nTwo\tthree.");
/// assert_eq!(cleaned, "One.\n\nTwo three.");
/// ```
#[must_use]
pub fn clean_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let text = HORIZONTAL_WS.replace_all(&text, " ");
    let text = BLANK_RUNS.replace_all(&text, "\n\n");
    let text = NON_ASCII.replace_all(&text, " ");
    text.trim().to_string()
}
