//! Sentence segmentation.
//!
//! Splits cleaned text into an ordered sequence of sentences. Every chunk
//! boundary downstream is a sentence boundary, so correctness here bounds
//! the quality of everything else.
//!
//! ## The Hard Part: Abbreviations
//!
//! ```text
//! "Dr. Smith went to Washington D.C. on Jan. 15th."
//!     ^                          ^       ^
//!     Not a sentence end (abbreviation)
//! ```
//!
//! The primary splitter uses Unicode Standard Annex #29 (UAX #29), which
//! handles abbreviations, decimal numbers, and ellipses well.
//!
//! ## The Fallback
//!
//! If the primary splitter produces nothing for non-empty input, a regex
//! fallback takes over: it masks a fixed list of known abbreviations, splits
//! on `[.!?]` followed by whitespace and an uppercase letter, then unmasks.
//! The fallback is deliberately conservative; slight under-splitting is
//! preferable to cutting a sentence in half.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

/// Abbreviations the fallback splitter must not treat as sentence ends.
const ABBREVIATIONS: &[&str] = &[
    "Dr.", "Mr.", "Mrs.", "Ms.", "Prof.", "Jr.", "Sr.", "St.", "Ave.", "Blvd.", "Inc.", "Ltd.",
    "Corp.", "vs.", "etc.", "e.g.", "i.e.",
];

/// Sentinel substituted for the periods of protected abbreviations.
const MASK: char = '\u{1}';

static TERMINATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]+\s+").unwrap());

/// Split text into trimmed, non-empty sentences.
///
/// Empty or whitespace-only input yields an empty vector.
///
/// ```rust
/// let sentences = abridge::segment("Hello world. How are you? I am fine.");
/// assert_eq!(sentences.len(), 3);
/// assert_eq!(sentences[0], "Hello world.");
/// ```
#[must_use]
pub fn segment(text: &str) -> Vec<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return vec![];
    }

    let sentences: Vec<String> = trimmed
        .split_sentence_bounds()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    if sentences.is_empty() {
        // UAX #29 found nothing usable; take the regex path.
        tracing::warn!("primary sentence segmentation produced no output, using fallback");
        return segment_fallback(trimmed);
    }

    sentences
}

/// Regex-based fallback splitter with abbreviation protection.
///
/// Public so callers can exercise the degraded path directly.
#[must_use]
pub fn segment_fallback(text: &str) -> Vec<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return vec![];
    }

    // Mask abbreviation periods so they survive the split.
    let mut masked = trimmed.to_string();
    for abbr in ABBREVIATIONS {
        let replacement = abbr.replace('.', &MASK.to_string());
        masked = masked.replace(abbr, &replacement);
    }

    // The regex crate has no lookahead, so match terminator + whitespace and
    // verify the uppercase follow-up by hand.
    let mut sentences = Vec::new();
    let mut start = 0;
    for m in TERMINATOR.find_iter(&masked) {
        let next_is_upper = masked[m.end()..]
            .chars()
            .next()
            .is_some_and(char::is_uppercase);
        if next_is_upper {
            let end = masked[m.start()..m.end()]
                .find(char::is_whitespace)
                .map_or(m.end(), |ws| m.start() + ws);
            let candidate = masked[start..end].trim();
            if !candidate.is_empty() {
                sentences.push(candidate.to_string());
            }
            start = m.end();
        }
    }
    let tail = masked[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail.to_string());
    }

    // Unmask.
    sentences
        .into_iter()
        .map(|s| s.replace(MASK, "."))
        .collect()
}
