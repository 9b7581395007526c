//! Natural break detection.
//!
//! Books carry structure the raw character stream still shows: chapter
//! headings, scene dividers, blank-line runs. A chunk boundary placed on one
//! of these cues reads far better than a purely size-driven cut, so the
//! chunker prefers them when both are plausible.
//!
//! ```text
//! ... end of chapter twelve.
//!
//!
//! CHAPTER XIII          <- header pattern: break candidate
//!
//! The morning came ...
//! ```
//!
//! Each pattern is scanned independently and contributes the END offset of
//! every match as a candidate break. A pattern that fails to compile is
//! skipped; one bad pattern must never abort the scan.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

/// Candidate patterns, coarsest structural cues first.
const BREAK_PATTERNS: &[&str] = &[
    // Chapter / part / section headers on their own line.
    r"(?mi)^\s*(chapter|part|section|book|prologue|epilogue)\b[^\n]*$",
    // Three or more consecutive blank lines.
    r"\n[ \t]*\n[ \t]*\n[ \t]*\n(?:[ \t]*\n)*",
    // Divider rows: runs of -, =, *, or #.
    r"(?m)^\s*[-]{3,}\s*$",
    r"(?m)^\s*[=]{3,}\s*$",
    r"(?m)^\s*[*]{3,}\s*$",
    r"(?m)^\s*[#]{3,}\s*$",
    // Literal dividers that may appear inline.
    r"---|___|\*\*\*",
    // Abnormally wide whitespace or tab runs.
    r"[ ]{8,}|\t{3,}",
];

static PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    BREAK_PATTERNS
        .iter()
        .filter_map(|p| match Regex::new(p) {
            Ok(re) => Some(re),
            Err(e) => {
                tracing::warn!(pattern = *p, error = %e, "skipping unusable break pattern");
                None
            }
        })
        .collect()
});

/// Find natural break offsets in `text`.
///
/// The result always contains `0` and `text.len()`; everything in between is
/// the end offset of a structural cue match.
///
/// ```rust
/// let text = "Intro text.\n\nCHAPTER ONE\nIt begins.";
/// let breaks = abridge::find_breaks(text);
/// assert!(breaks.contains(&0));
/// assert!(breaks.contains(&text.len()));
/// assert!(breaks.len() > 2);
/// ```
#[must_use]
pub fn find_breaks(text: &str) -> BTreeSet<usize> {
    let mut breaks = BTreeSet::new();
    breaks.insert(0);
    breaks.insert(text.len());

    for re in PATTERNS.iter() {
        for m in re.find_iter(text) {
            breaks.insert(m.end());
        }
    }

    breaks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_always_contains_bounds() {
        let breaks = find_breaks("no structure here at all");
        assert!(breaks.contains(&0));
        assert!(breaks.contains(&24));
    }

    #[test]
    fn test_empty_text() {
        let breaks = find_breaks("");
        assert_eq!(breaks.len(), 1); // 0 and len coincide
        assert!(breaks.contains(&0));
    }

    #[test]
    fn test_chapter_header_detected() {
        let text = "The end of one part.\nChapter 2\nA new beginning here.";
        let breaks = find_breaks(text);
        let header_end = text.find("Chapter 2").unwrap() + "Chapter 2".len();
        assert!(breaks.contains(&header_end), "breaks: {breaks:?}");
    }

    #[test]
    fn test_divider_rows_detected() {
        for divider in ["---", "===", "***", "###"] {
            let text = format!("Before.\n{divider}\nAfter.");
            let breaks = find_breaks(&text);
            assert!(breaks.len() > 2, "no break for divider {divider}");
        }
    }

    #[test]
    fn test_blank_line_run_detected() {
        let text = "End of scene.\n\n\n\nNext scene starts.";
        let breaks = find_breaks(text);
        assert!(breaks.iter().any(|&b| b > 0 && b < text.len()));
    }

    #[test]
    fn test_breaks_sorted_and_unique() {
        let text = "A.\n\n\n\nB.\n---\nC.";
        let breaks: Vec<usize> = find_breaks(text).into_iter().collect();
        let mut sorted = breaks.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(breaks, sorted);
    }
}
