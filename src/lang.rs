//! Language detection.
//!
//! A thin wrapper over `whatlang`. The pipeline treats this as a best-effort
//! hint: detection failure degrades the pipeline output (`language = None`)
//! but never aborts it.

use serde::{Deserialize, Serialize};

/// Minimum trimmed length for a meaningful detection.
const MIN_DETECTABLE_LEN: usize = 10;

/// Detected language of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageInfo {
    /// ISO 639-3 language code (e.g. `"eng"`).
    pub code: String,
    /// English name of the language (e.g. `"English"`).
    pub name: String,
    /// Detection confidence in `[0, 1]`.
    pub confidence: f64,
}

/// Detect the primary language of `text`.
///
/// Returns `None` for inputs under 10 trimmed characters or when the
/// detector has nothing to say.
///
/// ```rust
/// let info = abridge::detect_language("The quick brown fox jumps over the lazy dog.");
/// assert_eq!(info.unwrap().code, "eng");
/// ```
#[must_use]
pub fn detect_language(text: &str) -> Option<LanguageInfo> {
    let trimmed = text.trim();
    if trimmed.len() < MIN_DETECTABLE_LEN {
        return None;
    }

    whatlang::detect(trimmed).map(|info| LanguageInfo {
        code: info.lang().code().to_string(),
        name: info.lang().eng_name().to_string(),
        confidence: info.confidence(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_english() {
        let text = "It was the best of times, it was the worst of times, \
                    it was the age of wisdom, it was the age of foolishness.";
        let info = detect_language(text).unwrap();
        assert_eq!(info.code, "eng");
        assert!(info.confidence > 0.0);
    }

    #[test]
    fn test_short_input_is_unknown() {
        assert!(detect_language("hi").is_none());
        assert!(detect_language("        ").is_none());
    }
}
