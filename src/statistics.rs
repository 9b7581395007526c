//! Document-level text statistics.

use serde::{Deserialize, Serialize};

use crate::segment::segment;

/// Average adult silent-reading speed, words per minute.
const READING_WORDS_PER_MINUTE: f64 = 225.0;

/// Basic counts over a cleaned document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextStatistics {
    /// Character count of the text.
    pub char_count: usize,
    /// Whitespace-separated word count.
    pub word_count: usize,
    /// Sentence count per the segmenter.
    pub sentence_count: usize,
    /// Mean words per sentence, rounded to two decimals.
    pub avg_words_per_sentence: f64,
    /// Estimated reading time at 225 words per minute.
    pub reading_time_minutes: f64,
}

/// Compute statistics for `text`. Empty input yields all zeros.
#[must_use]
pub fn text_statistics(text: &str) -> TextStatistics {
    if text.is_empty() {
        return TextStatistics::default();
    }

    let sentences = segment(text);
    let word_count = text.split_whitespace().count();
    let avg_words_per_sentence = if sentences.is_empty() {
        0.0
    } else {
        (word_count as f64 / sentences.len() as f64 * 100.0).round() / 100.0
    };

    TextStatistics {
        char_count: text.len(),
        word_count,
        sentence_count: sentences.len(),
        avg_words_per_sentence,
        reading_time_minutes: word_count as f64 / READING_WORDS_PER_MINUTE,
    }
}
