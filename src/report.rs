//! Post-merge validation.
//!
//! A merged summary is checked along three axes, each scored in `[0, 1]`:
//!
//! - **Coverage**: TF-IDF cosine similarity between the concatenated chunk
//!   summaries and the merged text.
//! - **Redundancy reduction**: how much shorter the merged text is than the
//!   sum of its inputs.
//! - **Coherence**: a weighted blend of sentence-length consistency,
//!   transition-word density, and pronoun consistency.
//!
//! The report also lists likely-missing key points: each chunk summary's
//! first sentence (usually its topic sentence) that does not appear verbatim
//! in the merged text. Validation is advisory; a failed report never blocks
//! the pipeline.

use serde::{Deserialize, Serialize};

use crate::segment::segment;
use crate::tfidf::{cosine_similarity, fit_transform};

/// Minimum coverage score for a passing report.
const COVERAGE_THRESHOLD: f64 = 0.7;

/// Minimum redundancy reduction for a passing report.
const REDUNDANCY_THRESHOLD: f64 = 0.3;

/// Minimum coherence score for a passing report.
const COHERENCE_THRESHOLD: f64 = 0.6;

/// Transition words counted toward the coherence score.
const TRANSITION_WORDS: &[&str] = &[
    "however",
    "moreover",
    "furthermore",
    "consequently",
    "additionally",
    "nevertheless",
    "therefore",
    "thus",
];

/// Quality assessment of a merged summary against its inputs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// TF-IDF similarity between the merged text and the combined inputs.
    pub coverage_score: f64,
    /// `1 - merged_length / total_input_length`, clamped to `[0, 1]`.
    pub redundancy_reduction: f64,
    /// Blend of length, transition, and pronoun consistency signals.
    pub coherence_score: f64,
    /// Topic sentences from the inputs not found in the merged text.
    pub missing_key_points: Vec<String>,
    /// Whether all three scores cleared their thresholds.
    pub validation_passed: bool,
}

/// Validate `merged` against the chunk summaries it was built from.
///
/// Never fails: sub-scores that cannot be computed fall back to neutral
/// defaults, which generally keep `validation_passed` false.
#[must_use]
pub fn validate_merged_summary(original_summaries: &[String], merged: &str) -> ValidationReport {
    let coverage_score = coverage(&original_summaries.join(" "), merged);
    let redundancy_reduction = redundancy_reduction(original_summaries, merged);
    let coherence_score = coherence(merged);
    let missing_key_points = missing_key_points(original_summaries, merged);

    let validation_passed = coverage_score > COVERAGE_THRESHOLD
        && redundancy_reduction > REDUNDANCY_THRESHOLD
        && coherence_score > COHERENCE_THRESHOLD;

    ValidationReport {
        coverage_score,
        redundancy_reduction,
        coherence_score,
        missing_key_points,
        validation_passed,
    }
}

/// TF-IDF cosine between the combined originals and the merged text,
/// clamped to `[0, 1]`. Falls back to 0.5 when the vocabulary is empty.
fn coverage(original_text: &str, merged: &str) -> f64 {
    match fit_transform(&[original_text, merged]) {
        Ok(rows) => cosine_similarity(&rows[0], &rows[1]).clamp(0.0, 1.0),
        Err(e) => {
            tracing::warn!(error = %e, "coverage score fell back to default");
            0.5
        }
    }
}

/// Length-based redundancy reduction; 0.0 when the inputs are empty.
fn redundancy_reduction(original_summaries: &[String], merged: &str) -> f64 {
    let original_length: usize = original_summaries.iter().map(String::len).sum();
    if original_length == 0 {
        return 0.0;
    }
    (1.0 - merged.len() as f64 / original_length as f64).clamp(0.0, 1.0)
}

/// Coherence blend: 50% sentence-length consistency, 30% transition-word
/// density, 20% pronoun consistency. A text of at most one sentence is
/// trivially coherent.
fn coherence(text: &str) -> f64 {
    let sentences = segment(text);
    if sentences.len() <= 1 {
        return 1.0;
    }

    let lengths: Vec<f64> = sentences.iter().map(|s| s.len() as f64).collect();
    let n = lengths.len() as f64;
    let avg_length = lengths.iter().sum::<f64>() / n;
    let mean_deviation = lengths.iter().map(|l| (l - avg_length).abs()).sum::<f64>() / n;
    let length_score = 1.0 - (mean_deviation / avg_length).min(1.0);

    let text_lower = text.to_lowercase();
    let transition_count = TRANSITION_WORDS
        .iter()
        .filter(|w| text_lower.contains(*w))
        .count();
    let transition_score =
        (transition_count as f64 / (sentences.len() - 1).max(1) as f64).min(1.0);

    0.5 * length_score + 0.3 * transition_score + 0.2 * pronoun_score(&text_lower)
}

/// Fraction of pronoun occurrences belonging to the dominant pronoun; 1.0
/// when the text has no pronouns.
fn pronoun_score(text_lower: &str) -> f64 {
    const PRONOUNS: &[&str] = &["he", "she", "it", "they", "we", "i", "you"];

    let mut counts = [0_usize; 7];
    for word in text_lower.split(|c: char| !c.is_alphanumeric() && c != '_') {
        if let Some(idx) = PRONOUNS.iter().position(|p| *p == word) {
            counts[idx] += 1;
        }
    }

    let total: usize = counts.iter().sum();
    if total == 0 {
        return 1.0;
    }
    let dominant = counts.iter().copied().max().unwrap_or(0);
    dominant as f64 / total as f64
}

/// Each input's first sentence that the merged text does not contain,
/// compared case-insensitively.
fn missing_key_points(original_summaries: &[String], merged: &str) -> Vec<String> {
    let merged_lower = merged.to_lowercase();
    let mut missing = Vec::new();

    for (i, summary) in original_summaries.iter().enumerate() {
        let sentences = segment(summary);
        if let Some(first) = sentences.first() {
            if !merged_lower.contains(&first.to_lowercase()) {
                missing.push(format!("Chunk {} topic: {first}", i + 1));
            }
        }
    }

    missing
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_identical_content_full_coverage() {
        let originals = strings(&["The fleet sailed north toward the ice."]);
        let report =
            validate_merged_summary(&originals, "The fleet sailed north toward the ice.");
        assert!(report.coverage_score > 0.99);
        assert!(report.missing_key_points.is_empty());
    }

    #[test]
    fn test_verbatim_copy_fails_on_redundancy() {
        // Coverage is perfect but nothing was reduced, so validation fails.
        let originals = strings(&["A. B."]);
        let report = validate_merged_summary(&originals, "A. B.");
        assert!(report.coverage_score > 0.99);
        assert!(report.redundancy_reduction.abs() < f64::EPSILON);
        assert!(!report.validation_passed);
    }

    #[test]
    fn test_redundancy_reduction_ratio() {
        let originals = strings(&["aaaaaaaaaa", "bbbbbbbbbb"]); // 20 chars
        let report = validate_merged_summary(&originals, "aaaaa"); // 5 chars
        assert!((report.redundancy_reduction - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_empty_inputs_zero_reduction() {
        let report = validate_merged_summary(&[], "");
        assert!(report.redundancy_reduction.abs() < f64::EPSILON);
        assert!(!report.validation_passed);
        // Empty vocabulary falls back to the neutral coverage default.
        assert!((report.coverage_score - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_single_sentence_trivially_coherent() {
        assert!((coherence("One lone sentence here.") - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_transitions_raise_coherence() {
        let flat = "The army moved east today. The city gates fell at dawn.";
        let linked = "The army moved east today. Therefore the city gates fell at dawn.";
        assert!(coherence(linked) > coherence(flat));
    }

    #[test]
    fn test_no_pronouns_perfect_pronoun_score() {
        assert!((pronoun_score("the castle stood on the hill") - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_mixed_pronouns_lower_score() {
        // "he" twice, "she" once: dominant fraction 2/3.
        let score = pronoun_score("he ran and he jumped while she watched");
        assert!((score - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_topic_sentence_reported() {
        let originals = strings(&[
            "The treaty was signed in secret. Ministers argued for weeks.",
            "Harvests failed across the south.",
        ]);
        let merged = "Harvests failed across the south.";
        let report = validate_merged_summary(&originals, merged);
        assert_eq!(report.missing_key_points.len(), 1);
        assert!(report.missing_key_points[0].starts_with("Chunk 1 topic:"));
    }
}
