//! Merging chunk summaries into one coherent narrative.
//!
//! ## The Problem
//!
//! Each chunk is summarized independently; the model never sees the whole
//! book. Naively concatenating the chunk summaries produces a text that
//! repeats itself at every overlap boundary and lurches between topics.
//! The merger has to turn N independent summaries into one non-redundant,
//! readable whole — without access to the original document structure.
//!
//! ## Strategies
//!
//! - **Simple**: exact-duplicate sentence removal (case-insensitive),
//!   first occurrence wins, then join and truncate.
//! - **Semantic**: TF-IDF over all sentences; keep the most distinctive 70%
//!   (scored by dissimilarity to the rest plus an early-position bonus) in
//!   their original order.
//! - **Intelligent** (default): a five-stage pipeline —
//!
//! ```text
//! 1. Flatten     every sentence tagged with (chunk, position)
//! 2. Score       0.5 * TF-IDF salience + 0.3 * position + 0.2 * length
//! 3. Deduplicate pairwise cosine > 0.8 marks the weaker sentence
//! 4. Reorder     importance desc, document order as tie-break
//! 5. Transition  synthesize connective phrases between sentences
//! ```
//!
//! Any TF-IDF failure (empty vocabulary) degrades to a named fallback —
//! simple merge for the semantic strategy, position-only scoring for the
//! intelligent one — and never propagates as an error.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::segment::segment;
use crate::tfidf::{cosine_similarity, fit_transform};
use crate::tokens::word_count;

/// Cosine similarity above which a sentence pair is considered redundant.
const REDUNDANCY_THRESHOLD: f64 = 0.8;

/// Fraction of sentences the semantic strategy keeps.
const SEMANTIC_KEEP_RATIO: f64 = 0.7;

/// The semantic strategy never keeps fewer sentences than this.
const SEMANTIC_KEEP_MIN: usize = 3;

/// Transition words a sentence may already start with.
const STARTING_TRANSITIONS: &[&str] = &[
    "however",
    "but",
    "in contrast",
    "on the other hand",
    "furthermore",
    "moreover",
    "additionally",
    "also",
    "for example",
    "for instance",
    "such as",
    "therefore",
    "thus",
    "consequently",
    "as a result",
    "nevertheless",
    "nonetheless",
    "meanwhile",
    "subsequently",
    "in addition",
    "further",
    "besides",
    "likewise",
    "conversely",
    "alternatively",
    "whereas",
    "while",
];

/// How chunk summaries are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeStrategy {
    /// Exact-duplicate removal, then join.
    Simple,
    /// TF-IDF distinctiveness selection in original order.
    Semantic,
    /// Full importance/redundancy/flow/transition pipeline.
    #[default]
    Intelligent,
}

/// A sentence with merge-time metadata. Created per merge call, discarded
/// after the merge completes.
#[derive(Debug, Clone)]
struct SentenceRecord {
    text: String,
    chunk_index: usize,
    sentence_index: usize,
    word_count: usize,
    importance_score: f64,
    is_redundant: bool,
    similar_sentences: Vec<usize>,
}

/// Merges independently produced chunk summaries.
///
/// Stateless: every merge owns its data, so one merger may serve concurrent
/// callers for different documents without coordination.
///
/// ## Example
///
/// ```rust
/// use abridge::{MergeStrategy, SummaryMerger};
///
/// let merger = SummaryMerger::new();
/// let summaries = vec![
///     "The hero leaves home.".to_string(),
///     "The hero leaves home. A storm forces a detour.".to_string(),
/// ];
/// let merged = merger.merge_summaries(&summaries, MergeStrategy::Simple, 1000);
/// assert_eq!(merged.matches("The hero leaves home.").count(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SummaryMerger;

impl SummaryMerger {
    /// Create a merger.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Merge `summaries` into a single text of at most `max_length`
    /// characters, ending on a sentence boundary.
    ///
    /// An empty input yields an empty string.
    #[must_use]
    pub fn merge_summaries(
        &self,
        summaries: &[String],
        strategy: MergeStrategy,
        max_length: usize,
    ) -> String {
        if summaries.is_empty() {
            return String::new();
        }

        match strategy {
            MergeStrategy::Simple => self.simple_merge(summaries, max_length),
            MergeStrategy::Semantic => self.semantic_merge(summaries, max_length),
            MergeStrategy::Intelligent => self.intelligent_merge(summaries, max_length),
        }
    }

    /// Merge with key phrases recovered from each summary's source chunk.
    ///
    /// Capitalized multi-word phrases from a chunk that its summary dropped
    /// are appended before the intelligent merge runs.
    ///
    /// # Errors
    ///
    /// [`Error::LengthMismatch`] when the two lists differ in length.
    pub fn merge_with_context(
        &self,
        summaries: &[String],
        chunk_texts: &[String],
        max_length: usize,
    ) -> Result<String> {
        if summaries.len() != chunk_texts.len() {
            return Err(Error::LengthMismatch {
                summaries: summaries.len(),
                contexts: chunk_texts.len(),
            });
        }

        let enriched: Vec<String> = summaries
            .iter()
            .zip(chunk_texts)
            .map(|(summary, context)| {
                let summary_lower = summary.to_lowercase();
                let mut enhanced = summary.clone();
                for phrase in extract_key_phrases(context, 3) {
                    if !summary_lower.contains(&phrase.to_lowercase()) {
                        enhanced.push(' ');
                        enhanced.push_str(&phrase);
                    }
                }
                enhanced
            })
            .collect();

        Ok(self.merge_summaries(&enriched, MergeStrategy::Intelligent, max_length))
    }

    /// Exact-duplicate removal, case-insensitive, first occurrence wins.
    fn simple_merge(&self, summaries: &[String], max_length: usize) -> String {
        let mut seen: Vec<String> = Vec::new();
        let mut unique: Vec<String> = Vec::new();

        for summary in summaries {
            for sentence in segment(summary) {
                let key = sentence.to_lowercase();
                if !seen.contains(&key) {
                    seen.push(key);
                    unique.push(sentence);
                }
            }
        }

        truncate_summary(&unique.join(" "), max_length)
    }

    /// Keep the most distinctive sentences, in original order.
    fn semantic_merge(&self, summaries: &[String], max_length: usize) -> String {
        let sentences: Vec<String> = summaries.iter().flat_map(|s| segment(s)).collect();
        if sentences.is_empty() {
            return String::new();
        }

        let texts: Vec<&str> = sentences.iter().map(String::as_str).collect();
        let rows = match fit_transform(&texts) {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!(error = %e, "semantic merge fell back to simple merge");
                return self.simple_merge(summaries, max_length);
            }
        };

        let n = sentences.len();
        let mut scores: Vec<(usize, f64)> = (0..n)
            .map(|i| {
                let total: f64 = (0..n).map(|j| cosine_similarity(&rows[i], &rows[j])).sum();
                let avg = if n > 1 { total / (n - 1) as f64 } else { 0.0 };
                let position_bonus = if i < 2 { 0.2 } else { 0.1 };
                (i, (1.0 - avg) + position_bonus)
            })
            .collect();

        scores.sort_by(|a, b| b.1.total_cmp(&a.1));
        let keep = ((n as f64 * SEMANTIC_KEEP_RATIO) as usize).max(SEMANTIC_KEEP_MIN);

        let mut selected: Vec<usize> = scores.iter().take(keep).map(|&(i, _)| i).collect();
        selected.sort_unstable(); // original relative order

        let merged: Vec<&str> = selected.iter().map(|&i| sentences[i].as_str()).collect();
        truncate_summary(&merged.join(" "), max_length)
    }

    /// The five-stage pipeline: flatten, score, deduplicate, reorder,
    /// transition.
    fn intelligent_merge(&self, summaries: &[String], max_length: usize) -> String {
        let mut records = extract_sentence_records(summaries);
        if records.is_empty() {
            return String::new();
        }

        let texts: Vec<&str> = records.iter().map(|r| r.text.as_str()).collect();
        let rows = match fit_transform(&texts) {
            Ok(rows) => Some(rows),
            Err(e) => {
                tracing::warn!(error = %e, "importance scoring fell back to position-only");
                None
            }
        };

        score_importance(&mut records, rows.as_deref());
        resolve_redundancy(&mut records, rows.as_deref());
        let ordered = optimize_flow(&records);
        let connected = generate_transitions(&ordered);

        truncate_summary(&connected.join(" "), max_length)
    }
}

/// Flatten summaries into tagged sentence records.
fn extract_sentence_records(summaries: &[String]) -> Vec<SentenceRecord> {
    let mut records = Vec::new();
    for (chunk_index, summary) in summaries.iter().enumerate() {
        for (sentence_index, sentence) in segment(summary).into_iter().enumerate() {
            records.push(SentenceRecord {
                word_count: word_count(&sentence),
                text: sentence,
                chunk_index,
                sentence_index,
                importance_score: 0.0,
                is_redundant: false,
                similar_sentences: Vec::new(),
            });
        }
    }
    records
}

/// Position score: topic sentences lead their chunk.
fn position_score(sentence_index: usize) -> f64 {
    match sentence_index {
        0 => 1.5,
        1 => 1.2,
        _ => 1.0,
    }
}

/// Weighted importance: 50% TF-IDF salience, 30% position, 20% length.
/// Without vectors, position alone decides.
fn score_importance(records: &mut [SentenceRecord], rows: Option<&[Vec<f64>]>) {
    let Some(rows) = rows else {
        for record in records.iter_mut() {
            record.importance_score = position_score(record.sentence_index);
        }
        return;
    };

    let magnitudes: Vec<f64> = rows.iter().map(|row| row.iter().sum()).collect();
    let max_magnitude = magnitudes.iter().fold(0.0_f64, |a, &b| a.max(b)).max(f64::MIN_POSITIVE);

    for (record, &magnitude) in records.iter_mut().zip(&magnitudes) {
        let tfidf_score = magnitude / max_magnitude;
        let length_score = (record.word_count as f64 / 15.0).min(1.0);
        record.importance_score =
            0.5 * tfidf_score + 0.3 * position_score(record.sentence_index) + 0.2 * length_score;
    }
}

/// Single-pass pairwise redundancy marking.
///
/// Each over-threshold pair marks its lower-importance member; pairs are
/// not revisited, so transitively-similar chains may stay partially
/// deduplicated. That matches the reference behavior and is deliberate.
fn resolve_redundancy(records: &mut [SentenceRecord], rows: Option<&[Vec<f64>]>) {
    let Some(rows) = rows else { return };
    if records.len() <= 1 {
        return;
    }

    for i in 0..records.len() {
        for j in (i + 1)..records.len() {
            let similarity = cosine_similarity(&rows[i], &rows[j]);
            if similarity > REDUNDANCY_THRESHOLD {
                if records[i].importance_score > records[j].importance_score {
                    records[j].is_redundant = true;
                    records[j].similar_sentences.push(i);
                } else {
                    records[i].is_redundant = true;
                    records[i].similar_sentences.push(j);
                }
            }
        }
    }
}

/// Drop redundant sentences; order by importance descending with original
/// document order as the tie-break.
fn optimize_flow(records: &[SentenceRecord]) -> Vec<String> {
    let mut kept: Vec<&SentenceRecord> = records.iter().filter(|r| !r.is_redundant).collect();
    kept.sort_by(|a, b| {
        b.importance_score
            .total_cmp(&a.importance_score)
            .then_with(|| a.chunk_index.cmp(&b.chunk_index))
            .then_with(|| a.sentence_index.cmp(&b.sentence_index))
    });
    kept.into_iter().map(|r| r.text.clone()).collect()
}

/// Prepend a synthesized transition to each sentence that needs one.
fn generate_transitions(sentences: &[String]) -> Vec<String> {
    if sentences.len() <= 1 {
        return sentences.to_vec();
    }

    let mut enhanced = vec![sentences[0].clone()];
    for i in 1..sentences.len() {
        match transition_phrase(&sentences[i - 1], &sentences[i]) {
            Some(phrase) => enhanced.push(format!("{phrase} {}", sentences[i])),
            None => enhanced.push(sentences[i].clone()),
        }
    }
    enhanced
}

/// Choose a transition phrase for the (previous, current) sentence pair, or
/// `None` when the current sentence already opens with one.
fn transition_phrase(prev: &str, current: &str) -> Option<&'static str> {
    let current_lower = current.trim().to_lowercase();
    let current_clean =
        current_lower.trim_start_matches(|c: char| ".,;:!?\"()[]{}".contains(c));

    for transition in STARTING_TRANSITIONS {
        if current_clean.starts_with(&format!("{transition} "))
            || current_clean.starts_with(&format!("{transition},"))
        {
            return None;
        }
    }

    // Keyword cues on the current sentence.
    let contrastive = ["however", "but", "in contrast", "on the other hand"];
    if contrastive.iter().any(|k| current_lower.contains(k)) {
        return Some("Furthermore");
    }
    let additive = ["also", "additionally", "moreover"];
    if additive.iter().any(|k| current_lower.contains(k)) {
        return Some("Additionally");
    }
    let exemplifying = ["for example", "for instance", "such as"];
    if exemplifying.iter().any(|k| current_lower.contains(k)) {
        return Some("For instance");
    }
    let conclusive = ["therefore", "thus", "consequently", "as a result"];
    if conclusive.iter().any(|k| current_lower.contains(k)) {
        return Some("Consequently");
    }

    // Default on the prior sentence's terminal punctuation.
    if prev.ends_with('.') {
        Some("Moreover")
    } else if prev.ends_with('?') {
        Some("Regarding this")
    } else if prev.ends_with('!') {
        Some("Building on this")
    } else {
        None
    }
}

/// Truncate to `max_length` characters on a sentence boundary.
///
/// Joining spaces count toward the budget, so the result never exceeds
/// `max_length` and never ends mid-sentence.
pub(crate) fn truncate_summary(summary: &str, max_length: usize) -> String {
    if summary.len() <= max_length {
        return summary.to_string();
    }

    let mut kept: Vec<String> = Vec::new();
    let mut current_length = 0;
    for sentence in segment(summary) {
        let addition = sentence.len() + usize::from(!kept.is_empty());
        if current_length + addition > max_length {
            break;
        }
        current_length += addition;
        kept.push(sentence);
    }

    kept.join(" ")
}

/// Up to `top_n` key phrases: runs of two or more consecutive capitalized
/// words longer than three characters.
fn extract_key_phrases(text: &str, top_n: usize) -> Vec<String> {
    let mut phrases: Vec<String> = Vec::new();

    for sentence in segment(text) {
        let mut current: Vec<&str> = Vec::new();
        for word in sentence.split_whitespace() {
            let capitalized = word.chars().next().is_some_and(char::is_uppercase);
            if capitalized && word.len() > 3 {
                current.push(word);
            } else if !current.is_empty() {
                if current.len() >= 2 {
                    phrases.push(current.join(" "));
                }
                current.clear();
            }
        }
        if current.len() >= 2 {
            phrases.push(current.join(" "));
        }
    }

    let mut unique: Vec<String> = Vec::new();
    for phrase in phrases {
        if !unique.contains(&phrase) {
            unique.push(phrase);
        }
        if unique.len() == top_n {
            break;
        }
    }
    unique
}
