//! Chunk statistics and validation.
//!
//! Aggregate quality metrics over a finished chunk list, computed against
//! the [`ChunkingConfig`](crate::ChunkingConfig) that produced it:
//!
//! - **Size consistency**: how tightly token counts cluster around the mean.
//! - **Overlap effectiveness**: the fraction of chunk transitions carrying at
//!   least 70% of the configured overlap.
//! - **Sentence integrity**: constant 1.0 — the chunker never splits a
//!   sentence, so this holds by construction.

use serde::{Deserialize, Serialize};

use crate::chunk::{Chunk, ChunkingConfig};

/// Fraction of the configured overlap a transition must carry to count as
/// effective.
const EFFECTIVE_OVERLAP_RATIO: f64 = 0.7;

/// Tolerated overshoot over `max_tokens` before a chunk is flagged.
const MAX_TOKENS_BUFFER: f64 = 1.2;

/// Aggregate overlap figures across chunk transitions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OverlapStats {
    /// Sum of previous-chunk overlaps over all transitions.
    pub total_overlap_tokens: usize,
    /// Mean overlap tokens over transitions that had any overlap.
    pub avg_overlap_tokens: f64,
    /// Number of transitions with a non-zero overlap.
    pub overlap_instances: usize,
    /// Percentage of transitions with a non-zero overlap.
    pub overlap_coverage: f64,
}

/// Derived quality scores, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    /// `max(0, 1 - stddev / (0.5 * mean))` over token counts.
    pub chunk_size_consistency: f64,
    /// Fraction of transitions carrying at least 70% of the target overlap.
    pub overlap_effectiveness: f64,
    /// Always 1.0; chunks never split sentences.
    pub sentence_integrity: f64,
}

/// Statistics over a chunk list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkStatistics {
    /// Number of chunks.
    pub chunk_count: usize,
    /// Sum of estimated token counts.
    pub total_estimated_tokens: usize,
    /// Sum of word counts.
    pub total_words: usize,
    /// Sum of sentence counts.
    pub total_sentences: usize,
    /// Mean estimated tokens per chunk.
    pub avg_tokens_per_chunk: f64,
    /// Mean words per chunk.
    pub avg_words_per_chunk: f64,
    /// Mean sentences per chunk.
    pub avg_sentences_per_chunk: f64,
    /// Smallest chunk token estimate.
    pub min_tokens: usize,
    /// Largest chunk token estimate.
    pub max_tokens: usize,
    /// `max_tokens - min_tokens`.
    pub token_range: usize,
    /// Overlap aggregates.
    pub overlap_stats: OverlapStats,
    /// Derived quality scores.
    pub quality_metrics: QualityMetrics,
}

/// Outcome of validating a chunk list against its configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkValidation {
    /// Whether every chunk met the size requirements.
    pub valid: bool,
    /// Human-readable findings; empty when everything is in bounds.
    pub warnings: Vec<String>,
}

/// Compute aggregate statistics for `chunks`.
///
/// An empty list yields all-zero statistics rather than an error.
#[must_use]
pub fn chunk_statistics(chunks: &[Chunk], config: &ChunkingConfig) -> ChunkStatistics {
    if chunks.is_empty() {
        return ChunkStatistics::default();
    }

    let token_counts: Vec<usize> = chunks.iter().map(|c| c.estimated_token_count).collect();
    let total_tokens: usize = token_counts.iter().sum();
    let total_words: usize = chunks.iter().map(|c| c.word_count).sum();
    let total_sentences: usize = chunks.iter().map(|c| c.sentence_count).sum();
    let count = chunks.len();

    let mut total_overlap_tokens = 0;
    let mut overlap_instances = 0;
    for chunk in &chunks[1..] {
        let overlap = chunk.overlap_info.previous_chunk_overlap;
        if overlap > 0 {
            total_overlap_tokens += overlap;
            overlap_instances += 1;
        }
    }
    let avg_overlap_tokens = if overlap_instances > 0 {
        total_overlap_tokens as f64 / overlap_instances as f64
    } else {
        0.0
    };

    ChunkStatistics {
        chunk_count: count,
        total_estimated_tokens: total_tokens,
        total_words,
        total_sentences,
        avg_tokens_per_chunk: total_tokens as f64 / count as f64,
        avg_words_per_chunk: total_words as f64 / count as f64,
        avg_sentences_per_chunk: total_sentences as f64 / count as f64,
        min_tokens: token_counts.iter().copied().min().unwrap_or(0),
        max_tokens: token_counts.iter().copied().max().unwrap_or(0),
        token_range: token_counts.iter().copied().max().unwrap_or(0)
            - token_counts.iter().copied().min().unwrap_or(0),
        overlap_stats: OverlapStats {
            total_overlap_tokens,
            avg_overlap_tokens,
            overlap_instances,
            overlap_coverage: (overlap_instances as f64 / (count - 1).max(1) as f64) * 100.0,
        },
        quality_metrics: QualityMetrics {
            chunk_size_consistency: consistency_score(&token_counts),
            overlap_effectiveness: overlap_score(chunks, config),
            sentence_integrity: 1.0,
        },
    }
}

/// Validate `chunks` against size requirements from `config`.
///
/// An empty list is invalid with an explanatory warning, not an error.
#[must_use]
pub fn validate_chunks(chunks: &[Chunk], config: &ChunkingConfig) -> ChunkValidation {
    if chunks.is_empty() {
        return ChunkValidation {
            valid: false,
            warnings: vec!["no chunks found".to_string()],
        };
    }

    let mut warnings = Vec::new();
    let mut valid = true;
    let upper = (config.max_tokens as f64 * MAX_TOKENS_BUFFER) as usize;

    for (i, chunk) in chunks.iter().enumerate() {
        if chunk.estimated_token_count < config.min_chunk_tokens {
            warnings.push(format!(
                "chunk {i} too small: {} tokens",
                chunk.estimated_token_count
            ));
            valid = false;
        }
        if chunk.estimated_token_count > upper {
            warnings.push(format!(
                "chunk {i} too large: {} tokens",
                chunk.estimated_token_count
            ));
            valid = false;
        }
    }

    let transitions = chunks.len().saturating_sub(1);
    let covered = chunks[1..]
        .iter()
        .filter(|c| c.overlap_info.previous_chunk_overlap > 0)
        .count();
    if transitions > 0 && covered < transitions {
        warnings.push(format!(
            "insufficient overlap: {covered}/{transitions} chunk transitions"
        ));
    }

    ChunkValidation { valid, warnings }
}

/// Consistency of token counts: 1.0 for uniform sizes, falling toward 0 as
/// the standard deviation approaches half the mean.
fn consistency_score(token_counts: &[usize]) -> f64 {
    if token_counts.len() <= 1 {
        return 1.0;
    }
    let n = token_counts.len() as f64;
    let mean = token_counts.iter().sum::<usize>() as f64 / n;
    if mean == 0.0 {
        return 1.0;
    }
    let variance = token_counts
        .iter()
        .map(|&t| (t as f64 - mean).powi(2))
        .sum::<f64>()
        / n;
    let std_dev = variance.sqrt();
    (1.0 - std_dev / (mean * 0.5)).max(0.0)
}

/// Fraction of transitions whose previous overlap reaches 70% of the target.
fn overlap_score(chunks: &[Chunk], config: &ChunkingConfig) -> f64 {
    if chunks.len() <= 1 {
        return 1.0;
    }
    let threshold = config.overlap_tokens as f64 * EFFECTIVE_OVERLAP_RATIO;
    let effective = chunks[1..]
        .iter()
        .filter(|c| c.overlap_info.previous_chunk_overlap as f64 >= threshold)
        .count();
    effective as f64 / (chunks.len() - 1) as f64
}
