//! Intelligent token-budgeted chunking.
//!
//! The core problem: a book is hundreds of times larger than a summarization
//! model's input window. The chunker converts the document's sentence
//! sequence into an ordered list of overlapping chunks that
//!
//! - never split a sentence,
//! - stay within an estimated token budget,
//! - prefer natural breaks (chapter headings, dividers) over raw size cuts,
//! - and share a sentence overlap across each boundary so no context is
//!   stranded.
//!
//! ## The Algorithm
//!
//! A cursor walks the sentence sequence:
//!
//! ```text
//! 1. Greedily take sentences while the running token estimate fits the
//!    budget (always at least one, to guarantee progress).
//! 2. If a natural break falls inside the open window, trim the chunk to
//!    end at the sentence containing it. Trim only — never extend; a break
//!    landing exactly on the greedy boundary is a no-op.
//! 3. If the chunk came out under the minimum and input remains, redo the
//!    greedy pass with a 1.5x budget to avoid a pathologically small chunk.
//! 4. Emit the chunk. If the input is exhausted, stop.
//! 5. Walk backwards from the chunk end, accumulating sentences within the
//!    overlap budget; the next cursor starts there (always advancing by at
//!    least one sentence).
//! ```
//!
//! ## Two-Pass Overlap
//!
//! The forward pass knows each chunk's *next* overlap (it just computed the
//! window), but not its *previous* overlap. A second pass over the finished,
//! index-addressable chunk list backfills it by finding the longest suffix
//! of the prior chunk's sentences that prefixes the current chunk's.
//!
//! ```text
//! Chunk 0 sentences: [s0 s1 s2 s3 s4]
//! Chunk 1 sentences:          [s3 s4 s5 s6]
//!                              ^^^^^
//!                    shared boundary sentences -> previous overlap of 1
//! ```

use std::ops::Bound::Excluded;

use crate::breaks::find_breaks;
use crate::chunk::{Chunk, ChunkingConfig, OverlapInfo};
use crate::error::Result;
use crate::segment::segment;
use crate::tokens::{estimate_tokens, word_count};

/// Budget multiplier for the undersized-chunk retry.
const RETRY_BUDGET_FACTOR: f64 = 1.5;

/// Sentence-aligned chunker bounded by an estimated token budget.
///
/// ## Example
///
/// ```rust
/// use abridge::{ChunkingConfig, IntelligentChunker};
///
/// let config = ChunkingConfig {
///     max_tokens: 30,
///     overlap_tokens: 8,
///     min_chunk_tokens: 4,
///     ..ChunkingConfig::default()
/// };
/// let chunker = IntelligentChunker::new(config).unwrap();
/// let chunks = chunker.chunk_text(
///     "The storm broke at dawn. Waves battered the hull for hours. \
///      The crew held the line. By noon the sea had calmed again. \
///      Nobody spoke of it afterwards.",
/// );
///
/// assert!(!chunks.is_empty());
/// assert!(chunks[0].is_first_chunk);
/// assert!(chunks.last().unwrap().is_last_chunk);
/// ```
#[derive(Debug, Clone)]
pub struct IntelligentChunker {
    config: ChunkingConfig,
}

/// Per-sentence data precomputed before the cursor walk.
struct SentenceInfo {
    tokens: usize,
    start: usize,
    end: usize,
}

impl IntelligentChunker {
    /// Create a chunker from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Validation`] when the configuration is
    /// internally inconsistent (see [`ChunkingConfig::validate`]).
    pub fn new(config: ChunkingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The configuration this chunker was built from.
    #[must_use]
    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    /// Split `text` into sentence-aligned, overlapping chunks.
    ///
    /// Empty or whitespace-only input yields an empty list. A single
    /// sentence larger than the whole budget still becomes its own chunk;
    /// sentences are never split.
    #[must_use]
    pub fn chunk_text(&self, text: &str) -> Vec<Chunk> {
        let sentences = segment(text);
        if sentences.is_empty() {
            return vec![];
        }

        let breaks = find_breaks(text);
        let infos = Self::sentence_infos(text, &sentences);
        let n = sentences.len();

        let mut chunks: Vec<Chunk> = Vec::new();
        let mut cursor = 0;

        while cursor < n {
            let mut end_idx = Self::greedy_fill(&infos, cursor, self.config.max_tokens);

            // Prefer a natural break inside the open window over the raw
            // token-budget boundary. A break at the greedy end itself (or at
            // the window start) changes nothing.
            // Best-effort spans can invert under duplicate sentences; the
            // break preference only applies to a well-formed window.
            let window_start = infos[cursor].start;
            let window_end = infos[end_idx - 1].end;
            if window_start < window_end {
                if let Some(&brk) = breaks
                    .range((Excluded(window_start), Excluded(window_end)))
                    .next_back()
                {
                    let containing = (cursor..end_idx)
                        .rev()
                        .find(|&j| infos[j].start < brk)
                        .unwrap_or(cursor);
                    end_idx = containing + 1;
                }
            }

            // Undersized and more input left: retry with a stretched budget
            // rather than emitting a sliver.
            let window_tokens: usize = infos[cursor..end_idx].iter().map(|s| s.tokens).sum();
            if window_tokens < self.config.min_chunk_tokens && end_idx < n {
                let stretched = (self.config.max_tokens as f64 * RETRY_BUDGET_FACTOR) as usize;
                end_idx = Self::greedy_fill(&infos, cursor, stretched);
            }

            let is_last = end_idx == n;
            let next_cursor = if is_last {
                n
            } else {
                self.overlap_cursor(&infos, cursor, end_idx)
            };
            let next_overlap: usize = infos[next_cursor..end_idx].iter().map(|s| s.tokens).sum();

            chunks.push(Self::build_chunk(
                chunks.len(),
                &sentences[cursor..end_idx],
                &infos[cursor..end_idx],
                cursor == 0,
                is_last,
                next_overlap,
            ));

            cursor = next_cursor;
        }

        Self::backfill_previous_overlap(&mut chunks);
        chunks
    }

    /// Greedily accumulate sentences from `start` while the running token
    /// estimate stays within `budget`. Always takes at least one sentence.
    fn greedy_fill(infos: &[SentenceInfo], start: usize, budget: usize) -> usize {
        let mut total = 0;
        let mut idx = start;
        while idx < infos.len() {
            let tokens = infos[idx].tokens;
            if total + tokens > budget && idx > start {
                break;
            }
            total += tokens;
            idx += 1;
        }
        idx
    }

    /// Walk backwards from `end_idx`, keeping sentences within the overlap
    /// budget. The returned cursor never retreats to the chunk start: the
    /// next chunk always begins at least one sentence further on.
    fn overlap_cursor(&self, infos: &[SentenceInfo], chunk_start: usize, end_idx: usize) -> usize {
        let mut overlap_tokens = 0;
        let mut kept = 0;
        for j in (chunk_start..end_idx).rev() {
            if overlap_tokens + infos[j].tokens <= self.config.overlap_tokens {
                overlap_tokens += infos[j].tokens;
                kept += 1;
            } else {
                break;
            }
        }
        (end_idx - kept).max(chunk_start + 1)
    }

    fn build_chunk(
        sequence_index: usize,
        sentences: &[String],
        infos: &[SentenceInfo],
        is_first: bool,
        is_last: bool,
        next_overlap: usize,
    ) -> Chunk {
        let text = sentences.join(" ");
        Chunk {
            sequence_index,
            estimated_token_count: estimate_tokens(&text),
            word_count: word_count(&text),
            sentence_count: sentences.len(),
            start_index: infos.first().map_or(0, |s| s.start),
            end_index: infos.last().map_or(0, |s| s.end),
            is_first_chunk: is_first,
            is_last_chunk: is_last,
            overlap_info: OverlapInfo {
                previous_chunk_overlap: 0,
                next_chunk_overlap: next_overlap,
            },
            sentences: sentences.to_vec(),
            text,
        }
    }

    /// Best-effort character spans plus token estimates per sentence.
    ///
    /// A sentence the substring search cannot locate defaults its start to 0
    /// and its end to the text length.
    fn sentence_infos(text: &str, sentences: &[String]) -> Vec<SentenceInfo> {
        sentences
            .iter()
            .map(|s| {
                let (start, end) = text
                    .find(s.as_str())
                    .map_or((0, text.len()), |pos| (pos, pos + s.len()));
                SentenceInfo {
                    tokens: estimate_tokens(s),
                    start,
                    end,
                }
            })
            .collect()
    }

    /// Second pass: recompute each chunk's previous-chunk overlap as the
    /// longest suffix of the prior chunk's sentences that prefixes this
    /// chunk's (exact text equality).
    fn backfill_previous_overlap(chunks: &mut [Chunk]) {
        for k in 1..chunks.len() {
            let prev = &chunks[k - 1].sentences;
            let cur = &chunks[k].sentences;

            let max_shared = prev.len().min(cur.len());
            let mut shared = 0;
            for len in (1..=max_shared).rev() {
                if prev[prev.len() - len..] == cur[..len] {
                    shared = len;
                    break;
                }
            }

            let overlap_tokens: usize = cur[..shared].iter().map(|s| estimate_tokens(s)).sum();
            chunks[k].overlap_info.previous_chunk_overlap = overlap_tokens;
        }
    }
}
