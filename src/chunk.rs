//! The chunk data model.
//!
//! A [`Chunk`] is a bounded, sentence-aligned, contiguous span of a document
//! sized to fit a downstream summarization model's input budget. Chunks are
//! immutable once the chunker emits them; every field is derived from the
//! sentence sequence and the [`ChunkingConfig`] in force at the time.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::tokens::model_token_limit;

/// Tokens shared with the neighbors of a chunk.
///
/// `next_chunk_overlap` is estimated during the forward chunking pass;
/// `previous_chunk_overlap` is backfilled by a second pass that diffs
/// adjacent sentence lists. Overlap sentences are always a suffix of the
/// earlier chunk and a prefix of the later one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlapInfo {
    /// Estimated tokens shared with the previous chunk.
    pub previous_chunk_overlap: usize,
    /// Estimated tokens shared with the next chunk.
    pub next_chunk_overlap: usize,
}

/// A sentence-aligned span of the document.
///
/// ## Character Offsets
///
/// `start_index..end_index` is a best-effort span into the cleaned document
/// text, found by substring search. A first sentence that cannot be located
/// defaults to 0; a last sentence that cannot be located defaults to the
/// text length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Zero-based position in the chunk sequence; strictly increasing and
    /// gapless within a document.
    pub sequence_index: usize,
    /// Space-joined text of the constituent sentences.
    pub text: String,
    /// The constituent sentences, in document order.
    pub sentences: Vec<String>,
    /// Estimated token count of `text`.
    pub estimated_token_count: usize,
    /// Whitespace word count of `text`.
    pub word_count: usize,
    /// Number of constituent sentences.
    pub sentence_count: usize,
    /// Best-effort character offset where the chunk starts.
    pub start_index: usize,
    /// Best-effort character offset where the chunk ends (exclusive).
    pub end_index: usize,
    /// Whether this is the first chunk of the document.
    pub is_first_chunk: bool,
    /// Whether this is the last chunk of the document.
    pub is_last_chunk: bool,
    /// Tokens shared with neighboring chunks.
    pub overlap_info: OverlapInfo,
}

impl std::fmt::Display for Chunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Chunk {{ seq: {}, sentences: {}, est_tokens: {}, span: {}..{} }}",
            self.sequence_index,
            self.sentence_count,
            self.estimated_token_count,
            self.start_index,
            self.end_index
        )
    }
}

/// Chunking parameters, persisted alongside a document.
///
/// Statistics and validation calls later reconstruct an equivalent chunker
/// from this record without re-deriving parameters. The record is part of
/// the document's immutable processing history for that chunking run; it is
/// overwritten only when the document is rechunked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Downstream model identifier, used for token-limit lookups.
    pub model_name: String,
    /// Maximum estimated tokens per chunk.
    pub max_tokens: usize,
    /// Target estimated tokens of overlap between adjacent chunks.
    pub overlap_tokens: usize,
    /// Minimum estimated tokens for a non-terminal chunk.
    pub min_chunk_tokens: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            model_name: "t5-small".to_string(),
            max_tokens: 512,
            overlap_tokens: 100,
            min_chunk_tokens: 50,
        }
    }
}

impl ChunkingConfig {
    /// Build a config sized to a known model's input limit.
    ///
    /// `max_tokens` becomes the model's limit from the static lookup table;
    /// overlap and minimum keep their defaults.
    #[must_use]
    pub fn for_model(model_name: &str) -> Self {
        Self {
            model_name: model_name.to_string(),
            max_tokens: model_token_limit(model_name),
            ..Self::default()
        }
    }

    /// Check internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when `max_tokens` is zero, the overlap
    /// is not smaller than `max_tokens`, or the minimum exceeds the maximum.
    pub fn validate(&self) -> Result<()> {
        if self.max_tokens == 0 {
            return Err(Error::Validation("max_tokens must be > 0".into()));
        }
        if self.overlap_tokens >= self.max_tokens {
            return Err(Error::Validation(format!(
                "overlap_tokens ({}) must be < max_tokens ({})",
                self.overlap_tokens, self.max_tokens
            )));
        }
        if self.min_chunk_tokens > self.max_tokens {
            return Err(Error::Validation(format!(
                "min_chunk_tokens ({}) must be <= max_tokens ({})",
                self.min_chunk_tokens, self.max_tokens
            )));
        }
        Ok(())
    }
}
