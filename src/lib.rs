//! # abridge
//!
//! Book-length text summarization: chunking, merging, and orchestration.
//!
//! ## The Problem
//!
//! Summarization models have input limits. Books don't fit. A 300-page
//! novel is ~120k tokens; a T5 checkpoint takes 512. You need to split the
//! document into model-sized pieces, summarize each independently, and then
//! stitch N partial summaries back into one coherent whole.
//!
//! Both halves are harder than they sound:
//!
//! - A chunk boundary mid-sentence garbles the model input
//! - Without overlap, context at each boundary is lost
//! - With overlap, adjacent summaries repeat each other
//! - Independently-written summaries lurch between topics when joined
//!
//! ## The Pipeline
//!
//! ```text
//! raw text ──> clean ──> detect language ──> segment ──> statistics
//!                                                            │
//!                 ┌──────────────────────────────────────────┘
//!                 v
//!             chunk (token budget + natural breaks + overlap)
//!                 │
//!                 v                per chunk
//!             summarize ──────────────────────┐
//!                 │                           │  external model,
//!                 v                           │  failures tolerated
//!             merge (dedup + reorder + transitions)
//!                 │
//!                 v
//!             validate (coverage / redundancy / coherence)
//! ```
//!
//! Chunking is sentence-aligned and token-budgeted: sentences are packed
//! greedily up to the model's limit, boundaries are pulled back to natural
//! breaks (chapter headings, blank-line runs) when one falls inside the
//! window, and adjacent chunks share a configurable token overlap.
//!
//! Merging removes the redundancy the overlap creates, reorders sentences
//! by TF-IDF importance, and synthesizes transition phrases — see
//! [`SummaryMerger`] for the strategy menu.
//!
//! ## Quick Start
//!
//! ```rust
//! use abridge::{ChunkingConfig, IntelligentChunker, MergeStrategy, SummaryMerger};
//!
//! let config = ChunkingConfig::for_model("t5-small");
//! let chunker = IntelligentChunker::new(config)?;
//! let chunks = chunker.chunk_text(
//!     "The expedition set out at dawn. The mountains lay two weeks east. \
//!      Supplies were thin but morale held.",
//! );
//! assert_eq!(chunks.len(), 1);
//!
//! // Downstream: summarize each chunk, then merge.
//! let summaries: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
//! let merger = SummaryMerger::new();
//! let merged = merger.merge_summaries(&summaries, MergeStrategy::Intelligent, 2000);
//! assert!(!merged.is_empty());
//! # Ok::<(), abridge::Error>(())
//! ```
//!
//! ## End to End
//!
//! [`Pipeline`] runs cleaning through chunking and reports per-step timings
//! and errors. [`SummarizationService`] adds persistence and the external
//! model call: it claims a document with an atomic status compare-and-swap,
//! summarizes every chunk (tolerating per-chunk failures), merges,
//! validates, and saves. The model is injected via the [`Summarize`] trait
//! so tests can substitute a stub.

mod breaks;
mod chunk;
mod chunker;
mod clean;
mod error;
mod lang;
mod merger;
mod pipeline;
mod report;
mod segment;
mod service;
mod statistics;
mod stats;
mod store;
mod tfidf;
mod tokens;

pub use breaks::find_breaks;
pub use chunk::{Chunk, ChunkingConfig, OverlapInfo};
pub use chunker::IntelligentChunker;
pub use clean::clean_text;
pub use error::{Error, Result};
pub use lang::{detect_language, LanguageInfo};
pub use merger::{MergeStrategy, SummaryMerger};
pub use pipeline::{Pipeline, PipelineReport, StepTiming};
pub use report::{validate_merged_summary, ValidationReport};
pub use segment::{segment, segment_fallback};
pub use service::{
    ChunkSummary, DocumentOutcome, ServiceConfig, SummarizationService,
};
pub use statistics::{text_statistics, TextStatistics};
pub use stats::{
    chunk_statistics, validate_chunks, ChunkStatistics, ChunkValidation, OverlapStats,
    QualityMetrics,
};
pub use store::{Document, DocumentStatus, DocumentStore, MemoryStore, SummaryRecord};
pub use tokens::{estimate_tokens, model_token_limit, word_count};

/// An abstractive summarization model.
///
/// Implementations wrap whatever backend produces a summary for a single
/// chunk — a local model, an HTTP service, or a test stub:
///
/// ```rust
/// use abridge::Summarize;
///
/// struct FirstSentence;
///
/// impl Summarize for FirstSentence {
///     fn summarize(&self, text: &str, _max: usize, _min: usize) -> abridge::Result<String> {
///         Ok(text.split_inclusive('.').next().unwrap_or(text).to_string())
///     }
/// }
/// ```
pub trait Summarize: Send + Sync {
    /// Summarize `text` into roughly `min_length..=max_length` tokens.
    ///
    /// # Errors
    ///
    /// Implementations report backend failures; the service maps them to
    /// per-chunk [`ChunkSummary::Failed`] slots.
    fn summarize(&self, text: &str, max_length: usize, min_length: usize) -> Result<String>;
}
