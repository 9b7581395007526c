//! Error types for abridge.

/// Errors that can occur while chunking, merging, or running the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed input or a bad identifier. Always surfaced to the caller.
    #[error("validation error: {0}")]
    Validation(String),

    /// A fatal pipeline step failed.
    #[error("pipeline step '{step}' failed: {message}")]
    Processing {
        /// Name of the step that failed.
        step: &'static str,
        /// Underlying failure message.
        message: String,
    },

    /// The external summarization model failed for one chunk.
    #[error("summarization failed for chunk {chunk}: {message}")]
    ExternalCall {
        /// Sequence index of the affected chunk.
        chunk: usize,
        /// Underlying failure message.
        message: String,
    },

    /// The document is already being processed by another caller.
    #[error("document is already processing")]
    AlreadyProcessing,

    /// The document has already been summarized.
    #[error("document is already completed")]
    AlreadyCompleted,

    /// `merge_with_context` was given lists of different lengths.
    #[error("summaries ({summaries}) and contexts ({contexts}) must have the same length")]
    LengthMismatch {
        /// Number of chunk summaries.
        summaries: usize,
        /// Number of source chunk texts.
        contexts: usize,
    },

    /// TF-IDF fitting found no usable terms (all stopwords or empty input).
    ///
    /// Never escapes the merger: it selects a named fallback instead.
    #[error("empty vocabulary: no usable terms after tokenization")]
    EmptyVocabulary,

    /// The document store reported a failure.
    #[error("store error: {0}")]
    Store(String),
}

/// Result type for abridge operations.
pub type Result<T> = std::result::Result<T, Error>;
