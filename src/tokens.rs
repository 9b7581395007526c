//! Token estimation.
//!
//! Chunk sizing decisions need a token count, but running a real subword
//! tokenizer over an entire book just to size chunks is wasteful and drags
//! in a model dependency. English prose averages ~1.3 subword tokens per
//! whitespace word for the model families we target, so we estimate:
//!
//! ```text
//! estimated_tokens = round(word_count * 1.3)
//! ```
//!
//! Every size guarantee in the chunker is therefore approximate. Downstream
//! models tolerate this because the chunker leaves headroom below the hard
//! model limits in [`model_token_limit`].

/// Tokens-per-word ratio for the estimate.
const TOKENS_PER_WORD: f64 = 1.3;

/// Count whitespace-separated words.
#[must_use]
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Estimate the subword token count of `text`.
///
/// ```rust
/// // 4 words -> round(4 * 1.3) = 5
/// assert_eq!(abridge::estimate_tokens("the cat sat down"), 5);
/// assert_eq!(abridge::estimate_tokens(""), 0);
/// ```
#[must_use]
pub fn estimate_tokens(text: &str) -> usize {
    (word_count(text) as f64 * TOKENS_PER_WORD).round() as usize
}

/// Maximum input tokens for a known summarization model.
///
/// Static mapping with an explicit default; unknown names get the
/// conservative 512 limit.
#[must_use]
pub fn model_token_limit(model_name: &str) -> usize {
    match model_name {
        "t5-small" | "t5-base" | "t5-large" => 512,
        "bart-large-cnn" | "distilbart-cnn-12-6" => 1024,
        "pegasus-xsum" | "pegasus-cnn_dailymail" => 512,
        "long-t5-tglobal-base" | "long-t5-tglobal-large" => 4096,
        _ => 512,
    }
}
