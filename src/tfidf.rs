//! A small TF-IDF vector space for sentence scoring.
//!
//! The merger needs a notion of "how similar are these two sentences" and
//! "how salient is this sentence" without any learned embedding model. A
//! term-frequency/inverse-document-frequency space over the sentences at
//! hand is enough for both:
//!
//! ```text
//! weight(term, doc) = tf(term, doc) * (ln((1 + n) / (1 + df(term))) + 1)
//! ```
//!
//! Rows are L2-normalized, so cosine similarity reduces to a dot product.
//! The vocabulary is capped at 1000 terms (kept by document frequency) and
//! a fixed English stopword list is dropped before counting.
//!
//! Fitting fails with [`Error::EmptyVocabulary`] when no usable terms remain
//! (all stopwords, or no word characters at all). Callers in the merger
//! treat that as the signal to take a named fallback path rather than an
//! error to propagate.

use std::collections::HashMap;

use crate::error::{Error, Result};

/// Vocabulary cap, by document frequency.
const MAX_FEATURES: usize = 1000;

/// Common English stopwords excluded from the vector space.
const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "few", "for",
    "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers", "herself",
    "him", "himself", "his", "how", "i", "if", "in", "into", "is", "it", "its", "itself", "just",
    "me", "more", "most", "my", "myself", "no", "nor", "not", "now", "of", "off", "on", "once",
    "only", "or", "other", "our", "ours", "ourselves", "out", "over", "own", "same", "she",
    "should", "so", "some", "such", "than", "that", "the", "their", "theirs", "them",
    "themselves", "then", "there", "these", "they", "this", "those", "through", "to", "too",
    "under", "until", "up", "very", "was", "we", "were", "what", "when", "where", "which",
    "while", "who", "whom", "why", "will", "with", "you", "your", "yours", "yourself",
    "yourselves",
];

/// Lowercased word tokens of `text`, stopwords removed.
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|t| !t.is_empty() && !STOP_WORDS.contains(t))
        .map(str::to_string)
        .collect()
}

/// Fit a TF-IDF space over `docs` and return one L2-normalized row per doc.
///
/// # Errors
///
/// [`Error::EmptyVocabulary`] when no document contributes a usable term.
pub(crate) fn fit_transform(docs: &[&str]) -> Result<Vec<Vec<f64>>> {
    let tokenized: Vec<Vec<String>> = docs.iter().map(|d| tokenize(d)).collect();

    // Document frequencies.
    let mut df: HashMap<&str, usize> = HashMap::new();
    for tokens in &tokenized {
        let mut seen: Vec<&str> = tokens.iter().map(String::as_str).collect();
        seen.sort_unstable();
        seen.dedup();
        for term in seen {
            *df.entry(term).or_insert(0) += 1;
        }
    }
    if df.is_empty() {
        return Err(Error::EmptyVocabulary);
    }

    // Cap the vocabulary by document frequency, ties broken alphabetically
    // for determinism.
    let mut terms: Vec<(&str, usize)> = df.iter().map(|(&t, &c)| (t, c)).collect();
    terms.sort_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    terms.truncate(MAX_FEATURES);

    let vocab: HashMap<&str, usize> = terms
        .iter()
        .enumerate()
        .map(|(i, &(t, _))| (t, i))
        .collect();

    let n = docs.len() as f64;
    let idf: Vec<f64> = terms
        .iter()
        .map(|&(_, doc_freq)| ((1.0 + n) / (1.0 + doc_freq as f64)).ln() + 1.0)
        .collect();

    let mut rows = Vec::with_capacity(docs.len());
    for tokens in &tokenized {
        let mut row = vec![0.0; vocab.len()];
        for token in tokens {
            if let Some(&idx) = vocab.get(token.as_str()) {
                row[idx] += idf[idx];
            }
        }
        let norm: f64 = row.iter().map(|w| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for w in &mut row {
                *w /= norm;
            }
        }
        rows.push(row);
    }

    Ok(rows)
}

/// Cosine similarity of two vectors; 0.0 when either is all zeros.
pub(crate) fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
