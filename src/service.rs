//! The document summarization service.
//!
//! Orchestrates one document's journey from stored text to saved summary:
//!
//! ```text
//! claim (CAS uploaded -> processing)
//!   -> pipeline (clean/segment/chunk)
//!   -> summarize each chunk          (per-chunk failures tolerated)
//!   -> merge chunk summaries
//!   -> validate merged summary
//!   -> save summary, status -> completed
//! ```
//!
//! The claim is an atomic compare-and-swap on the document status, so a
//! document is processed at most once at a time: a concurrent caller loses
//! the swap and gets [`Error::AlreadyProcessing`] or
//! [`Error::AlreadyCompleted`] instead of a duplicate run.
//!
//! Per-chunk summarization failures do not abort the run. Each chunk keeps
//! its slot in the result as [`ChunkSummary::Failed`], index-aligned with
//! the chunk list; only when every chunk fails does the run fail as a
//! whole. Any fatal failure moves the document to
//! [`DocumentStatus::Failed`] — it is never left in `Processing`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::merger::{MergeStrategy, SummaryMerger};
use crate::pipeline::Pipeline;
use crate::report::{validate_merged_summary, ValidationReport};
use crate::store::{DocumentStatus, DocumentStore};
use crate::Summarize;

/// Service knobs beyond the chunking configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Strategy for combining chunk summaries.
    pub merge_strategy: MergeStrategy,
    /// Character budget for the merged summary.
    pub merged_max_length: usize,
    /// `max_length` passed to the summarization model per chunk.
    pub chunk_summary_max_length: usize,
    /// `min_length` passed to the summarization model per chunk.
    pub chunk_summary_min_length: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            merge_strategy: MergeStrategy::Intelligent,
            merged_max_length: 2000,
            chunk_summary_max_length: 150,
            chunk_summary_min_length: 30,
        }
    }
}

/// Outcome of summarizing one chunk; slots stay index-aligned with the
/// chunk list even on failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChunkSummary {
    /// The model's summary for this chunk.
    Completed(String),
    /// Why this chunk's summarization failed.
    Failed(String),
}

impl ChunkSummary {
    /// The summary text, if this chunk completed.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Completed(text) => Some(text),
            Self::Failed(_) => None,
        }
    }
}

/// Result of a successful document run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentOutcome {
    /// The processed document.
    pub document_id: String,
    /// The merged summary that was saved.
    pub summary: String,
    /// Per-chunk outcomes, index-aligned with the chunk list.
    pub chunk_summaries: Vec<ChunkSummary>,
    /// Number of chunks whose summarization failed.
    pub failed_chunks: usize,
    /// Quality assessment of the merged summary.
    pub validation: ValidationReport,
}

/// Drives documents through the summarization workflow.
///
/// The summarization model is an injected capability, not ambient state;
/// tests substitute a stub.
pub struct SummarizationService<S, M> {
    store: S,
    model: M,
    pipeline: Pipeline,
    merger: SummaryMerger,
    config: ServiceConfig,
}

impl<S: DocumentStore, M: Summarize> SummarizationService<S, M> {
    /// Service with default pipeline and service configuration.
    pub fn new(store: S, model: M) -> Self {
        Self::with_config(store, model, Pipeline::new(), ServiceConfig::default())
    }

    /// Service with explicit configuration.
    pub fn with_config(store: S, model: M, pipeline: Pipeline, config: ServiceConfig) -> Self {
        Self {
            store,
            model,
            pipeline,
            merger: SummaryMerger::new(),
            config,
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Summarize the document `id` end to end.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] for an unknown id or a document in
    ///   [`DocumentStatus::Failed`] (reset it to `Uploaded` to retry).
    /// - [`Error::AlreadyProcessing`] / [`Error::AlreadyCompleted`] when a
    ///   concurrent or earlier run holds or finished the document.
    /// - [`Error::Processing`] when a fatal pipeline step fails or every
    ///   chunk summarization fails; the document moves to `Failed`.
    pub fn process_document(&self, id: &str) -> Result<DocumentOutcome> {
        let document = self.store.get_document(id)?;

        let claimed = self.store.conditional_set_status(
            id,
            DocumentStatus::Uploaded,
            DocumentStatus::Processing,
        )?;
        if !claimed {
            return Err(match self.store.get_document(id)?.status {
                DocumentStatus::Processing => Error::AlreadyProcessing,
                DocumentStatus::Completed => Error::AlreadyCompleted,
                status => Error::Validation(format!(
                    "document {id} is {status:?}; reset it to uploaded to retry"
                )),
            });
        }

        tracing::info!(document_id = id, "claimed document for summarization");
        match self.run(id, &document.text) {
            Ok(outcome) => {
                self.store.set_status(id, DocumentStatus::Completed)?;
                Ok(outcome)
            }
            Err(e) => {
                tracing::error!(document_id = id, error = %e, "summarization run failed");
                if let Err(status_err) = self.store.set_status(id, DocumentStatus::Failed) {
                    tracing::error!(document_id = id, error = %status_err,
                        "failed to mark document as failed");
                }
                Err(e)
            }
        }
    }

    fn run(&self, id: &str, text: &str) -> Result<DocumentOutcome> {
        let report = self.pipeline.process(text);
        if !report.success {
            return Err(Error::Processing {
                step: "pipeline",
                message: report.errors.join("; "),
            });
        }
        self.store.save_chunking_config(id, self.pipeline.config())?;

        let mut chunk_summaries = Vec::with_capacity(report.chunks.len());
        for chunk in &report.chunks {
            let outcome = self.model.summarize(
                &chunk.text,
                self.config.chunk_summary_max_length,
                self.config.chunk_summary_min_length,
            );
            match outcome {
                Ok(summary) => chunk_summaries.push(ChunkSummary::Completed(summary)),
                Err(e) => {
                    tracing::warn!(document_id = id, chunk = chunk.sequence_index,
                        error = %e, "chunk summarization failed");
                    chunk_summaries.push(ChunkSummary::Failed(e.to_string()));
                }
            }
        }

        let completed: Vec<String> = chunk_summaries
            .iter()
            .filter_map(|s| s.text().map(str::to_string))
            .collect();
        let failed_chunks = chunk_summaries.len() - completed.len();
        if completed.is_empty() {
            return Err(Error::Processing {
                step: "summarization",
                message: format!("all {} chunk summarizations failed", chunk_summaries.len()),
            });
        }

        let summary = self.merger.merge_summaries(
            &completed,
            self.config.merge_strategy,
            self.config.merged_max_length,
        );
        let validation = validate_merged_summary(&completed, &summary);

        let mut metadata = HashMap::new();
        metadata.insert("chunk_count".to_string(), chunk_summaries.len().to_string());
        metadata.insert("failed_chunks".to_string(), failed_chunks.to_string());
        metadata.insert(
            "validation_passed".to_string(),
            validation.validation_passed.to_string(),
        );
        metadata.insert(
            "coverage_score".to_string(),
            format!("{:.3}", validation.coverage_score),
        );
        self.store.save_summary(id, &summary, metadata)?;

        Ok(DocumentOutcome {
            document_id: id.to_string(),
            summary,
            chunk_summaries,
            failed_chunks,
            validation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::ChunkingConfig;
    use crate::store::MemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Stub model: echoes the first sentence, optionally failing on chosen
    /// call indices.
    struct StubModel {
        calls: AtomicUsize,
        fail_on: Vec<usize>,
    }

    impl StubModel {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_on: vec![],
            }
        }

        fn failing_on(fail_on: Vec<usize>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_on,
            }
        }
    }

    impl Summarize for StubModel {
        fn summarize(&self, text: &str, _max_length: usize, _min_length: usize) -> Result<String> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_on.contains(&call) {
                return Err(Error::ExternalCall {
                    chunk: call,
                    message: "model unavailable".to_string(),
                });
            }
            let first = text.split_inclusive('.').next().unwrap_or(text);
            Ok(first.trim().to_string())
        }
    }

    fn seeded(store: &MemoryStore) -> String {
        store
            .create_document(
                "The voyage began in spring. Storms scattered the fleet. \
                 Only two ships reached the strait. The crews wintered ashore.",
                HashMap::new(),
            )
            .unwrap()
    }

    #[test]
    fn test_process_document_completes() {
        let store = MemoryStore::new();
        let id = seeded(&store);
        let service = SummarizationService::new(store, StubModel::new());

        let outcome = service.process_document(&id).unwrap();
        assert!(!outcome.summary.is_empty());
        assert_eq!(outcome.failed_chunks, 0);
        assert_eq!(
            service.store().get_document(&id).unwrap().status,
            DocumentStatus::Completed
        );
        assert!(service.store().get_latest_summary(&id).unwrap().is_some());
    }

    #[test]
    fn test_second_run_reports_already_completed() {
        let store = MemoryStore::new();
        let id = seeded(&store);
        let service = SummarizationService::new(store, StubModel::new());

        service.process_document(&id).unwrap();
        assert!(matches!(
            service.process_document(&id),
            Err(Error::AlreadyCompleted)
        ));
    }

    #[test]
    fn test_processing_document_not_reclaimed() {
        let store = MemoryStore::new();
        let id = seeded(&store);
        store.set_status(&id, DocumentStatus::Processing).unwrap();
        let service = SummarizationService::new(store, StubModel::new());

        assert!(matches!(
            service.process_document(&id),
            Err(Error::AlreadyProcessing)
        ));
    }

    #[test]
    fn test_partial_failure_keeps_slot_alignment() {
        let store = MemoryStore::new();
        let id = seeded(&store);
        // A tight budget splits the fixture into several chunks, so one
        // failing chunk leaves survivors to merge.
        let pipeline = Pipeline::with_config(ChunkingConfig {
            max_tokens: 12,
            overlap_tokens: 4,
            min_chunk_tokens: 2,
            ..ChunkingConfig::default()
        });
        let service = SummarizationService::with_config(
            store,
            StubModel::failing_on(vec![0]),
            pipeline,
            ServiceConfig::default(),
        );

        let outcome = service.process_document(&id).unwrap();
        assert!(
            outcome.chunk_summaries.len() >= 2,
            "fixture must chunk into multiple pieces, got {}",
            outcome.chunk_summaries.len()
        );
        assert_eq!(outcome.failed_chunks, 1);
        assert!(matches!(outcome.chunk_summaries[0], ChunkSummary::Failed(_)));
        assert!(outcome
            .chunk_summaries
            .iter()
            .skip(1)
            .all(|s| matches!(s, ChunkSummary::Completed(_))));
        assert!(!outcome.summary.is_empty());
        assert_eq!(
            service.store().get_document(&id).unwrap().status,
            DocumentStatus::Completed
        );
    }

    #[test]
    fn test_all_chunks_failing_is_fatal() {
        let store = MemoryStore::new();
        let id = seeded(&store);
        // Single chunk at default config; first call fails.
        let service = SummarizationService::new(store, StubModel::failing_on(vec![0, 1, 2, 3]));

        let result = service.process_document(&id);
        assert!(matches!(
            result,
            Err(Error::Processing {
                step: "summarization",
                ..
            })
        ));
        assert_eq!(
            service.store().get_document(&id).unwrap().status,
            DocumentStatus::Failed
        );
    }

    #[test]
    fn test_empty_document_fails_and_reverts() {
        let store = MemoryStore::new();
        let id = store.create_document("   ", HashMap::new()).unwrap();
        let service = SummarizationService::new(store, StubModel::new());

        let result = service.process_document(&id);
        assert!(matches!(
            result,
            Err(Error::Processing {
                step: "pipeline",
                ..
            })
        ));
        assert_eq!(
            service.store().get_document(&id).unwrap().status,
            DocumentStatus::Failed
        );
    }

    #[test]
    fn test_failed_document_requires_reset() {
        let store = MemoryStore::new();
        let id = seeded(&store);
        store.set_status(&id, DocumentStatus::Failed).unwrap();
        let service = SummarizationService::new(store, StubModel::new());

        assert!(matches!(
            service.process_document(&id),
            Err(Error::Validation(_))
        ));

        // Resetting to uploaded re-arms the document.
        service
            .store()
            .set_status(&id, DocumentStatus::Uploaded)
            .unwrap();
        assert!(service.process_document(&id).is_ok());
    }

    #[test]
    fn test_chunking_config_saved_with_run() {
        let store = MemoryStore::new();
        let id = seeded(&store);
        let service = SummarizationService::new(store, StubModel::new());
        service.process_document(&id).unwrap();
        assert!(service
            .store()
            .get_document(&id)
            .unwrap()
            .chunking_config
            .is_some());
    }
}
