//! The persistence boundary.
//!
//! The service talks to storage through [`DocumentStore`], a small trait
//! with opaque string ids. The one transactional requirement is
//! [`DocumentStore::conditional_set_status`]: an atomic compare-and-swap on
//! the document status, so two concurrent summarization requests for the
//! same document cannot both run. Everything else is plain reads and
//! writes.
//!
//! [`MemoryStore`] is the in-process implementation used by tests and
//! single-node deployments.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::chunk::ChunkingConfig;
use crate::error::{Error, Result};

/// Lifecycle states of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    /// Text stored, not yet summarized.
    Uploaded,
    /// A summarization run holds the document.
    Processing,
    /// A summary exists.
    Completed,
    /// The last summarization run failed.
    Failed,
}

/// A stored document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Opaque id.
    pub id: String,
    /// Raw document text.
    pub text: String,
    /// Caller-supplied metadata, e.g. title or source filename.
    pub metadata: HashMap<String, String>,
    /// Current lifecycle state.
    pub status: DocumentStatus,
    /// Configuration of the last chunking run, if any.
    pub chunking_config: Option<ChunkingConfig>,
}

/// A stored summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRecord {
    /// Document this summary belongs to.
    pub document_id: String,
    /// The merged summary text.
    pub text: String,
    /// Run metadata, e.g. chunk counts and validation scores.
    pub metadata: HashMap<String, String>,
}

/// Storage operations the summarization service needs.
///
/// Implementations must make `conditional_set_status` atomic with respect
/// to concurrent calls for the same document; a read-then-write sequence is
/// not an acceptable implementation.
pub trait DocumentStore: Send + Sync {
    /// Store a new document in [`DocumentStatus::Uploaded`]; returns its id.
    fn create_document(&self, text: &str, metadata: HashMap<String, String>) -> Result<String>;

    /// Fetch a document.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] for an unknown id.
    fn get_document(&self, id: &str) -> Result<Document>;

    /// Atomically set the status to `new` iff it currently equals
    /// `expected`. Returns whether the swap happened.
    fn conditional_set_status(
        &self,
        id: &str,
        expected: DocumentStatus,
        new: DocumentStatus,
    ) -> Result<bool>;

    /// Unconditionally set the status.
    fn set_status(&self, id: &str, status: DocumentStatus) -> Result<()>;

    /// Persist the chunking configuration used for a document's latest run.
    fn save_chunking_config(&self, id: &str, config: &ChunkingConfig) -> Result<()>;

    /// Persist a summary for a document.
    fn save_summary(
        &self,
        document_id: &str,
        text: &str,
        metadata: HashMap<String, String>,
    ) -> Result<()>;

    /// The most recently saved summary for a document, if any.
    fn get_latest_summary(&self, document_id: &str) -> Result<Option<SummaryRecord>>;
}

#[derive(Debug, Default)]
struct MemoryState {
    documents: HashMap<String, Document>,
    summaries: Vec<SummaryRecord>,
}

/// In-memory [`DocumentStore`].
///
/// All operations take one mutex, which trivially makes the conditional
/// status update atomic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    next_id: AtomicU64,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| Error::Store("store mutex poisoned".to_string()))
    }
}

impl DocumentStore for MemoryStore {
    fn create_document(&self, text: &str, metadata: HashMap<String, String>) -> Result<String> {
        let id = format!("doc-{}", self.next_id.fetch_add(1, Ordering::Relaxed));
        let document = Document {
            id: id.clone(),
            text: text.to_string(),
            metadata,
            status: DocumentStatus::Uploaded,
            chunking_config: None,
        };
        self.lock()?.documents.insert(id.clone(), document);
        Ok(id)
    }

    fn get_document(&self, id: &str) -> Result<Document> {
        self.lock()?
            .documents
            .get(id)
            .cloned()
            .ok_or_else(|| Error::Validation(format!("unknown document id: {id}")))
    }

    fn conditional_set_status(
        &self,
        id: &str,
        expected: DocumentStatus,
        new: DocumentStatus,
    ) -> Result<bool> {
        let mut state = self.lock()?;
        let document = state
            .documents
            .get_mut(id)
            .ok_or_else(|| Error::Validation(format!("unknown document id: {id}")))?;
        if document.status == expected {
            document.status = new;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn set_status(&self, id: &str, status: DocumentStatus) -> Result<()> {
        let mut state = self.lock()?;
        let document = state
            .documents
            .get_mut(id)
            .ok_or_else(|| Error::Validation(format!("unknown document id: {id}")))?;
        document.status = status;
        Ok(())
    }

    fn save_chunking_config(&self, id: &str, config: &ChunkingConfig) -> Result<()> {
        let mut state = self.lock()?;
        let document = state
            .documents
            .get_mut(id)
            .ok_or_else(|| Error::Validation(format!("unknown document id: {id}")))?;
        document.chunking_config = Some(config.clone());
        Ok(())
    }

    fn save_summary(
        &self,
        document_id: &str,
        text: &str,
        metadata: HashMap<String, String>,
    ) -> Result<()> {
        let mut state = self.lock()?;
        if !state.documents.contains_key(document_id) {
            return Err(Error::Validation(format!(
                "unknown document id: {document_id}"
            )));
        }
        state.summaries.push(SummaryRecord {
            document_id: document_id.to_string(),
            text: text.to_string(),
            metadata,
        });
        Ok(())
    }

    fn get_latest_summary(&self, document_id: &str) -> Result<Option<SummaryRecord>> {
        Ok(self
            .lock()?
            .summaries
            .iter()
            .rev()
            .find(|s| s.document_id == document_id)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_get() {
        let store = MemoryStore::new();
        let id = store
            .create_document("Some text.", HashMap::new())
            .unwrap();
        let doc = store.get_document(&id).unwrap();
        assert_eq!(doc.text, "Some text.");
        assert_eq!(doc.status, DocumentStatus::Uploaded);
        assert!(doc.chunking_config.is_none());
    }

    #[test]
    fn test_unknown_id_is_validation_error() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.get_document("missing"),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_conditional_set_status_swaps_once() {
        let store = MemoryStore::new();
        let id = store.create_document("Text.", HashMap::new()).unwrap();

        let won = store
            .conditional_set_status(&id, DocumentStatus::Uploaded, DocumentStatus::Processing)
            .unwrap();
        assert!(won);

        // Second caller sees Processing, not Uploaded.
        let won_again = store
            .conditional_set_status(&id, DocumentStatus::Uploaded, DocumentStatus::Processing)
            .unwrap();
        assert!(!won_again);
        assert_eq!(
            store.get_document(&id).unwrap().status,
            DocumentStatus::Processing
        );
    }

    #[test]
    fn test_latest_summary_wins() {
        let store = MemoryStore::new();
        let id = store.create_document("Text.", HashMap::new()).unwrap();
        store.save_summary(&id, "first", HashMap::new()).unwrap();
        store.save_summary(&id, "second", HashMap::new()).unwrap();
        let latest = store.get_latest_summary(&id).unwrap().unwrap();
        assert_eq!(latest.text, "second");
    }

    #[test]
    fn test_no_summary_yet() {
        let store = MemoryStore::new();
        let id = store.create_document("Text.", HashMap::new()).unwrap();
        assert!(store.get_latest_summary(&id).unwrap().is_none());
    }

    #[test]
    fn test_chunking_config_persisted() {
        let store = MemoryStore::new();
        let id = store.create_document("Text.", HashMap::new()).unwrap();
        let config = ChunkingConfig::for_model("bart-large-cnn");
        store.save_chunking_config(&id, &config).unwrap();
        assert_eq!(store.get_document(&id).unwrap().chunking_config, Some(config));
    }
}
