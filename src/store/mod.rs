//! Session document storage.
//!
//! The game core only needs a keyed document store with versioned writes and
//! change subscriptions. [`MemoryStore`] is the in-process implementation the
//! server runs on; other backends plug in through [`DocumentStore`].

mod memory;
pub mod snapshot;

pub use memory::MemoryStore;
pub use snapshot::{StoreSnapshot, SNAPSHOT_SCHEMA_VERSION};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::broadcast;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Document {collection}/{id} not found")]
    NotFound { collection: String, id: String },

    #[error("Version conflict: expected {expected}, found {actual}")]
    VersionConflict { expected: u64, actual: u64 },

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization failed: {0}")]
    Serde(#[from] serde_json::Error),
}

/// A stored document and the version of its latest write
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub version: u64,
    pub data: Value,
}

/// Guard for a document write. A missing document has version 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    /// Write unconditionally
    None,
    /// Write only if the stored version still matches
    Version(u64),
    /// Write only if no document exists yet
    Absent,
}

impl Precondition {
    /// Check against the stored version (0 when missing)
    pub fn check(self, actual: u64) -> StoreResult<()> {
        let expected = match self {
            Precondition::None => return Ok(()),
            Precondition::Version(expected) => expected,
            Precondition::Absent => 0,
        };
        if expected == actual {
            Ok(())
        } else {
            Err(StoreError::VersionConflict { expected, actual })
        }
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fresh id the store would assign to a new document
    fn new_document_id(&self) -> String;

    /// Create or overwrite a document. Returns the id it was stored under.
    /// [`Precondition::Absent`] turns this into create-if-missing.
    async fn create_document(
        &self,
        collection: &str,
        id: Option<&str>,
        data: Value,
        precondition: Precondition,
    ) -> StoreResult<String>;

    async fn get_document(&self, collection: &str, id: &str) -> StoreResult<Option<Document>>;

    /// Merge top-level `fields` into an existing document. Returns the new version.
    async fn update_document(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
        precondition: Precondition,
    ) -> StoreResult<u64>;

    /// Receive the full document after every subsequent write, in version order
    async fn subscribe(&self, collection: &str, id: &str) -> StoreResult<Subscription>;
}

/// Change feed for one document
#[derive(Debug)]
pub struct Subscription {
    rx: Option<broadcast::Receiver<Document>>,
}

impl Subscription {
    pub fn new(rx: broadcast::Receiver<Document>) -> Self {
        Self { rx: Some(rx) }
    }

    /// Next pushed document, or `None` once unsubscribed or the store is gone.
    /// A subscriber that fell behind skips ahead to the newest pushes.
    pub async fn recv(&mut self) -> Option<Document> {
        loop {
            let rx = self.rx.as_mut()?;
            match rx.recv().await {
                Ok(doc) => return Some(doc),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!("Subscriber lagged, skipped {} updates", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    self.rx = None;
                    return None;
                }
            }
        }
    }

    pub fn unsubscribe(&mut self) {
        self.rx = None;
    }

    pub fn is_active(&self) -> bool {
        self.rx.is_some()
    }
}
