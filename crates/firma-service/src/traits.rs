//! Collaborator ports consumed by the signing service
//!
//! Transport, storage, directory sync, mail, and PDF mechanics all live
//! behind these traits. The in-memory reference adapters in
//! [`crate::memory`] implement them for tests; production deployments
//! plug in transactional and network-backed adapters.

use async_trait::async_trait;
use firma_types::{
    CausacionGroup, Document, DocumentId, GroupCode, NotificationEvent, WorkflowResult,
};

/// Boxed error for fire-and-forget collaborators whose failures are
/// logged, never propagated
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Transactional persistence for the document aggregate.
///
/// A document is read and written as one unit (status, assignments,
/// retentions) so the ordering invariant holds under a single
/// serializable write.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a new document. Fails on duplicate id.
    async fn insert(&self, document: Document) -> WorkflowResult<()>;

    /// Load a document by id.
    async fn fetch(&self, id: &DocumentId) -> WorkflowResult<Document>;

    /// Compare-and-set write: commits only when the stored version still
    /// equals `expected_version`, returning the stored document with its
    /// bumped version. A mismatch is a Conflict the caller must retry
    /// from the top — never partially reapply.
    async fn update(&self, document: Document, expected_version: u64)
        -> WorkflowResult<Document>;
}

/// Causación group lookups, resolved lazily at act time because
/// membership can change while a document is in flight
#[async_trait]
pub trait GroupDirectory: Send + Sync {
    async fn group(&self, code: &GroupCode) -> WorkflowResult<Option<CausacionGroup>>;
}

/// The external business-number counter.
///
/// Must be idempotent under retry: the same document id always yields
/// the same number.
#[async_trait]
pub trait ConsecutivoIssuer: Send + Sync {
    async fn issue(&self, document_id: &DocumentId) -> WorkflowResult<i64>;
}

/// Fire-and-forget notification delivery
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, event: &NotificationEvent) -> Result<(), BoxError>;
}

/// Post-commit PDF stamping. Invoked after, never as part of, a
/// committed transition; failure is logged and does not revert it.
#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    async fn stamp_signed(&self, document: &Document) -> Result<(), BoxError>;
    async fn stamp_rejected(&self, document: &Document) -> Result<(), BoxError>;
}
