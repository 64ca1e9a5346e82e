//! In-memory reference adapters for the collaborator ports.
//!
//! Deterministic and test-friendly. Production deployments should use a
//! transactional backend for source-of-truth data; the compare-and-set
//! contract of [`DocumentStore::update`] is honored here exactly as a
//! SQL adapter would honor it.

use crate::traits::{
    BoxError, ConsecutivoIssuer, DocumentRenderer, DocumentStore, GroupDirectory, Notifier,
};
use async_trait::async_trait;
use firma_types::{
    CausacionGroup, Document, DocumentId, GroupCode, NotificationEvent, WorkflowError,
    WorkflowResult,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Mutex, RwLock};

fn poisoned(what: &str) -> WorkflowError {
    WorkflowError::Storage {
        message: format!("{what} lock poisoned"),
    }
}

// ── Document Store ───────────────────────────────────────────────────

/// In-memory document store with compare-and-set semantics
#[derive(Default)]
pub struct InMemoryDocumentStore {
    documents: RwLock<HashMap<DocumentId, Document>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.documents.read().map(|g| g.len()).unwrap_or(0)
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn insert(&self, document: Document) -> WorkflowResult<()> {
        let mut guard = self.documents.write().map_err(|_| poisoned("documents"))?;
        if guard.contains_key(&document.id) {
            return Err(WorkflowError::Conflict {
                document_id: document.id.clone(),
            });
        }
        guard.insert(document.id.clone(), document);
        Ok(())
    }

    async fn fetch(&self, id: &DocumentId) -> WorkflowResult<Document> {
        let guard = self.documents.read().map_err(|_| poisoned("documents"))?;
        guard
            .get(id)
            .cloned()
            .ok_or_else(|| WorkflowError::DocumentNotFound(id.clone()))
    }

    async fn update(
        &self,
        mut document: Document,
        expected_version: u64,
    ) -> WorkflowResult<Document> {
        let mut guard = self.documents.write().map_err(|_| poisoned("documents"))?;
        let stored = guard
            .get(&document.id)
            .ok_or_else(|| WorkflowError::DocumentNotFound(document.id.clone()))?;

        if stored.version != expected_version {
            return Err(WorkflowError::Conflict {
                document_id: document.id.clone(),
            });
        }
        document.version = expected_version + 1;
        guard.insert(document.id.clone(), document.clone());
        Ok(document)
    }
}

// ── Group Directory ──────────────────────────────────────────────────

/// In-memory causación group directory
#[derive(Default)]
pub struct InMemoryGroupDirectory {
    groups: RwLock<HashMap<GroupCode, CausacionGroup>>,
}

impl InMemoryGroupDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&self, group: CausacionGroup) {
        if let Ok(mut guard) = self.groups.write() {
            guard.insert(group.code.clone(), group);
        }
    }
}

#[async_trait]
impl GroupDirectory for InMemoryGroupDirectory {
    async fn group(&self, code: &GroupCode) -> WorkflowResult<Option<CausacionGroup>> {
        let guard = self.groups.read().map_err(|_| poisoned("groups"))?;
        Ok(guard.get(code).cloned())
    }
}

// ── Consecutivo Issuer ───────────────────────────────────────────────

/// Monotonic counter, idempotent per document: the same document id
/// always receives the number issued to it first
#[derive(Default)]
pub struct SequenceIssuer {
    next: AtomicI64,
    issued: Mutex<HashMap<DocumentId, i64>>,
}

impl SequenceIssuer {
    pub fn new() -> Self {
        Self {
            next: AtomicI64::new(1),
            issued: Mutex::new(HashMap::new()),
        }
    }

    pub fn starting_at(first: i64) -> Self {
        Self {
            next: AtomicI64::new(first),
            issued: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl ConsecutivoIssuer for SequenceIssuer {
    async fn issue(&self, document_id: &DocumentId) -> WorkflowResult<i64> {
        let mut guard = self.issued.lock().map_err(|_| poisoned("issued"))?;
        if let Some(existing) = guard.get(document_id) {
            return Ok(*existing);
        }
        let number = self.next.fetch_add(1, Ordering::SeqCst);
        guard.insert(document_id.clone(), number);
        Ok(number)
    }
}

// ── Notifier ─────────────────────────────────────────────────────────

/// Records delivered events for assertions
#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<NotificationEvent>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<NotificationEvent> {
        self.events.lock().map(|g| g.clone()).unwrap_or_default()
    }

    pub fn event_types(&self) -> Vec<&'static str> {
        self.events().iter().map(|e| e.event_type()).collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn deliver(&self, event: &NotificationEvent) -> Result<(), BoxError> {
        self.events
            .lock()
            .map_err(|_| "events lock poisoned")?
            .push(event.clone());
        Ok(())
    }
}

// ── Renderer ─────────────────────────────────────────────────────────

/// Renderer that does nothing — stamping is an external PDF utility
#[derive(Default)]
pub struct NoopRenderer;

impl NoopRenderer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DocumentRenderer for NoopRenderer {
    async fn stamp_signed(&self, _document: &Document) -> Result<(), BoxError> {
        Ok(())
    }

    async fn stamp_rejected(&self, _document: &Document) -> Result<(), BoxError> {
        Ok(())
    }
}
