//! The signing service: async facade over the workflow core
//!
//! Every action follows the same shape: acquire the document's advisory
//! lock, load current state, run the pure engine transition, commit a
//! single compare-and-set write, then fire the post-commit side effects
//! (notification delivery, PDF stamping) whose failures are logged and
//! never surfaced.

use crate::traits::{
    ConsecutivoIssuer, DocumentRenderer, DocumentStore, GroupDirectory, Notifier,
};
use firma_engine::{
    AssignmentBuilder, GroupRegistry, RejectRequest, RequestedSigner, RetentionLedger,
    SignRequest, SigningStateMachine, TypeCatalog,
};
use firma_types::{
    Document, DocumentId, DocumentType, DocumentTypeId, NotificationEvent, Retention,
    SignerAssignment, UserId, WorkflowError, WorkflowResult,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

// ── Per-document advisory locks ──────────────────────────────────────

/// Lock table serializing concurrent actions against one document.
/// Different documents proceed fully in parallel.
#[derive(Default)]
struct DocumentLocks {
    locks: Mutex<HashMap<DocumentId, Arc<tokio::sync::Mutex<()>>>>,
}

impl DocumentLocks {
    fn acquire(&self, id: &DocumentId) -> WorkflowResult<Arc<tokio::sync::Mutex<()>>> {
        let mut guard = self.locks.lock().map_err(|_| WorkflowError::Storage {
            message: "lock table poisoned".into(),
        })?;
        Ok(Arc::clone(guard.entry(id.clone()).or_default()))
    }
}

// ── New-document request ─────────────────────────────────────────────

/// Parameters for creating a document
#[derive(Clone, Debug)]
pub struct NewDocument {
    pub title: String,
    pub description: Option<String>,
    pub source_file: String,
    pub document_type_id: Option<DocumentTypeId>,
    pub created_by: UserId,
}

impl NewDocument {
    pub fn new(
        title: impl Into<String>,
        source_file: impl Into<String>,
        created_by: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: None,
            source_file: source_file.into(),
            document_type_id: None,
            created_by: UserId::new(created_by),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_document_type(mut self, id: DocumentTypeId) -> Self {
        self.document_type_id = Some(id);
        self
    }
}

// ── Signing Service ──────────────────────────────────────────────────

/// Async facade composing the workflow core with its collaborators
pub struct SigningService {
    store: Arc<dyn DocumentStore>,
    groups: Arc<dyn GroupDirectory>,
    issuer: Arc<dyn ConsecutivoIssuer>,
    notifier: Arc<dyn Notifier>,
    renderer: Arc<dyn DocumentRenderer>,
    catalog: RwLock<TypeCatalog>,
    locks: DocumentLocks,
    builder: AssignmentBuilder,
    state_machine: SigningStateMachine,
    ledger: RetentionLedger,
}

impl SigningService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        groups: Arc<dyn GroupDirectory>,
        issuer: Arc<dyn ConsecutivoIssuer>,
        notifier: Arc<dyn Notifier>,
        renderer: Arc<dyn DocumentRenderer>,
    ) -> Self {
        Self {
            store,
            groups,
            issuer,
            notifier,
            renderer,
            catalog: RwLock::new(TypeCatalog::new()),
            locks: DocumentLocks::default(),
            builder: AssignmentBuilder::new(),
            state_machine: SigningStateMachine::new(),
            ledger: RetentionLedger::new(),
        }
    }

    // ── Catalog management ───────────────────────────────────────────

    pub fn register_document_type(
        &self,
        document_type: DocumentType,
    ) -> WorkflowResult<DocumentTypeId> {
        self.catalog
            .write()
            .map_err(|_| WorkflowError::Storage {
                message: "catalog lock poisoned".into(),
            })?
            .register(document_type)
    }

    // ── Document lifecycle ───────────────────────────────────────────

    /// Create a document in Draft; signers are assigned separately
    pub async fn create_document(&self, request: NewDocument) -> WorkflowResult<Document> {
        if let Some(type_id) = &request.document_type_id {
            // Fail fast on unknown types rather than at first action
            self.lookup_type(type_id)?;
        }

        let mut document = Document::new(request.title, request.source_file, request.created_by);
        document.description = request.description;
        document.document_type_id = request.document_type_id;

        self.store.insert(document.clone()).await?;
        tracing::info!(document_id = %document.id, "Document created");
        Ok(document)
    }

    /// Install (or replace) the ordered signer list and move the
    /// document to Pending. Permitted only while no signer has acted.
    pub async fn assign_signers(
        &self,
        document_id: &DocumentId,
        requested: Vec<RequestedSigner>,
    ) -> WorkflowResult<Document> {
        let lock = self.locks.acquire(document_id)?;
        let _guard = lock.lock().await;

        let mut document = self.store.fetch(document_id).await?;
        self.builder.ensure_reassignable(&document)?;

        let document_type = self.type_of(&document)?;
        let assignments = self.builder.build(document_type.as_ref(), &requested)?;
        let expected_version = document.version;
        document.replace_assignments(assignments)?;

        let saved = self.store.update(document, expected_version).await?;
        tracing::info!(
            document_id = %saved.id,
            signers = saved.assignments.len(),
            "Signers assigned"
        );

        if let Some(position) = saved.current_eligible_position() {
            self.dispatch(&[NotificationEvent::TurnAdvanced {
                document_id: saved.id.clone(),
                position,
            }])
            .await;
        }
        Ok(saved)
    }

    // ── Workflow actions ─────────────────────────────────────────────

    /// Sign the actor's slot. On completion the business number is
    /// fetched from the external counter (idempotent) and applied
    /// exactly once, inside the same committed write.
    pub async fn sign(
        &self,
        document_id: &DocumentId,
        request: SignRequest,
    ) -> WorkflowResult<SignerAssignment> {
        let lock = self.locks.acquire(document_id)?;
        let _guard = lock.lock().await;

        let mut document = self.store.fetch(document_id).await?;
        let document_type = self.type_of(&document)?;
        let groups = self.group_snapshot(&document).await?;
        let expected_version = document.version;

        let transition =
            self.state_machine
                .sign(&mut document, document_type.as_ref(), &groups, request)?;

        if transition.completed && document.consecutivo.is_none() {
            let consecutivo = self.issuer.issue(document_id).await?;
            document.assign_consecutivo(consecutivo)?;
        }

        let saved = self.store.update(document, expected_version).await?;

        self.dispatch(&transition.events).await;
        if transition.completed {
            if let Err(error) = self.renderer.stamp_signed(&saved).await {
                tracing::warn!(document_id = %saved.id, error = %error, "PDF stamping failed");
            }
        }

        self.assignment_at(&saved, transition.position)
    }

    /// Reject the actor's slot, terminating the workflow
    pub async fn reject(
        &self,
        document_id: &DocumentId,
        request: RejectRequest,
    ) -> WorkflowResult<SignerAssignment> {
        let lock = self.locks.acquire(document_id)?;
        let _guard = lock.lock().await;

        let mut document = self.store.fetch(document_id).await?;
        let document_type = self.type_of(&document)?;
        let groups = self.group_snapshot(&document).await?;
        let expected_version = document.version;

        let transition =
            self.state_machine
                .reject(&mut document, document_type.as_ref(), &groups, request)?;

        let saved = self.store.update(document, expected_version).await?;

        self.dispatch(&transition.events).await;
        if let Err(error) = self.renderer.stamp_rejected(&saved).await {
            tracing::warn!(document_id = %saved.id, error = %error, "PDF stamping failed");
        }

        self.assignment_at(&saved, transition.position)
    }

    /// Apply a partial retention hold to a completed document
    pub async fn retain(
        &self,
        document_id: &DocumentId,
        actor: &UserId,
        percentage: f64,
        reason: &str,
    ) -> WorkflowResult<Retention> {
        let lock = self.locks.acquire(document_id)?;
        let _guard = lock.lock().await;

        let mut document = self.store.fetch(document_id).await?;
        let document_type = self.type_of(&document)?;
        let expected_version = document.version;

        let outcome = self.ledger.retain(
            &mut document,
            document_type.as_ref(),
            actor,
            percentage,
            reason,
        )?;
        self.store.update(document, expected_version).await?;

        self.dispatch(&outcome.events).await;
        Ok(outcome.retention)
    }

    /// Release the active retention hold
    pub async fn release(&self, document_id: &DocumentId, actor: &UserId) -> WorkflowResult<()> {
        let lock = self.locks.acquire(document_id)?;
        let _guard = lock.lock().await;

        let mut document = self.store.fetch(document_id).await?;
        let expected_version = document.version;

        let events = self.ledger.release(&mut document, actor)?;
        self.store.update(document, expected_version).await?;

        self.dispatch(&events).await;
        Ok(())
    }

    /// Manually archive a Signed or Rejected document
    pub async fn archive(&self, document_id: &DocumentId) -> WorkflowResult<Document> {
        let lock = self.locks.acquire(document_id)?;
        let _guard = lock.lock().await;

        let mut document = self.store.fetch(document_id).await?;
        let expected_version = document.version;
        self.state_machine.archive(&mut document)?;
        self.store.update(document, expected_version).await
    }

    // ── Query helpers ────────────────────────────────────────────────

    /// The position whose turn it is, if any
    pub async fn current_eligible_position(
        &self,
        document_id: &DocumentId,
    ) -> WorkflowResult<Option<u32>> {
        let document = self.store.fetch(document_id).await?;
        Ok(self.state_machine.eligible_position(&document))
    }

    /// Whether every assignment has signed
    pub async fn is_complete(&self, document_id: &DocumentId) -> WorkflowResult<bool> {
        let document = self.store.fetch(document_id).await?;
        Ok(document.is_complete())
    }

    pub async fn get_document(&self, document_id: &DocumentId) -> WorkflowResult<Document> {
        self.store.fetch(document_id).await
    }

    // ── Internal helpers ─────────────────────────────────────────────

    fn lookup_type(&self, id: &DocumentTypeId) -> WorkflowResult<DocumentType> {
        self.catalog
            .read()
            .map_err(|_| WorkflowError::Storage {
                message: "catalog lock poisoned".into(),
            })?
            .get(id)
            .cloned()
    }

    fn type_of(&self, document: &Document) -> WorkflowResult<Option<DocumentType>> {
        document
            .document_type_id
            .as_ref()
            .map(|id| self.lookup_type(id))
            .transpose()
    }

    /// Point-in-time snapshot of every group referenced by the
    /// document's slots. A code the directory no longer knows surfaces
    /// loudly rather than silently skipping the slot.
    async fn group_snapshot(&self, document: &Document) -> WorkflowResult<GroupRegistry> {
        let mut registry = GroupRegistry::new();
        for assignment in &document.assignments {
            if let Some(code) = assignment.party.group_code() {
                if registry.contains(code) {
                    continue;
                }
                let group = self
                    .groups
                    .group(code)
                    .await?
                    .ok_or_else(|| WorkflowError::GroupNotFound(code.clone()))?;
                registry.insert(group);
            }
        }
        Ok(registry)
    }

    async fn dispatch(&self, events: &[NotificationEvent]) {
        for event in events {
            if let Err(error) = self.notifier.deliver(event).await {
                tracing::warn!(
                    event = event.event_type(),
                    document_id = %event.document_id(),
                    error = %error,
                    "Notification delivery failed"
                );
            }
        }
    }

    fn assignment_at(
        &self,
        document: &Document,
        position: u32,
    ) -> WorkflowResult<SignerAssignment> {
        document
            .assignment_at(position)
            .cloned()
            .ok_or_else(|| WorkflowError::Storage {
                message: format!(
                    "position {position} missing from document {} after write",
                    document.id
                ),
            })
    }
}
