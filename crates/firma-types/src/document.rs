//! Documents: the aggregate root of the signing workflow
//!
//! A document owns its ordered signer assignments and its retention
//! history (composition, no sharing). It is loaded, transitioned, and
//! written as one unit so the ordering invariant can be enforced under a
//! single serializable write.

use crate::{
    AssignmentStatus, DocumentTypeId, Retention, SignerAssignment, UserId, WorkflowError,
    WorkflowResult,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Document Identifier ──────────────────────────────────────────────

/// Unique identifier for a document
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub String);

impl DocumentId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Document Status ──────────────────────────────────────────────────

/// Lifecycle status of a document
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DocumentStatus {
    /// Created, no signers assigned yet
    #[default]
    Draft,
    /// Signers assigned, workflow in progress
    Pending,
    /// Every assignment signed; consecutivo assigned
    Signed,
    /// Terminated by a rejection; only re-assignment may revive it
    Rejected,
    /// Manually archived (terminal)
    Archived,
}

impl DocumentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Archived)
    }

    /// Whether sign/reject actions are accepted in this status
    pub fn accepts_actions(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

// ── Document ─────────────────────────────────────────────────────────

/// A document under the signing workflow
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Opaque reference to the uploaded source file (storage is external)
    pub source_file: String,
    pub status: DocumentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_type_id: Option<DocumentTypeId>,
    /// Business document number, assigned exactly once at completion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consecutivo: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Optimistic-concurrency token, bumped by the persistence layer on
    /// every successful write
    pub version: u64,
    /// Ordered signer slots, sorted by position
    pub assignments: Vec<SignerAssignment>,
    /// Retention history; at most one entry is active
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub retentions: Vec<Retention>,
}

impl Document {
    pub fn new(
        title: impl Into<String>,
        source_file: impl Into<String>,
        created_by: UserId,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: DocumentId::generate(),
            title: title.into(),
            description: None,
            source_file: source_file.into(),
            status: DocumentStatus::Draft,
            document_type_id: None,
            consecutivo: None,
            completed_at: None,
            created_by,
            created_at: now,
            updated_at: now,
            version: 0,
            assignments: Vec::new(),
            retentions: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_document_type(mut self, document_type_id: DocumentTypeId) -> Self {
        self.document_type_id = Some(document_type_id);
        self
    }

    // ── Assignment lifecycle ─────────────────────────────────────────

    /// Install a (new) signer list and move the document to Pending.
    ///
    /// Permitted only while no signer has acted; replacing an in-progress
    /// list would destroy the audit trail. Resets a Rejected document back
    /// to Pending (the explicit re-entry path).
    pub fn replace_assignments(
        &mut self,
        assignments: Vec<SignerAssignment>,
    ) -> WorkflowResult<()> {
        if assignments.is_empty() {
            return Err(WorkflowError::EmptyAssignment);
        }
        if self.has_acted_assignment() {
            return Err(WorkflowError::WorkflowInProgress {
                document_id: self.id.clone(),
            });
        }
        self.assignments = assignments;
        self.assignments.sort_by_key(|a| a.position);
        self.status = DocumentStatus::Pending;
        self.touch();
        Ok(())
    }

    /// Whether any slot has reached a terminal decision
    pub fn has_acted_assignment(&self) -> bool {
        self.assignments.iter().any(|a| a.has_acted())
    }

    // ── Turn computation ─────────────────────────────────────────────

    /// The position whose turn it is: the first slot, in position order,
    /// with every earlier slot Signed. None when the document is complete
    /// or a rejection blocked the pipeline.
    pub fn current_eligible_position(&self) -> Option<u32> {
        for assignment in &self.assignments {
            match assignment.status {
                AssignmentStatus::Signed => continue,
                AssignmentStatus::Pending => return Some(assignment.position),
                AssignmentStatus::Rejected => return None,
            }
        }
        None
    }

    /// All assignments signed (and at least one exists)
    pub fn is_complete(&self) -> bool {
        !self.assignments.is_empty() && self.assignments.iter().all(|a| a.is_signed())
    }

    pub fn assignment_at(&self, position: u32) -> Option<&SignerAssignment> {
        self.assignments.iter().find(|a| a.position == position)
    }

    pub fn assignment_at_mut(&mut self, position: u32) -> Option<&mut SignerAssignment> {
        self.assignments.iter_mut().find(|a| a.position == position)
    }

    // ── Completion ───────────────────────────────────────────────────

    /// Transition to Signed once every slot has signed
    pub fn mark_completed(&mut self) {
        self.status = DocumentStatus::Signed;
        self.completed_at = Some(Utc::now());
        self.touch();
    }

    /// Transition to Rejected; untouched slots stay Pending for audit
    pub fn mark_rejected(&mut self) {
        self.status = DocumentStatus::Rejected;
        self.touch();
    }

    /// Assign the business document number. Exactly-once: a second call
    /// is a reportable anomaly, never a silent overwrite.
    ///
    /// The completing assignment's audit copy is backfilled when the
    /// signer supplied none.
    pub fn assign_consecutivo(&mut self, consecutivo: i64) -> WorkflowResult<()> {
        if let Some(existing) = self.consecutivo {
            return Err(WorkflowError::ConsecutivoAlreadyAssigned {
                document_id: self.id.clone(),
                consecutivo: existing,
            });
        }
        self.consecutivo = Some(consecutivo);
        if let Some(last) = self
            .assignments
            .iter_mut()
            .filter(|a| a.is_signed() && a.consecutivo.is_none())
            .last()
        {
            last.consecutivo = Some(consecutivo);
        }
        self.touch();
        Ok(())
    }

    /// Manual terminal transition, valid from Signed or Rejected
    pub fn archive(&mut self) -> WorkflowResult<()> {
        match self.status {
            DocumentStatus::Signed | DocumentStatus::Rejected => {
                self.status = DocumentStatus::Archived;
                self.touch();
                Ok(())
            }
            status => Err(WorkflowError::InvalidState {
                document_id: self.id.clone(),
                status,
                required: DocumentStatus::Signed,
            }),
        }
    }

    // ── Retention ────────────────────────────────────────────────────

    /// The unreleased retention, if one exists
    pub fn active_retention(&self) -> Option<&Retention> {
        self.retentions.iter().find(|r| r.is_active())
    }

    pub fn active_retention_mut(&mut self) -> Option<&mut Retention> {
        self.retentions.iter_mut().find(|r| r.is_active())
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Bump `updated_at` after a direct slot mutation
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RoleName, SignerParty};

    fn make_document() -> Document {
        Document::new("Factura 0012", "s3://docs/0012.pdf", UserId::new("emisor"))
    }

    fn three_slots() -> Vec<SignerAssignment> {
        (1..=3)
            .map(|i| {
                SignerAssignment::new(
                    i,
                    SignerParty::individual(format!("user-{i}")),
                    vec![RoleName::new("firmante")],
                )
            })
            .collect()
    }

    #[test]
    fn test_new_document_is_draft() {
        let doc = make_document();
        assert_eq!(doc.status, DocumentStatus::Draft);
        assert!(doc.assignments.is_empty());
        assert!(!doc.is_complete());
        assert_eq!(doc.current_eligible_position(), None);
    }

    #[test]
    fn test_replace_assignments_moves_to_pending() {
        let mut doc = make_document();
        doc.replace_assignments(three_slots()).unwrap();

        assert_eq!(doc.status, DocumentStatus::Pending);
        assert_eq!(doc.current_eligible_position(), Some(1));
    }

    #[test]
    fn test_replace_assignments_rejects_empty_list() {
        let mut doc = make_document();
        let err = doc.replace_assignments(Vec::new()).unwrap_err();
        assert!(matches!(err, WorkflowError::EmptyAssignment));
    }

    #[test]
    fn test_replace_assignments_blocked_once_acted() {
        let mut doc = make_document();
        doc.replace_assignments(three_slots()).unwrap();
        doc.assignment_at_mut(1).unwrap().mark_signed(
            &UserId::new("user-1"),
            crate::SignaturePayload::new(serde_json::json!({})),
            None,
        );

        let err = doc.replace_assignments(three_slots()).unwrap_err();
        assert!(matches!(err, WorkflowError::WorkflowInProgress { .. }));
    }

    #[test]
    fn test_eligible_position_advances_in_order() {
        let mut doc = make_document();
        doc.replace_assignments(three_slots()).unwrap();

        for expected in 1..=3u32 {
            assert_eq!(doc.current_eligible_position(), Some(expected));
            doc.assignment_at_mut(expected).unwrap().mark_signed(
                &UserId::new(format!("user-{expected}")),
                crate::SignaturePayload::new(serde_json::json!({})),
                None,
            );
        }
        assert_eq!(doc.current_eligible_position(), None);
        assert!(doc.is_complete());
    }

    #[test]
    fn test_rejection_blocks_pipeline() {
        let mut doc = make_document();
        doc.replace_assignments(three_slots()).unwrap();
        doc.assignment_at_mut(1)
            .unwrap()
            .mark_rejected(&UserId::new("user-1"), "datos faltantes");

        assert_eq!(doc.current_eligible_position(), None);
        assert!(!doc.is_complete());
        // Later slots remain Pending for the audit trail
        assert!(doc.assignment_at(2).unwrap().is_pending());
        assert!(doc.assignment_at(3).unwrap().is_pending());
    }

    #[test]
    fn test_consecutivo_exactly_once() {
        let mut doc = make_document();
        doc.replace_assignments(three_slots()).unwrap();
        doc.assign_consecutivo(1001).unwrap();
        assert_eq!(doc.consecutivo, Some(1001));

        let err = doc.assign_consecutivo(1002).unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::ConsecutivoAlreadyAssigned {
                consecutivo: 1001,
                ..
            }
        ));
        assert_eq!(doc.consecutivo, Some(1001));
    }

    #[test]
    fn test_consecutivo_backfills_completing_slot() {
        let mut doc = make_document();
        doc.replace_assignments(three_slots()).unwrap();
        for i in 1..=3u32 {
            doc.assignment_at_mut(i).unwrap().mark_signed(
                &UserId::new(format!("user-{i}")),
                crate::SignaturePayload::new(serde_json::json!({})),
                None,
            );
        }
        doc.assign_consecutivo(77).unwrap();
        assert_eq!(doc.assignment_at(3).unwrap().consecutivo, Some(77));
        // Earlier slots keep whatever was stamped when they signed
        assert_eq!(doc.assignment_at(1).unwrap().consecutivo, None);
    }

    #[test]
    fn test_archive_requires_terminal_workflow() {
        let mut doc = make_document();
        let err = doc.archive().unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidState { .. }));

        doc.replace_assignments(three_slots()).unwrap();
        doc.mark_rejected();
        doc.archive().unwrap();
        assert_eq!(doc.status, DocumentStatus::Archived);
    }

    #[test]
    fn test_active_retention_lookup() {
        let mut doc = make_document();
        assert!(doc.active_retention().is_none());

        let mut held = Retention::new(doc.id.clone(), 10.0, "ajuste", UserId::new("t"));
        held.release(UserId::new("t"));
        doc.retentions.push(held);
        doc.retentions
            .push(Retention::new(doc.id.clone(), 20.0, "nueva", UserId::new("t")));

        assert_eq!(doc.active_retention().unwrap().percentage, 20.0);
    }
}
