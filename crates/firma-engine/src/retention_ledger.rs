//! Retention ledger: partial holds layered onto completed documents
//!
//! A thin invariant-holder. Its only independent logic is preventing a
//! second concurrent hold and keeping the percentage inside (0, 100].
//! Retentions are post-completion annotations: they never participate in
//! the signer sequence, and a release is logical — the row survives for
//! audit, so a later hold can be applied again.

use firma_types::{
    valid_retention_percentage, Document, DocumentStatus, DocumentType, NotificationEvent,
    Retention, UserId, WorkflowError, WorkflowResult,
};

/// Outcome of a retain action
#[derive(Clone, Debug)]
pub struct RetentionOutcome {
    pub retention: Retention,
    pub events: Vec<NotificationEvent>,
}

/// Applies and releases retention holds under the documented invariants
#[derive(Clone, Debug, Default)]
pub struct RetentionLedger;

impl RetentionLedger {
    pub fn new() -> Self {
        Self
    }

    /// Apply a partial hold to a fully-signed document.
    ///
    /// Requires: document Signed, a retainable document type (when the
    /// document is typed), percentage in (0, 100], a non-empty reason,
    /// and no active retention.
    pub fn retain(
        &self,
        document: &mut Document,
        document_type: Option<&DocumentType>,
        actor: &UserId,
        percentage: f64,
        reason: &str,
    ) -> WorkflowResult<RetentionOutcome> {
        if document.status != DocumentStatus::Signed {
            return Err(WorkflowError::InvalidState {
                document_id: document.id.clone(),
                status: document.status,
                required: DocumentStatus::Signed,
            });
        }
        if let Some(ty) = document_type {
            if !ty.retainable {
                return Err(WorkflowError::RetentionNotAllowed {
                    document_type: ty.id.clone(),
                });
            }
        }
        if !valid_retention_percentage(percentage) {
            return Err(WorkflowError::InvalidPercentage { percentage });
        }
        if reason.trim().is_empty() {
            return Err(WorkflowError::EmptyReason);
        }
        if document.active_retention().is_some() {
            return Err(WorkflowError::AlreadyRetained {
                document_id: document.id.clone(),
            });
        }

        let retention = Retention::new(document.id.clone(), percentage, reason, actor.clone());
        document.retentions.push(retention.clone());
        document.touch();

        tracing::info!(
            document_id = %document.id,
            actor = %actor,
            percentage,
            "Retention applied"
        );

        Ok(RetentionOutcome {
            retention,
            events: vec![NotificationEvent::RetentionApplied {
                document_id: document.id.clone(),
                actor: actor.clone(),
                percentage,
            }],
        })
    }

    /// Release the active hold. Logical only: the row keeps its history.
    pub fn release(
        &self,
        document: &mut Document,
        actor: &UserId,
    ) -> WorkflowResult<Vec<NotificationEvent>> {
        let document_id = document.id.clone();
        let retention =
            document
                .active_retention_mut()
                .ok_or(WorkflowError::NoActiveRetention {
                    document_id: document_id.clone(),
                })?;
        retention.release(actor.clone());
        document.touch();

        tracing::info!(document_id = %document_id, actor = %actor, "Retention released");

        Ok(vec![NotificationEvent::RetentionReleased {
            document_id,
            actor: actor.clone(),
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use firma_types::{RoleName, SignerAssignment, SignerParty};

    fn signed_document() -> Document {
        let mut doc = Document::new("Factura 31", "s3://f31.pdf", UserId::new("emisor"));
        doc.replace_assignments(vec![SignerAssignment::new(
            1,
            SignerParty::individual("firmante"),
            vec![RoleName::new("aprobador")],
        )])
        .unwrap();
        doc.assignment_at_mut(1).unwrap().mark_signed(
            &UserId::new("firmante"),
            firma_types::SignaturePayload::new(serde_json::json!({})),
            None,
        );
        doc.mark_completed();
        doc
    }

    // ── Scenario D: retain / release lifecycle ───────────────────────

    #[test]
    fn test_retain_release_lifecycle() {
        let ledger = RetentionLedger::new();
        let mut doc = signed_document();
        let tesorero = UserId::new("tesorero");

        let outcome = ledger
            .retain(&mut doc, None, &tesorero, 30.0, "disputa parcial")
            .unwrap();
        assert!(outcome.retention.is_active());
        assert!(matches!(
            outcome.events[0],
            NotificationEvent::RetentionApplied { percentage, .. } if percentage == 30.0
        ));

        // Second hold while one is active
        let err = ledger
            .retain(&mut doc, None, &tesorero, 10.0, "otra disputa")
            .unwrap_err();
        assert!(matches!(err, WorkflowError::AlreadyRetained { .. }));

        ledger.release(&mut doc, &tesorero).unwrap();
        assert!(doc.active_retention().is_none());

        // Releasing again fails
        let err = ledger.release(&mut doc, &tesorero).unwrap_err();
        assert!(matches!(err, WorkflowError::NoActiveRetention { .. }));

        // History is preserved and a new hold is possible
        assert_eq!(doc.retentions.len(), 1);
        ledger
            .retain(&mut doc, None, &tesorero, 15.0, "nueva disputa")
            .unwrap();
        assert_eq!(doc.retentions.len(), 2);
    }

    #[test]
    fn test_retain_requires_signed_document() {
        let ledger = RetentionLedger::new();
        let mut doc = Document::new("Borrador", "s3://b.pdf", UserId::new("emisor"));

        let err = ledger
            .retain(&mut doc, None, &UserId::new("t"), 20.0, "x")
            .unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidState { .. }));
    }

    #[test]
    fn test_percentage_and_reason_validation() {
        let ledger = RetentionLedger::new();
        let mut doc = signed_document();
        let actor = UserId::new("t");

        for bad in [0.0, -1.0, 100.5] {
            let err = ledger.retain(&mut doc, None, &actor, bad, "razón").unwrap_err();
            assert!(matches!(err, WorkflowError::InvalidPercentage { .. }));
        }

        let err = ledger.retain(&mut doc, None, &actor, 50.0, "  ").unwrap_err();
        assert!(matches!(err, WorkflowError::EmptyReason));
    }

    #[test]
    fn test_non_retainable_type_is_refused() {
        let ledger = RetentionLedger::new();
        let mut doc = signed_document();
        let ty = DocumentType::new("acta", "Acta");

        let err = ledger
            .retain(&mut doc, Some(&ty), &UserId::new("t"), 10.0, "razón")
            .unwrap_err();
        assert!(matches!(err, WorkflowError::RetentionNotAllowed { .. }));

        let factura = DocumentType::new("factura", "Factura").retainable();
        ledger
            .retain(&mut doc, Some(&factura), &UserId::new("t"), 10.0, "razón")
            .unwrap();
    }
}
