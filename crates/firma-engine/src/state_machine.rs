//! Signing state machine: turn enforcement and sign/reject transitions
//!
//! One state machine invocation per loaded document; the document's
//! ordered signer list is its transition table. A position may be acted
//! on only when every earlier position is Signed — rejecting is also a
//! decision made in turn. Causación slots resolve the acting member
//! against a point-in-time group snapshot at act time.

use crate::catalog::GroupRegistry;
use firma_types::{
    Document, DocumentStatus, DocumentType, NotificationEvent, SignaturePayload, SignerParty,
    UserId, WorkflowError, WorkflowResult,
};

// ── Commands ─────────────────────────────────────────────────────────

/// A sign command against a document
#[derive(Clone, Debug)]
pub struct SignRequest {
    pub actor: UserId,
    /// Opaque application-level signature data, stored untouched
    pub payload: SignaturePayload,
    /// Pass-through per-assignment consecutivo (audit copy); the engine
    /// never computes numbers
    pub consecutivo: Option<i64>,
    /// Last four digits of the actor's ID, for types that require the
    /// secondary verification on group slots
    pub identity_proof: Option<String>,
}

impl SignRequest {
    pub fn new(actor: impl Into<String>, payload: SignaturePayload) -> Self {
        Self {
            actor: UserId::new(actor),
            payload,
            consecutivo: None,
            identity_proof: None,
        }
    }

    pub fn with_consecutivo(mut self, consecutivo: i64) -> Self {
        self.consecutivo = Some(consecutivo);
        self
    }

    pub fn with_identity_proof(mut self, last_four: impl Into<String>) -> Self {
        self.identity_proof = Some(last_four.into());
        self
    }
}

/// A reject command against a document
#[derive(Clone, Debug)]
pub struct RejectRequest {
    pub actor: UserId,
    pub reason: String,
    pub identity_proof: Option<String>,
}

impl RejectRequest {
    pub fn new(actor: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            actor: UserId::new(actor),
            reason: reason.into(),
            identity_proof: None,
        }
    }

    pub fn with_identity_proof(mut self, last_four: impl Into<String>) -> Self {
        self.identity_proof = Some(last_four.into());
        self
    }
}

/// Outcome of a committed transition
#[derive(Clone, Debug)]
pub struct Transition {
    /// The position that acted
    pub position: u32,
    /// Whether this action completed the document
    pub completed: bool,
    /// Notification records for the external dispatcher
    pub events: Vec<NotificationEvent>,
}

// ── How an actor covers a slot ───────────────────────────────────────

enum Coverage {
    Direct,
    ViaGroup,
}

// ── State Machine ────────────────────────────────────────────────────

/// Enforces turn order and applies sign/reject/archive transitions
#[derive(Clone, Debug, Default)]
pub struct SigningStateMachine;

impl SigningStateMachine {
    pub fn new() -> Self {
        Self
    }

    /// Apply a sign action.
    ///
    /// Marks the actor's slot Signed, stamps the audit fields, and — when
    /// this was the last pending slot — transitions the document to
    /// Signed. The document-level consecutivo is applied separately by
    /// the caller via [`Document::assign_consecutivo`], from the external
    /// idempotent counter.
    pub fn sign(
        &self,
        document: &mut Document,
        document_type: Option<&DocumentType>,
        groups: &GroupRegistry,
        request: SignRequest,
    ) -> WorkflowResult<Transition> {
        self.ensure_pending(document)?;
        let position = self.resolve_actor_position(
            document,
            document_type,
            groups,
            &request.actor,
            request.identity_proof.as_deref(),
        )?;

        let document_id = document.id.clone();
        let slot = document
            .assignment_at_mut(position)
            .ok_or(WorkflowError::OutOfTurn {
                document_id,
                position,
            })?;
        slot.mark_signed(&request.actor, request.payload, request.consecutivo);
        document.touch();

        let mut events = vec![NotificationEvent::Signed {
            document_id: document.id.clone(),
            actor: request.actor.clone(),
            position,
        }];

        let completed = document.is_complete();
        if completed {
            document.mark_completed();
            events.push(NotificationEvent::DocumentComplete {
                document_id: document.id.clone(),
            });
            tracing::info!(
                document_id = %document.id,
                position,
                actor = %request.actor,
                "Document fully signed"
            );
        } else if let Some(next) = document.current_eligible_position() {
            events.push(NotificationEvent::TurnAdvanced {
                document_id: document.id.clone(),
                position: next,
            });
            tracing::info!(
                document_id = %document.id,
                position,
                actor = %request.actor,
                next_position = next,
                "Assignment signed"
            );
        }

        Ok(Transition {
            position,
            completed,
            events,
        })
    }

    /// Apply a reject action.
    ///
    /// Rejection by any signer terminates the whole workflow; remaining
    /// Pending slots are left Pending so the audit trail shows who never
    /// got to act.
    pub fn reject(
        &self,
        document: &mut Document,
        document_type: Option<&DocumentType>,
        groups: &GroupRegistry,
        request: RejectRequest,
    ) -> WorkflowResult<Transition> {
        if request.reason.trim().is_empty() {
            return Err(WorkflowError::EmptyReason);
        }
        self.ensure_pending(document)?;
        let position = self.resolve_actor_position(
            document,
            document_type,
            groups,
            &request.actor,
            request.identity_proof.as_deref(),
        )?;

        let document_id = document.id.clone();
        let slot = document
            .assignment_at_mut(position)
            .ok_or(WorkflowError::OutOfTurn {
                document_id,
                position,
            })?;
        slot.mark_rejected(&request.actor, request.reason.clone());
        document.mark_rejected();

        tracing::info!(
            document_id = %document.id,
            position,
            actor = %request.actor,
            "Assignment rejected; workflow terminated"
        );

        Ok(Transition {
            position,
            completed: false,
            events: vec![NotificationEvent::Rejected {
                document_id: document.id.clone(),
                actor: request.actor,
                position,
                reason: request.reason,
            }],
        })
    }

    /// Manual terminal transition, valid from Signed or Rejected
    pub fn archive(&self, document: &mut Document) -> WorkflowResult<()> {
        document.archive()?;
        tracing::info!(document_id = %document.id, "Document archived");
        Ok(())
    }

    /// The position whose turn it is, if any
    pub fn eligible_position(&self, document: &Document) -> Option<u32> {
        document.current_eligible_position()
    }

    // ── Internal helpers ─────────────────────────────────────────────

    fn ensure_pending(&self, document: &Document) -> WorkflowResult<()> {
        if !document.status.accepts_actions() {
            return Err(WorkflowError::InvalidState {
                document_id: document.id.clone(),
                status: document.status,
                required: DocumentStatus::Pending,
            });
        }
        Ok(())
    }

    /// Resolve the actor to the slot they may act on.
    ///
    /// Scans slots in position order for one covering the actor — a
    /// literal individual match, or a causación group the actor belongs
    /// to (any membership counts as a claim; its validity is checked
    /// after). No covering slot → NotASigner. A covered slot that has
    /// already acted → AlreadyActed. A pending covered slot that is not
    /// the current turn → OutOfTurn.
    fn resolve_actor_position(
        &self,
        document: &Document,
        document_type: Option<&DocumentType>,
        groups: &GroupRegistry,
        actor: &UserId,
        identity_proof: Option<&str>,
    ) -> WorkflowResult<u32> {
        let mut acted_claim: Option<u32> = None;
        let mut pending_claim: Option<(u32, Coverage)> = None;

        for assignment in &document.assignments {
            let coverage = match &assignment.party {
                SignerParty::Individual { user_id } if user_id == actor => Some(Coverage::Direct),
                SignerParty::Individual { .. } => None,
                SignerParty::Group { group_code, .. } => {
                    let group = groups.get(group_code)?;
                    group
                        .members
                        .iter()
                        .any(|m| &m.user_id == actor)
                        .then_some(Coverage::ViaGroup)
                }
            };

            match coverage {
                Some(coverage) if assignment.is_pending() => {
                    pending_claim = Some((assignment.position, coverage));
                    break;
                }
                Some(_) if acted_claim.is_none() => acted_claim = Some(assignment.position),
                _ => {}
            }
        }

        let (position, coverage) = match (pending_claim, acted_claim) {
            (Some(claim), _) => claim,
            (None, Some(position)) => {
                return Err(WorkflowError::AlreadyActed {
                    document_id: document.id.clone(),
                    position,
                })
            }
            (None, None) => {
                return Err(WorkflowError::NotASigner {
                    document_id: document.id.clone(),
                    actor: actor.clone(),
                })
            }
        };

        if let Coverage::ViaGroup = coverage {
            self.verify_group_actor(document, document_type, groups, actor, identity_proof, position)?;
        }

        match document.current_eligible_position() {
            Some(eligible) if eligible == position => Ok(position),
            _ => Err(WorkflowError::OutOfTurn {
                document_id: document.id.clone(),
                position,
            }),
        }
    }

    /// Verify a group claim: active group, active membership, and the
    /// last-4-digits check when the document type requires it. Success
    /// lets the slot rebind to the acting member; position never changes.
    fn verify_group_actor(
        &self,
        document: &Document,
        document_type: Option<&DocumentType>,
        groups: &GroupRegistry,
        actor: &UserId,
        identity_proof: Option<&str>,
        position: u32,
    ) -> WorkflowResult<()> {
        let group_code = document
            .assignment_at(position)
            .and_then(|a| a.party.group_code())
            .cloned()
            .ok_or_else(|| WorkflowError::NotASigner {
                document_id: document.id.clone(),
                actor: actor.clone(),
            })?;
        let group = groups.get(&group_code)?;

        if !group.active {
            return Err(WorkflowError::GroupInactive {
                group_code: group.code.clone(),
            });
        }
        let member = group
            .active_member(actor)
            .ok_or_else(|| WorkflowError::NotAGroupMember {
                group_code: group.code.clone(),
                actor: actor.clone(),
            })?;

        if document_type.is_some_and(|ty| ty.requires_identity_check) {
            let verified = identity_proof.is_some_and(|proof| member.documento_matches(proof));
            if !verified {
                return Err(WorkflowError::IdentityCheckFailed {
                    actor: actor.clone(),
                });
            }
        }

        Ok(())
    }
}
