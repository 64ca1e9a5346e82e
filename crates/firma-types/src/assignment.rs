//! Signer assignments: the ordered slots of a document's signing pipeline

use crate::{GroupCode, RoleName};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── User Identifier ──────────────────────────────────────────────────

/// Identifier of a platform user (resolved by the external identity layer)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Signer Party ─────────────────────────────────────────────────────

/// Who a slot belongs to: a specific user, or a causación group whose
/// active members are interchangeable until one of them acts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SignerParty {
    Individual {
        user_id: UserId,
    },
    Group {
        group_code: GroupCode,
        /// The member who actually acted, bound at act time for audit
        #[serde(skip_serializing_if = "Option::is_none")]
        bound_actor: Option<UserId>,
    },
}

impl SignerParty {
    pub fn individual(user_id: impl Into<String>) -> Self {
        Self::Individual {
            user_id: UserId::new(user_id),
        }
    }

    pub fn group(group_code: impl Into<String>) -> Self {
        Self::Group {
            group_code: GroupCode::new(group_code),
            bound_actor: None,
        }
    }

    /// Group code, for group slots
    pub fn group_code(&self) -> Option<&GroupCode> {
        match self {
            Self::Group { group_code, .. } => Some(group_code),
            Self::Individual { .. } => None,
        }
    }

    /// The effective actor for audit: the individual user, or the
    /// group member bound at act time (if any).
    pub fn effective_actor(&self) -> Option<&UserId> {
        match self {
            Self::Individual { user_id } => Some(user_id),
            Self::Group { bound_actor, .. } => bound_actor.as_ref(),
        }
    }
}

// ── Assignment Status ────────────────────────────────────────────────

/// Status of one signer slot. Signed and Rejected are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AssignmentStatus {
    #[default]
    Pending,
    Signed,
    Rejected,
}

impl AssignmentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Signed | Self::Rejected)
    }
}

// ── Signature Payload ────────────────────────────────────────────────

/// Opaque application-level signature data. The engine stores it
/// untouched; rendering and verification are external concerns.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SignaturePayload(pub serde_json::Value);

impl SignaturePayload {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }
}

impl From<serde_json::Value> for SignaturePayload {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

// ── Signer Assignment ────────────────────────────────────────────────

/// One ordered slot in a document's signing pipeline
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SignerAssignment {
    /// 1-based order position; strictly increasing within a document,
    /// ties forbidden. The builder assigns dense positions.
    pub position: u32,
    /// Who may act on this slot
    pub party: SignerParty,
    /// Roles this slot satisfies (a merged multi-role slot carries several)
    pub role_names: Vec<RoleName>,
    pub status: AssignmentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejected_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    /// Audit copy of the business document number, stamped at the moment
    /// this slot signs. Survives even if a later slot rejects.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consecutivo: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<SignaturePayload>,
}

impl SignerAssignment {
    pub fn new(position: u32, party: SignerParty, role_names: Vec<RoleName>) -> Self {
        Self {
            position,
            party,
            role_names,
            status: AssignmentStatus::Pending,
            signed_at: None,
            rejected_at: None,
            rejection_reason: None,
            consecutivo: None,
            signature: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == AssignmentStatus::Pending
    }

    pub fn is_signed(&self) -> bool {
        self.status == AssignmentStatus::Signed
    }

    /// Whether this slot has reached a terminal decision
    pub fn has_acted(&self) -> bool {
        self.status.is_terminal()
    }

    /// Mark the slot signed: stamp the timestamp, store the opaque
    /// payload and the pass-through consecutivo, and bind group slots
    /// to the acting member.
    pub fn mark_signed(
        &mut self,
        actor: &UserId,
        payload: SignaturePayload,
        consecutivo: Option<i64>,
    ) {
        self.bind_actor(actor);
        self.status = AssignmentStatus::Signed;
        self.signed_at = Some(Utc::now());
        self.signature = Some(payload);
        self.consecutivo = consecutivo;
    }

    /// Mark the slot rejected with the mandatory reason
    pub fn mark_rejected(&mut self, actor: &UserId, reason: impl Into<String>) {
        self.bind_actor(actor);
        self.status = AssignmentStatus::Rejected;
        self.rejected_at = Some(Utc::now());
        self.rejection_reason = Some(reason.into());
    }

    /// Bind a group slot to the member who acted. Individual slots
    /// are already bound by construction.
    fn bind_actor(&mut self, actor: &UserId) {
        if let SignerParty::Group { bound_actor, .. } = &mut self.party {
            *bound_actor = Some(actor.clone());
        }
    }
}
