//! Error types for the signing workflow
//!
//! One enum for every violation the core can report, with a [`class`]
//! accessor grouping variants into the caller-facing taxonomy. The core
//! never retries and never corrects silently; every violation surfaces
//! synchronously with enough context to render a user-facing message.
//!
//! [`class`]: WorkflowError::class

use crate::{DocumentId, DocumentStatus, DocumentTypeId, GroupCode, UserId};

/// Caller-facing error taxonomy
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorClass {
    /// Malformed input: unknown role, empty reason, out-of-range percentage
    Validation,
    /// Operation invalid for the current document/assignment state
    State,
    /// Actor not entitled to act
    Authorization,
    /// Concurrent mutation detected by the persistence layer; retry the
    /// whole action, never partially reapply it
    Conflict,
    /// Referenced entity does not exist
    NotFound,
}

/// Errors reported by the signing workflow core
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    // ── Validation ───────────────────────────────────────────────────
    #[error("role '{role}' is not part of the document type's template")]
    UnknownRole { role: String },

    #[error("at least one signer is required")]
    EmptyAssignment,

    #[error("signer '{signer}' appears more than once and the document type does not allow role collapsing")]
    DuplicateSigner { signer: String },

    #[error("signer '{signer}' specifies no roles")]
    MissingRoles { signer: String },

    #[error("a non-empty reason is required")]
    EmptyReason,

    #[error("retention percentage {percentage} is outside (0, 100]")]
    InvalidPercentage { percentage: f64 },

    #[error("document type '{document_type}' has a duplicate role in its template")]
    InvalidTemplate { document_type: DocumentTypeId },

    // ── State ────────────────────────────────────────────────────────
    #[error("position {position} of document {document_id} is not the current turn")]
    OutOfTurn {
        document_id: DocumentId,
        position: u32,
    },

    #[error("position {position} of document {document_id} has already acted")]
    AlreadyActed {
        document_id: DocumentId,
        position: u32,
    },

    #[error("document {document_id} is {status:?}; operation requires {required:?}")]
    InvalidState {
        document_id: DocumentId,
        status: DocumentStatus,
        required: DocumentStatus,
    },

    #[error("document {document_id} already has an active retention")]
    AlreadyRetained { document_id: DocumentId },

    #[error("document {document_id} has no active retention")]
    NoActiveRetention { document_id: DocumentId },

    #[error("document {document_id} has signers that already acted; re-assignment is not permitted")]
    WorkflowInProgress { document_id: DocumentId },

    #[error("document type '{document_type}' does not accept retention")]
    RetentionNotAllowed { document_type: DocumentTypeId },

    #[error("document {document_id} already has consecutivo {consecutivo}")]
    ConsecutivoAlreadyAssigned {
        document_id: DocumentId,
        consecutivo: i64,
    },

    // ── Authorization ────────────────────────────────────────────────
    #[error("user '{actor}' is not a signer of document {document_id}")]
    NotASigner {
        document_id: DocumentId,
        actor: UserId,
    },

    #[error("causación group '{group_code}' is inactive")]
    GroupInactive { group_code: GroupCode },

    #[error("user '{actor}' is not an active member of group '{group_code}'")]
    NotAGroupMember {
        group_code: GroupCode,
        actor: UserId,
    },

    #[error("identity verification failed for user '{actor}'")]
    IdentityCheckFailed { actor: UserId },

    // ── Conflict ─────────────────────────────────────────────────────
    #[error("concurrent modification of document {document_id}; retry the action")]
    Conflict { document_id: DocumentId },

    /// Transient persistence failure; retry the whole action
    #[error("storage backend error: {message}")]
    Storage { message: String },

    // ── Not found ────────────────────────────────────────────────────
    #[error("document {0} not found")]
    DocumentNotFound(DocumentId),

    #[error("document type '{0}' not found")]
    DocumentTypeNotFound(DocumentTypeId),

    #[error("causación group '{0}' not found")]
    GroupNotFound(GroupCode),
}

impl WorkflowError {
    /// Map this error into the caller-facing taxonomy
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::UnknownRole { .. }
            | Self::EmptyAssignment
            | Self::DuplicateSigner { .. }
            | Self::MissingRoles { .. }
            | Self::EmptyReason
            | Self::InvalidPercentage { .. }
            | Self::InvalidTemplate { .. } => ErrorClass::Validation,

            Self::OutOfTurn { .. }
            | Self::AlreadyActed { .. }
            | Self::InvalidState { .. }
            | Self::AlreadyRetained { .. }
            | Self::NoActiveRetention { .. }
            | Self::WorkflowInProgress { .. }
            | Self::RetentionNotAllowed { .. }
            | Self::ConsecutivoAlreadyAssigned { .. } => ErrorClass::State,

            Self::NotASigner { .. }
            | Self::GroupInactive { .. }
            | Self::NotAGroupMember { .. }
            | Self::IdentityCheckFailed { .. } => ErrorClass::Authorization,

            Self::Conflict { .. } | Self::Storage { .. } => ErrorClass::Conflict,

            Self::DocumentNotFound(_)
            | Self::DocumentTypeNotFound(_)
            | Self::GroupNotFound(_) => ErrorClass::NotFound,
        }
    }
}

/// Result type alias for workflow operations
pub type WorkflowResult<T> = Result<T, WorkflowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let doc = DocumentId::generate();

        assert_eq!(
            WorkflowError::EmptyAssignment.class(),
            ErrorClass::Validation
        );
        assert_eq!(
            WorkflowError::OutOfTurn {
                document_id: doc.clone(),
                position: 3
            }
            .class(),
            ErrorClass::State
        );
        assert_eq!(
            WorkflowError::NotASigner {
                document_id: doc.clone(),
                actor: UserId::new("x")
            }
            .class(),
            ErrorClass::Authorization
        );
        assert_eq!(
            WorkflowError::Conflict {
                document_id: doc.clone()
            }
            .class(),
            ErrorClass::Conflict
        );
        assert_eq!(
            WorkflowError::DocumentNotFound(doc).class(),
            ErrorClass::NotFound
        );
    }
}
