//! Notification events emitted by workflow transitions
//!
//! Events are fire-and-forget records: the engine produces them, the
//! external dispatcher delivers them. Delivery failure never rolls back
//! the transition that produced the event.

use crate::{DocumentId, UserId};
use serde::{Deserialize, Serialize};

/// A notification record produced by a committed transition
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationEvent {
    /// A signer approved their slot
    Signed {
        document_id: DocumentId,
        actor: UserId,
        position: u32,
    },
    /// A signer rejected their slot, terminating the workflow
    Rejected {
        document_id: DocumentId,
        actor: UserId,
        position: u32,
        reason: String,
    },
    /// Every slot signed; the document is complete
    DocumentComplete { document_id: DocumentId },
    /// The turn moved to the next pending position (notify that signer)
    TurnAdvanced {
        document_id: DocumentId,
        position: u32,
    },
    /// A retention hold was applied to a completed document
    RetentionApplied {
        document_id: DocumentId,
        actor: UserId,
        percentage: f64,
    },
    /// An active retention hold was released
    RetentionReleased {
        document_id: DocumentId,
        actor: UserId,
    },
}

impl NotificationEvent {
    /// The document this event concerns
    pub fn document_id(&self) -> &DocumentId {
        match self {
            Self::Signed { document_id, .. }
            | Self::Rejected { document_id, .. }
            | Self::DocumentComplete { document_id }
            | Self::TurnAdvanced { document_id, .. }
            | Self::RetentionApplied { document_id, .. }
            | Self::RetentionReleased { document_id, .. } => document_id,
        }
    }

    /// Stable event-type tag, useful for dispatcher routing and logs
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Signed { .. } => "SIGNED",
            Self::Rejected { .. } => "REJECTED",
            Self::DocumentComplete { .. } => "DOCUMENT_COMPLETE",
            Self::TurnAdvanced { .. } => "TURN_ADVANCED",
            Self::RetentionApplied { .. } => "RETENTION_APPLIED",
            Self::RetentionReleased { .. } => "RETENTION_RELEASED",
        }
    }
}
