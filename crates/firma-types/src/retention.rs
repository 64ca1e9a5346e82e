//! Retention: a partial financial hold on an already fully-signed document
//!
//! Retentions are post-completion annotations, not workflow steps. A
//! released retention is never deleted; it stays in the document's
//! history so a later hold can be applied without losing the audit trail.

use crate::{DocumentId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A partial-withhold event layered onto a signed document
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Retention {
    pub document_id: DocumentId,
    /// Percentage withheld, in (0, 100]
    pub percentage: f64,
    pub reason: String,
    pub retained_by: UserId,
    pub retained_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub released_by: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub released_at: Option<DateTime<Utc>>,
}

impl Retention {
    pub fn new(
        document_id: DocumentId,
        percentage: f64,
        reason: impl Into<String>,
        retained_by: UserId,
    ) -> Self {
        Self {
            document_id,
            percentage,
            reason: reason.into(),
            retained_by,
            retained_at: Utc::now(),
            released_by: None,
            released_at: None,
        }
    }

    /// An active retention has not been released yet
    pub fn is_active(&self) -> bool {
        self.released_at.is_none()
    }

    /// Stamp the release. Logical deletion only; the row survives.
    pub fn release(&mut self, released_by: UserId) {
        self.released_by = Some(released_by);
        self.released_at = Some(Utc::now());
    }
}

/// Whether a percentage is a valid withhold amount: in (0, 100]
pub fn valid_retention_percentage(percentage: f64) -> bool {
    percentage > 0.0 && percentage <= 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_is_logical() {
        let mut retention = Retention::new(
            DocumentId::generate(),
            30.0,
            "disputa parcial",
            UserId::new("tesorero"),
        );
        assert!(retention.is_active());

        retention.release(UserId::new("gerente"));
        assert!(!retention.is_active());
        assert_eq!(retention.released_by, Some(UserId::new("gerente")));
        // Original hold data survives the release
        assert_eq!(retention.percentage, 30.0);
        assert_eq!(retention.reason, "disputa parcial");
    }

    #[test]
    fn test_percentage_bounds() {
        assert!(!valid_retention_percentage(0.0));
        assert!(!valid_retention_percentage(-5.0));
        assert!(valid_retention_percentage(0.5));
        assert!(valid_retention_percentage(100.0));
        assert!(!valid_retention_percentage(100.01));
    }
}
