//! Causación groups: named sets of interchangeable signers
//!
//! A group fills a single ordered slot. Any active member of an active
//! group may act on the slot; once acted, the slot is bound to the acting
//! member's identity for audit. Membership is resolved lazily at act time,
//! never at assignment time, because it can change in between.

use crate::{RoleName, UserId};
use serde::{Deserialize, Serialize};

/// Unique code of a causación group
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupCode(pub String);

impl GroupCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }
}

impl std::fmt::Display for GroupCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A member of a causación group
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Integrante {
    pub user_id: UserId,
    /// Job title of the member within the group
    pub cargo: String,
    pub active: bool,
    /// National ID number, required when the document type demands the
    /// last-4-digits secondary verification
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documento: Option<String>,
}

impl Integrante {
    pub fn new(user_id: impl Into<String>, cargo: impl Into<String>) -> Self {
        Self {
            user_id: UserId::new(user_id),
            cargo: cargo.into(),
            active: true,
            documento: None,
        }
    }

    pub fn with_documento(mut self, documento: impl Into<String>) -> Self {
        self.documento = Some(documento.into());
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// Check the last-4-digits identity proof against the member's ID number
    pub fn documento_matches(&self, last_four: &str) -> bool {
        match &self.documento {
            Some(doc) => doc.len() >= 4 && doc.ends_with(last_four) && last_four.len() == 4,
            None => false,
        }
    }
}

/// A named group of interchangeable signers
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CausacionGroup {
    pub code: GroupCode,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub active: bool,
    /// The role this group satisfies when it fills a slot
    pub role: RoleName,
    pub members: Vec<Integrante>,
}

impl CausacionGroup {
    pub fn new(code: impl Into<String>, name: impl Into<String>, role: RoleName) -> Self {
        Self {
            code: GroupCode::new(code),
            name: name.into(),
            description: None,
            active: true,
            role,
            members: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_member(mut self, member: Integrante) -> Self {
        self.members.push(member);
        self
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }

    /// Find an active member by user id
    pub fn active_member(&self, user_id: &UserId) -> Option<&Integrante> {
        self.members
            .iter()
            .find(|m| m.active && &m.user_id == user_id)
    }

    /// Whether the user is an active member of this group
    pub fn is_active_member(&self, user_id: &UserId) -> bool {
        self.active_member(user_id).is_some()
    }

    pub fn active_members(&self) -> Vec<&Integrante> {
        self.members.iter().filter(|m| m.active).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_group() -> CausacionGroup {
        CausacionGroup::new("caus-contabilidad", "Causación Contabilidad", RoleName::new("causador"))
            .with_member(Integrante::new("ana", "Contadora").with_documento("52841967"))
            .with_member(Integrante::new("luis", "Auxiliar").inactive())
    }

    #[test]
    fn test_active_membership() {
        let group = make_group();
        assert!(group.is_active_member(&UserId::new("ana")));
        assert!(!group.is_active_member(&UserId::new("luis")));
        assert!(!group.is_active_member(&UserId::new("nadie")));
        assert_eq!(group.active_members().len(), 1);
    }

    #[test]
    fn test_documento_check() {
        let group = make_group();
        let ana = group.active_member(&UserId::new("ana")).unwrap();
        assert!(ana.documento_matches("1967"));
        assert!(!ana.documento_matches("0000"));
        // Proof must be exactly four digits
        assert!(!ana.documento_matches("52841967"));

        let sin_documento = Integrante::new("eva", "Analista");
        assert!(!sin_documento.documento_matches("1967"));
    }
}
