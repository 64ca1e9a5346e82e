//! Document type reference data: ordered role templates and workflow flags

use serde::{Deserialize, Serialize};

// ── Identifiers ──────────────────────────────────────────────────────

/// Unique identifier for a document type
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentTypeId(pub String);

impl DocumentTypeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for DocumentTypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A role a signer slot satisfies (e.g. "elaborador", "revisor", "aprobador")
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleName(pub String);

impl RoleName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl std::fmt::Display for RoleName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Document Type ────────────────────────────────────────────────────

/// A document type: the ordered role template signers must follow,
/// plus the flags governing collapsing, identity checks, and retention.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DocumentType {
    /// Unique type identifier
    pub id: DocumentTypeId,
    /// Human-readable name
    pub name: String,
    /// Ordered list of required roles. Empty means "no template":
    /// signers keep their requested order.
    pub role_template: Vec<RoleName>,
    /// Whether one user may hold several template roles in a single slot
    pub allows_role_collapse: bool,
    /// Whether group slots require the last-4-digits identity check
    pub requires_identity_check: bool,
    /// Whether a completed document of this type accepts a retention hold
    pub retainable: bool,
}

impl DocumentType {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: DocumentTypeId::new(id),
            name: name.into(),
            role_template: Vec::new(),
            allows_role_collapse: false,
            requires_identity_check: false,
            retainable: false,
        }
    }

    pub fn with_role_template(mut self, roles: impl IntoIterator<Item = RoleName>) -> Self {
        self.role_template = roles.into_iter().collect();
        self
    }

    pub fn with_role_collapse(mut self) -> Self {
        self.allows_role_collapse = true;
        self
    }

    pub fn with_identity_check(mut self) -> Self {
        self.requires_identity_check = true;
        self
    }

    pub fn retainable(mut self) -> Self {
        self.retainable = true;
        self
    }

    /// Whether this type prescribes a signing order
    pub fn has_template(&self) -> bool {
        !self.role_template.is_empty()
    }

    /// Index of a role within the template, if present
    pub fn template_index(&self, role: &RoleName) -> Option<usize> {
        self.role_template.iter().position(|r| r == role)
    }
}
