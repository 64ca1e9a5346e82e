//! Reference data registries: document types and causación groups
//!
//! Document types are near-static catalog data. Groups are looked up at
//! act time (never at assignment time) because membership can change
//! while a document is in flight; the service layer loads a point-in-time
//! [`GroupRegistry`] snapshot per action.

use firma_types::{
    CausacionGroup, DocumentType, DocumentTypeId, GroupCode, WorkflowError, WorkflowResult,
};
use std::collections::HashMap;

// ── Type Catalog ─────────────────────────────────────────────────────

/// Registry of document types, keyed by ID
#[derive(Clone, Debug, Default)]
pub struct TypeCatalog {
    types: HashMap<DocumentTypeId, DocumentType>,
}

impl TypeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a document type.
    ///
    /// Rejects templates with duplicate roles: a role that appears twice
    /// would make the signing order ambiguous.
    pub fn register(&mut self, document_type: DocumentType) -> WorkflowResult<DocumentTypeId> {
        for (i, role) in document_type.role_template.iter().enumerate() {
            if document_type.role_template[..i].contains(role) {
                return Err(WorkflowError::InvalidTemplate {
                    document_type: document_type.id.clone(),
                });
            }
        }

        let id = document_type.id.clone();
        self.types.insert(id.clone(), document_type);
        tracing::info!(document_type = %id, "Document type registered");
        Ok(id)
    }

    pub fn get(&self, id: &DocumentTypeId) -> WorkflowResult<&DocumentType> {
        self.types
            .get(id)
            .ok_or_else(|| WorkflowError::DocumentTypeNotFound(id.clone()))
    }

    pub fn list(&self) -> Vec<&DocumentType> {
        self.types.values().collect()
    }

    pub fn count(&self) -> usize {
        self.types.len()
    }
}

// ── Group Registry ───────────────────────────────────────────────────

/// Point-in-time snapshot of causación groups, keyed by code
#[derive(Clone, Debug, Default)]
pub struct GroupRegistry {
    groups: HashMap<GroupCode, CausacionGroup>,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, group: CausacionGroup) {
        self.groups.insert(group.code.clone(), group);
    }

    pub fn get(&self, code: &GroupCode) -> WorkflowResult<&CausacionGroup> {
        self.groups
            .get(code)
            .ok_or_else(|| WorkflowError::GroupNotFound(code.clone()))
    }

    pub fn contains(&self, code: &GroupCode) -> bool {
        self.groups.contains_key(code)
    }
}

impl FromIterator<CausacionGroup> for GroupRegistry {
    fn from_iter<I: IntoIterator<Item = CausacionGroup>>(iter: I) -> Self {
        let mut registry = Self::new();
        for group in iter {
            registry.insert(group);
        }
        registry
    }
}
