//! Assignment builder: from requested signers to the ordered slot list
//!
//! The builder is the normalization boundary: legacy single-role and
//! multi-role request shapes both arrive here as [`RequestedSigner`]
//! entries with a role list, and nothing deeper in the workflow ever
//! branches on input shape again.
//!
//! It is pure — the proposed list is returned, persisting it is the
//! caller's concern.

use firma_types::{
    Document, DocumentType, GroupCode, RoleName, SignerAssignment, SignerParty, UserId,
    WorkflowError, WorkflowResult,
};

// ── Requested Signers ────────────────────────────────────────────────

/// Who a requested slot should belong to
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RequestedParty {
    User(UserId),
    Group(GroupCode),
}

impl RequestedParty {
    /// Label used in error messages
    fn label(&self) -> String {
        match self {
            Self::User(user_id) => user_id.0.clone(),
            Self::Group(code) => code.0.clone(),
        }
    }

    fn into_signer_party(self) -> SignerParty {
        match self {
            Self::User(user_id) => SignerParty::Individual { user_id },
            Self::Group(group_code) => SignerParty::Group {
                group_code,
                bound_actor: None,
            },
        }
    }
}

/// One requested signer entry: a user or group plus the roles it covers
#[derive(Clone, Debug)]
pub struct RequestedSigner {
    pub party: RequestedParty,
    pub roles: Vec<RoleName>,
}

impl RequestedSigner {
    pub fn user(user_id: impl Into<String>, roles: impl IntoIterator<Item = RoleName>) -> Self {
        Self {
            party: RequestedParty::User(UserId::new(user_id)),
            roles: roles.into_iter().collect(),
        }
    }

    /// Legacy single-role shape, normalized here at the boundary
    pub fn single_role(user_id: impl Into<String>, role: RoleName) -> Self {
        Self::user(user_id, [role])
    }

    pub fn group(group_code: impl Into<String>, roles: impl IntoIterator<Item = RoleName>) -> Self {
        Self {
            party: RequestedParty::Group(GroupCode::new(group_code)),
            roles: roles.into_iter().collect(),
        }
    }
}

// ── Builder ──────────────────────────────────────────────────────────

/// Builds the ordered signer slot list for a document
#[derive(Clone, Debug, Default)]
pub struct AssignmentBuilder;

impl AssignmentBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Produce the ordered assignment list.
    ///
    /// With a role template, entries are sorted to match template order
    /// (by the minimal template index across each entry's roles) and any
    /// role outside the template is an error. Without one, request order
    /// is preserved. Positions come out dense, starting at 1.
    pub fn build(
        &self,
        document_type: Option<&DocumentType>,
        requested: &[RequestedSigner],
    ) -> WorkflowResult<Vec<SignerAssignment>> {
        if requested.is_empty() {
            return Err(WorkflowError::EmptyAssignment);
        }

        let merged = self.merge_entries(document_type, requested)?;

        let ordered = match document_type.filter(|ty| ty.has_template()) {
            Some(ty) => self.sort_by_template(ty, merged)?,
            None => merged,
        };

        Ok(ordered
            .into_iter()
            .zip(1u32..)
            .map(|((party, roles), position)| {
                SignerAssignment::new(position, party.into_signer_party(), roles)
            })
            .collect())
    }

    /// Re-assignment guard: replacing an existing list is permitted only
    /// while no assignment has status Signed or Rejected.
    pub fn ensure_reassignable(&self, document: &Document) -> WorkflowResult<()> {
        if document.has_acted_assignment() {
            return Err(WorkflowError::WorkflowInProgress {
                document_id: document.id.clone(),
            });
        }
        Ok(())
    }

    // ── Internal helpers ─────────────────────────────────────────────

    /// Collapse repeated parties into single multi-role entries when the
    /// document type allows it; otherwise a repeat is an error.
    fn merge_entries(
        &self,
        document_type: Option<&DocumentType>,
        requested: &[RequestedSigner],
    ) -> WorkflowResult<Vec<(RequestedParty, Vec<RoleName>)>> {
        let collapse_allowed = document_type.is_some_and(|ty| ty.allows_role_collapse);
        let mut merged: Vec<(RequestedParty, Vec<RoleName>)> = Vec::new();

        for entry in requested {
            if entry.roles.is_empty() {
                return Err(WorkflowError::MissingRoles {
                    signer: entry.party.label(),
                });
            }

            match merged.iter_mut().find(|(party, _)| party == &entry.party) {
                Some((party, roles)) => {
                    if !collapse_allowed {
                        return Err(WorkflowError::DuplicateSigner {
                            signer: party.label(),
                        });
                    }
                    for role in &entry.roles {
                        if !roles.contains(role) {
                            roles.push(role.clone());
                        }
                    }
                }
                None => {
                    let mut roles = Vec::new();
                    for role in &entry.roles {
                        if !roles.contains(role) {
                            roles.push(role.clone());
                        }
                    }
                    merged.push((entry.party.clone(), roles));
                }
            }
        }

        Ok(merged)
    }

    /// Stable-sort entries by the minimal template index of their roles
    fn sort_by_template(
        &self,
        document_type: &DocumentType,
        merged: Vec<(RequestedParty, Vec<RoleName>)>,
    ) -> WorkflowResult<Vec<(RequestedParty, Vec<RoleName>)>> {
        let mut keyed = Vec::with_capacity(merged.len());
        for (party, roles) in merged {
            let mut key = usize::MAX;
            for role in &roles {
                match document_type.template_index(role) {
                    Some(index) => key = key.min(index),
                    None => {
                        return Err(WorkflowError::UnknownRole {
                            role: role.0.clone(),
                        })
                    }
                }
            }
            keyed.push((key, party, roles));
        }
        keyed.sort_by_key(|(key, _, _)| *key);
        Ok(keyed.into_iter().map(|(_, party, roles)| (party, roles)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use firma_types::{AssignmentStatus, SignaturePayload};

    fn role(name: &str) -> RoleName {
        RoleName::new(name)
    }

    fn contract_type() -> DocumentType {
        DocumentType::new("contrato", "Contrato").with_role_template([
            role("elaborador"),
            role("revisor"),
            role("aprobador"),
        ])
    }

    /// Builder invariant: positions dense from 1, no duplicates, no gaps
    fn assert_dense_positions(assignments: &[SignerAssignment]) {
        for (i, assignment) in assignments.iter().enumerate() {
            assert_eq!(assignment.position, i as u32 + 1);
        }
    }

    #[test]
    fn test_empty_request_fails() {
        let err = AssignmentBuilder::new().build(None, &[]).unwrap_err();
        assert!(matches!(err, WorkflowError::EmptyAssignment));
    }

    #[test]
    fn test_no_template_preserves_request_order() {
        let requested = vec![
            RequestedSigner::single_role("carla", role("gerente")),
            RequestedSigner::single_role("david", role("contador")),
        ];
        let assignments = AssignmentBuilder::new().build(None, &requested).unwrap();

        assert_eq!(assignments.len(), 2);
        assert_dense_positions(&assignments);
        assert_eq!(
            assignments[0].party,
            SignerParty::individual("carla")
        );
        assert_eq!(assignments[1].party, SignerParty::individual("david"));
    }

    #[test]
    fn test_template_reorders_requested_signers() {
        let ty = contract_type();
        // Requested out of template order
        let requested = vec![
            RequestedSigner::single_role("aprueba", role("aprobador")),
            RequestedSigner::single_role("elabora", role("elaborador")),
            RequestedSigner::single_role("revisa", role("revisor")),
        ];
        let assignments = AssignmentBuilder::new().build(Some(&ty), &requested).unwrap();

        assert_dense_positions(&assignments);
        assert_eq!(assignments[0].party, SignerParty::individual("elabora"));
        assert_eq!(assignments[1].party, SignerParty::individual("revisa"));
        assert_eq!(assignments[2].party, SignerParty::individual("aprueba"));
    }

    #[test]
    fn test_role_outside_template_fails() {
        let ty = contract_type();
        let requested = vec![RequestedSigner::single_role("x", role("gerente"))];
        let err = AssignmentBuilder::new()
            .build(Some(&ty), &requested)
            .unwrap_err();
        assert!(matches!(err, WorkflowError::UnknownRole { role } if role == "gerente"));
    }

    #[test]
    fn test_duplicate_user_without_collapse_fails() {
        let ty = contract_type();
        let requested = vec![
            RequestedSigner::single_role("marta", role("elaborador")),
            RequestedSigner::single_role("marta", role("revisor")),
        ];
        let err = AssignmentBuilder::new()
            .build(Some(&ty), &requested)
            .unwrap_err();
        assert!(matches!(err, WorkflowError::DuplicateSigner { signer } if signer == "marta"));
    }

    #[test]
    fn test_duplicate_user_collapses_into_multi_role_slot() {
        let ty = contract_type().with_role_collapse();
        let requested = vec![
            RequestedSigner::single_role("marta", role("revisor")),
            RequestedSigner::single_role("marta", role("elaborador")),
            RequestedSigner::single_role("jefe", role("aprobador")),
        ];
        let assignments = AssignmentBuilder::new().build(Some(&ty), &requested).unwrap();

        // One merged slot for marta, sorted by her earliest template role
        assert_eq!(assignments.len(), 2);
        assert_dense_positions(&assignments);
        assert_eq!(assignments[0].party, SignerParty::individual("marta"));
        assert_eq!(
            assignments[0].role_names,
            vec![role("revisor"), role("elaborador")]
        );
        assert_eq!(assignments[1].party, SignerParty::individual("jefe"));
    }

    #[test]
    fn test_multi_role_entry_is_one_slot() {
        let requested = vec![RequestedSigner::user(
            "gerente",
            [role("revisor"), role("aprobador")],
        )];
        let assignments = AssignmentBuilder::new().build(None, &requested).unwrap();

        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments[0].role_names.len(), 2);
    }

    #[test]
    fn test_group_entry_binds_to_group_not_members() {
        let requested = vec![
            RequestedSigner::group("caus-conta", [role("causador")]),
            RequestedSigner::single_role("gerente", role("aprobador")),
        ];
        let assignments = AssignmentBuilder::new().build(None, &requested).unwrap();

        assert_eq!(assignments[0].party, SignerParty::group("caus-conta"));
        assert_eq!(assignments[0].party.effective_actor(), None);
    }

    #[test]
    fn test_entry_without_roles_fails() {
        let requested = vec![RequestedSigner::user("ana", [])];
        let err = AssignmentBuilder::new().build(None, &requested).unwrap_err();
        assert!(matches!(err, WorkflowError::MissingRoles { signer } if signer == "ana"));
    }

    #[test]
    fn test_reassignment_guard() {
        let mut document = Document::new("Doc", "s3://f.pdf", UserId::new("autor"));
        document
            .replace_assignments(
                AssignmentBuilder::new()
                    .build(
                        None,
                        &[
                            RequestedSigner::single_role("a", role("firmante")),
                            RequestedSigner::single_role("b", role("firmante")),
                        ],
                    )
                    .unwrap(),
            )
            .unwrap();

        let builder = AssignmentBuilder::new();
        builder.ensure_reassignable(&document).unwrap();

        document.assignment_at_mut(1).unwrap().mark_signed(
            &UserId::new("a"),
            SignaturePayload::new(serde_json::json!({})),
            None,
        );
        assert_eq!(
            document.assignment_at(1).unwrap().status,
            AssignmentStatus::Signed
        );
        let err = builder.ensure_reassignable(&document).unwrap_err();
        assert!(matches!(err, WorkflowError::WorkflowInProgress { .. }));
    }
}
