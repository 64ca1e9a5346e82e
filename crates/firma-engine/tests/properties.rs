//! Property tests for the workflow laws: under any interleaving of
//! sign/reject attempts, the signed slots form a position-order prefix,
//! the document completes iff every slot signed, the consecutivo is
//! present iff the document is Signed, and failed actions never mutate
//! state.

use firma_engine::{AssignmentBuilder, GroupRegistry, RequestedSigner, SigningStateMachine};
use firma_engine::{RejectRequest, SignRequest};
use firma_types::{
    AssignmentStatus, Document, DocumentStatus, RoleName, SignaturePayload, UserId,
};
use proptest::prelude::*;

fn document_with_signers(n: usize) -> Document {
    let requested: Vec<RequestedSigner> = (0..n)
        .map(|i| RequestedSigner::single_role(format!("user-{i}"), RoleName::new("firmante")))
        .collect();
    let assignments = AssignmentBuilder::new().build(None, &requested).unwrap();
    let mut document = Document::new("Prop", "s3://prop.pdf", UserId::new("autor"));
    document.replace_assignments(assignments).unwrap();
    document
}

/// Signed slots must form a prefix of the position order: once a
/// non-Signed slot appears, no later slot is Signed.
fn assert_signed_prefix(document: &Document) {
    let mut prefix_ended = false;
    for assignment in &document.assignments {
        match assignment.status {
            AssignmentStatus::Signed => assert!(
                !prefix_ended,
                "signed slot at position {} after a non-signed one",
                assignment.position
            ),
            _ => prefix_ended = true,
        }
    }
}

fn assert_workflow_laws(document: &Document) {
    assert_signed_prefix(document);

    let all_signed = document.assignments.iter().all(|a| a.is_signed());
    let rejected = document
        .assignments
        .iter()
        .filter(|a| a.status == AssignmentStatus::Rejected)
        .count();

    assert!(rejected <= 1, "at most one slot can reject");
    assert_eq!(document.status == DocumentStatus::Signed, all_signed);
    assert_eq!(document.status == DocumentStatus::Rejected, rejected == 1);
    // Completion law: consecutivo present iff Signed
    assert_eq!(
        document.consecutivo.is_some(),
        document.status == DocumentStatus::Signed
    );
}

proptest! {
    #[test]
    fn workflow_laws_hold_under_any_interleaving(
        signer_count in 1usize..6,
        actions in prop::collection::vec((0usize..8, any::<bool>()), 1..32),
    ) {
        let sm = SigningStateMachine::new();
        let groups = GroupRegistry::new();
        let mut document = document_with_signers(signer_count);
        let mut issued = 100i64;

        for (actor_index, is_sign) in actions {
            let actor = format!("user-{}", actor_index % (signer_count + 2));
            let before = serde_json::to_value(&document).unwrap();

            let result = if is_sign {
                sm.sign(
                    &mut document,
                    None,
                    &groups,
                    SignRequest::new(actor, SignaturePayload::new(serde_json::json!({}))),
                )
            } else {
                sm.reject(&mut document, None, &groups, RejectRequest::new(actor, "motivo"))
            };

            match result {
                Ok(transition) => {
                    if transition.completed {
                        // The service fetches the number from the external
                        // idempotent counter at completion
                        issued += 1;
                        document.assign_consecutivo(issued).unwrap();
                    }
                }
                Err(_) => {
                    // A failed action never mutates state
                    prop_assert_eq!(before, serde_json::to_value(&document).unwrap());
                }
            }

            assert_workflow_laws(&document);
        }

        // Once set, the consecutivo never changes
        if let Some(consecutivo) = document.consecutivo {
            prop_assert!(document.assign_consecutivo(consecutivo + 1).is_err());
            prop_assert_eq!(document.consecutivo, Some(consecutivo));
        }
    }
}
