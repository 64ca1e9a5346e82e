//! Domain types for the Firma signing workflow
//!
//! A document in Firma moves through a strict sequential signing pipeline:
//! an ordered list of signer slots, each acted on in turn, until every slot
//! is signed (document complete) or any slot rejects (workflow terminated).
//!
//! # Key Concepts
//!
//! - **Document**: the aggregate root — status, ordered signer assignments,
//!   and retention history. Loaded and written as one unit.
//! - **SignerAssignment**: one ordered slot. Either an individual user or a
//!   causación group (any active member may act; the slot binds to the
//!   acting member for audit).
//! - **DocumentType**: reference data — an ordered role template plus the
//!   flags that govern role collapsing, identity checks, and retention.
//! - **Retention**: a partial financial hold recorded against an already
//!   fully-signed document, independent of the signer sequence.
//! - **NotificationEvent**: fire-and-forget records emitted by transitions;
//!   delivery is an external collaborator's concern.
//!
//! # Design Principles
//!
//! 1. Every state change flows through the engine; types expose guarded
//!    mutators, never silent correction.
//! 2. Rejection preserves the audit trail: untouched slots stay Pending.
//! 3. The business document number (consecutivo) is assigned exactly once,
//!    at completion, from an external idempotent counter.

#![deny(unsafe_code)]

mod assignment;
mod catalog;
mod document;
mod errors;
mod events;
mod group;
mod retention;

pub use assignment::*;
pub use catalog::*;
pub use document::*;
pub use errors::*;
pub use events::*;
pub use group::*;
pub use retention::*;
