//! Firma Workflow Core
//!
//! The pure, synchronous heart of the signing platform. It owns no I/O:
//! callers load a [`firma_types::Document`] (plus the reference data it
//! needs), invoke a transition, and persist the result under a single
//! serializable write.
//!
//! # Key Principle
//!
//! **The engine decides, it never performs side effects.**
//!
//! Transitions return the [`firma_types::NotificationEvent`]s they produce;
//! delivery, PDF stamping, and consecutivo issuance belong to external
//! collaborators wired in by the service layer.
//!
//! # Architecture
//!
//! - [`AssignmentBuilder`] — turns requested signers plus a document type's
//!   role template into the ordered slot list
//! - [`SigningStateMachine`] — enforces turn order and applies
//!   sign/reject/archive transitions
//! - [`RetentionLedger`] — retain/release invariants on completed documents
//! - [`TypeCatalog`] / [`GroupRegistry`] — reference data lookups

#![deny(unsafe_code)]

pub mod assignment_builder;
pub mod catalog;
pub mod retention_ledger;
pub mod state_machine;

pub use assignment_builder::{AssignmentBuilder, RequestedParty, RequestedSigner};
pub use catalog::{GroupRegistry, TypeCatalog};
pub use retention_ledger::RetentionLedger;
pub use state_machine::{RejectRequest, SignRequest, SigningStateMachine, Transition};
