//! Firma Signing Service
//!
//! The async facade over the pure workflow core. It wires the engine to
//! its external collaborators through narrow ports:
//!
//! - [`DocumentStore`] — transactional persistence with a compare-and-set
//!   write (version mismatch surfaces as a Conflict the caller retries)
//! - [`GroupDirectory`] — point-in-time causación group snapshots
//! - [`ConsecutivoIssuer`] — the external business-number counter,
//!   idempotent per document
//! - [`Notifier`] — fire-and-forget event delivery
//! - [`DocumentRenderer`] — post-commit PDF stamping
//!
//! # Concurrency
//!
//! The unit of mutual exclusion is one document: a per-document advisory
//! lock serializes concurrent actions against the same document, while
//! actions against different documents proceed fully in parallel. Each
//! action is atomic — it reads current state, validates eligibility, and
//! commits a single versioned write, or fails without partial effects.
//!
//! Notification and rendering failures downstream of a committed write
//! are logged and never surfaced as failure of the triggering action.

#![deny(unsafe_code)]

pub mod memory;
pub mod service;
pub mod traits;

pub use memory::{
    InMemoryDocumentStore, InMemoryGroupDirectory, NoopRenderer, RecordingNotifier, SequenceIssuer,
};
pub use service::{NewDocument, SigningService};
pub use traits::{
    BoxError, ConsecutivoIssuer, DocumentRenderer, DocumentStore, GroupDirectory, Notifier,
};
