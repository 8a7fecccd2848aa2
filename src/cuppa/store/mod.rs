//! # Storage Layer
//!
//! This module defines the storage abstraction for cuppa. The [`ExpenseStore`]
//! trait lets the command layer run the same read-modify-write logic against
//! any backend.
//!
//! ## Snapshots and Revisions
//!
//! The record set is always read and written as a whole. A read returns a
//! [`Snapshot`]: the records plus the [`Revision`] they were read at. A
//! conditional write ([`ExpenseStore::commit`]) names the snapshot it was
//! computed from and is rejected with [`CuppaError::Conflict`] when storage has
//! moved on. Every mutation is therefore:
//!
//! 1. **Load**: `load_snapshot()`
//! 2. **Compute**: derive the next record set in memory
//! 3. **Compare-and-swap**: `commit(&snapshot, &next)`
//!
//! There is no retry. A conflict goes back to the caller, who may reload and
//! try again.
//!
//! ## Implementations
//!
//! - [`fs::CsvFileStore`]: a local CSV file; the revision is a SHA-256 of the
//!   file bytes.
//! - [`remote::RemoteSnapshotStore`]: a pretty-printed JSON array behind a
//!   hosted content API ([`content_api::ContentApi`]); the revision is the
//!   API's blob sha.
//! - [`memory::InMemoryStore`]: for testing logic without I/O.
//!
//! ## Read Failures
//!
//! `load_snapshot` reports I/O failures as errors. Only the `list` command
//! degrades a failed read to an empty, flagged listing.
//!
//! [`CuppaError::Conflict`]: crate::error::CuppaError::Conflict

use crate::error::Result;
use crate::model::{Expense, Revision, Snapshot};

pub mod content_api;
pub mod fs;
pub mod github;
pub mod mem_content;
pub mod memory;
pub mod remote;

/// Abstract interface for expense storage.
pub trait ExpenseStore {
    /// Load the full record set and the revision it was read at.
    /// A store that holds nothing yet returns an empty snapshot, not an error.
    fn load_snapshot(&self) -> Result<Snapshot>;

    /// Replace the record set, provided storage still holds `base`'s revision.
    fn commit(&mut self, base: &Snapshot, next: &[Expense]) -> Result<Revision>;

    /// Replace the record set unconditionally (last writer wins).
    fn save(&mut self, records: &[Expense]) -> Result<Revision>;

    /// Prepare the backing medium (create files, directories). Idempotent.
    fn ensure_store(&self) -> Result<()> {
        Ok(())
    }

    /// Human readable location, used in messages.
    fn location(&self) -> String;
}

impl<S: ExpenseStore + ?Sized> ExpenseStore for Box<S> {
    fn load_snapshot(&self) -> Result<Snapshot> {
        (**self).load_snapshot()
    }

    fn commit(&mut self, base: &Snapshot, next: &[Expense]) -> Result<Revision> {
        (**self).commit(base, next)
    }

    fn save(&mut self, records: &[Expense]) -> Result<Revision> {
        (**self).save(records)
    }

    fn ensure_store(&self) -> Result<()> {
        (**self).ensure_store()
    }

    fn location(&self) -> String {
        (**self).location()
    }
}
