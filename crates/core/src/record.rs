//! Stored-record trait and optimistic concurrency expectations.

use crate::error::{DomainError, DomainResult};

/// A persisted business record (student, course, invoice, ...).
///
/// Records are plain typed structs; the store assigns and bumps `version` on
/// every write so callers can detect lost updates.
pub trait Record: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Strongly-typed record identifier.
    type Id: Copy
        + Eq
        + Ord
        + core::hash::Hash
        + core::fmt::Debug
        + core::fmt::Display
        + Send
        + Sync;

    /// Human-readable entity name used in errors and logs (e.g. `"fee invoice"`).
    const KIND: &'static str;

    fn id(&self) -> Self::Id;

    /// Version of the stored state; 0 for records never persisted.
    fn version(&self) -> u64;

    fn set_version(&mut self, version: u64);
}

/// Optimistic concurrency expectation for a record write.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// Skip version checking.
    Any,
    /// The record must not exist yet.
    New,
    /// Require the stored record to be at an exact version.
    Exact(u64),
}

impl ExpectedVersion {
    /// `actual` is `None` when no record is stored under the id.
    pub fn matches(self, actual: Option<u64>) -> bool {
        match (self, actual) {
            (ExpectedVersion::Any, _) => true,
            (ExpectedVersion::New, None) => true,
            (ExpectedVersion::New, Some(_)) => false,
            (ExpectedVersion::Exact(v), Some(a)) => v == a,
            (ExpectedVersion::Exact(_), None) => false,
        }
    }

    pub fn check(self, actual: Option<u64>) -> DomainResult<()> {
        if self.matches(actual) {
            Ok(())
        } else {
            Err(DomainError::conflict(format!(
                "optimistic concurrency check failed (expected: {self:?}, actual: {actual:?})"
            )))
        }
    }

    /// Expectation for re-saving a record that was loaded at `record.version()`.
    pub fn of<R: Record>(record: &R) -> Self {
        if record.version() == 0 {
            ExpectedVersion::New
        } else {
            ExpectedVersion::Exact(record.version())
        }
    }
}
