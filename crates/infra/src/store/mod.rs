//! Record persistence.
//!
//! Every entity is stored through a [`Repository`], a versioned key/value
//! collection keyed by the record's typed id. Writes carry an
//! [`ExpectedVersion`] so two writers racing on the same record surface as
//! [`StoreError::Conflict`] instead of silently overwriting each other.
//!
//! Queries are predicate scans (`find`/`exists`/`count`); the in-memory
//! implementation is the only backend.

mod in_memory;

use std::sync::Arc;

use thiserror::Error;

use tutorbook_attendance::Attendance;
use tutorbook_catalog::{Batch, Course};
use tutorbook_core::{ExpectedVersion, Record};
use tutorbook_enrollment::StudentEnrollment;
use tutorbook_invoicing::{FeeInvoice, ModeOfPayment, PaymentEntry};
use tutorbook_students::Student;

use crate::notify::Communication;

pub use in_memory::InMemoryRepository;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Optimistic concurrency failure.
    #[error("concurrency conflict: {0}")]
    Conflict(String),

    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Versioned collection of one record type.
pub trait Repository<R: Record>: Send + Sync {
    fn get(&self, id: R::Id) -> Result<Option<R>, StoreError>;

    /// Store a new record at version 1.
    fn insert(&self, record: R) -> Result<R, StoreError>;

    /// Replace a stored record, bumping its version.
    fn update(&self, record: R, expected: ExpectedVersion) -> Result<R, StoreError>;

    /// All records matching `filter`, in id (creation) order.
    fn find(&self, filter: &dyn Fn(&R) -> bool) -> Result<Vec<R>, StoreError>;

    fn list(&self) -> Result<Vec<R>, StoreError> {
        self.find(&|_| true)
    }

    fn exists(&self, filter: &dyn Fn(&R) -> bool) -> Result<bool, StoreError> {
        Ok(!self.find(filter)?.is_empty())
    }

    fn count(&self, filter: &dyn Fn(&R) -> bool) -> Result<usize, StoreError> {
        Ok(self.find(filter)?.len())
    }
}

impl<R, S> Repository<R> for Arc<S>
where
    R: Record,
    S: Repository<R> + ?Sized,
{
    fn get(&self, id: R::Id) -> Result<Option<R>, StoreError> {
        (**self).get(id)
    }

    fn insert(&self, record: R) -> Result<R, StoreError> {
        (**self).insert(record)
    }

    fn update(&self, record: R, expected: ExpectedVersion) -> Result<R, StoreError> {
        (**self).update(record, expected)
    }

    fn find(&self, filter: &dyn Fn(&R) -> bool) -> Result<Vec<R>, StoreError> {
        (**self).find(filter)
    }
}

/// One repository per entity.
#[derive(Clone)]
pub struct Store {
    pub students: Arc<dyn Repository<Student>>,
    pub courses: Arc<dyn Repository<Course>>,
    pub batches: Arc<dyn Repository<Batch>>,
    pub enrollments: Arc<dyn Repository<StudentEnrollment>>,
    pub invoices: Arc<dyn Repository<FeeInvoice>>,
    pub payments: Arc<dyn Repository<PaymentEntry>>,
    pub modes_of_payment: Arc<dyn Repository<ModeOfPayment>>,
    pub attendance: Arc<dyn Repository<Attendance>>,
    pub communications: Arc<dyn Repository<Communication>>,
}

impl Store {
    pub fn in_memory() -> Self {
        Self {
            students: Arc::new(InMemoryRepository::new()),
            courses: Arc::new(InMemoryRepository::new()),
            batches: Arc::new(InMemoryRepository::new()),
            enrollments: Arc::new(InMemoryRepository::new()),
            invoices: Arc::new(InMemoryRepository::new()),
            payments: Arc::new(InMemoryRepository::new()),
            modes_of_payment: Arc::new(InMemoryRepository::new()),
            attendance: Arc::new(InMemoryRepository::new()),
            communications: Arc::new(InMemoryRepository::new()),
        }
    }
}

impl core::fmt::Debug for Store {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Store").finish_non_exhaustive()
    }
}
