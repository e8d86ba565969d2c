use thiserror::Error;

use tutorbook_core::DomainError;

use crate::notify::NotifyError;
use crate::store::StoreError;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Failure of a service operation.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Notify(#[from] NotifyError),
}

impl ServiceError {
    pub fn not_found(what: &str) -> Self {
        Self::Domain(DomainError::not_found(what))
    }

    /// Stable machine-readable error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::Domain(e) => match e {
                DomainError::Validation(_) | DomainError::InvalidId(_) => "validation",
                DomainError::NotFound(_) => "not_found",
                DomainError::Conflict(_) => "conflict",
                DomainError::InvariantViolation(_) => "invariant_violation",
                DomainError::Unauthorized => "unauthorized",
            },
            ServiceError::Store(e) => match e {
                StoreError::Conflict(_) | StoreError::DuplicateKey(_) => "conflict",
                StoreError::NotFound(_) => "not_found",
                StoreError::Unavailable(_) => "unavailable",
            },
            ServiceError::Notify(e) => match e {
                NotifyError::InvalidRecipient(_) => "validation",
                NotifyError::Delivery(_) => "delivery_failed",
            },
        }
    }

    /// User-correctable failure (as opposed to an unexpected one).
    pub fn is_expected(&self) -> bool {
        !matches!(self.kind(), "unavailable" | "delivery_failed" | "invariant_violation")
    }
}
