//! `tutorbook-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! errors, identifiers, the stored-record contract, the request context and
//! shared amount rules.

pub mod code;
pub mod context;
pub mod error;
pub mod id;
pub mod money;
pub mod record;
pub mod value_object;

pub use context::RequestContext;
pub use error::{DomainError, DomainResult};
pub use id::RecordId;
pub use money::PaymentStatus;
pub use record::{ExpectedVersion, Record};
pub use value_object::{DateRange, ValueObject};
