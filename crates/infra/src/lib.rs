//! Infrastructure layer: record store, locking, mail delivery, the services
//! implementing every operation, scheduled jobs and read-only reports.

pub mod jobs;
pub mod locks;
pub mod notify;
pub mod reports;
pub mod services;
pub mod store;

#[cfg(test)]
mod integration_tests;

pub use services::{ServiceError, ServiceResult, Services};
pub use store::{Repository, Store, StoreError};
