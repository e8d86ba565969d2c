//! Students domain module.
//!
//! Student records and the rules applied when they are registered or edited,
//! implemented purely as deterministic domain logic (no IO, no HTTP, no storage).

pub mod student;

pub use student::{RegisterStudent, Student, StudentId, StudentStatus, UpdateStudent};
