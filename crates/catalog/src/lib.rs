//! Catalog domain module: courses and their scheduled batches.

pub mod batch;
pub mod course;

pub use batch::{Batch, BatchId, BatchStatus, ScheduleBatch, UpdateBatch};
pub use course::{Course, CourseId, CourseStatus, CreateCourse, UpdateCourse};
