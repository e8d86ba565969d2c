use std::sync::PoisonError;

use tracing::info;

use tutorbook_catalog::course::{COURSE_CODE_DIGITS, COURSE_CODE_PREFIX};
use tutorbook_catalog::{
    Batch, BatchId, Course, CourseId, CreateCourse, ScheduleBatch, UpdateBatch, UpdateCourse,
};
use tutorbook_core::code::{generate_unique_code, random_digits};
use tutorbook_core::{DomainError, ExpectedVersion, RequestContext};
use tutorbook_enrollment::{EnrollmentStatus, StudentEnrollment};
use tutorbook_invoicing::{FeeInvoice, InvoiceStatus};

use super::{require, ServiceResult, Services};

impl Services {
    pub fn create_course(&self, ctx: &RequestContext, cmd: CreateCourse) -> ServiceResult<Course> {
        let _codes = self.code_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let repo = &self.store.courses;
        let code = match cmd.course_code.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            Some(code) => {
                if repo.exists(&|c: &Course| c.course_code == code)? {
                    let reason = format!("course code {code} already exists");
                    return Err(DomainError::validation(reason).into());
                }
                code.to_string()
            }
            None => generate_unique_code(
                COURSE_CODE_PREFIX,
                || random_digits(COURSE_CODE_DIGITS),
                |candidate| {
                    repo.exists(&|c: &Course| c.course_code == candidate)
                        .map_err(|e| DomainError::conflict(e.to_string()))
                },
            )?,
        };
        let course = repo.insert(Course::create(&cmd, code, ctx.now())?)?;
        info!(
            request_id = %ctx.request_id(),
            course = %course.id,
            code = %course.course_code,
            "course created"
        );
        Ok(course)
    }

    pub fn update_course(
        &self,
        ctx: &RequestContext,
        id: CourseId,
        cmd: UpdateCourse,
    ) -> ServiceResult<Course> {
        let stored = require(&*self.store.courses, id)?;
        let mut next = stored.clone();
        next.apply_update(&cmd)?;
        let saved = self.store.courses.update(next, ExpectedVersion::of(&stored))?;
        if saved.course_name != stored.course_name {
            for batch in self.store.batches.find(&|b: &Batch| b.course_id == id)? {
                self.batch_locks.with(&[batch.id], || -> ServiceResult<()> {
                    let current = require(&*self.store.batches, batch.id)?;
                    let mut next = current.clone();
                    next.refresh_course_name(&saved);
                    self.store.batches.update(next, ExpectedVersion::of(&current))?;
                    Ok(())
                })?;
            }
        }
        info!(request_id = %ctx.request_id(), course = %id, "course updated");
        Ok(saved)
    }

    pub fn get_course(&self, id: CourseId) -> ServiceResult<Course> {
        require(&*self.store.courses, id)
    }

    pub fn course_enrollments(&self, id: CourseId) -> ServiceResult<Vec<StudentEnrollment>> {
        require(&*self.store.courses, id)?;
        Ok(self
            .store
            .enrollments
            .find(&|e: &StudentEnrollment| e.course_id == id)?)
    }

    /// Number of Active enrollments in the course.
    pub fn course_total_enrollments(&self, id: CourseId) -> ServiceResult<usize> {
        require(&*self.store.courses, id)?;
        Ok(self.store.enrollments.count(&|e: &StudentEnrollment| {
            e.course_id == id && e.status == EnrollmentStatus::Active
        })?)
    }

    /// Sum of `total_amount` over Paid invoices of the course's Active enrollments.
    pub fn course_revenue(&self, id: CourseId) -> ServiceResult<u64> {
        let active: Vec<_> = self
            .course_enrollments(id)?
            .into_iter()
            .filter(StudentEnrollment::is_active)
            .map(|e| e.id)
            .collect();
        let paid = self.store.invoices.find(&|i: &FeeInvoice| {
            i.status == InvoiceStatus::Paid && active.contains(&i.enrollment_id)
        })?;
        Ok(paid.iter().map(|i| i.total_amount).sum())
    }

    pub fn schedule_batch(&self, ctx: &RequestContext, cmd: ScheduleBatch) -> ServiceResult<Batch> {
        let course = require(&*self.store.courses, cmd.course_id)?;
        let batch = self.store.batches.insert(Batch::schedule(&cmd, &course, ctx.now())?)?;
        info!(
            request_id = %ctx.request_id(),
            batch = %batch.id,
            name = %batch.batch_name,
            "batch scheduled"
        );
        Ok(batch)
    }

    pub fn update_batch(
        &self,
        ctx: &RequestContext,
        id: BatchId,
        cmd: UpdateBatch,
    ) -> ServiceResult<Batch> {
        self.batch_locks.with(&[id], || -> ServiceResult<Batch> {
            let stored = require(&*self.store.batches, id)?;
            let mut next = stored.clone();
            next.apply_update(&cmd)?;
            let saved = self.store.batches.update(next, ExpectedVersion::of(&stored))?;
            info!(request_id = %ctx.request_id(), batch = %id, "batch updated");
            Ok(saved)
        })
    }

    pub fn get_batch(&self, id: BatchId) -> ServiceResult<Batch> {
        require(&*self.store.batches, id)
    }

    pub fn batch_enrollments(&self, id: BatchId) -> ServiceResult<Vec<StudentEnrollment>> {
        require(&*self.store.batches, id)?;
        Ok(self
            .store
            .enrollments
            .find(&|e: &StudentEnrollment| e.batch_id == id)?)
    }

    /// Remaining seats, `None` for a batch without a capacity limit.
    pub fn available_slots(&self, id: BatchId) -> ServiceResult<Option<u32>> {
        Ok(self.get_batch(id)?.available_slots())
    }

    pub fn is_batch_full(&self, id: BatchId) -> ServiceResult<bool> {
        Ok(self.get_batch(id)?.is_full())
    }

    /// Rewrite `current_enrollment` from the count of Active enrollments.
    ///
    /// Callers hold the batch lock.
    pub(super) fn recount_batch(&self, id: BatchId) -> ServiceResult<Batch> {
        let stored = require(&*self.store.batches, id)?;
        let count = self.store.enrollments.count(&|e: &StudentEnrollment| {
            e.batch_id == id && e.status == EnrollmentStatus::Active
        })?;
        let count = u32::try_from(count)
            .map_err(|_| DomainError::invariant("enrollment count exceeds u32"))?;
        if stored.current_enrollment == count {
            return Ok(stored);
        }
        let mut next = stored.clone();
        next.set_enrollment_count(count);
        Ok(self.store.batches.update(next, ExpectedVersion::of(&stored))?)
    }
}
