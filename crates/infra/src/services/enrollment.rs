use tracing::{debug, info};

use tutorbook_attendance::{Attendance, AttendanceSummary};
use tutorbook_catalog::BatchId;
use tutorbook_core::{DomainError, ExpectedVersion, RequestContext};
use tutorbook_enrollment::{
    EnrollStudent, EnrollmentId, EnrollmentRefs, StudentEnrollment, UpdateEnrollment,
};
use tutorbook_invoicing::{FeeInvoice, PaymentEntry};

use super::{require, ServiceResult, Services};

impl Services {
    /// Enroll a student into a batch.
    ///
    /// The batch lock is held across the duplicate and capacity checks, the
    /// write and the seat recount.
    pub fn enroll(
        &self,
        ctx: &RequestContext,
        cmd: EnrollStudent,
    ) -> ServiceResult<StudentEnrollment> {
        self.batch_locks.with(&[cmd.batch_id], || -> ServiceResult<StudentEnrollment> {
            let student = require(&*self.store.students, cmd.student_id)?;
            let batch = require(&*self.store.batches, cmd.batch_id)?;
            let course = require(&*self.store.courses, batch.course_id)?;
            let refs = EnrollmentRefs {
                student: &student,
                batch: &batch,
                course: &course,
            };

            let mut enrollment = StudentEnrollment::new(&cmd, &refs, ctx.today(), ctx.now());
            let siblings = self.siblings(&enrollment)?;
            enrollment.admit(&refs, &siblings, None)?;
            let saved = self.store.enrollments.insert(enrollment)?;
            info!(
                request_id = %ctx.request_id(),
                actor = ctx.actor(),
                enrollment = %saved.id,
                student = %saved.student_id,
                batch = %saved.batch_id,
                total_fee = saved.total_fee,
                "student enrolled"
            );
            self.after_enrollment_saved(ctx, saved, None)
        })
    }

    /// Change discount, date, status or batch of an enrollment.
    ///
    /// Locks both the current and the target batch when the enrollment moves.
    pub fn update_enrollment(
        &self,
        ctx: &RequestContext,
        id: EnrollmentId,
        cmd: UpdateEnrollment,
    ) -> ServiceResult<StudentEnrollment> {
        let seen = require(&*self.store.enrollments, id)?;
        let target = cmd.batch_id.unwrap_or(seen.batch_id);
        self.batch_locks.with(&[seen.batch_id, target], || -> ServiceResult<StudentEnrollment> {
            let stored = require(&*self.store.enrollments, id)?;
            if stored.batch_id != seen.batch_id {
                return Err(DomainError::conflict("enrollment was moved concurrently").into());
            }
            let mut next = stored.clone();
            next.apply_update(&cmd);

            let student = require(&*self.store.students, next.student_id)?;
            let batch = require(&*self.store.batches, next.batch_id)?;
            let course = require(&*self.store.courses, batch.course_id)?;
            let refs = EnrollmentRefs {
                student: &student,
                batch: &batch,
                course: &course,
            };
            let siblings = self.siblings(&next)?;
            next.admit(&refs, &siblings, Some(&stored))?;

            let saved = self
                .store
                .enrollments
                .update(next, ExpectedVersion::of(&stored))?;
            info!(
                request_id = %ctx.request_id(),
                enrollment = %id,
                status = ?saved.status,
                "enrollment updated"
            );
            self.after_enrollment_saved(ctx, saved, Some(stored.batch_id))
        })
    }

    pub fn get_enrollment(&self, id: EnrollmentId) -> ServiceResult<StudentEnrollment> {
        require(&*self.store.enrollments, id)
    }

    /// Invoices raised for the enrollment, cancelled ones included, oldest first.
    pub fn enrollment_invoices(&self, id: EnrollmentId) -> ServiceResult<Vec<FeeInvoice>> {
        require(&*self.store.enrollments, id)?;
        let mut invoices = self
            .store
            .invoices
            .find(&|i: &FeeInvoice| i.enrollment_id == id)?;
        invoices.sort_by_key(|i| i.created_at);
        Ok(invoices)
    }

    /// Submitted payments across all invoices of the enrollment, newest first.
    pub fn enrollment_payment_history(&self, id: EnrollmentId) -> ServiceResult<Vec<PaymentEntry>> {
        require(&*self.store.enrollments, id)?;
        let invoices: Vec<_> = self
            .store
            .invoices
            .find(&|i: &FeeInvoice| i.enrollment_id == id)?
            .into_iter()
            .map(|i| i.id)
            .collect();
        let mut payments = self.store.payments.find(&|p: &PaymentEntry| {
            p.is_submitted() && invoices.contains(&p.invoice_id)
        })?;
        payments.sort_by(|a, b| b.posting_date.cmp(&a.posting_date));
        Ok(payments)
    }

    /// Attendance of the enrollment's student in the enrollment's batch.
    pub fn enrollment_attendance_summary(
        &self,
        id: EnrollmentId,
    ) -> ServiceResult<AttendanceSummary> {
        let enrollment = require(&*self.store.enrollments, id)?;
        let marks = self.store.attendance.find(&|a: &Attendance| {
            a.student_id == enrollment.student_id && a.batch_id == enrollment.batch_id
        })?;
        Ok(AttendanceSummary::from_records(&marks))
    }

    fn siblings(&self, enrollment: &StudentEnrollment) -> ServiceResult<Vec<StudentEnrollment>> {
        let (student, batch) = (enrollment.student_id, enrollment.batch_id);
        Ok(self
            .store
            .enrollments
            .find(&|e: &StudentEnrollment| e.student_id == student && e.batch_id == batch)?)
    }

    /// Post-save cascade: seat recount (old and new batch) and lazy invoice.
    fn after_enrollment_saved(
        &self,
        ctx: &RequestContext,
        enrollment: StudentEnrollment,
        previous_batch: Option<BatchId>,
    ) -> ServiceResult<StudentEnrollment> {
        let batch = self.recount_batch(enrollment.batch_id)?;
        debug!(batch = %batch.id, current_enrollment = batch.current_enrollment, "batch recounted");
        if let Some(previous) = previous_batch.filter(|b| *b != enrollment.batch_id) {
            self.recount_batch(previous)?;
        }
        if enrollment.needs_invoice() {
            self.ensure_invoice(ctx, &enrollment)?;
        }
        Ok(enrollment)
    }

    /// Issue the enrollment's invoice unless a non-cancelled one exists.
    fn ensure_invoice(
        &self,
        ctx: &RequestContext,
        enrollment: &StudentEnrollment,
    ) -> ServiceResult<()> {
        let id = enrollment.id;
        let exists = self
            .store
            .invoices
            .exists(&|i: &FeeInvoice| i.enrollment_id == id && !i.is_cancelled())?;
        if exists {
            return Ok(());
        }
        let invoice = self
            .store
            .invoices
            .insert(FeeInvoice::for_enrollment(enrollment, ctx.today(), ctx.now())?)?;
        info!(
            request_id = %ctx.request_id(),
            invoice = %invoice.id,
            enrollment = %id,
            total_amount = invoice.total_amount,
            "fee invoice issued"
        );
        Ok(())
    }
}
