use chrono::NaiveDate;
use tracing::{debug, info};

use tutorbook_attendance::{
    ensure_not_future, Attendance, AttendanceId, AttendanceRefs, AttendanceSummary, MarkAttendance,
    RosterEntry, RosterResult, UpdateAttendance,
};
use tutorbook_catalog::{Batch, BatchId, Course};
use tutorbook_core::{ExpectedVersion, RequestContext};
use tutorbook_students::{Student, StudentId};

use super::{require, ServiceResult, Services};

impl Services {
    /// Mark one student's attendance for a class date.
    pub fn mark_attendance(
        &self,
        ctx: &RequestContext,
        cmd: MarkAttendance,
    ) -> ServiceResult<Attendance> {
        self.batch_locks.with(&[cmd.batch_id], || -> ServiceResult<Attendance> {
            let student = require(&*self.store.students, cmd.student_id)?;
            let (batch, course) = self.batch_with_course(cmd.batch_id)?;
            let refs = AttendanceRefs {
                student: &student,
                batch: &batch,
                course: course.as_ref(),
            };
            let duplicate = self
                .find_mark(cmd.student_id, cmd.batch_id, cmd.attendance_date)?
                .is_some();
            let mark = Attendance::mark(&cmd, &refs, duplicate, ctx.today(), ctx.now())?;
            let saved = self.store.attendance.insert(mark)?;
            self.log_running_rate(&saved)?;
            Ok(saved)
        })
    }

    pub fn update_attendance(
        &self,
        ctx: &RequestContext,
        id: AttendanceId,
        cmd: UpdateAttendance,
    ) -> ServiceResult<Attendance> {
        let stored = require(&*self.store.attendance, id)?;
        let student = require(&*self.store.students, stored.student_id)?;
        let (batch, course) = self.batch_with_course(stored.batch_id)?;
        let mut next = stored.clone();
        next.apply_update(&cmd);
        next.refresh_related(&AttendanceRefs {
            student: &student,
            batch: &batch,
            course: course.as_ref(),
        })?;
        let saved = self
            .store
            .attendance
            .update(next, ExpectedVersion::of(&stored))?;
        debug!(
            request_id = %ctx.request_id(),
            attendance = %id,
            status = ?saved.status,
            "attendance updated"
        );
        self.log_running_rate(&saved)?;
        Ok(saved)
    }

    pub fn get_attendance(&self, id: AttendanceId) -> ServiceResult<Attendance> {
        require(&*self.store.attendance, id)
    }

    /// Attendance of one student in one batch.
    pub fn attendance_summary(
        &self,
        student: StudentId,
        batch: BatchId,
    ) -> ServiceResult<AttendanceSummary> {
        let marks = self
            .store
            .attendance
            .find(&|a: &Attendance| a.student_id == student && a.batch_id == batch)?;
        Ok(AttendanceSummary::from_records(&marks))
    }

    /// Attendance over every mark recorded for the batch.
    pub fn batch_attendance_summary(&self, batch: BatchId) -> ServiceResult<AttendanceSummary> {
        require(&*self.store.batches, batch)?;
        let marks = self
            .store
            .attendance
            .find(&|a: &Attendance| a.batch_id == batch)?;
        Ok(AttendanceSummary::from_records(&marks))
    }

    /// Upsert a whole roster for one class date.
    ///
    /// The date and every student are checked before any mark is written. A
    /// student listed twice updates the mark created by the first entry.
    pub fn mark_batch_attendance(
        &self,
        ctx: &RequestContext,
        batch_id: BatchId,
        date: NaiveDate,
        entries: Vec<RosterEntry>,
    ) -> ServiceResult<RosterResult> {
        ensure_not_future(date, ctx.today())?;
        self.batch_locks.with(&[batch_id], || -> ServiceResult<RosterResult> {
            let (batch, course) = self.batch_with_course(batch_id)?;
            let students = entries
                .iter()
                .map(|entry| require(&*self.store.students, entry.student))
                .collect::<ServiceResult<Vec<Student>>>()?;

            let mut result = RosterResult::default();
            for (entry, student) in entries.iter().zip(&students) {
                let refs = AttendanceRefs {
                    student,
                    batch: &batch,
                    course: course.as_ref(),
                };
                let saved = match self.find_mark(entry.student, batch_id, date)? {
                    Some(stored) => {
                        let mut next = stored.clone();
                        next.apply_update(&UpdateAttendance {
                            status: Some(entry.status),
                            notes: Some(entry.notes.clone()),
                            class_time: None,
                        });
                        next.refresh_related(&refs)?;
                        result.record(false);
                        self.store
                            .attendance
                            .update(next, ExpectedVersion::of(&stored))?
                    }
                    None => {
                        let cmd = MarkAttendance {
                            student_id: entry.student,
                            batch_id,
                            attendance_date: date,
                            status: entry.status,
                            notes: entry.notes.clone(),
                            class_time: None,
                        };
                        let mark = Attendance::mark(&cmd, &refs, false, ctx.today(), ctx.now())?;
                        result.record(true);
                        self.store.attendance.insert(mark)?
                    }
                };
                self.log_running_rate(&saved)?;
            }
            info!(
                request_id = %ctx.request_id(),
                batch = %batch_id,
                date = %date,
                created = result.created,
                updated = result.updated,
                "batch attendance marked"
            );
            Ok(result)
        })
    }

    fn batch_with_course(&self, id: BatchId) -> ServiceResult<(Batch, Option<Course>)> {
        let batch = require(&*self.store.batches, id)?;
        let course = self.store.courses.get(batch.course_id)?;
        Ok((batch, course))
    }

    fn find_mark(
        &self,
        student: StudentId,
        batch: BatchId,
        date: NaiveDate,
    ) -> ServiceResult<Option<Attendance>> {
        Ok(self
            .store
            .attendance
            .find(&|a: &Attendance| {
                a.student_id == student && a.batch_id == batch && a.attendance_date == date
            })?
            .into_iter()
            .next())
    }

    /// Debug-log the student's attendance rate in the batch up to this mark.
    fn log_running_rate(&self, mark: &Attendance) -> ServiceResult<()> {
        let (student, batch) = (mark.student_id, mark.batch_id);
        let marks = self
            .store
            .attendance
            .find(&|a: &Attendance| a.student_id == student && a.batch_id == batch)?;
        let summary = AttendanceSummary::until(&marks, mark.attendance_date);
        debug!(
            student = %student,
            batch = %batch,
            attended = summary.attended_sessions,
            total = summary.total_sessions,
            rate = summary.attendance_rate,
            "attendance rate"
        );
        Ok(())
    }
}
