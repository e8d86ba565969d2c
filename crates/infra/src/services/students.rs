use std::sync::PoisonError;

use tracing::info;

use tutorbook_core::code::{generate_unique_code, random_digits};
use tutorbook_core::{DomainError, ExpectedVersion, RequestContext};
use tutorbook_enrollment::StudentEnrollment;
use tutorbook_students::student::{STUDENT_CODE_DIGITS, STUDENT_CODE_PREFIX};
use tutorbook_students::{RegisterStudent, Student, StudentId, UpdateStudent};

use super::{require, ServiceResult, Services};

impl Services {
    /// Register a student, generating a unique `STU` code when none is given.
    pub fn register_student(
        &self,
        ctx: &RequestContext,
        cmd: RegisterStudent,
    ) -> ServiceResult<Student> {
        let _codes = self.code_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let repo = &self.store.students;
        let code = match cmd.student_code.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            Some(code) => {
                let taken = repo.exists(&|s: &Student| s.student_code == code)?;
                if taken {
                    let reason = format!("student code {code} already exists");
                    return Err(DomainError::validation(reason).into());
                }
                code.to_string()
            }
            None => generate_unique_code(
                STUDENT_CODE_PREFIX,
                || random_digits(STUDENT_CODE_DIGITS),
                |candidate| {
                    repo.exists(&|s: &Student| s.student_code == candidate)
                        .map_err(|e| DomainError::conflict(e.to_string()))
                },
            )?,
        };
        let student = repo.insert(Student::register(&cmd, code, ctx.now())?)?;
        info!(
            request_id = %ctx.request_id(),
            actor = ctx.actor(),
            student = %student.id,
            code = %student.student_code,
            "student registered"
        );
        Ok(student)
    }

    pub fn update_student(
        &self,
        ctx: &RequestContext,
        id: StudentId,
        cmd: UpdateStudent,
    ) -> ServiceResult<Student> {
        let stored = require(&*self.store.students, id)?;
        let mut next = stored.clone();
        next.apply_update(&cmd)?;
        let saved = self.store.students.update(next, ExpectedVersion::of(&stored))?;
        info!(request_id = %ctx.request_id(), student = %id, "student updated");
        Ok(saved)
    }

    pub fn get_student(&self, id: StudentId) -> ServiceResult<Student> {
        require(&*self.store.students, id)
    }

    /// Every enrollment of the student, newest enrollment date first.
    pub fn student_enrollments(&self, id: StudentId) -> ServiceResult<Vec<StudentEnrollment>> {
        require(&*self.store.students, id)?;
        let mut enrollments = self
            .store
            .enrollments
            .find(&|e: &StudentEnrollment| e.student_id == id)?;
        enrollments.sort_by(|a, b| b.enrollment_date.cmp(&a.enrollment_date));
        Ok(enrollments)
    }
}
