use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tutorbook_core::{DomainError, DomainResult, Record};

tutorbook_core::record_id!(StudentId, "StudentId");

/// Prefix of generated student codes (`STU` + 6 digits).
pub const STUDENT_CODE_PREFIX: &str = "STU";
pub const STUDENT_CODE_DIGITS: u32 = 6;

const MIN_PHONE_LEN: usize = 10;

/// Student status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StudentStatus {
    #[default]
    Active,
    Inactive,
}

/// A registered student.
///
/// Students are referenced by enrollments and attendance and are never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub student_code: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub status: StudentStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    version: u64,
}

/// Command: RegisterStudent.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RegisterStudent {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    /// Explicit code; generated when absent.
    pub student_code: Option<String>,
}

/// Command: UpdateStudent. `None` keeps the existing value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UpdateStudent {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub status: Option<StudentStatus>,
}

impl Student {
    /// Build a new student from a registration command and an already
    /// uniqueness-checked code.
    pub fn register(
        cmd: &RegisterStudent,
        student_code: String,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let mut student = Self {
            id: StudentId::generate(),
            student_code,
            first_name: cmd.first_name.trim().to_string(),
            last_name: cmd.last_name.trim().to_string(),
            full_name: String::new(),
            email: normalize(cmd.email.as_deref()),
            phone_number: normalize(cmd.phone_number.as_deref()),
            status: StudentStatus::Active,
            created_at: now,
            version: 0,
        };
        student.validate()?;
        student.refresh_full_name();
        Ok(student)
    }

    pub fn apply_update(&mut self, cmd: &UpdateStudent) -> DomainResult<()> {
        let mut next = self.clone();
        if let Some(first) = &cmd.first_name {
            next.first_name = first.trim().to_string();
        }
        if let Some(last) = &cmd.last_name {
            next.last_name = last.trim().to_string();
        }
        if cmd.email.is_some() {
            next.email = normalize(cmd.email.as_deref());
        }
        if cmd.phone_number.is_some() {
            next.phone_number = normalize(cmd.phone_number.as_deref());
        }
        if let Some(status) = cmd.status {
            next.status = status;
        }
        next.validate()?;
        next.refresh_full_name();
        *self = next;
        Ok(())
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.first_name.is_empty() || self.last_name.is_empty() {
            return Err(DomainError::validation("first and last name are required"));
        }
        if self.student_code.trim().is_empty() {
            return Err(DomainError::validation("student code cannot be empty"));
        }
        if let Some(email) = &self.email {
            if !email.contains('@') {
                return Err(DomainError::validation("please enter a valid email address"));
            }
        }
        if let Some(phone) = &self.phone_number {
            if phone.chars().count() < MIN_PHONE_LEN {
                return Err(DomainError::validation("please enter a valid phone number"));
            }
        }
        Ok(())
    }

    pub fn refresh_full_name(&mut self) {
        self.full_name = format!("{} {}", self.first_name, self.last_name);
    }

    pub fn is_active(&self) -> bool {
        self.status == StudentStatus::Active
    }
}

impl Record for Student {
    type Id = StudentId;
    const KIND: &'static str = "student";

    fn id(&self) -> StudentId {
        self.id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}

fn normalize(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn register_cmd() -> RegisterStudent {
        RegisterStudent {
            first_name: "Linh".to_string(),
            last_name: "Tran".to_string(),
            email: Some("linh@example.com".to_string()),
            phone_number: Some("0912345678".to_string()),
            student_code: None,
        }
    }

    #[test]
    fn register_builds_full_name() {
        let student =
            Student::register(&register_cmd(), "STU000001".to_string(), test_time()).unwrap();
        assert_eq!(student.full_name, "Linh Tran");
        assert_eq!(student.status, StudentStatus::Active);
        assert_eq!(student.version(), 0);
    }

    #[test]
    fn register_rejects_email_without_at_sign() {
        let mut cmd = register_cmd();
        cmd.email = Some("linh.example.com".to_string());
        let err = Student::register(&cmd, "STU000001".to_string(), test_time()).unwrap_err();
        match err {
            DomainError::Validation(msg) => assert!(msg.contains("email")),
            other => panic!("Expected Validation error, got {other:?}"),
        }
    }

    #[test]
    fn register_rejects_short_phone_number() {
        let mut cmd = register_cmd();
        cmd.phone_number = Some("12345".to_string());
        let err = Student::register(&cmd, "STU000001".to_string(), test_time()).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn blank_contact_fields_are_treated_as_absent() {
        let mut cmd = register_cmd();
        cmd.email = Some("   ".to_string());
        cmd.phone_number = Some(String::new());
        let student = Student::register(&cmd, "STU000001".to_string(), test_time()).unwrap();
        assert_eq!(student.email, None);
        assert_eq!(student.phone_number, None);
    }

    #[test]
    fn update_keeps_record_untouched_on_validation_failure() {
        let mut student =
            Student::register(&register_cmd(), "STU000001".to_string(), test_time()).unwrap();
        let before = student.clone();
        let err = student
            .apply_update(&UpdateStudent {
                last_name: Some("Nguyen".to_string()),
                email: Some("broken".to_string()),
                ..UpdateStudent::default()
            })
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(student, before);
    }

    #[test]
    fn update_refreshes_full_name() {
        let mut student =
            Student::register(&register_cmd(), "STU000001".to_string(), test_time()).unwrap();
        student
            .apply_update(&UpdateStudent {
                last_name: Some("Nguyen".to_string()),
                ..UpdateStudent::default()
            })
            .unwrap();
        assert_eq!(student.full_name, "Linh Nguyen");
    }
}
