use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tutorbook_core::{DomainError, DomainResult, Record};

tutorbook_core::record_id!(CourseId, "CourseId");

/// Prefix of generated course codes (`CRS` + 4 digits).
pub const COURSE_CODE_PREFIX: &str = "CRS";
pub const COURSE_CODE_DIGITS: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CourseStatus {
    #[default]
    Active,
    Inactive,
}

/// A course offered by the centre. Its fee seeds every enrollment's fee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub course_code: String,
    pub course_name: String,
    pub description: Option<String>,
    pub course_fee: u64,
    pub duration_months: u32,
    pub sessions_per_week: u32,
    pub status: CourseStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    version: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CreateCourse {
    #[serde(default)]
    pub course_name: String,
    pub course_code: Option<String>,
    pub description: Option<String>,
    pub course_fee: u64,
    pub duration_months: u32,
    pub sessions_per_week: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UpdateCourse {
    pub course_name: Option<String>,
    pub description: Option<String>,
    pub course_fee: Option<u64>,
    pub duration_months: Option<u32>,
    pub sessions_per_week: Option<u32>,
    pub status: Option<CourseStatus>,
}

impl Course {
    pub fn create(
        cmd: &CreateCourse,
        course_code: String,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let mut course = Self {
            id: CourseId::generate(),
            course_code,
            course_name: cmd.course_name.trim().to_string(),
            description: cmd.description.clone(),
            course_fee: cmd.course_fee,
            duration_months: cmd.duration_months,
            sessions_per_week: cmd.sessions_per_week,
            status: CourseStatus::Active,
            created_at: now,
            version: 0,
        };
        course.fill_default_name();
        course.validate()?;
        Ok(course)
    }

    pub fn apply_update(&mut self, cmd: &UpdateCourse) -> DomainResult<()> {
        let mut next = self.clone();
        if let Some(name) = &cmd.course_name {
            next.course_name = name.trim().to_string();
        }
        if cmd.description.is_some() {
            next.description = cmd.description.clone();
        }
        if let Some(fee) = cmd.course_fee {
            next.course_fee = fee;
        }
        if let Some(months) = cmd.duration_months {
            next.duration_months = months;
        }
        if let Some(sessions) = cmd.sessions_per_week {
            next.sessions_per_week = sessions;
        }
        if let Some(status) = cmd.status {
            next.status = status;
        }
        next.fill_default_name();
        next.validate()?;
        *self = next;
        Ok(())
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.course_fee == 0 {
            return Err(DomainError::validation("course fee must be greater than zero"));
        }
        if self.duration_months == 0 {
            return Err(DomainError::validation("duration must be greater than zero"));
        }
        if self.sessions_per_week == 0 {
            return Err(DomainError::validation(
                "sessions per week must be greater than zero",
            ));
        }
        Ok(())
    }

    fn fill_default_name(&mut self) {
        if self.course_name.is_empty() {
            self.course_name = format!("Course {}", self.course_code);
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == CourseStatus::Active
    }
}

impl Record for Course {
    type Id = CourseId;
    const KIND: &'static str = "course";

    fn id(&self) -> CourseId {
        self.id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}
