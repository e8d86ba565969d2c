use std::str::FromStr;

use axum::{http::StatusCode, Json};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use tutorbook_attendance::RosterEntry;
use tutorbook_catalog::BatchId;
use tutorbook_core::DomainError;
use tutorbook_students::StudentId;

use crate::app::errors::ApiResult;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateModeOfPaymentRequest {
    pub mode_of_payment: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

/// Roster for one batch session.
#[derive(Debug, Deserialize)]
pub struct MarkRosterRequest {
    pub attendance_date: NaiveDate,
    pub students: Vec<RosterEntry>,
}

#[derive(Debug, Deserialize)]
pub struct RevenueQuery {
    pub months: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct AttendanceSummaryQuery {
    pub student: StudentId,
    pub batch: BatchId,
}

// -------------------------
// Response helpers
// -------------------------

/// `{"status": "success", "data": ...}`
pub fn success<T: Serialize>(data: &T) -> ApiResult<Json<Value>> {
    Ok(Json(json!({
        "status": "success",
        "data": serde_json::to_value(data)?,
    })))
}

pub fn created<T: Serialize>(data: &T) -> ApiResult<(StatusCode, Json<Value>)> {
    Ok((StatusCode::CREATED, success(data)?))
}

/// Parse a path segment into a typed record id.
pub fn parse_id<T>(raw: &str) -> ApiResult<T>
where
    T: FromStr<Err = DomainError>,
{
    Ok(raw.parse()?)
}
