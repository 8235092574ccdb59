use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, EnumIter,
    ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LeaveType {
    Casual,
    Sick,
    Earned,
    Unpaid,
}

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

/// Which half of the day a half-day leave consumes.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum HalfDaySession {
    FirstHalf,
    SecondHalf,
}

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Default, Serialize, Deserialize, Display, EnumString,
    ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LeavePriority {
    #[default]
    Normal,
    High,
    Urgent,
}

/// The only two outcomes an administrator can record for a pending request.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LeaveDecision {
    Approved,
    Rejected,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct LeaveRequest {
    pub id: u64,
    pub teacher_id: u64,
    #[schema(example = "casual", value_type = String)]
    pub leave_type: String,
    #[schema(example = "2026-02-02", format = "date", value_type = String)]
    pub from_date: NaiveDate,
    #[schema(example = "2026-02-04", format = "date", value_type = String)]
    pub to_date: NaiveDate,
    pub half_day: bool,
    #[schema(example = "first_half", value_type = Option<String>)]
    pub half_day_session: Option<String>,
    pub reason: String,
    #[schema(example = "normal", value_type = String)]
    pub priority: String,
    #[schema(example = "pending", value_type = String)]
    pub status: String,
    #[schema(example = 3.0)]
    pub total_days: f64,
    pub contact_number: Option<String>,
    pub alternative_email: Option<String>,
    pub attachment: Option<String>,
    pub admin_remark: Option<String>,
    pub cancellation_reason: Option<String>,
    pub reviewed_by: Option<u64>,
    #[schema(format = "date-time", value_type = Option<String>)]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[schema(format = "date-time", value_type = Option<String>)]
    pub created_at: Option<DateTime<Utc>>,
}
