use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// Closed set of daily attendance statuses. Unknown values are rejected
/// when the request body is deserialized.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AttendanceStatus {
    Present,
    Absent,
    HalfDay,
    Late,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct AttendanceRecord {
    pub id: u64,
    pub student_id: u64,
    pub class_id: u64,
    pub date: NaiveDate,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub last_modified_reason: Option<String>,
}
