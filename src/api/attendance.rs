use actix_web::{HttpResponse, Responder, web};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

use crate::api::error_response;
use crate::auth::auth::AuthUser;
use crate::ledger::attendance::{self, MarkEntry};
use crate::ledger::clock::{Clock, SystemClock};
use crate::ledger::error::LedgerError;
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::model::school_class::SchoolClass;
use crate::utils::draft_cache;

#[derive(Deserialize, ToSchema)]
pub struct MarkAttendance {
    #[schema(example = 12)]
    pub class_id: u64,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub date: NaiveDate,
    /// One entry per roster student of the class.
    pub attendance_data: Vec<MarkEntry>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateAttendance {
    #[schema(example = "present")]
    pub status: AttendanceStatus,
    /// Mandatory once the record is older than 24 hours.
    #[schema(example = "entered absent by mistake", nullable = true)]
    pub reason: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceView {
    pub id: u64,
    pub student_id: u64,
    pub class_id: u64,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "present")]
    pub status: String,
    #[schema(format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
    pub last_modified_reason: Option<String>,
    /// The record left its edit window; corrections now need a reason.
    pub locked: bool,
}

impl AttendanceView {
    fn from_record(record: AttendanceRecord, now: DateTime<Utc>) -> Self {
        let locked = attendance::is_locked(record.created_at, now);
        AttendanceView {
            id: record.id,
            student_id: record.student_id,
            class_id: record.class_id,
            date: record.date,
            status: record.status,
            created_at: record.created_at,
            last_modified_reason: record.last_modified_reason,
            locked,
        }
    }
}

#[derive(Deserialize, IntoParams)]
pub struct RangeQuery {
    #[param(example = "2026-01-01", value_type = String)]
    pub start_date: NaiveDate,
    #[param(example = "2026-01-31", value_type = String)]
    pub end_date: NaiveDate,
}

#[derive(Deserialize, IntoParams)]
pub struct DraftKey {
    #[param(example = 12)]
    pub class_id: u64,
    #[param(example = "2026-01-05", value_type = String)]
    pub date: NaiveDate,
}

const RECORD_COLUMNS: &str =
    "SELECT id, student_id, class_id, date, status, created_at, last_modified_reason \
     FROM attendance_records";

async fn fetch_range(
    pool: &MySqlPool,
    class_id: u64,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<AttendanceRecord>, sqlx::Error> {
    sqlx::query_as::<_, AttendanceRecord>(&format!(
        "{} WHERE class_id = ? AND date BETWEEN ? AND ? ORDER BY date, student_id",
        RECORD_COLUMNS
    ))
    .bind(class_id)
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await
}

/// Submit a day's roster for a class
#[utoipa::path(
    post,
    path = "/api/attendance",
    request_body = MarkAttendance,
    responses(
        (status = 201, description = "Attendance recorded", body = Object),
        (status = 400, description = "Future date or roster mismatch"),
        (status = 409, description = "Attendance already recorded for this class and date"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn mark_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    clock: web::Data<SystemClock>,
    payload: web::Json<MarkAttendance>,
) -> actix_web::Result<impl Responder> {
    let teacher_id = auth.teacher_profile()?;

    let class_teacher: Option<u64> =
        sqlx::query_scalar("SELECT teacher_id FROM classes WHERE id = ?")
            .bind(payload.class_id)
            .fetch_optional(pool.get_ref())
            .await
            .map_err(|e| {
                tracing::error!(error = %e, class_id = payload.class_id, "Failed to fetch class");
                actix_web::error::ErrorInternalServerError("Internal Server Error")
            })?;

    let Some(class_teacher) = class_teacher else {
        return Ok(HttpResponse::NotFound().json(json!({ "message": "Class not found" })));
    };
    if class_teacher != teacher_id {
        return Ok(HttpResponse::Forbidden().json(json!({
            "message": "Only the class teacher may mark attendance"
        })));
    }

    let roster: Vec<u64> = sqlx::query_scalar("SELECT id FROM students WHERE class_id = ?")
        .bind(payload.class_id)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, class_id = payload.class_id, "Failed to fetch roster");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let already: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM attendance_records WHERE class_id = ? AND date = ?",
    )
    .bind(payload.class_id)
    .bind(payload.date)
    .fetch_one(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Failed to check for existing attendance");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if already > 0 {
        return Ok(error_response(&LedgerError::conflict(
            "attendance for this class and date is already recorded, correct individual records instead",
        )));
    }

    if let Err(e) = attendance::validate_roster(
        &roster,
        &payload.attendance_data,
        payload.date,
        clock.today(),
    ) {
        return Ok(error_response(&e));
    }

    let records = attendance::build_records(
        payload.class_id,
        payload.date,
        &payload.attendance_data,
        clock.now(),
    );

    // all rows of the day land or none do
    let mut tx = pool.begin().await.map_err(|e| {
        tracing::error!(error = %e, "Failed to open transaction");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    for record in &records {
        let insert = sqlx::query(
            r#"
            INSERT INTO attendance_records (student_id, class_id, date, status, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.student_id)
        .bind(record.class_id)
        .bind(record.date)
        .bind(record.status.to_string())
        .bind(record.created_at)
        .execute(&mut *tx)
        .await;

        if let Err(e) = insert {
            // (student_id, date) uniqueness catches records created under
            // a previous class assignment
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23000") {
                    return Ok(error_response(&LedgerError::conflict(format!(
                        "student {} already has an attendance record for {}",
                        record.student_id, record.date
                    ))));
                }
            }

            tracing::error!(error = %e, "Failed to insert attendance record");
            return Err(actix_web::error::ErrorInternalServerError(
                "Internal Server Error",
            ));
        }
    }

    tx.commit().await.map_err(|e| {
        tracing::error!(error = %e, "Failed to commit attendance");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    // the unsent draft is superseded by the stored records
    draft_cache::clear(payload.class_id, payload.date).await;

    let now = clock.now();
    let created = fetch_range(pool.get_ref(), payload.class_id, payload.date, payload.date)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch created records");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let views: Vec<AttendanceView> = created
        .into_iter()
        .map(|r| AttendanceView::from_record(r, now))
        .collect();

    Ok(HttpResponse::Created().json(json!({
        "message": "Attendance recorded",
        "records": views
    })))
}

/// Correct a single record's status
#[utoipa::path(
    put,
    path = "/api/attendance/{record_id}",
    params(
        ("record_id" = u64, Path, description = "Attendance record to correct")
    ),
    request_body = UpdateAttendance,
    responses(
        (status = 200, description = "Record updated", body = AttendanceView),
        (status = 400, description = "Reason missing for a locked record"),
        (status = 404, description = "Record not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn update_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    clock: web::Data<SystemClock>,
    path: web::Path<u64>,
    payload: web::Json<UpdateAttendance>,
) -> actix_web::Result<impl Responder> {
    auth.teacher_profile()?;

    let record_id = path.into_inner();

    let record = sqlx::query_as::<_, AttendanceRecord>(&format!(
        "{} WHERE id = ?",
        RECORD_COLUMNS
    ))
    .bind(record_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, record_id, "Failed to fetch attendance record");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let Some(record) = record else {
        return Ok(HttpResponse::NotFound().json(json!({ "message": "Record not found" })));
    };

    let reason = payload
        .reason
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(String::from);

    if let Err(e) = attendance::check_editable(record.created_at, reason.as_deref(), clock.now()) {
        return Ok(error_response(&e));
    }

    // created_at stays put; the lock window never resets
    sqlx::query(
        r#"
        UPDATE attendance_records
        SET status = ?, last_modified_reason = COALESCE(?, last_modified_reason)
        WHERE id = ?
        "#,
    )
    .bind(payload.status.to_string())
    .bind(&reason)
    .bind(record_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, record_id, "Failed to update attendance record");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    draft_cache::clear(record.class_id, record.date).await;

    let updated = sqlx::query_as::<_, AttendanceRecord>(&format!(
        "{} WHERE id = ?",
        RECORD_COLUMNS
    ))
    .bind(record_id)
    .fetch_one(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, record_id, "Failed to fetch updated record");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(AttendanceView::from_record(updated, clock.now())))
}

/// Records of a class over a date range
#[utoipa::path(
    get,
    path = "/api/attendance/class/{class_id}",
    params(
        ("class_id" = u64, Path, description = "Class to list"),
        RangeQuery
    ),
    responses(
        (status = 200, description = "Records with derived locked flag", body = [AttendanceView]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn attendance_by_class(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    clock: web::Data<SystemClock>,
    path: web::Path<u64>,
    query: web::Query<RangeQuery>,
) -> actix_web::Result<impl Responder> {
    auth.teacher_profile()?;

    let class_id = path.into_inner();
    let records = fetch_range(pool.get_ref(), class_id, query.start_date, query.end_date)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, class_id, "Failed to fetch attendance range");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let now = clock.now();
    let views: Vec<AttendanceView> = records
        .into_iter()
        .map(|r| AttendanceView::from_record(r, now))
        .collect();

    Ok(HttpResponse::Ok().json(views))
}

/// Classes assigned to the authenticated teacher
#[utoipa::path(
    get,
    path = "/api/attendance/classes",
    responses(
        (status = 200, description = "Classes this teacher marks", body = [SchoolClass]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn my_classes(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let teacher_id = auth.teacher_profile()?;

    let classes: Vec<SchoolClass> = sqlx::query_as(
        "SELECT id, name, section, teacher_id FROM classes WHERE teacher_id = ? ORDER BY name, section",
    )
    .bind(teacher_id)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, teacher_id, "Failed to fetch classes");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(classes))
}

/// Stash unsent roster selections
#[utoipa::path(
    put,
    path = "/api/attendance/draft",
    params(DraftKey),
    request_body = Object,
    responses(
        (status = 200, description = "Draft saved"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn save_draft(
    auth: AuthUser,
    query: web::Query<DraftKey>,
    body: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    auth.teacher_profile()?;
    draft_cache::save(query.class_id, query.date, body.into_inner()).await;
    Ok(HttpResponse::Ok().json(json!({ "message": "Draft saved" })))
}

/// Fetch the unsent draft, if any
#[utoipa::path(
    get,
    path = "/api/attendance/draft",
    params(DraftKey),
    responses(
        (status = 200, description = "Draft, null when absent"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn get_draft(
    auth: AuthUser,
    query: web::Query<DraftKey>,
) -> actix_web::Result<impl Responder> {
    auth.teacher_profile()?;
    let draft = draft_cache::get(query.class_id, query.date).await;
    Ok(HttpResponse::Ok().json(json!({ "draft": draft })))
}
