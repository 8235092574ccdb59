use actix_web::{HttpResponse, Responder, web};
use sqlx::MySqlPool;

use crate::auth::auth::AuthUser;
use crate::ledger::clock::{Clock, SystemClock};
use crate::ledger::dashboard::{
    DashboardSummary, WEAK_ATTENDANCE_THRESHOLD, attendance_percentage,
};

/// Landing-page counters for the authenticated teacher
#[utoipa::path(
    get,
    path = "/api/dashboard/summary",
    responses(
        (status = 200, description = "Summary counters", body = DashboardSummary),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn summary(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    clock: web::Data<SystemClock>,
) -> actix_web::Result<impl Responder> {
    let teacher_id = auth.teacher_profile()?;
    let today = clock.today();

    let pending_attendance: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM classes c
        WHERE c.teacher_id = ?
          AND NOT EXISTS (
              SELECT 1 FROM attendance_records ar
              WHERE ar.class_id = c.id AND ar.date = ?
          )
        "#,
    )
    .bind(teacher_id)
    .bind(today)
    .fetch_one(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, teacher_id, "Failed to count pending attendance");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let marked: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM attendance_records ar
        JOIN classes c ON ar.class_id = c.id
        WHERE c.teacher_id = ? AND ar.date = ?
        "#,
    )
    .bind(teacher_id)
    .bind(today)
    .fetch_one(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, teacher_id, "Failed to count marked records");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let present: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM attendance_records ar
        JOIN classes c ON ar.class_id = c.id
        WHERE c.teacher_id = ? AND ar.date = ? AND ar.status = 'present'
        "#,
    )
    .bind(teacher_id)
    .bind(today)
    .fetch_one(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, teacher_id, "Failed to count present records");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    // the rolling percentage itself is maintained by the analytics job
    let weak_students_count: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM students s
        JOIN classes c ON s.class_id = c.id
        WHERE c.teacher_id = ? AND s.attendance_percentage < ?
        "#,
    )
    .bind(teacher_id)
    .bind(WEAK_ATTENDANCE_THRESHOLD)
    .fetch_one(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, teacher_id, "Failed to count weak students");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let pending_leave_requests: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM leave_requests WHERE teacher_id = ? AND status = 'pending'",
    )
    .bind(teacher_id)
    .fetch_one(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, teacher_id, "Failed to count pending leave requests");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(DashboardSummary {
        pending_attendance,
        today_attendance_percentage: attendance_percentage(present, marked),
        weak_students_count,
        pending_leave_requests,
    }))
}
