use std::collections::HashMap;

use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use strum::IntoEnumIterator;
use utoipa::ToSchema;

use crate::api::error_response;
use crate::auth::auth::AuthUser;
use crate::ledger::clock::{Clock, SystemClock};
use crate::ledger::error::LedgerError;
use crate::ledger::{balance, dashboard, leave};
use crate::model::leave_balance::LeaveBalance;
use crate::model::leave_request::{
    HalfDaySession, LeaveDecision, LeavePriority, LeaveRequest, LeaveStatus, LeaveType,
};
use crate::utils::notifier;

#[derive(Deserialize, ToSchema)]
pub struct ApplyLeave {
    #[schema(example = "casual")]
    pub leave_type: LeaveType,
    #[schema(example = "2026-02-02", format = "date", value_type = String)]
    pub from_date: NaiveDate,
    #[schema(example = "2026-02-04", format = "date", value_type = String)]
    pub to_date: NaiveDate,
    #[serde(default)]
    pub half_day: bool,
    /// Required when half_day is set.
    #[schema(example = "first_half", nullable = true)]
    pub session: Option<HalfDaySession>,
    #[schema(example = "family function")]
    pub reason: String,
    #[serde(default)]
    #[schema(example = "normal")]
    pub priority: LeavePriority,
    pub contact_number: Option<String>,
    pub alternative_email: Option<String>,
    /// Reference to an already-uploaded supporting document.
    pub attachment: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct CancelLeave {
    #[schema(example = "plans changed")]
    pub cancellation_reason: String,
}

#[derive(Deserialize, ToSchema)]
pub struct DecideLeave {
    #[schema(example = "approved")]
    pub decision: LeaveDecision,
    #[schema(example = "approved, arrange a substitute", nullable = true)]
    pub admin_remark: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct BalanceView {
    #[schema(example = "casual")]
    pub leave_type: String,
    #[schema(example = 12.0)]
    pub total: f64,
    #[schema(example = 3.5)]
    pub used: f64,
    #[schema(example = 8.5)]
    pub available: f64,
}

const REQUEST_COLUMNS: &str = "SELECT id, teacher_id, leave_type, from_date, to_date, half_day, \
     half_day_session, reason, priority, status, total_days, contact_number, alternative_email, \
     attachment, admin_remark, cancellation_reason, reviewed_by, reviewed_at, created_at \
     FROM leave_requests";

async fn fetch_request(
    pool: &MySqlPool,
    request_id: u64,
) -> Result<Option<LeaveRequest>, sqlx::Error> {
    sqlx::query_as::<_, LeaveRequest>(&format!("{} WHERE id = ?", REQUEST_COLUMNS))
        .bind(request_id)
        .fetch_optional(pool)
        .await
}

/// Quota view covering every metered leave type, whether or not a
/// counter row exists yet.
async fn load_balances(
    pool: &MySqlPool,
    teacher_id: u64,
) -> Result<Vec<BalanceView>, sqlx::Error> {
    let rows: Vec<LeaveBalance> = sqlx::query_as(
        "SELECT teacher_id, leave_type, total, used FROM leave_balances WHERE teacher_id = ?",
    )
    .bind(teacher_id)
    .fetch_all(pool)
    .await?;

    let stored: HashMap<String, (f64, f64)> = rows
        .into_iter()
        .map(|b| (b.leave_type, (b.total, b.used)))
        .collect();

    let mut views = Vec::new();
    for leave_type in LeaveType::iter() {
        let (total, used) = stored
            .get(&leave_type.to_string())
            .copied()
            .unwrap_or((balance::default_quota(leave_type), 0.0));
        if total > 0.0 {
            views.push(BalanceView {
                leave_type: leave_type.to_string(),
                total,
                used,
                available: balance::available(total, used),
            });
        }
    }
    Ok(views)
}

/// Submit a leave application
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body = ApplyLeave,
    responses(
        (status = 201, description = "Request created in pending state", body = Object),
        (status = 400, description = "Invalid range, past start, missing reason or session"),
        (status = 409, description = "Overlaps an existing request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn apply_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    clock: web::Data<SystemClock>,
    payload: web::Json<ApplyLeave>,
) -> actix_web::Result<impl Responder> {
    let teacher_id = auth.teacher_profile()?;

    let mut tx = pool.begin().await.map_err(|e| {
        tracing::error!(error = %e, "Failed to open transaction");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    // lock the requester's open ranges so two submissions cannot slip
    // past the overlap check together
    let open_ranges: Vec<(NaiveDate, NaiveDate)> = sqlx::query_as(
        r#"
        SELECT from_date, to_date
        FROM leave_requests
        WHERE teacher_id = ? AND status IN ('pending', 'approved')
        FOR UPDATE
        "#,
    )
    .bind(teacher_id)
    .fetch_all(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!(error = %e, teacher_id, "Failed to fetch open leave ranges");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let submission = leave::Submission {
        from_date: payload.from_date,
        to_date: payload.to_date,
        half_day: payload.half_day,
        session: payload.session,
        reason: &payload.reason,
    };

    let total_days = match leave::validate_submit(&submission, clock.today(), &open_ranges) {
        Ok(days) => days,
        Err(e) => return Ok(error_response(&e)),
    };

    let result = sqlx::query(
        r#"
        INSERT INTO leave_requests
            (teacher_id, leave_type, from_date, to_date, half_day, half_day_session,
             reason, priority, status, total_days, contact_number, alternative_email, attachment)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, 'pending', ?, ?, ?, ?)
        "#,
    )
    .bind(teacher_id)
    .bind(payload.leave_type.to_string())
    .bind(payload.from_date)
    .bind(payload.to_date)
    .bind(payload.half_day)
    .bind(payload.session.map(|s| s.to_string()))
    .bind(payload.reason.trim())
    .bind(payload.priority.to_string())
    .bind(total_days)
    .bind(&payload.contact_number)
    .bind(&payload.alternative_email)
    .bind(&payload.attachment)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!(error = %e, teacher_id, "Failed to create leave request");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let request_id = result.last_insert_id();

    tx.commit().await.map_err(|e| {
        tracing::error!(error = %e, "Failed to commit leave request");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    // soft quota check only: over-quota submissions are allowed
    let stored: Option<(f64, f64)> = sqlx::query_as(
        "SELECT total, used FROM leave_balances WHERE teacher_id = ? AND leave_type = ?",
    )
    .bind(teacher_id)
    .bind(payload.leave_type.to_string())
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, teacher_id, "Failed to fetch balance");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let (total, used) =
        stored.unwrap_or((balance::default_quota(payload.leave_type), 0.0));
    let warning = balance::exceeds_quota(total, used, total_days).then(|| {
        format!(
            "this request exceeds your remaining {} leave balance",
            payload.leave_type
        )
    });

    notifier::leave_submitted(teacher_id, request_id, &payload.leave_type.to_string());

    let request = fetch_request(pool.get_ref(), request_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, request_id, "Failed to fetch created request");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Leave request submitted",
        "request": request,
        "warning": warning
    })))
}

/// The requester's leave history with stats and balance
#[utoipa::path(
    get,
    path = "/api/leave",
    responses(
        (status = 200, description = "Requests, summary stats and balance", body = Object),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn my_leaves(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let teacher_id = auth.teacher_profile()?;

    let requests: Vec<LeaveRequest> = sqlx::query_as(&format!(
        "{} WHERE teacher_id = ? ORDER BY created_at DESC",
        REQUEST_COLUMNS
    ))
    .bind(teacher_id)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, teacher_id, "Failed to fetch leave requests");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let stats = dashboard::summarize_statuses(
        requests
            .iter()
            .filter_map(|r| r.status.parse::<LeaveStatus>().ok()),
    );

    let balance = load_balances(pool.get_ref(), teacher_id).await.map_err(|e| {
        tracing::error!(error = %e, teacher_id, "Failed to fetch balances");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(json!({
        "data": requests,
        "stats": stats,
        "balance": balance
    })))
}

/// Current quota counters
#[utoipa::path(
    get,
    path = "/api/leave/balance",
    responses(
        (status = 200, description = "Balance per metered leave type", body = [BalanceView]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn get_balance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let teacher_id = auth.teacher_profile()?;

    let balance = load_balances(pool.get_ref(), teacher_id).await.map_err(|e| {
        tracing::error!(error = %e, teacher_id, "Failed to fetch balances");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(balance))
}

/// Withdraw a pending request
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/cancel",
    params(
        ("leave_id" = u64, Path, description = "Request to cancel")
    ),
    request_body = CancelLeave,
    responses(
        (status = 200, description = "Request cancelled", body = LeaveRequest),
        (status = 400, description = "Missing cancellation reason"),
        (status = 409, description = "Not pending or not the requester"),
        (status = 404, description = "Request not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn cancel_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<CancelLeave>,
) -> actix_web::Result<impl Responder> {
    let teacher_id = auth.teacher_profile()?;

    let leave_id = path.into_inner();
    let record = fetch_request(pool.get_ref(), leave_id).await.map_err(|e| {
        tracing::error!(error = %e, leave_id, "Failed to fetch leave request");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let Some(record) = record else {
        return Ok(HttpResponse::NotFound().json(json!({ "message": "Leave request not found" })));
    };

    let Ok(status) = record.status.parse::<LeaveStatus>() else {
        tracing::error!(leave_id, status = %record.status, "Stored status is not recognized");
        return Err(actix_web::error::ErrorInternalServerError(
            "Internal Server Error",
        ));
    };

    if let Err(e) = leave::validate_cancel(
        status,
        record.teacher_id,
        teacher_id,
        &payload.cancellation_reason,
    ) {
        return Ok(error_response(&e));
    }

    // pending requests never reserved balance, so no counter moves here
    let result = sqlx::query(
        r#"
        UPDATE leave_requests
        SET status = 'cancelled', cancellation_reason = ?
        WHERE id = ? AND status = 'pending'
        "#,
    )
    .bind(payload.cancellation_reason.trim())
    .bind(leave_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, leave_id, "Failed to cancel leave request");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(error_response(&LedgerError::state(
            "leave request was already processed",
        )));
    }

    let updated = fetch_request(pool.get_ref(), leave_id).await.map_err(|e| {
        tracing::error!(error = %e, leave_id, "Failed to fetch cancelled request");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(updated))
}

/// Approve or reject a pending request (admin)
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/decide",
    params(
        ("leave_id" = u64, Path, description = "Request to decide")
    ),
    request_body = DecideLeave,
    responses(
        (status = 200, description = "Request decided", body = LeaveRequest),
        (status = 409, description = "Request is not pending"),
        (status = 404, description = "Request not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn decide_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    clock: web::Data<SystemClock>,
    path: web::Path<u64>,
    payload: web::Json<DecideLeave>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let leave_id = path.into_inner();

    // decision and balance reservation are one atomic unit
    let mut tx = pool.begin().await.map_err(|e| {
        tracing::error!(error = %e, "Failed to open transaction");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let record: Option<LeaveRequest> =
        sqlx::query_as(&format!("{} WHERE id = ? FOR UPDATE", REQUEST_COLUMNS))
            .bind(leave_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, leave_id, "Failed to fetch leave request");
                actix_web::error::ErrorInternalServerError("Internal Server Error")
            })?;

    let Some(record) = record else {
        return Ok(HttpResponse::NotFound().json(json!({ "message": "Leave request not found" })));
    };

    let Ok(status) = record.status.parse::<LeaveStatus>() else {
        tracing::error!(leave_id, status = %record.status, "Stored status is not recognized");
        return Err(actix_web::error::ErrorInternalServerError(
            "Internal Server Error",
        ));
    };

    if let Err(e) = leave::validate_decide(status) {
        return Ok(error_response(&e));
    }

    let result = sqlx::query(
        r#"
        UPDATE leave_requests
        SET status = ?, admin_remark = ?, reviewed_by = ?, reviewed_at = ?
        WHERE id = ? AND status = 'pending'
        "#,
    )
    .bind(payload.decision.to_string())
    .bind(&payload.admin_remark)
    .bind(auth.user_id)
    .bind(clock.now())
    .bind(leave_id)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!(error = %e, leave_id, "Failed to record decision");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(error_response(&LedgerError::state(
            "leave request was already processed",
        )));
    }

    if payload.decision == LeaveDecision::Approved {
        let Ok(leave_type) = record.leave_type.parse::<LeaveType>() else {
            tracing::error!(leave_id, leave_type = %record.leave_type, "Stored leave type is not recognized");
            return Err(actix_web::error::ErrorInternalServerError(
                "Internal Server Error",
            ));
        };

        // first approval of a type seeds the counter row; the increment
        // itself is an atomic read-modify-write
        sqlx::query(
            r#"
            INSERT INTO leave_balances (teacher_id, leave_type, total, used)
            VALUES (?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE used = used + VALUES(used)
            "#,
        )
        .bind(record.teacher_id)
        .bind(&record.leave_type)
        .bind(balance::default_quota(leave_type))
        .bind(record.total_days)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, leave_id, "Failed to reserve leave balance");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;
    }

    tx.commit().await.map_err(|e| {
        tracing::error!(error = %e, "Failed to commit decision");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    notifier::leave_decided(record.teacher_id, leave_id, payload.decision);

    let updated = fetch_request(pool.get_ref(), leave_id).await.map_err(|e| {
        tracing::error!(error = %e, leave_id, "Failed to fetch decided request");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(updated))
}
