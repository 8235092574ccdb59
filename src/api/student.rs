use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sqlx::MySqlPool;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::model::student::Student;
use crate::utils::db_utils::{build_update_sql, execute_update};

#[derive(Deserialize, Serialize, ToSchema)]
pub struct CreateStudent {
    #[schema(example = "7A-014")]
    pub roll_no: String,
    #[schema(example = "Ayesha")]
    pub first_name: String,
    #[schema(example = "Rahman")]
    pub last_name: String,
    #[schema(example = 12)]
    pub class_id: u64,
    #[schema(example = "+8801712345678", nullable = true)]
    pub guardian_contact: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct StudentQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub class_id: Option<u64>,
    pub search: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct StudentListResponse {
    pub data: Vec<Student>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 42)]
    pub total: i64,
}

/// Documented shape of the partial-update payload; the handler itself
/// accepts raw JSON and lets the column whitelist do the filtering.
#[derive(Deserialize, ToSchema)]
pub struct UpdateStudent {
    pub roll_no: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub class_id: Option<u64>,
    pub guardian_contact: Option<String>,
}

// Helper enum for typed SQLx binding
enum FilterValue<'a> {
    U64(u64),
    Str(&'a str),
}

/// Columns the dynamic update endpoint may touch.
const STUDENT_UPDATE_COLUMNS: &[&str] = &[
    "roll_no",
    "first_name",
    "last_name",
    "class_id",
    "guardian_contact",
];

/// Enroll a student (admin)
#[utoipa::path(
    post,
    path = "/api/students",
    request_body = CreateStudent,
    responses(
        (status = 201, description = "Student enrolled"),
        (status = 409, description = "Roll number already in use for this class"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Students"
)]
pub async fn create_student(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateStudent>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let result = sqlx::query(
        r#"
        INSERT INTO students (roll_no, first_name, last_name, class_id, guardian_contact)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&payload.roll_no)
    .bind(&payload.first_name)
    .bind(&payload.last_name)
    .bind(payload.class_id)
    .bind(&payload.guardian_contact)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(_) => Ok(HttpResponse::Created().json(json!({
            "message": "Student enrolled successfully"
        }))),
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23000") {
                    return Ok(HttpResponse::Conflict().json(json!({
                        "message": "Roll number already in use for this class"
                    })));
                }
            }
            error!(error = %e, "Failed to enroll student");
            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Something went wrong, contact the system admin"
            })))
        }
    }
}

/// Paginated roster listing
#[utoipa::path(
    get,
    path = "/api/students",
    params(StudentQuery),
    responses(
        (status = 200, description = "Paginated student list", body = StudentListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Students"
)]
pub async fn list_students(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<StudentQuery>,
) -> actix_web::Result<impl Responder> {
    auth.teacher_profile()?;

    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    if let Some(class_id) = query.class_id {
        where_sql.push_str(" AND class_id = ?");
        args.push(FilterValue::U64(class_id));
    }

    let search_pattern;
    if let Some(search) = query.search.as_deref() {
        where_sql.push_str(" AND (first_name LIKE ? OR last_name LIKE ? OR roll_no LIKE ?)");
        search_pattern = format!("%{}%", search);
        args.push(FilterValue::Str(&search_pattern));
        args.push(FilterValue::Str(&search_pattern));
        args.push(FilterValue::Str(&search_pattern));
    }

    let count_sql = format!("SELECT COUNT(*) FROM students{}", where_sql);

    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Str(s) => count_q.bind(*s),
        };
    }

    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to count students");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let data_sql = format!(
        r#"
        SELECT id, roll_no, first_name, last_name, class_id, guardian_contact,
               attendance_percentage
        FROM students
        {}
        ORDER BY class_id, roll_no
        LIMIT ? OFFSET ?
        "#,
        where_sql
    );

    let mut data_q = sqlx::query_as::<_, Student>(&data_sql);
    for arg in args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(v),
            FilterValue::Str(s) => data_q.bind(s),
        };
    }

    let students = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to fetch student list");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(StudentListResponse {
        data: students,
        page,
        per_page,
        total,
    }))
}

/// Single student profile
#[utoipa::path(
    get,
    path = "/api/students/{student_id}",
    params(
        ("student_id" = u64, Path, description = "Student to fetch")
    ),
    responses(
        (status = 200, description = "Student found", body = Student),
        (status = 404, description = "Student not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Students"
)]
pub async fn get_student(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.teacher_profile()?;

    let student_id = path.into_inner();
    let student = sqlx::query_as::<_, Student>(
        r#"
        SELECT id, roll_no, first_name, last_name, class_id, guardian_contact,
               attendance_percentage
        FROM students
        WHERE id = ?
        "#,
    )
    .bind(student_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, student_id, "Failed to fetch student");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    match student {
        Some(data) => Ok(HttpResponse::Ok().json(data)),
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": "Student not found"
        }))),
    }
}

/// Partial profile update (admin)
#[utoipa::path(
    put,
    path = "/api/students/{student_id}",
    params(
        ("student_id" = u64, Path, description = "Student to update")
    ),
    request_body = UpdateStudent,
    responses(
        (status = 200, description = "Student updated"),
        (status = 400, description = "Unknown column or empty payload"),
        (status = 404, description = "Student not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Students"
)]
pub async fn update_student(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let student_id = path.into_inner();
    let update = build_update_sql(
        "students",
        &payload,
        STUDENT_UPDATE_COLUMNS,
        "id",
        student_id as i64,
    )?;

    let affected = execute_update(pool.get_ref(), update).await.map_err(|e| {
        error!(error = %e, student_id, "Failed to update student");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if affected == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Student not found"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Student updated successfully"
    })))
}
