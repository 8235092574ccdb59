use crate::api::attendance::{AttendanceView, MarkAttendance, UpdateAttendance};
use crate::api::leave::{ApplyLeave, BalanceView, CancelLeave, DecideLeave};
use crate::api::student::{CreateStudent, StudentListResponse, UpdateStudent};
use crate::ledger::attendance::MarkEntry;
use crate::ledger::dashboard::{DashboardSummary, LeaveStats};
use crate::model::attendance::AttendanceStatus;
use crate::model::leave_request::{
    HalfDaySession, LeaveDecision, LeavePriority, LeaveRequest, LeaveStatus, LeaveType,
};
use crate::model::school_class::SchoolClass;
use crate::model::student::Student;
use crate::models::{LoginReq, RegisterReq};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "School Administration API",
        version = "1.0.0",
        description = r#"
## School Administration Portal

This API powers a school-administration portal covering the daily duties
of teachers and administrators.

### Key Features
- **Attendance**
  - Submit a class's daily roster in one shot
  - Correct individual records, with an audit reason once the 24h window closes
  - Stash unsent roster drafts per class and date
- **Leave**
  - Apply for leave (full or half day), track status and balances
  - Cancel pending requests, admin approve/reject with remarks
- **Dashboard**
  - Pending-attendance, today's percentage and weak-student counters
- **Students**
  - Enroll, list, and update roster profiles

### Security
Endpoints are protected with **JWT Bearer authentication**; administrator
operations additionally require the Admin role.

### Response Format
- JSON-based RESTful responses
- Pagination supported for list endpoints

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::attendance::mark_attendance,
        crate::api::attendance::update_attendance,
        crate::api::attendance::attendance_by_class,
        crate::api::attendance::my_classes,
        crate::api::attendance::save_draft,
        crate::api::attendance::get_draft,

        crate::api::leave::apply_leave,
        crate::api::leave::my_leaves,
        crate::api::leave::get_balance,
        crate::api::leave::cancel_leave,
        crate::api::leave::decide_leave,

        crate::api::dashboard::summary,

        crate::api::student::create_student,
        crate::api::student::list_students,
        crate::api::student::get_student,
        crate::api::student::update_student
    ),
    components(
        schemas(
            MarkAttendance,
            UpdateAttendance,
            AttendanceView,
            MarkEntry,
            AttendanceStatus,
            ApplyLeave,
            CancelLeave,
            DecideLeave,
            BalanceView,
            LeaveRequest,
            LeaveType,
            LeaveStatus,
            HalfDaySession,
            LeavePriority,
            LeaveDecision,
            DashboardSummary,
            LeaveStats,
            CreateStudent,
            UpdateStudent,
            Student,
            SchoolClass,
            StudentListResponse,
            RegisterReq,
            LoginReq
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Attendance", description = "Daily attendance APIs"),
        (name = "Leave", description = "Leave application APIs"),
        (name = "Dashboard", description = "Teacher dashboard APIs"),
        (name = "Students", description = "Student roster APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
