pub mod attendance;
pub mod dashboard;
pub mod leave;
pub mod student;

use actix_web::HttpResponse;
use serde_json::json;

use crate::ledger::error::LedgerError;

/// Wire mapping of the ledger failure taxonomy: bad input is 400, range
/// conflicts and illegal transitions both surface as 409 for manual
/// resolution. State never changed when one of these is returned.
pub fn error_response(err: &LedgerError) -> HttpResponse {
    match err {
        LedgerError::Validation(msg) => HttpResponse::BadRequest().json(json!({ "message": msg })),
        LedgerError::Conflict(msg) => HttpResponse::Conflict().json(json!({ "message": msg })),
        LedgerError::State(msg) => HttpResponse::Conflict().json(json!({ "message": msg })),
    }
}
