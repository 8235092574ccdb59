//! Fire-and-forget notifications at the ledger boundary. Delivery is an
//! external collaborator's job; nothing here affects the outcome of the
//! transaction that triggered it, so a lost notification only logs.

use tracing::info;

use crate::model::leave_request::LeaveDecision;

pub fn leave_submitted(teacher_id: u64, request_id: u64, leave_type: &str) {
    info!(
        teacher_id,
        request_id, leave_type, "leave request submitted, queueing admin notification"
    );
}

pub fn leave_decided(teacher_id: u64, request_id: u64, decision: LeaveDecision) {
    info!(
        teacher_id,
        request_id,
        decision = %decision,
        "leave request decided, queueing requester notification"
    );
}
