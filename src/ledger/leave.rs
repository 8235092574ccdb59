use chrono::NaiveDate;

use super::error::LedgerError;
use crate::model::leave_request::{HalfDaySession, LeaveStatus};

/// Inclusive day span of the range, minus half a day for half-day leave.
pub fn total_days(from: NaiveDate, to: NaiveDate, half_day: bool) -> f64 {
    let span = (to - from).num_days() as f64 + 1.0;
    if half_day { span - 0.5 } else { span }
}

/// Two ranges conflict when they share at least one calendar day.
pub fn overlaps(
    new_from: NaiveDate,
    new_to: NaiveDate,
    existing_from: NaiveDate,
    existing_to: NaiveDate,
) -> bool {
    new_from <= existing_to && new_to >= existing_from
}

/// Open requests hold their range against new submissions; rejected and
/// cancelled ones free theirs.
pub fn blocks_new_requests(status: LeaveStatus) -> bool {
    matches!(status, LeaveStatus::Pending | LeaveStatus::Approved)
}

/// Everything the submission rules need to see of a new application.
#[derive(Debug)]
pub struct Submission<'a> {
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub half_day: bool,
    pub session: Option<HalfDaySession>,
    pub reason: &'a str,
}

/// Validates a new application against the requester's open requests and
/// returns the day count it will consume. `open_ranges` must already be
/// filtered to Pending/Approved requests.
pub fn validate_submit(
    submission: &Submission,
    today: NaiveDate,
    open_ranges: &[(NaiveDate, NaiveDate)],
) -> Result<f64, LedgerError> {
    if submission.from_date > submission.to_date {
        return Err(LedgerError::validation("from_date cannot be after to_date"));
    }
    if submission.from_date < today {
        return Err(LedgerError::validation("leave cannot start in the past"));
    }
    if submission.reason.trim().is_empty() {
        return Err(LedgerError::validation("a reason is required"));
    }
    if submission.half_day && submission.session.is_none() {
        return Err(LedgerError::validation(
            "half-day leave requires a session (first or second half)",
        ));
    }

    for (existing_from, existing_to) in open_ranges {
        if overlaps(
            submission.from_date,
            submission.to_date,
            *existing_from,
            *existing_to,
        ) {
            return Err(LedgerError::conflict(format!(
                "overlaps an existing leave request ({} to {})",
                existing_from, existing_to
            )));
        }
    }

    Ok(total_days(
        submission.from_date,
        submission.to_date,
        submission.half_day,
    ))
}

/// Cancellation is a requester-only move out of Pending, with a reason.
pub fn validate_cancel(
    status: LeaveStatus,
    requester_id: u64,
    caller_id: u64,
    reason: &str,
) -> Result<(), LedgerError> {
    if caller_id != requester_id {
        return Err(LedgerError::state(
            "only the requester may cancel a leave request",
        ));
    }
    if status != LeaveStatus::Pending {
        return Err(LedgerError::state(format!(
            "only a pending request can be cancelled (current status: {})",
            status
        )));
    }
    if reason.trim().is_empty() {
        return Err(LedgerError::validation("a cancellation reason is required"));
    }
    Ok(())
}

/// Approve/Reject leave Pending only; the three terminal states admit no
/// further transitions.
pub fn validate_decide(status: LeaveStatus) -> Result<(), LedgerError> {
    if status != LeaveStatus::Pending {
        return Err(LedgerError::state(format!(
            "only a pending request can be decided (current status: {})",
            status
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn submission(from: NaiveDate, to: NaiveDate) -> Submission<'static> {
        Submission {
            from_date: from,
            to_date: to,
            half_day: false,
            session: None,
            reason: "family function",
        }
    }

    #[test]
    fn day_count_is_inclusive() {
        assert_eq!(total_days(date(2024, 3, 10), date(2024, 3, 12), false), 3.0);
        assert_eq!(total_days(date(2024, 3, 10), date(2024, 3, 10), false), 1.0);
    }

    #[test]
    fn half_day_subtracts_half() {
        assert_eq!(total_days(date(2024, 3, 10), date(2024, 3, 10), true), 0.5);
        assert_eq!(total_days(date(2024, 3, 10), date(2024, 3, 12), true), 2.5);
    }

    #[test]
    fn shared_boundary_day_conflicts() {
        // 03-10..03-12 is already open; 03-12..03-14 shares day 03-12.
        let open = [(date(2024, 3, 10), date(2024, 3, 12))];
        let err = validate_submit(
            &submission(date(2024, 3, 12), date(2024, 3, 14)),
            date(2024, 3, 1),
            &open,
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::Conflict(_)));
    }

    #[test]
    fn disjoint_range_is_accepted() {
        let open = [(date(2024, 3, 10), date(2024, 3, 12))];
        let days = validate_submit(
            &submission(date(2024, 3, 13), date(2024, 3, 14)),
            date(2024, 3, 1),
            &open,
        )
        .unwrap();
        assert_eq!(days, 2.0);
    }

    #[test]
    fn inverted_range_is_rejected() {
        let err = validate_submit(
            &submission(date(2024, 3, 14), date(2024, 3, 12)),
            date(2024, 3, 1),
            &[],
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[test]
    fn past_start_is_rejected() {
        let err = validate_submit(
            &submission(date(2024, 2, 28), date(2024, 3, 2)),
            date(2024, 3, 1),
            &[],
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[test]
    fn blank_reason_is_rejected() {
        let mut sub = submission(date(2024, 3, 10), date(2024, 3, 12));
        sub.reason = "  ";
        let err = validate_submit(&sub, date(2024, 3, 1), &[]).unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[test]
    fn half_day_without_session_is_rejected() {
        let mut sub = submission(date(2024, 3, 10), date(2024, 3, 10));
        sub.half_day = true;
        let err = validate_submit(&sub, date(2024, 3, 1), &[]).unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));

        sub.session = Some(HalfDaySession::FirstHalf);
        assert_eq!(validate_submit(&sub, date(2024, 3, 1), &[]).unwrap(), 0.5);
    }

    #[test]
    fn only_open_statuses_block() {
        assert!(blocks_new_requests(LeaveStatus::Pending));
        assert!(blocks_new_requests(LeaveStatus::Approved));
        assert!(!blocks_new_requests(LeaveStatus::Rejected));
        assert!(!blocks_new_requests(LeaveStatus::Cancelled));
    }

    #[test]
    fn cancel_is_pending_and_requester_only() {
        validate_cancel(LeaveStatus::Pending, 7, 7, "plans changed").unwrap();

        let err = validate_cancel(LeaveStatus::Approved, 7, 7, "plans changed").unwrap_err();
        assert!(matches!(err, LedgerError::State(_)));

        let err = validate_cancel(LeaveStatus::Pending, 7, 8, "plans changed").unwrap_err();
        assert!(matches!(err, LedgerError::State(_)));

        let err = validate_cancel(LeaveStatus::Pending, 7, 7, "").unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[test]
    fn decided_requests_are_terminal() {
        validate_decide(LeaveStatus::Pending).unwrap();
        for terminal in [
            LeaveStatus::Approved,
            LeaveStatus::Rejected,
            LeaveStatus::Cancelled,
        ] {
            assert!(matches!(
                validate_decide(terminal).unwrap_err(),
                LedgerError::State(_)
            ));
        }
    }
}
