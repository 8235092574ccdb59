use std::collections::HashSet;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::error::LedgerError;
use crate::model::attendance::AttendanceStatus;

/// Hours after creation during which a record may be corrected without a
/// reason. Past the window the reason becomes the audit trail and is
/// mandatory.
pub const EDIT_LOCK_HOURS: i64 = 24;

/// One roster entry of a day's submission.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct MarkEntry {
    #[schema(example = 101)]
    pub student_id: u64,
    #[schema(example = "present")]
    pub status: AttendanceStatus,
}

/// A record ready for insertion. All records of one submission share the
/// same creation instant.
#[derive(Debug, Clone, Copy)]
pub struct NewAttendanceRecord {
    pub student_id: u64,
    pub class_id: u64,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub created_at: DateTime<Utc>,
}

/// Checks a day's submission against the stored class roster: the date
/// must not lie in the future and the entries must cover the roster
/// exactly, one entry per student. An empty roster with no entries is a
/// valid no-op.
pub fn validate_roster(
    roster: &[u64],
    entries: &[MarkEntry],
    date: NaiveDate,
    today: NaiveDate,
) -> Result<(), LedgerError> {
    if date > today {
        return Err(LedgerError::validation(
            "attendance date cannot be in the future",
        ));
    }

    let roster_ids: HashSet<u64> = roster.iter().copied().collect();
    let mut seen = HashSet::with_capacity(entries.len());

    for entry in entries {
        if !roster_ids.contains(&entry.student_id) {
            return Err(LedgerError::validation(format!(
                "student {} is not part of this class",
                entry.student_id
            )));
        }
        if !seen.insert(entry.student_id) {
            return Err(LedgerError::validation(format!(
                "student {} appears more than once",
                entry.student_id
            )));
        }
    }

    for id in &roster_ids {
        if !seen.contains(id) {
            return Err(LedgerError::validation(format!(
                "attendance entry for student {} is missing",
                id
            )));
        }
    }

    Ok(())
}

pub fn build_records(
    class_id: u64,
    date: NaiveDate,
    entries: &[MarkEntry],
    now: DateTime<Utc>,
) -> Vec<NewAttendanceRecord> {
    entries
        .iter()
        .map(|entry| NewAttendanceRecord {
            student_id: entry.student_id,
            class_id,
            date,
            status: entry.status,
            created_at: now,
        })
        .collect()
}

/// Lock-window rule for corrections: within the window a reason is
/// optional (stored when given), afterwards a non-empty reason is
/// required before the status may change.
pub fn check_editable(
    created_at: DateTime<Utc>,
    reason: Option<&str>,
    now: DateTime<Utc>,
) -> Result<(), LedgerError> {
    let has_reason = reason.map(str::trim).is_some_and(|r| !r.is_empty());
    if is_locked(created_at, now) && !has_reason {
        return Err(LedgerError::validation(format!(
            "record is older than {} hours, a correction reason is required",
            EDIT_LOCK_HOURS
        )));
    }
    Ok(())
}

/// Display flag: the record left its edit window.
pub fn is_locked(created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now.signed_duration_since(created_at) > Duration::hours(EDIT_LOCK_HOURS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn entry(student_id: u64, status: AttendanceStatus) -> MarkEntry {
        MarkEntry { student_id, status }
    }

    #[test]
    fn full_roster_passes_and_builds_one_record_per_student() {
        let roster = [1, 2, 3];
        let entries = [
            entry(1, AttendanceStatus::Present),
            entry(2, AttendanceStatus::Absent),
            entry(3, AttendanceStatus::Late),
        ];
        let today = date(2024, 1, 1);

        validate_roster(&roster, &entries, today, today).unwrap();

        let now = at(2024, 1, 1, 9, 0);
        let records = build_records(12, today, &entries, now);
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.created_at == now && r.class_id == 12));
    }

    #[test]
    fn future_date_is_rejected() {
        let err = validate_roster(
            &[1],
            &[entry(1, AttendanceStatus::Present)],
            date(2024, 1, 2),
            date(2024, 1, 1),
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[test]
    fn short_entry_list_is_rejected() {
        let err = validate_roster(
            &[1, 2],
            &[entry(1, AttendanceStatus::Present)],
            date(2024, 1, 1),
            date(2024, 1, 1),
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[test]
    fn unknown_student_is_rejected() {
        let err = validate_roster(
            &[1],
            &[
                entry(1, AttendanceStatus::Present),
                entry(9, AttendanceStatus::Present),
            ],
            date(2024, 1, 1),
            date(2024, 1, 1),
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[test]
    fn duplicated_student_is_rejected() {
        let err = validate_roster(
            &[1, 2],
            &[
                entry(1, AttendanceStatus::Present),
                entry(1, AttendanceStatus::Absent),
            ],
            date(2024, 1, 1),
            date(2024, 1, 1),
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[test]
    fn empty_class_is_a_noop_success() {
        validate_roster(&[], &[], date(2024, 1, 1), date(2024, 1, 1)).unwrap();
        assert!(build_records(12, date(2024, 1, 1), &[], at(2024, 1, 1, 9, 0)).is_empty());
    }

    #[test]
    fn stale_record_requires_a_reason() {
        // Marked 2024-01-01 09:00, corrected 25 hours later.
        let created = at(2024, 1, 1, 9, 0);
        let now = at(2024, 1, 2, 10, 0);

        let err = check_editable(created, None, now).unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
        assert!(check_editable(created, Some("   "), now).is_err());

        check_editable(created, Some("late correction"), now).unwrap();
    }

    #[test]
    fn fresh_record_is_editable_without_a_reason() {
        let created = at(2024, 1, 1, 9, 0);
        let now = at(2024, 1, 1, 15, 0);
        check_editable(created, None, now).unwrap();
    }

    #[test]
    fn lock_flag_flips_after_the_window() {
        let created = at(2024, 1, 1, 9, 0);
        assert!(!is_locked(created, at(2024, 1, 2, 9, 0)));
        assert!(is_locked(created, at(2024, 1, 2, 9, 30)));
    }
}
