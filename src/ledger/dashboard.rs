use serde::Serialize;
use utoipa::ToSchema;

use crate::model::leave_request::LeaveStatus;

/// Rolling attendance percentage below which a student counts as weak.
pub const WEAK_ATTENDANCE_THRESHOLD: f64 = 75.0;

/// Read-only projection for a teacher's landing page. Assembled from
/// counts the handler reads; nothing here writes.
#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardSummary {
    /// Classes of this teacher with no attendance set for today.
    #[schema(example = 2)]
    pub pending_attendance: i64,
    /// Present share of today's marked records, 0.0 when none are marked.
    #[schema(example = 87.5)]
    pub today_attendance_percentage: f64,
    #[schema(example = 4)]
    pub weak_students_count: i64,
    #[schema(example = 1)]
    pub pending_leave_requests: i64,
}

pub fn attendance_percentage(present: i64, marked: i64) -> f64 {
    if marked <= 0 {
        return 0.0;
    }
    present as f64 * 100.0 / marked as f64
}

/// Per-status counters over a requester's leave history. Cancelled
/// requests count toward the total only.
#[derive(Debug, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct LeaveStats {
    pub total: i64,
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
}

pub fn summarize_statuses(statuses: impl IntoIterator<Item = LeaveStatus>) -> LeaveStats {
    let mut stats = LeaveStats::default();
    for status in statuses {
        stats.total += 1;
        match status {
            LeaveStatus::Pending => stats.pending += 1,
            LeaveStatus::Approved => stats.approved += 1,
            LeaveStatus::Rejected => stats.rejected += 1,
            LeaveStatus::Cancelled => {}
        }
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_is_zero_when_nothing_is_marked() {
        assert_eq!(attendance_percentage(0, 0), 0.0);
    }

    #[test]
    fn percentage_is_present_over_marked() {
        assert_eq!(attendance_percentage(7, 8), 87.5);
        assert_eq!(attendance_percentage(8, 8), 100.0);
    }

    #[test]
    fn stats_count_every_status_toward_total() {
        let stats = summarize_statuses([
            LeaveStatus::Pending,
            LeaveStatus::Approved,
            LeaveStatus::Approved,
            LeaveStatus::Rejected,
            LeaveStatus::Cancelled,
        ]);
        assert_eq!(
            stats,
            LeaveStats {
                total: 5,
                pending: 1,
                approved: 2,
                rejected: 1,
            }
        );
    }
}
