use serde::{Deserialize, Serialize};

/// Stored quota counters, one row per (teacher, leave type). Rows are
/// seeded lazily on the first approval of that type.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct LeaveBalance {
    pub teacher_id: u64,
    pub leave_type: String,
    pub total: f64,
    pub used: f64,
}
