use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct SchoolClass {
    pub id: u64,
    pub name: String,
    pub section: String,
    /// Class teacher responsible for the daily roster.
    pub teacher_id: u64,
}
