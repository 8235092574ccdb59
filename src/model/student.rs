use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "roll_no": "7A-014",
        "first_name": "Ayesha",
        "last_name": "Rahman",
        "class_id": 12,
        "guardian_contact": "+8801712345678",
        "attendance_percentage": 91.5
    })
)]
pub struct Student {
    #[schema(example = 1)]
    pub id: u64,

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

    /// Rolling percentage maintained by the analytics job, read-only here.
    #[schema(example = 91.5)]
    pub attendance_percentage: f64,
}
