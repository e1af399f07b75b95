use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Notification {
    pub id: u64,
    pub employee_id: u64,
    #[schema(example = "Your leave request #12 was approved")]
    pub message: String,
    #[schema(example = "/leaves/12", nullable = true)]
    pub link: Option<String>,
    pub is_read: bool,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub const TABLE: &'static str = "notifications";
    pub const COLUMNS: &'static str = "id, employee_id, message, link, is_read, created_at";
}
