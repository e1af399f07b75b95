use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Variable allowance claimed for a single month (overtime, night shift, ...).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Allowance {
    pub id: u64,
    pub employee_id: u64,
    #[schema(example = 3)]
    pub month: u32,
    #[schema(example = 2026)]
    pub year: u32,
    #[schema(example = "Overtime")]
    pub name: String,
    #[schema(example = 2500.0)]
    pub amount: f64,
    #[schema(nullable = true)]
    pub description: Option<String>,
    #[schema(example = "pending")]
    pub status: String,
    #[schema(nullable = true)]
    pub remarks: Option<String>,
    #[schema(nullable = true)]
    pub actioned_by: Option<u64>,
    #[schema(value_type = Option<String>, format = DateTime, nullable = true)]
    pub actioned_at: Option<DateTime<Utc>>,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime<Utc>,
}

impl Allowance {
    pub const TABLE: &'static str = "allowances";
    pub const COLUMNS: &'static str = "id, employee_id, month, year, name, amount, description, \
         status, remarks, actioned_by, actioned_at, created_at";
    pub const UPDATABLE: &'static [&'static str] =
        &["month", "year", "name", "amount", "description"];
}
