use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct FixedAllowance {
    pub id: u64,
    pub employee_id: u64,
    pub month: u32,
    pub year: u32,
    #[schema(example = "Telephone")]
    pub name: String,
    #[schema(example = 1000.0)]
    pub amount: f64,
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

impl FixedAllowance {
    pub const TABLE: &'static str = "fixed_allowances";
    pub const COLUMNS: &'static str = "id, employee_id, month, year, name, amount, status, \
         remarks, actioned_by, actioned_at, created_at";
    pub const UPDATABLE: &'static [&'static str] = &["month", "year", "name", "amount"];
}
