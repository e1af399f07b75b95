use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Holiday {
    pub id: u64,
    #[schema(example = "Independence Day")]
    pub name: String,
    #[schema(value_type = String, format = Date, example = "2026-03-26")]
    pub date: NaiveDate,
    #[schema(nullable = true)]
    pub description: Option<String>,
    pub is_optional: bool,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime<Utc>,
}

impl Holiday {
    pub const TABLE: &'static str = "holidays";
    pub const COLUMNS: &'static str = "id, name, date, description, is_optional, created_at";
    pub const UPDATABLE: &'static [&'static str] = &["name", "date", "description", "is_optional"];
}
