use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Department {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "Finance")]
    pub name: String,
    #[schema(example = "FIN", nullable = true)]
    pub code: Option<String>,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime<Utc>,
}

impl Department {
    pub const TABLE: &'static str = "departments";
    pub const COLUMNS: &'static str = "id, name, code, created_at";
    pub const UPDATABLE: &'static [&'static str] = &["name", "code"];
}
