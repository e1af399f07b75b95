use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct User {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "jdoe")]
    pub username: String,
    #[schema(example = "john.doe@company.com")]
    pub email: String,
    /// 1 admin, 2 hr, 3 employee, 4 accounts, 5 lead
    #[schema(example = 3)]
    pub role_id: u8,
    pub is_active: bool,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime<Utc>,
}

impl User {
    pub const TABLE: &'static str = "users";
    pub const COLUMNS: &'static str = "id, username, email, role_id, is_active, created_at";
    pub const UPDATABLE: &'static [&'static str] = &["username", "email", "role_id", "is_active"];
}
