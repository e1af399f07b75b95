use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "user_id": 4,
        "department_id": 10,
        "employee_code": "EMP-001",
        "first_name": "John",
        "last_name": "Doe",
        "email": "john.doe@company.com",
        "phone": "+8801712345678",
        "designation": "Accountant",
        "reporting_to": 7,
        "doj": "2024-01-01",
        "dol": null,
        "created_at": "2024-01-01T00:00:00Z"
    })
)]
pub struct Employee {
    pub id: u64,
    #[schema(nullable = true)]
    pub user_id: Option<u64>,
    #[schema(nullable = true)]
    pub department_id: Option<u64>,
    pub employee_code: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[schema(nullable = true)]
    pub phone: Option<String>,
    #[schema(nullable = true)]
    pub designation: Option<String>,
    /// Employee id of the lead this employee reports to
    #[schema(nullable = true)]
    pub reporting_to: Option<u64>,
    /// Date of joining
    #[schema(value_type = String, format = Date)]
    pub doj: NaiveDate,
    /// Date of leaving
    #[schema(value_type = Option<String>, format = Date, nullable = true)]
    pub dol: Option<NaiveDate>,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime<Utc>,
}

impl Employee {
    pub const TABLE: &'static str = "employees";
    pub const COLUMNS: &'static str = "id, user_id, department_id, employee_code, first_name, \
         last_name, email, phone, designation, reporting_to, doj, dol, created_at";
    pub const UPDATABLE: &'static [&'static str] = &[
        "user_id",
        "department_id",
        "employee_code",
        "first_name",
        "last_name",
        "email",
        "phone",
        "designation",
        "reporting_to",
        "doj",
        "dol",
    ];
}
