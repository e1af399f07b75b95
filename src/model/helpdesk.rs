use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct HelpdeskTicket {
    pub id: u64,
    pub employee_id: u64,
    #[schema(example = "Payslip not generated")]
    pub subject: String,
    pub description: String,
    #[schema(example = "payroll", nullable = true)]
    pub category: Option<String>,
    /// open | resolved
    #[schema(example = "open")]
    pub status: String,
    #[schema(nullable = true)]
    pub reply: Option<String>,
    /// User id that resolved the ticket
    #[schema(nullable = true)]
    pub resolved_by: Option<u64>,
    #[schema(value_type = Option<String>, format = DateTime, nullable = true)]
    pub resolved_at: Option<DateTime<Utc>>,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime<Utc>,
}

impl HelpdeskTicket {
    pub const TABLE: &'static str = "helpdesk_tickets";
    pub const COLUMNS: &'static str = "id, employee_id, subject, description, category, status, \
         reply, resolved_by, resolved_at, created_at";

    pub const OPEN: &'static str = "open";
    pub const RESOLVED: &'static str = "resolved";
}
