use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

/// Leave categories accepted on a leave application.
#[derive(
    Debug,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveType {
    /// Earned leave
    El,
    /// Sick leave
    Sl,
    /// Casual leave
    Cl,
    /// On duty
    Od,
    /// Leave without pay
    Lwp,
    /// Half-day leave
    Lhd,
    Others,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Leave {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "cl")]
    pub leave_type: String,
    #[schema(value_type = String, format = Date, example = "2026-01-05")]
    pub start_date: NaiveDate,
    #[schema(value_type = String, example = "09:30:00")]
    pub start_time: NaiveTime,
    #[schema(value_type = String, format = Date, example = "2026-01-05")]
    pub end_date: NaiveDate,
    #[schema(value_type = String, example = "13:30:00")]
    pub end_time: NaiveTime,
    #[schema(example = 0.5)]
    pub days: f64,
    #[schema(nullable = true)]
    pub reason: Option<String>,
    #[schema(example = "pending")]
    pub status: String,
    #[schema(nullable = true)]
    pub remarks: Option<String>,
    /// User id of the approver
    #[schema(nullable = true)]
    pub actioned_by: Option<u64>,
    #[schema(value_type = Option<String>, format = DateTime, nullable = true)]
    pub actioned_at: Option<DateTime<Utc>>,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime<Utc>,
}

impl Leave {
    pub const TABLE: &'static str = "leaves";
    pub const COLUMNS: &'static str = "id, employee_id, leave_type, start_date, start_time, \
         end_date, end_time, days, reason, status, remarks, actioned_by, actioned_at, created_at";
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn accepts_only_known_codes() {
        let codes: Vec<String> = LeaveType::iter().map(|t| t.to_string()).collect();
        assert_eq!(codes, ["el", "sl", "cl", "od", "lwp", "lhd", "others"]);

        assert_eq!(LeaveType::from_str("lwp").unwrap(), LeaveType::Lwp);
        assert!(LeaveType::from_str("annual").is_err());
        assert!(serde_json::from_str::<LeaveType>("\"maternity\"").is_err());
    }
}
