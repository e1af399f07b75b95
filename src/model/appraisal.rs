use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AppraisalStatus {
    Draft,
    Submitted,
    Reviewed,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Appraisal {
    pub id: u64,
    pub employee_id: u64,
    /// Employee id of the reviewer
    #[schema(nullable = true)]
    pub reviewer_id: Option<u64>,
    #[schema(example = "2025-26")]
    pub period: String,
    #[schema(example = 4.0, nullable = true)]
    pub self_rating: Option<f64>,
    #[schema(example = 3.5, nullable = true)]
    pub manager_rating: Option<f64>,
    #[schema(nullable = true)]
    pub achievements: Option<String>,
    #[schema(nullable = true)]
    pub comments: Option<String>,
    #[schema(example = "draft")]
    pub status: String,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime<Utc>,
}

impl Appraisal {
    pub const TABLE: &'static str = "appraisals";
    pub const COLUMNS: &'static str = "id, employee_id, reviewer_id, period, self_rating, \
         manager_rating, achievements, comments, status, created_at";
    pub const OWNER_UPDATABLE: &'static [&'static str] = &["period", "self_rating", "achievements"];

    pub fn status(&self) -> Option<AppraisalStatus> {
        self.status.parse().ok()
    }
}

pub const MIN_RATING: f64 = 1.0;
pub const MAX_RATING: f64 = 5.0;

pub fn validate_rating(field: &str, rating: Option<f64>) -> Result<(), String> {
    match rating {
        Some(r) if !(MIN_RATING..=MAX_RATING).contains(&r) => Err(format!(
            "{field} must be between {MIN_RATING} and {MAX_RATING}"
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_range() {
        assert!(validate_rating("self_rating", None).is_ok());
        assert!(validate_rating("self_rating", Some(1.0)).is_ok());
        assert!(validate_rating("self_rating", Some(5.0)).is_ok());
        assert_eq!(
            validate_rating("manager_rating", Some(5.5)).unwrap_err(),
            "manager_rating must be between 1 and 5"
        );
        assert!(validate_rating("manager_rating", Some(f64::NAN)).is_err());
    }
}
