use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Leave Travel Concession reimbursement claim.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct LtcClaim {
    pub id: u64,
    pub employee_id: u64,
    #[schema(example = "2026-29")]
    pub block_year: String,
    #[schema(example = "Dhaka")]
    pub journey_from: String,
    #[schema(example = "Cox's Bazar")]
    pub journey_to: String,
    #[schema(value_type = String, format = Date)]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = Date)]
    pub end_date: NaiveDate,
    #[schema(example = 3)]
    pub family_members: u32,
    #[schema(example = 18000.0)]
    pub amount_claimed: f64,
    #[schema(nullable = true)]
    pub amount_approved: Option<f64>,
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

impl LtcClaim {
    pub const TABLE: &'static str = "ltc_claims";
    pub const COLUMNS: &'static str = "id, employee_id, block_year, journey_from, journey_to, \
         start_date, end_date, family_members, amount_claimed, amount_approved, status, remarks, \
         actioned_by, actioned_at, created_at";
}

/// Amount to reimburse on approval: the requested figure or, if absent, the claim.
pub fn approved_amount(claimed: f64, requested: Option<f64>) -> Result<f64, String> {
    match requested {
        None => Ok(claimed),
        Some(amount) if !amount.is_finite() || amount < 0.0 => {
            Err("amount_approved must be a non-negative number".to_string())
        }
        Some(amount) if amount > claimed => {
            Err("amount_approved cannot exceed the amount claimed".to_string())
        }
        Some(amount) => Ok(amount),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approval_amount_defaults_to_claim() {
        assert_eq!(approved_amount(1200.0, None), Ok(1200.0));
        assert_eq!(approved_amount(1200.0, Some(900.0)), Ok(900.0));
        assert!(approved_amount(1200.0, Some(1500.0)).is_err());
        assert!(approved_amount(1200.0, Some(-1.0)).is_err());
    }
}
