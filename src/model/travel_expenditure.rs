use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use utoipa::ToSchema;

use super::line_item;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Expense {
    #[schema(value_type = String, format = Date)]
    pub date: NaiveDate,
    #[schema(example = "Hotel")]
    pub category: String,
    #[schema(nullable = true)]
    pub description: Option<String>,
    #[schema(example = 3500.0)]
    pub amount: f64,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct TravelExpenditure {
    pub id: u64,
    pub employee_id: u64,
    #[schema(example = "Client visit, Chattogram")]
    pub purpose: String,
    #[schema(value_type = String, format = Date)]
    pub from_date: NaiveDate,
    #[schema(value_type = String, format = Date)]
    pub to_date: NaiveDate,
    #[schema(value_type = Vec<Expense>)]
    pub expenses: Json<Vec<Expense>>,
    /// Sum of all expense amounts, recomputed on every save
    pub total_amount: f64,
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

impl TravelExpenditure {
    pub const TABLE: &'static str = "travel_expenditures";
    pub const COLUMNS: &'static str = "id, employee_id, purpose, from_date, to_date, expenses, \
         total_amount, status, remarks, actioned_by, actioned_at, created_at";
}

pub fn total_amount(expenses: &[Expense]) -> f64 {
    line_item::sum_amounts(expenses.iter().map(|e| &e.amount))
}

/// Checks a trip's dates and expense lines before it is saved.
pub fn validate_trip(from: NaiveDate, to: NaiveDate, expenses: &[Expense]) -> Result<(), String> {
    if from > to {
        return Err("from_date cannot be after to_date".to_string());
    }
    if expenses.is_empty() {
        return Err("at least one expense is required".to_string());
    }
    for expense in expenses {
        if expense.category.trim().is_empty() {
            return Err("expense category cannot be empty".to_string());
        }
        line_item::validate_amount("expense amount", expense.amount)?;
        if expense.date < from || expense.date > to {
            return Err(format!(
                "expense dated {} is outside the trip dates",
                expense.date
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, d).unwrap()
    }

    fn expense(day: u32, category: &str, amount: f64) -> Expense {
        Expense {
            date: date(day),
            category: category.to_string(),
            description: None,
            amount,
        }
    }

    #[test]
    fn total_is_sum_of_expenses() {
        let expenses = vec![
            expense(3, "Air fare", 7200.0),
            expense(3, "Hotel", 3500.0),
            expense(4, "Local conveyance", 450.25),
        ];
        assert_eq!(total_amount(&expenses), 11150.25);
        assert_eq!(total_amount(&[]), 0.0);
    }

    #[test]
    fn trip_validation() {
        let ok = vec![expense(3, "Hotel", 10.0)];
        assert!(validate_trip(date(2), date(4), &ok).is_ok());
        assert!(validate_trip(date(5), date(4), &ok).is_err());
        assert!(validate_trip(date(2), date(4), &[]).is_err());
        assert!(validate_trip(date(4), date(6), &ok).is_err());
        assert!(validate_trip(date(2), date(4), &[expense(3, "Hotel", -5.0)]).is_err());
    }
}
