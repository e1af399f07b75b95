use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use utoipa::ToSchema;

use super::line_item::{self, LineItem};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Salary {
    pub id: u64,
    pub employee_id: u64,
    #[schema(example = 3)]
    pub month: u32,
    #[schema(example = 2026)]
    pub year: u32,
    #[schema(example = 50000.0)]
    pub basic: f64,
    #[schema(value_type = Vec<LineItem>)]
    pub allowances: Json<Vec<LineItem>>,
    #[schema(value_type = Vec<LineItem>)]
    pub deductions: Json<Vec<LineItem>>,
    /// basic + allowances
    pub gross: f64,
    /// gross - deductions
    pub net: f64,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime<Utc>,
}

impl Salary {
    pub const TABLE: &'static str = "salaries";
    pub const COLUMNS: &'static str =
        "id, employee_id, month, year, basic, allowances, deductions, gross, net, created_at";

    pub fn allowance_total(&self) -> f64 {
        line_item::total(&self.allowances)
    }

    pub fn deduction_total(&self) -> f64 {
        line_item::total(&self.deductions)
    }
}

/// Gross and net pay derived from a salary slip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SalaryFigures {
    pub gross: f64,
    pub net: f64,
}

impl SalaryFigures {
    pub fn compute(basic: f64, allowances: &[LineItem], deductions: &[LineItem]) -> Self {
        let basic = if basic.is_finite() { basic } else { 0.0 };
        let gross = basic + line_item::total(allowances);
        let net = gross - line_item::total(deductions);
        Self { gross, net }
    }
}

pub fn validate_period(month: u32, year: u32) -> Result<(), String> {
    if !(1..=12).contains(&month) {
        return Err("month must be between 1 and 12".to_string());
    }
    if !(1970..=9999).contains(&year) {
        return Err("year is out of range".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, amount: f64) -> LineItem {
        LineItem {
            name: name.to_string(),
            amount,
        }
    }

    #[test]
    fn net_is_gross_minus_deductions() {
        let figures = SalaryFigures::compute(
            40_000.0,
            &[item("HRA", 8_000.0), item("Conveyance", 1_600.0)],
            &[item("PF", 4_800.0), item("Professional tax", 200.0)],
        );
        assert_eq!(figures.gross, 49_600.0);
        assert_eq!(figures.net, 44_600.0);
    }

    #[test]
    fn empty_line_items_leave_basic() {
        let figures = SalaryFigures::compute(30_000.0, &[], &[]);
        assert_eq!(figures, SalaryFigures { gross: 30_000.0, net: 30_000.0 });
    }

    #[test]
    fn period_bounds() {
        assert!(validate_period(1, 2026).is_ok());
        assert!(validate_period(12, 2026).is_ok());
        assert!(validate_period(0, 2026).is_err());
        assert!(validate_period(13, 2026).is_err());
        assert!(validate_period(6, 1900).is_err());
    }
}
