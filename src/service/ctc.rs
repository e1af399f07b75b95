//! Cost-to-company report: salary slips merged with approved variable and
//! fixed allowances per employee and month.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;

use crate::model::allowance::Allowance;
use crate::model::fixed_allowance::FixedAllowance;
use crate::model::salary::Salary;
use crate::model::status::ApprovalStatus;

/// What the report needs to know about an employee.
#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct EmployeeRef {
    pub id: u64,
    pub employee_code: String,
    pub first_name: String,
    pub last_name: String,
    pub dol: Option<NaiveDate>,
}

impl EmployeeRef {
    pub const COLUMNS: &'static str = "id, employee_code, first_name, last_name, dol";

    fn name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CtcKey {
    employee_id: u64,
    month: u32,
    year: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CtcRow {
    pub employee_id: u64,
    #[schema(example = "EMP-001")]
    pub employee_code: String,
    #[schema(example = "John Doe")]
    pub employee_name: String,
    pub month: u32,
    pub year: u32,
    pub basic: f64,
    pub gross: f64,
    /// Sum of salary allowance line items
    pub allowances: f64,
    /// Sum of salary deduction line items
    pub deductions: f64,
    /// Approved variable allowances for the month
    pub variable_allowances: f64,
    /// Approved fixed allowances for the month
    pub fixed_allowances: f64,
    /// basic + allowances - deductions + variable + fixed
    pub total: f64,
}

impl CtcRow {
    fn empty(key: CtcKey) -> Self {
        Self {
            employee_id: key.employee_id,
            employee_code: String::new(),
            employee_name: String::new(),
            month: key.month,
            year: key.year,
            basic: 0.0,
            gross: 0.0,
            allowances: 0.0,
            deductions: 0.0,
            variable_allowances: 0.0,
            fixed_allowances: 0.0,
            total: 0.0,
        }
    }
}

fn finite(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

fn is_approved(status: &str) -> bool {
    ApprovalStatus::from_column(status) == Some(ApprovalStatus::Approved)
}

/// Merges the three sources into one row per employee-month.
///
/// Allowances that are not approved are ignored, employees with a date of
/// leaving are dropped, and rows come back newest period first, then by
/// employee name.
pub fn aggregate(
    salaries: &[Salary],
    variable: &[Allowance],
    fixed: &[FixedAllowance],
    directory: &HashMap<u64, EmployeeRef>,
) -> Vec<CtcRow> {
    let mut rows: HashMap<CtcKey, CtcRow> = HashMap::new();

    for salary in salaries {
        let key = CtcKey {
            employee_id: salary.employee_id,
            month: salary.month,
            year: salary.year,
        };
        let row = rows.entry(key).or_insert_with(|| CtcRow::empty(key));
        row.basic += finite(salary.basic);
        row.gross += finite(salary.gross);
        row.allowances += salary.allowance_total();
        row.deductions += salary.deduction_total();
    }

    for allowance in variable.iter().filter(|a| is_approved(&a.status)) {
        let key = CtcKey {
            employee_id: allowance.employee_id,
            month: allowance.month,
            year: allowance.year,
        };
        rows.entry(key)
            .or_insert_with(|| CtcRow::empty(key))
            .variable_allowances += finite(allowance.amount);
    }

    for allowance in fixed.iter().filter(|a| is_approved(&a.status)) {
        let key = CtcKey {
            employee_id: allowance.employee_id,
            month: allowance.month,
            year: allowance.year,
        };
        rows.entry(key)
            .or_insert_with(|| CtcRow::empty(key))
            .fixed_allowances += finite(allowance.amount);
    }

    let mut report: Vec<CtcRow> = rows
        .into_values()
        .filter_map(|mut row| {
            if let Some(employee) = directory.get(&row.employee_id) {
                if employee.dol.is_some() {
                    return None;
                }
                row.employee_code = employee.employee_code.clone();
                row.employee_name = employee.name();
            }
            row.total = row.basic + row.allowances - row.deductions
                + row.variable_allowances
                + row.fixed_allowances;
            Some(row)
        })
        .collect();

    report.sort_by(compare_rows);
    report
}

fn compare_rows(a: &CtcRow, b: &CtcRow) -> Ordering {
    b.year
        .cmp(&a.year)
        .then_with(|| b.month.cmp(&a.month))
        .then_with(|| a.employee_name.cmp(&b.employee_name))
        .then_with(|| a.employee_id.cmp(&b.employee_id))
}

pub fn grand_total(rows: &[CtcRow]) -> f64 {
    rows.iter().map(|r| r.total).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::line_item::LineItem;
    use chrono::Utc;
    use sqlx::types::Json;

    fn item(name: &str, amount: f64) -> LineItem {
        LineItem {
            name: name.to_string(),
            amount,
        }
    }

    fn salary(employee_id: u64, month: u32, year: u32, basic: f64) -> Salary {
        let allowances = vec![item("HRA", 5000.0), item("DA", 1000.0)];
        let deductions = vec![item("PF", 1200.0)];
        Salary {
            id: employee_id * 100 + u64::from(month),
            employee_id,
            month,
            year,
            basic,
            gross: basic + 6000.0,
            net: basic + 4800.0,
            allowances: Json(allowances),
            deductions: Json(deductions),
            created_at: Utc::now(),
        }
    }

    fn variable(employee_id: u64, month: u32, year: u32, amount: f64, status: &str) -> Allowance {
        Allowance {
            id: 1,
            employee_id,
            month,
            year,
            name: "Overtime".to_string(),
            amount,
            description: None,
            status: status.to_string(),
            remarks: None,
            actioned_by: None,
            actioned_at: None,
            created_at: Utc::now(),
        }
    }

    fn fixed(employee_id: u64, month: u32, year: u32, amount: f64, status: &str) -> FixedAllowance {
        FixedAllowance {
            id: 1,
            employee_id,
            month,
            year,
            name: "Telephone".to_string(),
            amount,
            status: status.to_string(),
            remarks: None,
            actioned_by: None,
            actioned_at: None,
            created_at: Utc::now(),
        }
    }

    fn directory(entries: &[(u64, &str, &str, bool)]) -> HashMap<u64, EmployeeRef> {
        entries
            .iter()
            .map(|(id, first, last, has_left)| {
                (
                    *id,
                    EmployeeRef {
                        id: *id,
                        employee_code: format!("EMP-{id}"),
                        first_name: first.to_string(),
                        last_name: last.to_string(),
                        dol: has_left.then(|| NaiveDate::from_ymd_opt(2025, 12, 31).unwrap()),
                    },
                )
            })
            .collect()
    }

    #[test]
    fn total_merges_all_sources() {
        let dir = directory(&[(1, "Asha", "Roy", false)]);
        let rows = aggregate(
            &[salary(1, 3, 2026, 40_000.0)],
            &[
                variable(1, 3, 2026, 2_000.0, "approved"),
                variable(1, 3, 2026, 500.0, "approved"),
            ],
            &[fixed(1, 3, 2026, 1_000.0, "approved")],
            &dir,
        );

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.employee_name, "Asha Roy");
        assert_eq!(row.employee_code, "EMP-1");
        assert_eq!(row.basic, 40_000.0);
        assert_eq!(row.gross, 46_000.0);
        assert_eq!(row.allowances, 6_000.0);
        assert_eq!(row.deductions, 1_200.0);
        assert_eq!(row.variable_allowances, 2_500.0);
        assert_eq!(row.fixed_allowances, 1_000.0);
        assert_eq!(row.total, 40_000.0 + 6_000.0 - 1_200.0 + 2_500.0 + 1_000.0);
    }

    #[test]
    fn ignores_unapproved_allowances() {
        let dir = directory(&[(1, "Asha", "Roy", false)]);
        let rows = aggregate(
            &[salary(1, 3, 2026, 40_000.0)],
            &[
                variable(1, 3, 2026, 2_000.0, "pending"),
                variable(1, 3, 2026, 700.0, "rejected"),
            ],
            &[fixed(1, 3, 2026, 1_000.0, "pending")],
            &dir,
        );
        assert_eq!(rows[0].variable_allowances, 0.0);
        assert_eq!(rows[0].fixed_allowances, 0.0);
        assert_eq!(rows[0].total, 44_800.0);
    }

    #[test]
    fn allowance_without_salary_creates_row() {
        let dir = directory(&[(2, "Bilal", "Khan", false)]);
        let rows = aggregate(&[], &[], &[fixed(2, 1, 2026, 1_500.0, "approved")], &dir);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].basic, 0.0);
        assert_eq!(rows[0].fixed_allowances, 1_500.0);
        assert_eq!(rows[0].total, 1_500.0);
    }

    #[test]
    fn drops_employees_who_left() {
        let dir = directory(&[(1, "Asha", "Roy", false), (2, "Bilal", "Khan", true)]);
        let rows = aggregate(
            &[salary(1, 3, 2026, 40_000.0), salary(2, 3, 2026, 35_000.0)],
            &[variable(2, 3, 2026, 100.0, "approved")],
            &[],
            &dir,
        );
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].employee_id, 1);
    }

    #[test]
    fn sorted_by_period_desc_then_name() {
        let dir = directory(&[
            (1, "Zara", "Ali", false),
            (2, "Asha", "Roy", false),
            (3, "Milan", "Das", false),
        ]);
        let rows = aggregate(
            &[
                salary(1, 3, 2026, 1.0),
                salary(2, 3, 2026, 1.0),
                salary(3, 12, 2025, 1.0),
                salary(1, 1, 2026, 1.0),
            ],
            &[],
            &[],
            &dir,
        );
        let order: Vec<(u32, u32, &str)> = rows
            .iter()
            .map(|r| (r.year, r.month, r.employee_name.as_str()))
            .collect();
        assert_eq!(
            order,
            [
                (2026, 3, "Asha Roy"),
                (2026, 3, "Zara Ali"),
                (2026, 1, "Zara Ali"),
                (2025, 12, "Milan Das"),
            ]
        );
    }

    #[test]
    fn malformed_amounts_count_as_zero() {
        let dir = directory(&[(1, "Asha", "Roy", false)]);
        let mut broken = salary(1, 3, 2026, f64::NAN);
        broken.gross = f64::INFINITY;
        broken.allowances = Json(vec![item("HRA", f64::NAN)]);
        let rows = aggregate(
            &[broken],
            &[variable(1, 3, 2026, f64::NAN, "approved")],
            &[],
            &dir,
        );
        assert_eq!(rows[0].basic, 0.0);
        assert_eq!(rows[0].gross, 0.0);
        assert_eq!(rows[0].total, -1_200.0);
        assert_eq!(grand_total(&rows), -1_200.0);
    }
}
