use std::collections::HashMap;

use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use tracing::debug;
use utoipa::{IntoParams, ToSchema};

use crate::auth::identity::{AuthUser, PAYROLL_VIEW_ROLES};
use crate::error::ApiError;
use crate::model::allowance::Allowance;
use crate::model::fixed_allowance::FixedAllowance;
use crate::model::salary::Salary;
use crate::model::status::ApprovalStatus;
use crate::service::ctc::{self, CtcRow, EmployeeRef};
use crate::utils::db_utils::{Filters, fetch_all};

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CtcQuery {
    pub year: Option<u32>,
    /// 1-12
    pub month: Option<u32>,
    pub employee_id: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct CtcReport {
    pub rows: Vec<CtcRow>,
    #[schema(example = 152000.0)]
    pub grand_total: f64,
}

fn period_filters(query: &CtcQuery) -> Result<Filters, ApiError> {
    if let Some(month) = query.month {
        if !(1..=12).contains(&month) {
            return Err(ApiError::bad_request("month must be between 1 and 12"));
        }
    }

    let mut filters = Filters::new();
    filters
        .eq_opt("year", query.year)
        .eq_opt("month", query.month)
        .eq_opt("employee_id", query.employee_id);
    Ok(filters)
}

async fn directory(pool: &MySqlPool) -> Result<HashMap<u64, EmployeeRef>, ApiError> {
    let sql = format!("SELECT {} FROM employees", EmployeeRef::COLUMNS);
    let employees = sqlx::query_as::<_, EmployeeRef>(&sql)
        .fetch_all(pool)
        .await?;

    Ok(employees.into_iter().map(|e| (e.id, e)).collect())
}

/// Cost-to-company report (HR/Accounts/Admin)
///
/// One row per employee and month: salary slip figures plus approved
/// variable and fixed allowances. Employees who have left are omitted.
#[utoipa::path(
    get,
    path = "/api/ctc",
    params(CtcQuery),
    responses(
        (status = 200, description = "CTC rows and grand total", body = CtcReport),
        (status = 400, description = "Invalid period"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "CTC"
)]
pub async fn ctc_report(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<CtcQuery>,
) -> Result<HttpResponse, ApiError> {
    auth.require_any(PAYROLL_VIEW_ROLES)?;

    let filters = period_filters(&query)?;
    let mut approved = period_filters(&query)?;
    approved.eq("status", ApprovalStatus::Approved.as_ref());

    let pool = pool.get_ref();
    let salaries = fetch_all::<Salary>(pool, Salary::TABLE, Salary::COLUMNS, &filters, "id").await?;
    let variable =
        fetch_all::<Allowance>(pool, Allowance::TABLE, Allowance::COLUMNS, &approved, "id").await?;
    let fixed = fetch_all::<FixedAllowance>(
        pool,
        FixedAllowance::TABLE,
        FixedAllowance::COLUMNS,
        &approved,
        "id",
    )
    .await?;
    let directory = directory(pool).await?;

    debug!(
        salaries = salaries.len(),
        variable = variable.len(),
        fixed = fixed.len(),
        "Aggregating CTC"
    );

    let rows = ctc::aggregate(&salaries, &variable, &fixed, &directory);
    let grand_total = ctc::grand_total(&rows);

    Ok(HttpResponse::Ok().json(CtcReport { rows, grand_total }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_out_of_range_is_rejected() {
        let query = CtcQuery {
            year: Some(2026),
            month: Some(13),
            employee_id: None,
        };
        assert!(matches!(period_filters(&query), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn filters_follow_the_query() {
        let query = CtcQuery {
            year: Some(2026),
            month: Some(3),
            employee_id: None,
        };
        let filters = period_filters(&query).unwrap();
        assert_eq!(filters.where_sql(), " WHERE year = ? AND month = ?");
        assert_eq!(filters.values().len(), 2);
    }
}
