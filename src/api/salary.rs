use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use sqlx::types::Json;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use super::{ensure_can_view, scope_to_caller};
use crate::auth::identity::{AuthUser, PAYROLL_VIEW_ROLES};
use crate::error::ApiError;
use crate::model::line_item::{LineItem, validate_amount, validate_items};
use crate::model::salary::{Salary, SalaryFigures, validate_period};
use crate::utils::db_utils::{Filters, delete_by_id, fetch_page, find_or_404};
use crate::utils::notify::notify;
use crate::utils::pagination::{Page, list_response};

list_response!(SalaryListResponse, Salary);

#[derive(Deserialize, ToSchema)]
pub struct CreateSalary {
    pub employee_id: u64,
    #[schema(example = 3)]
    pub month: u32,
    #[schema(example = 2026)]
    pub year: u32,
    #[schema(example = 40000.0)]
    pub basic: f64,
    #[serde(default)]
    pub allowances: Vec<LineItem>,
    #[serde(default)]
    pub deductions: Vec<LineItem>,
}

/// Fields left out keep their stored values; gross and net are recomputed.
#[derive(Deserialize, ToSchema)]
pub struct UpdateSalary {
    pub month: Option<u32>,
    pub year: Option<u32>,
    pub basic: Option<f64>,
    pub allowances: Option<Vec<LineItem>>,
    pub deductions: Option<Vec<LineItem>>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SalaryQuery {
    pub employee_id: Option<u64>,
    pub month: Option<u32>,
    pub year: Option<u32>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

fn validate_slip(
    month: u32,
    year: u32,
    basic: f64,
    allowances: &[LineItem],
    deductions: &[LineItem],
) -> Result<SalaryFigures, ApiError> {
    validate_period(month, year).map_err(ApiError::BadRequest)?;
    validate_amount("basic", basic).map_err(ApiError::BadRequest)?;
    validate_items("allowance", allowances).map_err(ApiError::BadRequest)?;
    validate_items("deduction", deductions).map_err(ApiError::BadRequest)?;

    Ok(SalaryFigures::compute(basic, allowances, deductions))
}

/// List salary slips
#[utoipa::path(
    get,
    path = "/api/salaries",
    params(SalaryQuery),
    responses(
        (status = 200, description = "Paginated salary list", body = SalaryListResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Salary"
)]
pub async fn list_salaries(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<SalaryQuery>,
) -> Result<HttpResponse, ApiError> {
    let page = Page::new(query.page, query.per_page);

    let mut filters = Filters::new();
    scope_to_caller(&mut filters, &auth, PAYROLL_VIEW_ROLES, query.employee_id, false)?;
    filters
        .eq_opt("month", query.month)
        .eq_opt("year", query.year);

    let (data, total) = fetch_page::<Salary>(
        pool.get_ref(),
        Salary::TABLE,
        Salary::COLUMNS,
        &filters,
        "year DESC, month DESC, employee_id ASC",
        page,
    )
    .await?;

    Ok(HttpResponse::Ok().json(SalaryListResponse::new(data, page, total)))
}

/// Get a salary slip
#[utoipa::path(
    get,
    path = "/api/salaries/{id}",
    params(("id" = u64, Path, description = "Salary ID")),
    responses(
        (status = 200, description = "Salary found", body = Salary),
        (status = 404, description = "Salary not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Salary"
)]
pub async fn get_salary(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let salary: Salary = find_or_404(
        pool.get_ref(),
        Salary::TABLE,
        Salary::COLUMNS,
        path.into_inner(),
        "Salary",
    )
    .await?;

    ensure_can_view(pool.get_ref(), &auth, PAYROLL_VIEW_ROLES, salary.employee_id, false).await?;

    Ok(HttpResponse::Ok().json(salary))
}

/// Create a salary slip (Accounts/Admin)
#[utoipa::path(
    post,
    path = "/api/salaries",
    request_body = CreateSalary,
    responses(
        (status = 201, description = "Salary created", body = Object, example = json!({
            "message": "Salary created", "id": 8, "gross": 49600.0, "net": 44600.0
        })),
        (status = 400, description = "Invalid payload"),
        (status = 409, description = "Salary already exists for this month")
    ),
    security(("bearer_auth" = [])),
    tag = "Salary"
)]
pub async fn create_salary(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateSalary>,
) -> Result<HttpResponse, ApiError> {
    auth.require_accounts_or_admin()?;

    let figures = validate_slip(
        payload.month,
        payload.year,
        payload.basic,
        &payload.allowances,
        &payload.deductions,
    )?;

    let result = sqlx::query(
        r#"
        INSERT INTO salaries
            (employee_id, month, year, basic, allowances, deductions, gross, net)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(payload.employee_id)
    .bind(payload.month)
    .bind(payload.year)
    .bind(payload.basic)
    .bind(Json(&payload.allowances))
    .bind(Json(&payload.deductions))
    .bind(figures.gross)
    .bind(figures.net)
    .execute(pool.get_ref())
    .await?;

    let id = result.last_insert_id();
    info!(
        salary_id = id,
        employee_id = payload.employee_id,
        month = payload.month,
        year = payload.year,
        "Salary created"
    );

    notify(
        pool.get_ref(),
        payload.employee_id,
        &format!("Salary for {:02}/{} is available", payload.month, payload.year),
        Some(format!("/salaries/{id}")),
    )
    .await;

    Ok(HttpResponse::Created().json(json!({
        "message": "Salary created",
        "id": id,
        "gross": figures.gross,
        "net": figures.net
    })))
}

/// Update a salary slip (Accounts/Admin)
#[utoipa::path(
    put,
    path = "/api/salaries/{id}",
    params(("id" = u64, Path, description = "Salary ID")),
    request_body = UpdateSalary,
    responses(
        (status = 200, description = "Salary updated"),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Salary not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Salary"
)]
pub async fn update_salary(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<UpdateSalary>,
) -> Result<HttpResponse, ApiError> {
    auth.require_accounts_or_admin()?;

    let salary_id = path.into_inner();
    let current: Salary = find_or_404(
        pool.get_ref(),
        Salary::TABLE,
        Salary::COLUMNS,
        salary_id,
        "Salary",
    )
    .await?;

    let payload = payload.into_inner();
    let month = payload.month.unwrap_or(current.month);
    let year = payload.year.unwrap_or(current.year);
    let basic = payload.basic.unwrap_or(current.basic);
    let allowances = payload.allowances.unwrap_or(current.allowances.0);
    let deductions = payload.deductions.unwrap_or(current.deductions.0);

    let figures = validate_slip(month, year, basic, &allowances, &deductions)?;

    let affected = sqlx::query(
        r#"
        UPDATE salaries
        SET month = ?, year = ?, basic = ?, allowances = ?, deductions = ?, gross = ?, net = ?
        WHERE id = ?
        "#,
    )
    .bind(month)
    .bind(year)
    .bind(basic)
    .bind(Json(&allowances))
    .bind(Json(&deductions))
    .bind(figures.gross)
    .bind(figures.net)
    .bind(salary_id)
    .execute(pool.get_ref())
    .await?
    .rows_affected();

    if affected == 0 {
        return Err(ApiError::not_found("Salary"));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Salary updated",
        "gross": figures.gross,
        "net": figures.net
    })))
}

/// Delete a salary slip (Accounts/Admin)
#[utoipa::path(
    delete,
    path = "/api/salaries/{id}",
    params(("id" = u64, Path, description = "Salary ID")),
    responses(
        (status = 200, description = "Successfully deleted"),
        (status = 404, description = "Salary not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Salary"
)]
pub async fn delete_salary(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    auth.require_accounts_or_admin()?;

    if delete_by_id(pool.get_ref(), Salary::TABLE, path.into_inner()).await? == 0 {
        return Err(ApiError::not_found("Salary"));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Successfully deleted" })))
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
    fn slip_validation_returns_figures() {
        let figures = validate_slip(
            4,
            2026,
            20_000.0,
            &[item("HRA", 5_000.0)],
            &[item("PF", 2_400.0)],
        )
        .unwrap();
        assert_eq!(figures.gross, 25_000.0);
        assert_eq!(figures.net, 22_600.0);
    }

    #[test]
    fn slip_validation_rejects_bad_input() {
        assert!(validate_slip(13, 2026, 1.0, &[], &[]).is_err());
        assert!(validate_slip(1, 2026, -1.0, &[], &[]).is_err());
        assert!(validate_slip(1, 2026, 1.0, &[item(" ", 5.0)], &[]).is_err());
        assert!(validate_slip(1, 2026, 1.0, &[], &[item("Tax", f64::INFINITY)]).is_err());
    }
}
