use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{Value, json};
use sqlx::MySqlPool;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use crate::auth::identity::{AuthUser, PAYROLL_VIEW_ROLES};
use crate::error::ApiError;
use crate::model::employee::Employee;
use crate::model::role::Role;
use crate::utils::db_utils::{
    Filters, SqlValue, build_update_sql, delete_by_id, execute_update, fetch_page, find_or_404,
};
use crate::utils::pagination::{Page, list_response};

list_response!(EmployeeListResponse, Employee);

#[derive(Deserialize, ToSchema)]
pub struct CreateEmployee {
    #[schema(nullable = true)]
    pub user_id: Option<u64>,
    #[schema(example = 1, nullable = true)]
    pub department_id: Option<u64>,
    #[schema(example = "EMP-001")]
    pub employee_code: String,
    #[schema(example = "John")]
    pub first_name: String,
    #[schema(example = "Doe")]
    pub last_name: String,
    #[schema(example = "john@email.com", format = "email")]
    pub email: String,
    #[schema(nullable = true)]
    pub phone: Option<String>,
    #[schema(example = "Accountant", nullable = true)]
    pub designation: Option<String>,
    #[schema(nullable = true)]
    pub reporting_to: Option<u64>,
    #[schema(example = "2026-01-01", value_type = String, format = Date)]
    pub doj: NaiveDate,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EmployeeQuery {
    pub department_id: Option<u64>,
    /// Only employees reporting to this lead
    pub reporting_to: Option<u64>,
    /// true: no date of leaving, false: has left
    pub active: Option<bool>,
    /// Search by name, code or email
    pub search: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// List employees
///
/// HR, Accounts and Admin see everyone; leads see themselves and their
/// reportees; other employees see only themselves.
#[utoipa::path(
    get,
    path = "/api/employees",
    params(EmployeeQuery),
    responses(
        (status = 200, description = "Paginated employee list", body = EmployeeListResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn list_employees(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<EmployeeQuery>,
) -> Result<HttpResponse, ApiError> {
    let page = Page::new(query.page, query.per_page);

    let mut filters = Filters::new();
    if !auth.has_any(PAYROLL_VIEW_ROLES) {
        let own = auth.employee()?;
        if auth.role == Role::Lead {
            filters.raw(
                "id = ? OR reporting_to = ?",
                vec![SqlValue::U64(own), SqlValue::U64(own)],
            );
        } else {
            filters.eq("id", own);
        }
    }

    filters
        .eq_opt("department_id", query.department_id)
        .eq_opt("reporting_to", query.reporting_to);
    match query.active {
        Some(true) => filters.raw("dol IS NULL", Vec::new()),
        Some(false) => filters.raw("dol IS NOT NULL", Vec::new()),
        None => &mut filters,
    };
    if let Some(search) = &query.search {
        filters.search(
            &["first_name", "last_name", "employee_code", "email"],
            search,
        );
    }

    let (data, total) = fetch_page::<Employee>(
        pool.get_ref(),
        Employee::TABLE,
        Employee::COLUMNS,
        &filters,
        "id DESC",
        page,
    )
    .await?;

    Ok(HttpResponse::Ok().json(EmployeeListResponse::new(data, page, total)))
}

/// Get an employee
#[utoipa::path(
    get,
    path = "/api/employees/{id}",
    params(("id" = u64, Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Employee found", body = Employee),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn get_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let employee: Employee = find_or_404(
        pool.get_ref(),
        Employee::TABLE,
        Employee::COLUMNS,
        path.into_inner(),
        "Employee",
    )
    .await?;

    let is_lead_of = auth.role == Role::Lead
        && auth.employee_id.is_some()
        && employee.reporting_to == auth.employee_id;
    if !is_lead_of {
        auth.require_owner_or(PAYROLL_VIEW_ROLES, employee.id)?;
    }

    Ok(HttpResponse::Ok().json(employee))
}

/// Create an employee (HR/Admin)
#[utoipa::path(
    post,
    path = "/api/employees",
    request_body = CreateEmployee,
    responses(
        (status = 201, description = "Employee created", body = Object, example = json!({
            "message": "Employee created", "id": 12
        })),
        (status = 400, description = "Invalid payload"),
        (status = 409, description = "Employee code already exists")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn create_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateEmployee>,
) -> Result<HttpResponse, ApiError> {
    auth.require_hr_or_admin()?;

    let code = payload.employee_code.trim();
    if code.is_empty() || payload.first_name.trim().is_empty() || payload.email.trim().is_empty()
    {
        return Err(ApiError::bad_request(
            "employee_code, first_name and email are required",
        ));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO employees
        (user_id, department_id, employee_code, first_name, last_name, email, phone,
         designation, reporting_to, doj)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(payload.user_id)
    .bind(payload.department_id)
    .bind(code)
    .bind(payload.first_name.trim())
    .bind(payload.last_name.trim())
    .bind(payload.email.trim())
    .bind(payload.phone.as_deref())
    .bind(payload.designation.as_deref())
    .bind(payload.reporting_to)
    .bind(payload.doj)
    .execute(pool.get_ref())
    .await?;

    let id = result.last_insert_id();
    info!(employee_id = id, employee_code = %code, "Employee created");

    Ok(HttpResponse::Created().json(json!({
        "message": "Employee created",
        "id": id
    })))
}

/// Update an employee (HR/Admin)
#[utoipa::path(
    put,
    path = "/api/employees/{id}",
    params(("id" = u64, Path, description = "Employee ID")),
    request_body = Object,
    responses(
        (status = 200, description = "Employee updated"),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn update_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> Result<HttpResponse, ApiError> {
    auth.require_hr_or_admin()?;

    let employee_id = path.into_inner();
    if body.get("reporting_to").and_then(Value::as_u64) == Some(employee_id) {
        return Err(ApiError::bad_request("An employee cannot report to themselves"));
    }

    let update = build_update_sql(Employee::TABLE, &body, Employee::UPDATABLE, employee_id)?;
    if execute_update(pool.get_ref(), update).await? == 0 {
        return Err(ApiError::not_found("Employee"));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Employee updated" })))
}

/// Delete an employee (HR/Admin)
#[utoipa::path(
    delete,
    path = "/api/employees/{id}",
    params(("id" = u64, Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Successfully deleted"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn delete_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    auth.require_hr_or_admin()?;

    let employee_id = path.into_inner();
    if delete_by_id(pool.get_ref(), Employee::TABLE, employee_id).await? == 0 {
        return Err(ApiError::not_found("Employee"));
    }

    info!(employee_id, actor = auth.user_id, "Employee deleted");
    Ok(HttpResponse::Ok().json(json!({ "message": "Successfully deleted" })))
}
