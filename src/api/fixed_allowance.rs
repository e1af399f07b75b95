use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::{Value, json};
use sqlx::MySqlPool;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use super::{
    amount_field, decision_response, ensure_can_view, name_field, period_fields,
    scope_to_caller, update_pending,
};
use crate::auth::identity::{AuthUser, PAYROLL_VIEW_ROLES};
use crate::error::ApiError;
use crate::model::fixed_allowance::FixedAllowance;
use crate::model::line_item::validate_amount;
use crate::model::role::Role;
use crate::model::salary::validate_period;
use crate::model::status::{ApprovalStatus, is_pending};
use crate::service::approval::{ApprovalKind, Decision, DecisionRequest, DecisionUpdate};
use crate::utils::json_body::OptionalJson;
use crate::utils::db_utils::{Filters, delete_by_id, fetch_page, find_or_404};
use crate::utils::pagination::{Page, list_response};

list_response!(FixedAllowanceListResponse, FixedAllowance);

#[derive(Deserialize, ToSchema)]
pub struct CreateFixedAllowance {
    pub employee_id: u64,
    #[schema(example = 3)]
    pub month: u32,
    #[schema(example = 2026)]
    pub year: u32,
    #[schema(example = "Telephone")]
    pub name: String,
    #[schema(example = 1000.0)]
    pub amount: f64,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FixedAllowanceQuery {
    pub employee_id: Option<u64>,
    pub status: Option<ApprovalStatus>,
    pub month: Option<u32>,
    pub year: Option<u32>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// List fixed allowances
#[utoipa::path(
    get,
    path = "/api/fixed-allowances",
    params(FixedAllowanceQuery),
    responses(
        (status = 200, description = "Paginated fixed allowance list", body = FixedAllowanceListResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "FixedAllowance"
)]
pub async fn list_fixed_allowances(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<FixedAllowanceQuery>,
) -> Result<HttpResponse, ApiError> {
    let page = Page::new(query.page, query.per_page);

    let mut filters = Filters::new();
    scope_to_caller(&mut filters, &auth, PAYROLL_VIEW_ROLES, query.employee_id, false)?;
    filters
        .eq_opt("status", query.status.map(|s| s.to_string()))
        .eq_opt("month", query.month)
        .eq_opt("year", query.year);

    let (data, total) = fetch_page::<FixedAllowance>(
        pool.get_ref(),
        FixedAllowance::TABLE,
        FixedAllowance::COLUMNS,
        &filters,
        "year DESC, month DESC, id DESC",
        page,
    )
    .await?;

    Ok(HttpResponse::Ok().json(FixedAllowanceListResponse::new(data, page, total)))
}

/// Get a fixed allowance
#[utoipa::path(
    get,
    path = "/api/fixed-allowances/{id}",
    params(("id" = u64, Path, description = "Fixed allowance ID")),
    responses(
        (status = 200, description = "Fixed allowance found", body = FixedAllowance),
        (status = 404, description = "Fixed allowance not found")
    ),
    security(("bearer_auth" = [])),
    tag = "FixedAllowance"
)]
pub async fn get_fixed_allowance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let allowance: FixedAllowance = find_or_404(
        pool.get_ref(),
        FixedAllowance::TABLE,
        FixedAllowance::COLUMNS,
        path.into_inner(),
        "Fixed allowance",
    )
    .await?;

    ensure_can_view(pool.get_ref(), &auth, PAYROLL_VIEW_ROLES, allowance.employee_id, false)
        .await?;

    Ok(HttpResponse::Ok().json(allowance))
}

/// Set up a fixed allowance for an employee (HR/Accounts/Admin)
#[utoipa::path(
    post,
    path = "/api/fixed-allowances",
    request_body = CreateFixedAllowance,
    responses(
        (status = 201, description = "Fixed allowance submitted"),
        (status = 400, description = "Invalid payload"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "FixedAllowance"
)]
pub async fn create_fixed_allowance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateFixedAllowance>,
) -> Result<HttpResponse, ApiError> {
    auth.require_any(PAYROLL_VIEW_ROLES)?;

    validate_period(payload.month, payload.year).map_err(ApiError::BadRequest)?;
    validate_amount("amount", payload.amount).map_err(ApiError::BadRequest)?;
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("Allowance name is required"));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO fixed_allowances (employee_id, month, year, name, amount)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(payload.employee_id)
    .bind(payload.month)
    .bind(payload.year)
    .bind(name)
    .bind(payload.amount)
    .execute(pool.get_ref())
    .await?;

    let id = result.last_insert_id();
    info!(
        fixed_allowance_id = id,
        employee_id = payload.employee_id,
        amount = payload.amount,
        "Fixed allowance submitted"
    );

    Ok(HttpResponse::Created().json(json!({
        "message": "Fixed allowance submitted",
        "id": id,
        "status": ApprovalStatus::Pending
    })))
}

/// Update a pending fixed allowance (HR/Accounts/Admin)
#[utoipa::path(
    put,
    path = "/api/fixed-allowances/{id}",
    params(("id" = u64, Path, description = "Fixed allowance ID")),
    request_body = Object,
    responses(
        (status = 200, description = "Fixed allowance updated"),
        (status = 400, description = "Not pending or invalid payload"),
        (status = 404, description = "Fixed allowance not found")
    ),
    security(("bearer_auth" = [])),
    tag = "FixedAllowance"
)]
pub async fn update_fixed_allowance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> Result<HttpResponse, ApiError> {
    auth.require_any(PAYROLL_VIEW_ROLES)?;

    let mut body = body.into_inner();
    let allowance_id = path.into_inner();
    let allowance: FixedAllowance = find_or_404(
        pool.get_ref(),
        FixedAllowance::TABLE,
        FixedAllowance::COLUMNS,
        allowance_id,
        "Fixed allowance",
    )
    .await?;

    if !is_pending(&allowance.status) {
        return Err(ApiError::bad_request("Only pending allowances can be changed"));
    }
    if let Some(name) = name_field(&body, "name")? {
        body["name"] = Value::String(name);
    }
    amount_field(&body, "amount")?;
    period_fields(&body, allowance.month, allowance.year)?;

    update_pending(
        pool.get_ref(),
        FixedAllowance::TABLE,
        &body,
        FixedAllowance::UPDATABLE,
        allowance_id,
    )
    .await?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Fixed allowance updated" })))
}

/// Delete a fixed allowance
///
/// HR/Accounts may withdraw while pending; Admin may delete any.
#[utoipa::path(
    delete,
    path = "/api/fixed-allowances/{id}",
    params(("id" = u64, Path, description = "Fixed allowance ID")),
    responses(
        (status = 200, description = "Successfully deleted"),
        (status = 400, description = "Fixed allowance already processed"),
        (status = 404, description = "Fixed allowance not found")
    ),
    security(("bearer_auth" = [])),
    tag = "FixedAllowance"
)]
pub async fn delete_fixed_allowance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    auth.require_any(PAYROLL_VIEW_ROLES)?;

    let allowance_id = path.into_inner();
    let allowance: FixedAllowance = find_or_404(
        pool.get_ref(),
        FixedAllowance::TABLE,
        FixedAllowance::COLUMNS,
        allowance_id,
        "Fixed allowance",
    )
    .await?;

    if auth.role != Role::Admin && !is_pending(&allowance.status) {
        return Err(ApiError::bad_request("Only pending allowances can be withdrawn"));
    }

    if delete_by_id(pool.get_ref(), FixedAllowance::TABLE, allowance_id).await? == 0 {
        return Err(ApiError::not_found("Fixed allowance"));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Successfully deleted" })))
}

/// Approve a fixed allowance (Accounts/Admin)
#[utoipa::path(
    post,
    path = "/api/fixed-allowances/{id}/approve",
    params(("id" = u64, Path, description = "Fixed allowance ID")),
    request_body = DecisionRequest,
    responses(
        (status = 200, description = "Fixed allowance approved"),
        (status = 400, description = "Fixed allowance not pending"),
        (status = 403, description = "Not allowed to approve")
    ),
    security(("bearer_auth" = [])),
    tag = "FixedAllowance"
)]
pub async fn approve_fixed_allowance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: OptionalJson<DecisionRequest>,
) -> Result<HttpResponse, ApiError> {
    decision_response(
        pool.get_ref(),
        ApprovalKind::FixedAllowance,
        path.into_inner(),
        Decision::Approve,
        body.into_inner(),
        &auth,
        DecisionUpdate::default(),
    )
    .await
}

/// Reject a fixed allowance (Accounts/Admin); remarks are required
#[utoipa::path(
    post,
    path = "/api/fixed-allowances/{id}/reject",
    params(("id" = u64, Path, description = "Fixed allowance ID")),
    request_body = DecisionRequest,
    responses(
        (status = 200, description = "Fixed allowance rejected"),
        (status = 400, description = "Missing remarks or not pending"),
        (status = 403, description = "Not allowed to reject")
    ),
    security(("bearer_auth" = [])),
    tag = "FixedAllowance"
)]
pub async fn reject_fixed_allowance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: OptionalJson<DecisionRequest>,
) -> Result<HttpResponse, ApiError> {
    decision_response(
        pool.get_ref(),
        ApprovalKind::FixedAllowance,
        path.into_inner(),
        Decision::Reject,
        body.into_inner(),
        &auth,
        DecisionUpdate::default(),
    )
    .await
}
