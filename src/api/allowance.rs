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
use crate::auth::identity::{ACCOUNTS_ROLES, AuthUser, PAYROLL_VIEW_ROLES};
use crate::error::ApiError;
use crate::model::allowance::Allowance;
use crate::model::line_item::validate_amount;
use crate::model::role::Role;
use crate::model::salary::validate_period;
use crate::model::status::{ApprovalStatus, is_pending};
use crate::service::approval::{ApprovalKind, Decision, DecisionRequest, DecisionUpdate};
use crate::utils::json_body::OptionalJson;
use crate::utils::db_utils::{Filters, delete_by_id, fetch_page, find_or_404};
use crate::utils::pagination::{Page, list_response};

list_response!(AllowanceListResponse, Allowance);

#[derive(Deserialize, ToSchema)]
pub struct CreateAllowance {
    /// Accounts/Admin may file on behalf of an employee; defaults to the caller
    #[schema(nullable = true)]
    pub employee_id: Option<u64>,
    #[schema(example = 3)]
    pub month: u32,
    #[schema(example = 2026)]
    pub year: u32,
    #[schema(example = "Overtime")]
    pub name: String,
    #[schema(example = 2500.0)]
    pub amount: f64,
    #[schema(example = "12 hours in March close", nullable = true)]
    pub description: Option<String>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AllowanceQuery {
    pub employee_id: Option<u64>,
    pub status: Option<ApprovalStatus>,
    pub month: Option<u32>,
    pub year: Option<u32>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// List variable allowances
#[utoipa::path(
    get,
    path = "/api/allowances",
    params(AllowanceQuery),
    responses(
        (status = 200, description = "Paginated allowance list", body = AllowanceListResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Allowance"
)]
pub async fn list_allowances(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<AllowanceQuery>,
) -> Result<HttpResponse, ApiError> {
    let page = Page::new(query.page, query.per_page);

    let mut filters = Filters::new();
    scope_to_caller(&mut filters, &auth, PAYROLL_VIEW_ROLES, query.employee_id, false)?;
    filters
        .eq_opt("status", query.status.map(|s| s.to_string()))
        .eq_opt("month", query.month)
        .eq_opt("year", query.year);

    let (data, total) = fetch_page::<Allowance>(
        pool.get_ref(),
        Allowance::TABLE,
        Allowance::COLUMNS,
        &filters,
        "year DESC, month DESC, id DESC",
        page,
    )
    .await?;

    Ok(HttpResponse::Ok().json(AllowanceListResponse::new(data, page, total)))
}

/// Get a variable allowance
#[utoipa::path(
    get,
    path = "/api/allowances/{id}",
    params(("id" = u64, Path, description = "Allowance ID")),
    responses(
        (status = 200, description = "Allowance found", body = Allowance),
        (status = 404, description = "Allowance not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Allowance"
)]
pub async fn get_allowance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let allowance: Allowance = find_or_404(
        pool.get_ref(),
        Allowance::TABLE,
        Allowance::COLUMNS,
        path.into_inner(),
        "Allowance",
    )
    .await?;

    ensure_can_view(pool.get_ref(), &auth, PAYROLL_VIEW_ROLES, allowance.employee_id, false)
        .await?;

    Ok(HttpResponse::Ok().json(allowance))
}

/// Claim a variable allowance
#[utoipa::path(
    post,
    path = "/api/allowances",
    request_body = CreateAllowance,
    responses(
        (status = 201, description = "Allowance submitted", body = Object, example = json!({
            "message": "Allowance submitted", "id": 4, "status": "pending"
        })),
        (status = 400, description = "Invalid payload")
    ),
    security(("bearer_auth" = [])),
    tag = "Allowance"
)]
pub async fn create_allowance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateAllowance>,
) -> Result<HttpResponse, ApiError> {
    let employee_id = auth.filing_for(ACCOUNTS_ROLES, payload.employee_id)?;

    validate_period(payload.month, payload.year).map_err(ApiError::BadRequest)?;
    validate_amount("amount", payload.amount).map_err(ApiError::BadRequest)?;
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("Allowance name is required"));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO allowances (employee_id, month, year, name, amount, description)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(employee_id)
    .bind(payload.month)
    .bind(payload.year)
    .bind(name)
    .bind(payload.amount)
    .bind(payload.description.as_deref())
    .execute(pool.get_ref())
    .await?;

    let id = result.last_insert_id();
    info!(allowance_id = id, employee_id, amount = payload.amount, "Allowance submitted");

    Ok(HttpResponse::Created().json(json!({
        "message": "Allowance submitted",
        "id": id,
        "status": ApprovalStatus::Pending
    })))
}

/// Update a pending variable allowance
#[utoipa::path(
    put,
    path = "/api/allowances/{id}",
    params(("id" = u64, Path, description = "Allowance ID")),
    request_body = Object,
    responses(
        (status = 200, description = "Allowance updated"),
        (status = 400, description = "Not pending or invalid payload"),
        (status = 404, description = "Allowance not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Allowance"
)]
pub async fn update_allowance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> Result<HttpResponse, ApiError> {
    let mut body = body.into_inner();
    let allowance_id = path.into_inner();
    let allowance: Allowance = find_or_404(
        pool.get_ref(),
        Allowance::TABLE,
        Allowance::COLUMNS,
        allowance_id,
        "Allowance",
    )
    .await?;

    auth.require_owner_or(ACCOUNTS_ROLES, allowance.employee_id)?;
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
        Allowance::TABLE,
        &body,
        Allowance::UPDATABLE,
        allowance_id,
    )
    .await?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Allowance updated" })))
}

/// Delete a variable allowance
///
/// Owners may withdraw while pending; Admin may delete any.
#[utoipa::path(
    delete,
    path = "/api/allowances/{id}",
    params(("id" = u64, Path, description = "Allowance ID")),
    responses(
        (status = 200, description = "Successfully deleted"),
        (status = 400, description = "Allowance already processed"),
        (status = 404, description = "Allowance not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Allowance"
)]
pub async fn delete_allowance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let allowance_id = path.into_inner();
    let allowance: Allowance = find_or_404(
        pool.get_ref(),
        Allowance::TABLE,
        Allowance::COLUMNS,
        allowance_id,
        "Allowance",
    )
    .await?;

    if auth.role != Role::Admin {
        auth.require_owner_or(&[], allowance.employee_id)?;
        if !is_pending(&allowance.status) {
            return Err(ApiError::bad_request("Only pending allowances can be withdrawn"));
        }
    }

    if delete_by_id(pool.get_ref(), Allowance::TABLE, allowance_id).await? == 0 {
        return Err(ApiError::not_found("Allowance"));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Successfully deleted" })))
}

/// Approve a variable allowance (Accounts/Admin)
#[utoipa::path(
    post,
    path = "/api/allowances/{id}/approve",
    params(("id" = u64, Path, description = "Allowance ID")),
    request_body = DecisionRequest,
    responses(
        (status = 200, description = "Allowance approved"),
        (status = 400, description = "Allowance not pending"),
        (status = 403, description = "Not allowed to approve")
    ),
    security(("bearer_auth" = [])),
    tag = "Allowance"
)]
pub async fn approve_allowance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: OptionalJson<DecisionRequest>,
) -> Result<HttpResponse, ApiError> {
    decision_response(
        pool.get_ref(),
        ApprovalKind::Allowance,
        path.into_inner(),
        Decision::Approve,
        body.into_inner(),
        &auth,
        DecisionUpdate::default(),
    )
    .await
}

/// Reject a variable allowance (Accounts/Admin); remarks are required
#[utoipa::path(
    post,
    path = "/api/allowances/{id}/reject",
    params(("id" = u64, Path, description = "Allowance ID")),
    request_body = DecisionRequest,
    responses(
        (status = 200, description = "Allowance rejected"),
        (status = 400, description = "Missing remarks or allowance not pending"),
        (status = 403, description = "Not allowed to reject")
    ),
    security(("bearer_auth" = [])),
    tag = "Allowance"
)]
pub async fn reject_allowance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: OptionalJson<DecisionRequest>,
) -> Result<HttpResponse, ApiError> {
    decision_response(
        pool.get_ref(),
        ApprovalKind::Allowance,
        path.into_inner(),
        Decision::Reject,
        body.into_inner(),
        &auth,
        DecisionUpdate::default(),
    )
    .await
}
