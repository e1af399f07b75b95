use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use sqlx::types::Json;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use super::{decision_response, ensure_can_view, scope_to_caller};
use crate::auth::identity::{ACCOUNTS_ROLES, AuthUser, PAYROLL_VIEW_ROLES};
use crate::error::ApiError;
use crate::model::role::Role;
use crate::model::status::{ApprovalStatus, is_pending};
use crate::model::travel_expenditure::{Expense, TravelExpenditure, total_amount, validate_trip};
use crate::service::approval::{ApprovalKind, Decision, DecisionRequest, DecisionUpdate};
use crate::utils::json_body::OptionalJson;
use crate::utils::db_utils::{Filters, delete_by_id, fetch_page, find_or_404};
use crate::utils::pagination::{Page, list_response};

list_response!(TravelExpenditureListResponse, TravelExpenditure);

#[derive(Deserialize, ToSchema)]
pub struct CreateTravelExpenditure {
    /// Accounts/Admin may file on behalf of an employee; defaults to the caller
    #[schema(nullable = true)]
    pub employee_id: Option<u64>,
    #[schema(example = "Client visit, Chattogram")]
    pub purpose: String,
    #[schema(example = "2026-02-02", value_type = String, format = Date)]
    pub from_date: NaiveDate,
    #[schema(example = "2026-02-04", value_type = String, format = Date)]
    pub to_date: NaiveDate,
    pub expenses: Vec<Expense>,
}

/// Fields left out keep their stored values; the total is re-derived.
#[derive(Deserialize, ToSchema)]
pub struct UpdateTravelExpenditure {
    pub purpose: Option<String>,
    #[schema(value_type = Option<String>, format = Date)]
    pub from_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = Date)]
    pub to_date: Option<NaiveDate>,
    pub expenses: Option<Vec<Expense>>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TravelExpenditureQuery {
    pub employee_id: Option<u64>,
    pub status: Option<ApprovalStatus>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

fn checked_total(
    purpose: &str,
    from: NaiveDate,
    to: NaiveDate,
    expenses: &[Expense],
) -> Result<f64, ApiError> {
    if purpose.trim().is_empty() {
        return Err(ApiError::bad_request("Purpose is required"));
    }
    validate_trip(from, to, expenses).map_err(ApiError::BadRequest)?;
    Ok(total_amount(expenses))
}

/// List travel expenditures
#[utoipa::path(
    get,
    path = "/api/travel-expenditures",
    params(TravelExpenditureQuery),
    responses(
        (status = 200, description = "Paginated travel expenditure list", body = TravelExpenditureListResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "TravelExpenditure"
)]
pub async fn list_travel_expenditures(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<TravelExpenditureQuery>,
) -> Result<HttpResponse, ApiError> {
    let page = Page::new(query.page, query.per_page);

    let mut filters = Filters::new();
    scope_to_caller(&mut filters, &auth, PAYROLL_VIEW_ROLES, query.employee_id, false)?;
    filters.eq_opt("status", query.status.map(|s| s.to_string()));

    let (data, total) = fetch_page::<TravelExpenditure>(
        pool.get_ref(),
        TravelExpenditure::TABLE,
        TravelExpenditure::COLUMNS,
        &filters,
        "from_date DESC, id DESC",
        page,
    )
    .await?;

    Ok(HttpResponse::Ok().json(TravelExpenditureListResponse::new(data, page, total)))
}

/// Get a travel expenditure
#[utoipa::path(
    get,
    path = "/api/travel-expenditures/{id}",
    params(("id" = u64, Path, description = "Travel expenditure ID")),
    responses(
        (status = 200, description = "Travel expenditure found", body = TravelExpenditure),
        (status = 404, description = "Travel expenditure not found")
    ),
    security(("bearer_auth" = [])),
    tag = "TravelExpenditure"
)]
pub async fn get_travel_expenditure(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let record: TravelExpenditure = find_or_404(
        pool.get_ref(),
        TravelExpenditure::TABLE,
        TravelExpenditure::COLUMNS,
        path.into_inner(),
        "Travel expenditure",
    )
    .await?;

    ensure_can_view(pool.get_ref(), &auth, PAYROLL_VIEW_ROLES, record.employee_id, false)
        .await?;

    Ok(HttpResponse::Ok().json(record))
}

/// Submit a travel expenditure
///
/// `total_amount` is derived from the expense lines.
#[utoipa::path(
    post,
    path = "/api/travel-expenditures",
    request_body = CreateTravelExpenditure,
    responses(
        (status = 201, description = "Travel expenditure submitted", body = Object, example = json!({
            "message": "Travel expenditure submitted", "id": 2, "total_amount": 11150.25, "status": "pending"
        })),
        (status = 400, description = "Invalid payload")
    ),
    security(("bearer_auth" = [])),
    tag = "TravelExpenditure"
)]
pub async fn create_travel_expenditure(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateTravelExpenditure>,
) -> Result<HttpResponse, ApiError> {
    let employee_id = auth.filing_for(ACCOUNTS_ROLES, payload.employee_id)?;
    let total = checked_total(
        &payload.purpose,
        payload.from_date,
        payload.to_date,
        &payload.expenses,
    )?;

    let result = sqlx::query(
        r#"
        INSERT INTO travel_expenditures
            (employee_id, purpose, from_date, to_date, expenses, total_amount)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(employee_id)
    .bind(payload.purpose.trim())
    .bind(payload.from_date)
    .bind(payload.to_date)
    .bind(Json(&payload.expenses))
    .bind(total)
    .execute(pool.get_ref())
    .await?;

    let id = result.last_insert_id();
    info!(travel_id = id, employee_id, total, "Travel expenditure submitted");

    Ok(HttpResponse::Created().json(json!({
        "message": "Travel expenditure submitted",
        "id": id,
        "total_amount": total,
        "status": ApprovalStatus::Pending
    })))
}

/// Update a pending travel expenditure
#[utoipa::path(
    put,
    path = "/api/travel-expenditures/{id}",
    params(("id" = u64, Path, description = "Travel expenditure ID")),
    request_body = UpdateTravelExpenditure,
    responses(
        (status = 200, description = "Travel expenditure updated"),
        (status = 400, description = "Not pending or invalid payload"),
        (status = 404, description = "Travel expenditure not found")
    ),
    security(("bearer_auth" = [])),
    tag = "TravelExpenditure"
)]
pub async fn update_travel_expenditure(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<UpdateTravelExpenditure>,
) -> Result<HttpResponse, ApiError> {
    let record_id = path.into_inner();
    let record: TravelExpenditure = find_or_404(
        pool.get_ref(),
        TravelExpenditure::TABLE,
        TravelExpenditure::COLUMNS,
        record_id,
        "Travel expenditure",
    )
    .await?;

    auth.require_owner_or(ACCOUNTS_ROLES, record.employee_id)?;
    if !is_pending(&record.status) {
        return Err(ApiError::bad_request(
            "Only pending travel expenditures can be changed",
        ));
    }

    let payload = payload.into_inner();
    let purpose = payload.purpose.unwrap_or(record.purpose);
    let from_date = payload.from_date.unwrap_or(record.from_date);
    let to_date = payload.to_date.unwrap_or(record.to_date);
    let expenses = payload.expenses.unwrap_or(record.expenses.0);

    let total = checked_total(&purpose, from_date, to_date, &expenses)?;

    let affected = sqlx::query(
        r#"
        UPDATE travel_expenditures
        SET purpose = ?, from_date = ?, to_date = ?, expenses = ?, total_amount = ?
        WHERE id = ? AND status = 'pending'
        "#,
    )
    .bind(purpose.trim())
    .bind(from_date)
    .bind(to_date)
    .bind(Json(&expenses))
    .bind(total)
    .bind(record_id)
    .execute(pool.get_ref())
    .await?
    .rows_affected();

    if affected == 0 {
        return Err(ApiError::bad_request(
            "Only pending travel expenditures can be changed",
        ));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Travel expenditure updated",
        "total_amount": total
    })))
}

/// Delete a travel expenditure
///
/// Owners may withdraw while pending; Admin may delete any.
#[utoipa::path(
    delete,
    path = "/api/travel-expenditures/{id}",
    params(("id" = u64, Path, description = "Travel expenditure ID")),
    responses(
        (status = 200, description = "Successfully deleted"),
        (status = 400, description = "Already processed"),
        (status = 404, description = "Travel expenditure not found")
    ),
    security(("bearer_auth" = [])),
    tag = "TravelExpenditure"
)]
pub async fn delete_travel_expenditure(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let record_id = path.into_inner();
    let record: TravelExpenditure = find_or_404(
        pool.get_ref(),
        TravelExpenditure::TABLE,
        TravelExpenditure::COLUMNS,
        record_id,
        "Travel expenditure",
    )
    .await?;

    if auth.role != Role::Admin {
        auth.require_owner_or(&[], record.employee_id)?;
        if !is_pending(&record.status) {
            return Err(ApiError::bad_request(
                "Only pending travel expenditures can be withdrawn",
            ));
        }
    }

    if delete_by_id(pool.get_ref(), TravelExpenditure::TABLE, record_id).await? == 0 {
        return Err(ApiError::not_found("Travel expenditure"));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Successfully deleted" })))
}

/// Approve a travel expenditure (Accounts/Admin)
#[utoipa::path(
    post,
    path = "/api/travel-expenditures/{id}/approve",
    params(("id" = u64, Path, description = "Travel expenditure ID")),
    request_body = DecisionRequest,
    responses(
        (status = 200, description = "Travel expenditure approved"),
        (status = 400, description = "Not pending"),
        (status = 403, description = "Not allowed to approve")
    ),
    security(("bearer_auth" = [])),
    tag = "TravelExpenditure"
)]
pub async fn approve_travel_expenditure(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: OptionalJson<DecisionRequest>,
) -> Result<HttpResponse, ApiError> {
    decision_response(
        pool.get_ref(),
        ApprovalKind::TravelExpenditure,
        path.into_inner(),
        Decision::Approve,
        body.into_inner(),
        &auth,
        DecisionUpdate::default(),
    )
    .await
}

/// Reject a travel expenditure (Accounts/Admin); remarks are required
#[utoipa::path(
    post,
    path = "/api/travel-expenditures/{id}/reject",
    params(("id" = u64, Path, description = "Travel expenditure ID")),
    request_body = DecisionRequest,
    responses(
        (status = 200, description = "Travel expenditure rejected"),
        (status = 400, description = "Missing remarks or not pending"),
        (status = 403, description = "Not allowed to reject")
    ),
    security(("bearer_auth" = [])),
    tag = "TravelExpenditure"
)]
pub async fn reject_travel_expenditure(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: OptionalJson<DecisionRequest>,
) -> Result<HttpResponse, ApiError> {
    decision_response(
        pool.get_ref(),
        ApprovalKind::TravelExpenditure,
        path.into_inner(),
        Decision::Reject,
        body.into_inner(),
        &auth,
        DecisionUpdate::default(),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, d).unwrap()
    }

    #[test]
    fn total_follows_expense_lines() {
        let expenses = vec![
            Expense {
                date: day(2),
                category: "Air fare".to_string(),
                description: None,
                amount: 6000.0,
            },
            Expense {
                date: day(3),
                category: "Hotel".to_string(),
                description: Some("2 nights".to_string()),
                amount: 4200.5,
            },
        ];
        assert_eq!(
            checked_total("Audit", day(2), day(3), &expenses).unwrap(),
            10200.5
        );
        assert!(checked_total("  ", day(2), day(3), &expenses).is_err());
        assert!(checked_total("Audit", day(2), day(2), &expenses).is_err());
    }
}
