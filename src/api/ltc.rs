use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use super::{decision_response, ensure_can_view, scope_to_caller};
use crate::auth::identity::{AuthUser, HR_ROLES, PAYROLL_VIEW_ROLES};
use crate::error::ApiError;
use crate::model::line_item::validate_amount;
use crate::model::ltc::{LtcClaim, approved_amount};
use crate::model::role::Role;
use crate::model::status::{ApprovalStatus, is_pending};
use crate::service::approval::{ApprovalKind, Decision, DecisionRequest, DecisionUpdate};
use crate::utils::json_body::OptionalJson;
use crate::utils::db_utils::{Filters, SqlValue, delete_by_id, fetch_page, find_or_404};
use crate::utils::pagination::{Page, list_response};

list_response!(LtcListResponse, LtcClaim);

#[derive(Deserialize, ToSchema)]
pub struct CreateLtc {
    /// HR/Admin may file on behalf of an employee; defaults to the caller
    #[schema(nullable = true)]
    pub employee_id: Option<u64>,
    #[schema(example = "2026-29")]
    pub block_year: String,
    #[schema(example = "Dhaka")]
    pub journey_from: String,
    #[schema(example = "Cox's Bazar")]
    pub journey_to: String,
    #[schema(example = "2026-04-10", value_type = String, format = Date)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-04-15", value_type = String, format = Date)]
    pub end_date: NaiveDate,
    #[schema(example = 3)]
    pub family_members: u32,
    #[schema(example = 18000.0)]
    pub amount_claimed: f64,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateLtc {
    pub block_year: Option<String>,
    pub journey_from: Option<String>,
    pub journey_to: Option<String>,
    #[schema(value_type = Option<String>, format = Date)]
    pub start_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = Date)]
    pub end_date: Option<NaiveDate>,
    pub family_members: Option<u32>,
    pub amount_claimed: Option<f64>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ApproveLtc {
    #[schema(nullable = true)]
    pub remarks: Option<String>,
    /// Defaults to the claimed amount
    #[schema(example = 15000.0, nullable = true)]
    pub amount_approved: Option<f64>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LtcQuery {
    pub employee_id: Option<u64>,
    pub status: Option<ApprovalStatus>,
    pub block_year: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

fn validate_claim(
    journey_from: &str,
    journey_to: &str,
    start_date: NaiveDate,
    end_date: NaiveDate,
    amount_claimed: f64,
) -> Result<(), ApiError> {
    if journey_from.trim().is_empty() || journey_to.trim().is_empty() {
        return Err(ApiError::bad_request("Journey origin and destination are required"));
    }
    if start_date > end_date {
        return Err(ApiError::bad_request("start_date cannot be after end_date"));
    }
    validate_amount("amount_claimed", amount_claimed).map_err(ApiError::BadRequest)
}

/// List LTC claims
#[utoipa::path(
    get,
    path = "/api/ltc",
    params(LtcQuery),
    responses(
        (status = 200, description = "Paginated LTC list", body = LtcListResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "LTC"
)]
pub async fn list_ltc(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<LtcQuery>,
) -> Result<HttpResponse, ApiError> {
    let page = Page::new(query.page, query.per_page);

    let mut filters = Filters::new();
    scope_to_caller(&mut filters, &auth, PAYROLL_VIEW_ROLES, query.employee_id, false)?;
    filters
        .eq_opt("status", query.status.map(|s| s.to_string()))
        .eq_opt("block_year", query.block_year.as_deref());

    let (data, total) = fetch_page::<LtcClaim>(
        pool.get_ref(),
        LtcClaim::TABLE,
        LtcClaim::COLUMNS,
        &filters,
        "start_date DESC, id DESC",
        page,
    )
    .await?;

    Ok(HttpResponse::Ok().json(LtcListResponse::new(data, page, total)))
}

/// Get an LTC claim
#[utoipa::path(
    get,
    path = "/api/ltc/{id}",
    params(("id" = u64, Path, description = "LTC claim ID")),
    responses(
        (status = 200, description = "LTC claim found", body = LtcClaim),
        (status = 404, description = "LTC claim not found")
    ),
    security(("bearer_auth" = [])),
    tag = "LTC"
)]
pub async fn get_ltc(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let claim: LtcClaim = find_or_404(
        pool.get_ref(),
        LtcClaim::TABLE,
        LtcClaim::COLUMNS,
        path.into_inner(),
        "LTC claim",
    )
    .await?;

    ensure_can_view(pool.get_ref(), &auth, PAYROLL_VIEW_ROLES, claim.employee_id, false).await?;

    Ok(HttpResponse::Ok().json(claim))
}

/// File an LTC claim
#[utoipa::path(
    post,
    path = "/api/ltc",
    request_body = CreateLtc,
    responses(
        (status = 201, description = "LTC claim submitted"),
        (status = 400, description = "Invalid payload")
    ),
    security(("bearer_auth" = [])),
    tag = "LTC"
)]
pub async fn create_ltc(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateLtc>,
) -> Result<HttpResponse, ApiError> {
    let employee_id = auth.filing_for(HR_ROLES, payload.employee_id)?;

    validate_claim(
        &payload.journey_from,
        &payload.journey_to,
        payload.start_date,
        payload.end_date,
        payload.amount_claimed,
    )?;

    let result = sqlx::query(
        r#"
        INSERT INTO ltc_claims
            (employee_id, block_year, journey_from, journey_to, start_date, end_date,
             family_members, amount_claimed)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(employee_id)
    .bind(payload.block_year.trim())
    .bind(payload.journey_from.trim())
    .bind(payload.journey_to.trim())
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(payload.family_members)
    .bind(payload.amount_claimed)
    .execute(pool.get_ref())
    .await?;

    let id = result.last_insert_id();
    info!(ltc_id = id, employee_id, amount = payload.amount_claimed, "LTC claim submitted");

    Ok(HttpResponse::Created().json(json!({
        "message": "LTC claim submitted",
        "id": id,
        "status": ApprovalStatus::Pending
    })))
}

/// Update a pending LTC claim
#[utoipa::path(
    put,
    path = "/api/ltc/{id}",
    params(("id" = u64, Path, description = "LTC claim ID")),
    request_body = UpdateLtc,
    responses(
        (status = 200, description = "LTC claim updated"),
        (status = 400, description = "Not pending or invalid payload"),
        (status = 404, description = "LTC claim not found")
    ),
    security(("bearer_auth" = [])),
    tag = "LTC"
)]
pub async fn update_ltc(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<UpdateLtc>,
) -> Result<HttpResponse, ApiError> {
    let claim_id = path.into_inner();
    let claim: LtcClaim = find_or_404(
        pool.get_ref(),
        LtcClaim::TABLE,
        LtcClaim::COLUMNS,
        claim_id,
        "LTC claim",
    )
    .await?;

    auth.require_owner_or(HR_ROLES, claim.employee_id)?;
    if !is_pending(&claim.status) {
        return Err(ApiError::bad_request("Only pending claims can be changed"));
    }

    let payload = payload.into_inner();
    let block_year = payload.block_year.unwrap_or(claim.block_year);
    let journey_from = payload.journey_from.unwrap_or(claim.journey_from);
    let journey_to = payload.journey_to.unwrap_or(claim.journey_to);
    let start_date = payload.start_date.unwrap_or(claim.start_date);
    let end_date = payload.end_date.unwrap_or(claim.end_date);
    let family_members = payload.family_members.unwrap_or(claim.family_members);
    let amount_claimed = payload.amount_claimed.unwrap_or(claim.amount_claimed);

    validate_claim(&journey_from, &journey_to, start_date, end_date, amount_claimed)?;

    let affected = sqlx::query(
        r#"
        UPDATE ltc_claims
        SET block_year = ?, journey_from = ?, journey_to = ?, start_date = ?, end_date = ?,
            family_members = ?, amount_claimed = ?
        WHERE id = ? AND status = 'pending'
        "#,
    )
    .bind(block_year.trim())
    .bind(journey_from.trim())
    .bind(journey_to.trim())
    .bind(start_date)
    .bind(end_date)
    .bind(family_members)
    .bind(amount_claimed)
    .bind(claim_id)
    .execute(pool.get_ref())
    .await?
    .rows_affected();

    if affected == 0 {
        return Err(ApiError::bad_request("Only pending claims can be changed"));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "LTC claim updated" })))
}

/// Delete an LTC claim
///
/// Owners may withdraw while pending; Admin may delete any.
#[utoipa::path(
    delete,
    path = "/api/ltc/{id}",
    params(("id" = u64, Path, description = "LTC claim ID")),
    responses(
        (status = 200, description = "Successfully deleted"),
        (status = 400, description = "Claim already processed"),
        (status = 404, description = "LTC claim not found")
    ),
    security(("bearer_auth" = [])),
    tag = "LTC"
)]
pub async fn delete_ltc(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let claim_id = path.into_inner();
    let claim: LtcClaim = find_or_404(
        pool.get_ref(),
        LtcClaim::TABLE,
        LtcClaim::COLUMNS,
        claim_id,
        "LTC claim",
    )
    .await?;

    if auth.role != Role::Admin {
        auth.require_owner_or(&[], claim.employee_id)?;
        if !is_pending(&claim.status) {
            return Err(ApiError::bad_request("Only pending claims can be withdrawn"));
        }
    }

    if delete_by_id(pool.get_ref(), LtcClaim::TABLE, claim_id).await? == 0 {
        return Err(ApiError::not_found("LTC claim"));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Successfully deleted" })))
}

/// Approve an LTC claim (HR/Accounts/Admin)
///
/// `amount_approved` defaults to the claimed amount and cannot exceed it.
#[utoipa::path(
    post,
    path = "/api/ltc/{id}/approve",
    params(("id" = u64, Path, description = "LTC claim ID")),
    request_body = ApproveLtc,
    responses(
        (status = 200, description = "LTC claim approved"),
        (status = 400, description = "Invalid amount or claim not pending"),
        (status = 409, description = "Claim changed while being approved"),
        (status = 403, description = "Not allowed to approve")
    ),
    security(("bearer_auth" = [])),
    tag = "LTC"
)]
pub async fn approve_ltc(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: OptionalJson<ApproveLtc>,
) -> Result<HttpResponse, ApiError> {
    let claim_id = path.into_inner();
    let ApproveLtc {
        remarks,
        amount_approved,
    } = body.into_inner();

    let claim: LtcClaim = find_or_404(
        pool.get_ref(),
        LtcClaim::TABLE,
        LtcClaim::COLUMNS,
        claim_id,
        "LTC claim",
    )
    .await?;
    let amount =
        approved_amount(claim.amount_claimed, amount_approved).map_err(ApiError::BadRequest)?;

    // the claim may be edited between the read above and the decision
    let set = [("amount_approved", SqlValue::F64(amount))];
    let guard = [("amount_claimed >= ?", SqlValue::F64(amount))];
    decision_response(
        pool.get_ref(),
        ApprovalKind::Ltc,
        claim_id,
        Decision::Approve,
        DecisionRequest { remarks },
        &auth,
        DecisionUpdate {
            set: &set,
            guard: &guard,
        },
    )
    .await
}

/// Reject an LTC claim (HR/Accounts/Admin); remarks are required
#[utoipa::path(
    post,
    path = "/api/ltc/{id}/reject",
    params(("id" = u64, Path, description = "LTC claim ID")),
    request_body = DecisionRequest,
    responses(
        (status = 200, description = "LTC claim rejected"),
        (status = 400, description = "Missing remarks or claim not pending"),
        (status = 403, description = "Not allowed to reject")
    ),
    security(("bearer_auth" = [])),
    tag = "LTC"
)]
pub async fn reject_ltc(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: OptionalJson<DecisionRequest>,
) -> Result<HttpResponse, ApiError> {
    decision_response(
        pool.get_ref(),
        ApprovalKind::Ltc,
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
    use actix_web::{FromRequest, http::StatusCode, test};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 4, d).unwrap()
    }

    async fn approval_body(payload: &str) -> Result<ApproveLtc, actix_web::Error> {
        let (req, mut pl) = test::TestRequest::post()
            .insert_header(("Content-Type", "application/json"))
            .set_payload(payload.to_string())
            .to_http_parts();
        OptionalJson::<ApproveLtc>::from_request(&req, &mut pl)
            .await
            .map(OptionalJson::into_inner)
    }

    #[actix_web::test]
    async fn approval_amount_comes_from_the_body() {
        let body = approval_body(r#"{"amount_approved": 900, "remarks": "Partial"}"#)
            .await
            .unwrap();
        assert_eq!(body.remarks.as_deref(), Some("Partial"));
        assert_eq!(approved_amount(1200.0, body.amount_approved), Ok(900.0));

        let body = approval_body("").await.unwrap();
        assert_eq!(approved_amount(1200.0, body.amount_approved), Ok(1200.0));
    }

    #[actix_web::test]
    async fn malformed_approval_is_rejected_not_defaulted() {
        for payload in [
            r#"{"amount_approved": "900"}"#,
            r#"{"amount_approved": 900, "remarks": 5}"#,
        ] {
            let err = approval_body(payload).await.unwrap_err();
            assert_eq!(err.error_response().status(), StatusCode::BAD_REQUEST, "{payload}");
        }
    }

    #[::core::prelude::v1::test]
    fn claim_validation() {
        assert!(validate_claim("Dhaka", "Sylhet", day(1), day(5), 5000.0).is_ok());
        assert!(validate_claim("Dhaka", "Sylhet", day(1), day(1), 0.0).is_ok());
        assert!(validate_claim(" ", "Sylhet", day(1), day(5), 5000.0).is_err());
        assert!(validate_claim("Dhaka", "Sylhet", day(6), day(5), 5000.0).is_err());
        assert!(validate_claim("Dhaka", "Sylhet", day(1), day(5), -10.0).is_err());
    }
}
