use actix_web::{HttpResponse, web};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use super::{decision_response, ensure_can_view, lead_of, scope_to_caller};
use crate::auth::identity::{AuthUser, HR_ROLES, PAYROLL_VIEW_ROLES};
use crate::error::ApiError;
use crate::model::leave::{Leave, LeaveType};
use crate::model::role::Role;
use crate::model::status::{ApprovalStatus, is_pending};
use crate::service::approval::{ApprovalKind, Decision, DecisionRequest, DecisionUpdate};
use crate::utils::json_body::OptionalJson;
use crate::service::leave_days::leave_days_between;
use crate::utils::db_utils::{Filters, delete_by_id, fetch_page, find_or_404};
use crate::utils::notify::notify;
use crate::utils::pagination::{Page, list_response};

list_response!(LeaveListResponse, Leave);

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    /// HR/Admin may file on behalf of an employee; defaults to the caller
    #[schema(nullable = true)]
    pub employee_id: Option<u64>,
    pub leave_type: LeaveType,
    #[schema(example = "2026-01-05", value_type = String, format = Date)]
    pub start_date: NaiveDate,
    #[schema(example = "09:30:00", value_type = String)]
    pub start_time: NaiveTime,
    #[schema(example = "2026-01-05", value_type = String, format = Date)]
    pub end_date: NaiveDate,
    #[schema(example = "13:30:00", value_type = String)]
    pub end_time: NaiveTime,
    #[schema(example = "Family function", nullable = true)]
    pub reason: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateLeave {
    pub leave_type: Option<LeaveType>,
    #[schema(value_type = Option<String>, format = Date)]
    pub start_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>)]
    pub start_time: Option<NaiveTime>,
    #[schema(value_type = Option<String>, format = Date)]
    pub end_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>)]
    pub end_time: Option<NaiveTime>,
    pub reason: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct LeaveWindow {
    #[schema(example = "2026-01-05", value_type = String, format = Date)]
    pub start_date: NaiveDate,
    #[schema(example = "09:30:00", value_type = String)]
    pub start_time: NaiveTime,
    #[schema(example = "2026-01-06", value_type = String, format = Date)]
    pub end_date: NaiveDate,
    #[schema(example = "13:30:00", value_type = String)]
    pub end_time: NaiveTime,
}

#[derive(Serialize, ToSchema)]
pub struct LeaveDaysResponse {
    #[schema(example = 1.5)]
    pub days: f64,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LeaveQuery {
    /// Filter by employee ID
    pub employee_id: Option<u64>,
    /// Filter by status
    pub status: Option<ApprovalStatus>,
    /// Filter by leave type
    pub leave_type: Option<LeaveType>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// A half-day leave must come out at exactly half a day.
fn check_days(leave_type: &str, days: f64) -> Result<(), ApiError> {
    if leave_type == LeaveType::Lhd.as_ref() && days != 0.5 {
        return Err(ApiError::bad_request(
            "Half-day leave must cover exactly one half of a day",
        ));
    }
    Ok(())
}

async fn ensure_no_overlap(
    pool: &MySqlPool,
    employee_id: u64,
    window: &LeaveWindow,
    exclude_id: u64,
) -> Result<(), ApiError> {
    let overlapping = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM leaves
        WHERE employee_id = ?
          AND id <> ?
          AND status IN ('pending', 'approved')
          AND TIMESTAMP(start_date, start_time) < ?
          AND TIMESTAMP(end_date, end_time) > ?
        "#,
    )
    .bind(employee_id)
    .bind(exclude_id)
    .bind(window.end_date.and_time(window.end_time))
    .bind(window.start_date.and_time(window.start_time))
    .fetch_one(pool)
    .await?;

    if overlapping > 0 {
        return Err(ApiError::Conflict(
            "Leave overlaps an existing request".to_string(),
        ));
    }
    Ok(())
}

/// Preview the number of leave days for a window
#[utoipa::path(
    post,
    path = "/api/leaves/compute-days",
    request_body = LeaveWindow,
    responses(
        (status = 200, description = "Leave days", body = LeaveDaysResponse),
        (status = 400, description = "Window covers no office hours")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn compute_days(
    _auth: AuthUser,
    payload: web::Json<LeaveWindow>,
) -> Result<HttpResponse, ApiError> {
    let days = leave_days_between(
        payload.start_date,
        payload.start_time,
        payload.end_date,
        payload.end_time,
    )?;

    Ok(HttpResponse::Ok().json(LeaveDaysResponse { days }))
}

/// List leave requests
///
/// Employees see their own requests, leads also see their reportees'.
#[utoipa::path(
    get,
    path = "/api/leaves",
    params(LeaveQuery),
    responses(
        (status = 200, description = "Paginated leave list", body = LeaveListResponse),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn list_leaves(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<LeaveQuery>,
) -> Result<HttpResponse, ApiError> {
    let page = Page::new(query.page, query.per_page);

    let mut filters = Filters::new();
    scope_to_caller(&mut filters, &auth, PAYROLL_VIEW_ROLES, query.employee_id, true)?;
    filters
        .eq_opt("status", query.status.map(|s| s.to_string()))
        .eq_opt("leave_type", query.leave_type.map(|t| t.to_string()));

    let (data, total) = fetch_page::<Leave>(
        pool.get_ref(),
        Leave::TABLE,
        Leave::COLUMNS,
        &filters,
        "start_date DESC, id DESC",
        page,
    )
    .await?;

    Ok(HttpResponse::Ok().json(LeaveListResponse::new(data, page, total)))
}

/// Get a leave request
#[utoipa::path(
    get,
    path = "/api/leaves/{id}",
    params(("id" = u64, Path, description = "Leave ID")),
    responses(
        (status = 200, description = "Leave found", body = Leave),
        (status = 404, description = "Leave not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let leave: Leave = find_or_404(
        pool.get_ref(),
        Leave::TABLE,
        Leave::COLUMNS,
        path.into_inner(),
        "Leave request",
    )
    .await?;

    ensure_can_view(pool.get_ref(), &auth, PAYROLL_VIEW_ROLES, leave.employee_id, true).await?;

    Ok(HttpResponse::Ok().json(leave))
}

/// Apply for leave
///
/// The number of days is derived from the time window.
#[utoipa::path(
    post,
    path = "/api/leaves",
    request_body = CreateLeave,
    responses(
        (status = 201, description = "Leave request submitted", body = Object, example = json!({
            "message": "Leave request submitted", "id": 3, "days": 1.5, "status": "pending"
        })),
        (status = 400, description = "Invalid window"),
        (status = 409, description = "Overlaps an existing request")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateLeave>,
) -> Result<HttpResponse, ApiError> {
    let employee_id = auth.filing_for(HR_ROLES, payload.employee_id)?;

    let days = leave_days_between(
        payload.start_date,
        payload.start_time,
        payload.end_date,
        payload.end_time,
    )?;
    check_days(payload.leave_type.as_ref(), days)?;

    let window = LeaveWindow {
        start_date: payload.start_date,
        start_time: payload.start_time,
        end_date: payload.end_date,
        end_time: payload.end_time,
    };
    ensure_no_overlap(pool.get_ref(), employee_id, &window, 0).await?;

    let result = sqlx::query(
        r#"
        INSERT INTO leaves
            (employee_id, leave_type, start_date, start_time, end_date, end_time, days, reason)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(employee_id)
    .bind(payload.leave_type.as_ref())
    .bind(payload.start_date)
    .bind(payload.start_time)
    .bind(payload.end_date)
    .bind(payload.end_time)
    .bind(days)
    .bind(payload.reason.as_deref())
    .execute(pool.get_ref())
    .await?;

    let id = result.last_insert_id();
    info!(leave_id = id, employee_id, days, "Leave request submitted");

    if let Some(lead) = lead_of(pool.get_ref(), employee_id).await? {
        notify(
            pool.get_ref(),
            lead,
            &format!("Leave request #{id} ({days} days) awaits your approval"),
            Some(format!("/leaves/{id}")),
        )
        .await;
    }

    Ok(HttpResponse::Created().json(json!({
        "message": "Leave request submitted",
        "id": id,
        "days": days,
        "status": ApprovalStatus::Pending
    })))
}

/// Update a pending leave request
///
/// Days are recomputed from the resulting window.
#[utoipa::path(
    put,
    path = "/api/leaves/{id}",
    params(("id" = u64, Path, description = "Leave ID")),
    request_body = UpdateLeave,
    responses(
        (status = 200, description = "Leave updated"),
        (status = 400, description = "Not pending or invalid window"),
        (status = 404, description = "Leave not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn update_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<UpdateLeave>,
) -> Result<HttpResponse, ApiError> {
    let leave_id = path.into_inner();
    let leave: Leave = find_or_404(
        pool.get_ref(),
        Leave::TABLE,
        Leave::COLUMNS,
        leave_id,
        "Leave request",
    )
    .await?;

    auth.require_owner_or(HR_ROLES, leave.employee_id)?;
    if !is_pending(&leave.status) {
        return Err(ApiError::bad_request("Only pending leave can be changed"));
    }

    let payload = payload.into_inner();
    let leave_type = payload
        .leave_type
        .map_or(leave.leave_type, |t| t.to_string());
    let window = LeaveWindow {
        start_date: payload.start_date.unwrap_or(leave.start_date),
        start_time: payload.start_time.unwrap_or(leave.start_time),
        end_date: payload.end_date.unwrap_or(leave.end_date),
        end_time: payload.end_time.unwrap_or(leave.end_time),
    };
    let reason = payload.reason.or(leave.reason);

    let days = leave_days_between(
        window.start_date,
        window.start_time,
        window.end_date,
        window.end_time,
    )?;
    check_days(&leave_type, days)?;
    ensure_no_overlap(pool.get_ref(), leave.employee_id, &window, leave_id).await?;

    let affected = sqlx::query(
        r#"
        UPDATE leaves
        SET leave_type = ?, start_date = ?, start_time = ?, end_date = ?, end_time = ?,
            days = ?, reason = ?
        WHERE id = ? AND status = 'pending'
        "#,
    )
    .bind(&leave_type)
    .bind(window.start_date)
    .bind(window.start_time)
    .bind(window.end_date)
    .bind(window.end_time)
    .bind(days)
    .bind(reason)
    .bind(leave_id)
    .execute(pool.get_ref())
    .await?
    .rows_affected();

    if affected == 0 {
        return Err(ApiError::bad_request("Only pending leave can be changed"));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Leave updated",
        "days": days
    })))
}

/// Withdraw or delete a leave request
///
/// Owners may withdraw while pending; Admin may delete any request.
#[utoipa::path(
    delete,
    path = "/api/leaves/{id}",
    params(("id" = u64, Path, description = "Leave ID")),
    responses(
        (status = 200, description = "Successfully deleted"),
        (status = 400, description = "Leave already processed"),
        (status = 404, description = "Leave not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn delete_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let leave_id = path.into_inner();
    let leave: Leave = find_or_404(
        pool.get_ref(),
        Leave::TABLE,
        Leave::COLUMNS,
        leave_id,
        "Leave request",
    )
    .await?;

    if auth.role != Role::Admin {
        auth.require_owner_or(&[], leave.employee_id)?;
        if !is_pending(&leave.status) {
            return Err(ApiError::bad_request("Only pending leave can be withdrawn"));
        }
    }

    if delete_by_id(pool.get_ref(), Leave::TABLE, leave_id).await? == 0 {
        return Err(ApiError::not_found("Leave request"));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Successfully deleted" })))
}

/// Approve a leave request (Lead of the employee, HR, Admin)
#[utoipa::path(
    post,
    path = "/api/leaves/{id}/approve",
    params(("id" = u64, Path, description = "Leave ID")),
    request_body = DecisionRequest,
    responses(
        (status = 200, description = "Leave approved"),
        (status = 400, description = "Leave not pending"),
        (status = 403, description = "Not allowed to approve")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: OptionalJson<DecisionRequest>,
) -> Result<HttpResponse, ApiError> {
    decision_response(
        pool.get_ref(),
        ApprovalKind::Leave,
        path.into_inner(),
        Decision::Approve,
        body.into_inner(),
        &auth,
        DecisionUpdate::default(),
    )
    .await
}

/// Reject a leave request; remarks are required
#[utoipa::path(
    post,
    path = "/api/leaves/{id}/reject",
    params(("id" = u64, Path, description = "Leave ID")),
    request_body = DecisionRequest,
    responses(
        (status = 200, description = "Leave rejected"),
        (status = 400, description = "Missing remarks or leave not pending"),
        (status = 403, description = "Not allowed to reject")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: OptionalJson<DecisionRequest>,
) -> Result<HttpResponse, ApiError> {
    decision_response(
        pool.get_ref(),
        ApprovalKind::Leave,
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

    #[test]
    fn half_day_leave_must_be_half_a_day() {
        assert!(check_days("lhd", 0.5).is_ok());
        assert!(check_days("lhd", 1.0).is_err());
        assert!(check_days("cl", 1.0).is_ok());
        assert!(check_days("el", 0.5).is_ok());
    }
}
