use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::{Value, json};
use sqlx::MySqlPool;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use super::{ensure_can_view, lead_of, scope_to_caller};
use crate::auth::identity::{AuthUser, HR_ROLES};
use crate::error::ApiError;
use crate::model::appraisal::{Appraisal, AppraisalStatus, validate_rating};
use crate::model::role::Role;
use crate::utils::db_utils::{
    Filters, build_update_sql, delete_by_id, execute_update, fetch_page, find_or_404,
};
use crate::utils::notify::notify;
use crate::utils::pagination::{Page, list_response};

list_response!(AppraisalListResponse, Appraisal);

#[derive(Deserialize, ToSchema)]
pub struct CreateAppraisal {
    #[schema(example = "2025-26")]
    pub period: String,
    #[schema(example = 4.0, nullable = true)]
    pub self_rating: Option<f64>,
    #[schema(nullable = true)]
    pub achievements: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct ReviewAppraisal {
    #[schema(example = 3.5)]
    pub manager_rating: f64,
    #[schema(nullable = true)]
    pub comments: Option<String>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AppraisalQuery {
    pub employee_id: Option<u64>,
    pub status: Option<AppraisalStatus>,
    pub period: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

async fn load(pool: &MySqlPool, id: u64) -> Result<Appraisal, ApiError> {
    find_or_404(pool, Appraisal::TABLE, Appraisal::COLUMNS, id, "Appraisal").await
}

/// Moves an appraisal between states, guarding on the current one.
async fn transition(
    pool: &MySqlPool,
    id: u64,
    from: AppraisalStatus,
    to: AppraisalStatus,
) -> Result<(), ApiError> {
    let affected = sqlx::query("UPDATE appraisals SET status = ? WHERE id = ? AND status = ?")
        .bind(to.as_ref())
        .bind(id)
        .bind(from.as_ref())
        .execute(pool)
        .await?
        .rows_affected();

    if affected == 0 {
        return Err(ApiError::bad_request(format!("Appraisal is not {from}")));
    }
    Ok(())
}

/// List appraisals
///
/// Leads also see the appraisals of their reportees.
#[utoipa::path(
    get,
    path = "/api/appraisals",
    params(AppraisalQuery),
    responses(
        (status = 200, description = "Paginated appraisal list", body = AppraisalListResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Appraisal"
)]
pub async fn list_appraisals(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<AppraisalQuery>,
) -> Result<HttpResponse, ApiError> {
    let page = Page::new(query.page, query.per_page);

    let mut filters = Filters::new();
    scope_to_caller(&mut filters, &auth, HR_ROLES, query.employee_id, true)?;
    filters
        .eq_opt("status", query.status.map(|s| s.to_string()))
        .eq_opt("period", query.period.as_deref());

    let (data, total) = fetch_page::<Appraisal>(
        pool.get_ref(),
        Appraisal::TABLE,
        Appraisal::COLUMNS,
        &filters,
        "period DESC, id DESC",
        page,
    )
    .await?;

    Ok(HttpResponse::Ok().json(AppraisalListResponse::new(data, page, total)))
}

/// Get an appraisal
#[utoipa::path(
    get,
    path = "/api/appraisals/{id}",
    params(("id" = u64, Path, description = "Appraisal ID")),
    responses(
        (status = 200, description = "Appraisal found", body = Appraisal),
        (status = 404, description = "Appraisal not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Appraisal"
)]
pub async fn get_appraisal(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let appraisal = load(pool.get_ref(), path.into_inner()).await?;
    ensure_can_view(pool.get_ref(), &auth, HR_ROLES, appraisal.employee_id, true).await?;

    Ok(HttpResponse::Ok().json(appraisal))
}

/// Start a self appraisal
#[utoipa::path(
    post,
    path = "/api/appraisals",
    request_body = CreateAppraisal,
    responses(
        (status = 201, description = "Appraisal drafted"),
        (status = 400, description = "Invalid payload"),
        (status = 409, description = "Appraisal already exists for this period")
    ),
    security(("bearer_auth" = [])),
    tag = "Appraisal"
)]
pub async fn create_appraisal(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateAppraisal>,
) -> Result<HttpResponse, ApiError> {
    let employee_id = auth.employee()?;

    let period = payload.period.trim();
    if period.is_empty() {
        return Err(ApiError::bad_request("Appraisal period is required"));
    }
    validate_rating("self_rating", payload.self_rating).map_err(ApiError::BadRequest)?;

    let result = sqlx::query(
        r#"
        INSERT INTO appraisals (employee_id, period, self_rating, achievements, status)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(employee_id)
    .bind(period)
    .bind(payload.self_rating)
    .bind(payload.achievements.as_deref())
    .bind(AppraisalStatus::Draft.as_ref())
    .execute(pool.get_ref())
    .await?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Appraisal drafted",
        "id": result.last_insert_id(),
        "status": AppraisalStatus::Draft
    })))
}

/// Update a draft appraisal (owner)
#[utoipa::path(
    put,
    path = "/api/appraisals/{id}",
    params(("id" = u64, Path, description = "Appraisal ID")),
    request_body = Object,
    responses(
        (status = 200, description = "Appraisal updated"),
        (status = 400, description = "Not a draft or invalid payload"),
        (status = 403, description = "Not the owner")
    ),
    security(("bearer_auth" = [])),
    tag = "Appraisal"
)]
pub async fn update_appraisal(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> Result<HttpResponse, ApiError> {
    let appraisal_id = path.into_inner();
    let appraisal = load(pool.get_ref(), appraisal_id).await?;

    auth.require_owner_or(&[], appraisal.employee_id)?;
    if appraisal.status() != Some(AppraisalStatus::Draft) {
        return Err(ApiError::bad_request("Only draft appraisals can be changed"));
    }
    if let Some(rating) = body.get("self_rating") {
        let rating = match rating {
            Value::Null => None,
            other => Some(
                other
                    .as_f64()
                    .ok_or_else(|| ApiError::bad_request("self_rating must be a number"))?,
            ),
        };
        validate_rating("self_rating", rating).map_err(ApiError::BadRequest)?;
    }

    let mut update =
        build_update_sql(Appraisal::TABLE, &body, Appraisal::OWNER_UPDATABLE, appraisal_id)?;
    update.sql.push_str(" AND status = 'draft'");
    if execute_update(pool.get_ref(), update).await? == 0 {
        return Err(ApiError::bad_request("Only draft appraisals can be changed"));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Appraisal updated" })))
}

/// Submit a draft appraisal for review (owner)
#[utoipa::path(
    post,
    path = "/api/appraisals/{id}/submit",
    params(("id" = u64, Path, description = "Appraisal ID")),
    responses(
        (status = 200, description = "Appraisal submitted"),
        (status = 400, description = "Not a draft")
    ),
    security(("bearer_auth" = [])),
    tag = "Appraisal"
)]
pub async fn submit_appraisal(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let appraisal_id = path.into_inner();
    let appraisal = load(pool.get_ref(), appraisal_id).await?;
    auth.require_owner_or(&[], appraisal.employee_id)?;

    transition(
        pool.get_ref(),
        appraisal_id,
        AppraisalStatus::Draft,
        AppraisalStatus::Submitted,
    )
    .await?;

    if let Some(lead) = lead_of(pool.get_ref(), appraisal.employee_id).await? {
        notify(
            pool.get_ref(),
            lead,
            &format!("Appraisal #{appraisal_id} for {} awaits your review", appraisal.period),
            Some(format!("/appraisals/{appraisal_id}")),
        )
        .await;
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Appraisal submitted",
        "status": AppraisalStatus::Submitted
    })))
}

/// Review a submitted appraisal (Lead of the employee, HR, Admin)
#[utoipa::path(
    post,
    path = "/api/appraisals/{id}/review",
    params(("id" = u64, Path, description = "Appraisal ID")),
    request_body = ReviewAppraisal,
    responses(
        (status = 200, description = "Appraisal reviewed"),
        (status = 400, description = "Not submitted or invalid rating"),
        (status = 403, description = "Not allowed to review")
    ),
    security(("bearer_auth" = [])),
    tag = "Appraisal"
)]
pub async fn review_appraisal(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<ReviewAppraisal>,
) -> Result<HttpResponse, ApiError> {
    let appraisal_id = path.into_inner();
    let appraisal = load(pool.get_ref(), appraisal_id).await?;

    if auth.employee_id == Some(appraisal.employee_id) {
        return Err(ApiError::forbidden("You cannot review your own appraisal"));
    }
    if !auth.has_any(HR_ROLES) {
        let is_lead = auth.role == Role::Lead
            && auth.employee_id.is_some()
            && lead_of(pool.get_ref(), appraisal.employee_id).await? == auth.employee_id;
        if !is_lead {
            return Err(ApiError::forbidden(
                "Only the employee's lead, HR or Admin can review",
            ));
        }
    }

    validate_rating("manager_rating", Some(payload.manager_rating))
        .map_err(ApiError::BadRequest)?;

    let affected = sqlx::query(
        r#"
        UPDATE appraisals
        SET manager_rating = ?, comments = ?, reviewer_id = ?, status = ?
        WHERE id = ? AND status = ?
        "#,
    )
    .bind(payload.manager_rating)
    .bind(payload.comments.as_deref())
    .bind(auth.employee_id)
    .bind(AppraisalStatus::Reviewed.as_ref())
    .bind(appraisal_id)
    .bind(AppraisalStatus::Submitted.as_ref())
    .execute(pool.get_ref())
    .await?
    .rows_affected();

    if affected == 0 {
        return Err(ApiError::bad_request("Appraisal is not submitted"));
    }

    info!(appraisal_id, reviewer = auth.user_id, "Appraisal reviewed");
    notify(
        pool.get_ref(),
        appraisal.employee_id,
        &format!("Your appraisal for {} has been reviewed", appraisal.period),
        Some(format!("/appraisals/{appraisal_id}")),
    )
    .await;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Appraisal reviewed",
        "status": AppraisalStatus::Reviewed
    })))
}

/// Delete an appraisal (HR/Admin)
#[utoipa::path(
    delete,
    path = "/api/appraisals/{id}",
    params(("id" = u64, Path, description = "Appraisal ID")),
    responses(
        (status = 200, description = "Successfully deleted"),
        (status = 404, description = "Appraisal not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Appraisal"
)]
pub async fn delete_appraisal(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    auth.require_hr_or_admin()?;

    if delete_by_id(pool.get_ref(), Appraisal::TABLE, path.into_inner()).await? == 0 {
        return Err(ApiError::not_found("Appraisal"));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Successfully deleted" })))
}
