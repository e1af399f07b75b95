use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{Value, json};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

use crate::auth::identity::AuthUser;
use crate::error::ApiError;
use crate::model::holiday::Holiday;
use crate::utils::db_utils::{
    Filters, SqlValue, build_update_sql, delete_by_id, execute_update, fetch_page, find_or_404,
};
use crate::utils::pagination::{Page, list_response};

list_response!(HolidayListResponse, Holiday);

#[derive(Deserialize, ToSchema)]
pub struct CreateHoliday {
    #[schema(example = "Independence Day")]
    pub name: String,
    #[schema(example = "2026-03-26", value_type = String, format = Date)]
    pub date: NaiveDate,
    #[schema(nullable = true)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_optional: bool,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HolidayQuery {
    /// Calendar year
    pub year: Option<i32>,
    pub is_optional: Option<bool>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// List holidays
#[utoipa::path(
    get,
    path = "/api/holidays",
    params(HolidayQuery),
    responses(
        (status = 200, description = "Paginated holiday list", body = HolidayListResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Holiday"
)]
pub async fn list_holidays(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<HolidayQuery>,
) -> Result<HttpResponse, ApiError> {
    let page = Page::new(query.page, query.per_page);

    let mut filters = Filters::new();
    if let Some(year) = query.year {
        filters.raw("YEAR(date) = ?", vec![SqlValue::I64(i64::from(year))]);
    }
    filters.eq_opt("is_optional", query.is_optional);

    let (data, total) = fetch_page::<Holiday>(
        pool.get_ref(),
        Holiday::TABLE,
        Holiday::COLUMNS,
        &filters,
        "date ASC",
        page,
    )
    .await?;

    Ok(HttpResponse::Ok().json(HolidayListResponse::new(data, page, total)))
}

/// Get a holiday
#[utoipa::path(
    get,
    path = "/api/holidays/{id}",
    params(("id" = u64, Path, description = "Holiday ID")),
    responses(
        (status = 200, description = "Holiday found", body = Holiday),
        (status = 404, description = "Holiday not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Holiday"
)]
pub async fn get_holiday(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let holiday: Holiday = find_or_404(
        pool.get_ref(),
        Holiday::TABLE,
        Holiday::COLUMNS,
        path.into_inner(),
        "Holiday",
    )
    .await?;

    Ok(HttpResponse::Ok().json(holiday))
}

/// Add a holiday (HR/Admin)
#[utoipa::path(
    post,
    path = "/api/holidays",
    request_body = CreateHoliday,
    responses(
        (status = 201, description = "Holiday created"),
        (status = 400, description = "Invalid payload"),
        (status = 409, description = "A holiday already exists on this date")
    ),
    security(("bearer_auth" = [])),
    tag = "Holiday"
)]
pub async fn create_holiday(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateHoliday>,
) -> Result<HttpResponse, ApiError> {
    auth.require_hr_or_admin()?;

    let name = payload.name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("Holiday name is required"));
    }

    let result = sqlx::query(
        "INSERT INTO holidays (name, date, description, is_optional) VALUES (?, ?, ?, ?)",
    )
    .bind(name)
    .bind(payload.date)
    .bind(payload.description.as_deref())
    .bind(payload.is_optional)
    .execute(pool.get_ref())
    .await?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Holiday created",
        "id": result.last_insert_id()
    })))
}

/// Update a holiday (HR/Admin)
#[utoipa::path(
    put,
    path = "/api/holidays/{id}",
    params(("id" = u64, Path, description = "Holiday ID")),
    request_body = Object,
    responses(
        (status = 200, description = "Holiday updated"),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Holiday not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Holiday"
)]
pub async fn update_holiday(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> Result<HttpResponse, ApiError> {
    auth.require_hr_or_admin()?;

    let update = build_update_sql(Holiday::TABLE, &body, Holiday::UPDATABLE, path.into_inner())?;
    if execute_update(pool.get_ref(), update).await? == 0 {
        return Err(ApiError::not_found("Holiday"));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Holiday updated" })))
}

/// Delete a holiday (HR/Admin)
#[utoipa::path(
    delete,
    path = "/api/holidays/{id}",
    params(("id" = u64, Path, description = "Holiday ID")),
    responses(
        (status = 200, description = "Successfully deleted"),
        (status = 404, description = "Holiday not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Holiday"
)]
pub async fn delete_holiday(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    auth.require_hr_or_admin()?;

    if delete_by_id(pool.get_ref(), Holiday::TABLE, path.into_inner()).await? == 0 {
        return Err(ApiError::not_found("Holiday"));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Successfully deleted" })))
}
