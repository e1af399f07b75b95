use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::IntoParams;

use crate::auth::identity::AuthUser;
use crate::error::ApiError;
use crate::model::notification::Notification;
use crate::utils::db_utils::{Filters, fetch_page};
use crate::utils::pagination::{Page, list_response};

list_response!(NotificationListResponse, Notification);

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NotificationQuery {
    /// true: only unread notifications
    pub unread: Option<bool>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// The caller's notifications, newest first
#[utoipa::path(
    get,
    path = "/api/notifications",
    params(NotificationQuery),
    responses(
        (status = 200, description = "Paginated notifications", body = NotificationListResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Notification"
)]
pub async fn list_notifications(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<NotificationQuery>,
) -> Result<HttpResponse, ApiError> {
    let page = Page::new(query.page, query.per_page);

    let mut filters = Filters::new();
    filters.eq("employee_id", auth.employee()?);
    if query.unread == Some(true) {
        filters.eq("is_read", false);
    }

    let (data, total) = fetch_page::<Notification>(
        pool.get_ref(),
        Notification::TABLE,
        Notification::COLUMNS,
        &filters,
        "created_at DESC, id DESC",
        page,
    )
    .await?;

    Ok(HttpResponse::Ok().json(NotificationListResponse::new(data, page, total)))
}

/// Mark one notification read
#[utoipa::path(
    post,
    path = "/api/notifications/{id}/read",
    params(("id" = u64, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Marked read"),
        (status = 404, description = "Notification not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Notification"
)]
pub async fn mark_read(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let owner = sqlx::query_scalar::<_, u64>("SELECT employee_id FROM notifications WHERE id = ?")
        .bind(*path)
        .fetch_optional(pool.get_ref())
        .await?;

    // someone else's notification looks the same as a missing one
    if owner.is_none() || owner != auth.employee_id {
        return Err(ApiError::not_found("Notification"));
    }

    sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = ?")
        .bind(path.into_inner())
        .execute(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Marked read" })))
}

/// Mark all of the caller's notifications read
#[utoipa::path(
    post,
    path = "/api/notifications/read-all",
    responses(
        (status = 200, description = "Marked read", body = Object, example = json!({
            "message": "Marked read", "updated": 4
        }))
    ),
    security(("bearer_auth" = [])),
    tag = "Notification"
)]
pub async fn mark_all_read(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, ApiError> {
    let updated = sqlx::query(
        "UPDATE notifications SET is_read = TRUE WHERE employee_id = ? AND is_read = FALSE",
    )
    .bind(auth.employee()?)
    .execute(pool.get_ref())
    .await?
    .rows_affected();

    Ok(HttpResponse::Ok().json(json!({
        "message": "Marked read",
        "updated": updated
    })))
}

/// Delete one of the caller's notifications
#[utoipa::path(
    delete,
    path = "/api/notifications/{id}",
    params(("id" = u64, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Successfully deleted"),
        (status = 404, description = "Notification not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Notification"
)]
pub async fn delete_notification(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let affected = sqlx::query("DELETE FROM notifications WHERE id = ? AND employee_id = ?")
        .bind(path.into_inner())
        .bind(auth.employee()?)
        .execute(pool.get_ref())
        .await?
        .rows_affected();

    if affected == 0 {
        return Err(ApiError::not_found("Notification"));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Successfully deleted" })))
}
