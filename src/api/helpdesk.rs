use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use super::{ensure_can_view, scope_to_caller};
use crate::auth::identity::{AuthUser, HR_ROLES};
use crate::error::ApiError;
use crate::model::helpdesk::HelpdeskTicket;
use crate::utils::db_utils::{Filters, delete_by_id, fetch_page, find_or_404};
use crate::utils::json_body::OptionalJson;
use crate::utils::notify::notify;
use crate::utils::pagination::{Page, list_response};

list_response!(HelpdeskListResponse, HelpdeskTicket);

#[derive(Deserialize, ToSchema)]
pub struct CreateTicket {
    #[schema(example = "Payslip not generated")]
    pub subject: String,
    #[schema(example = "March payslip is missing from my account")]
    pub description: String,
    #[schema(example = "payroll", nullable = true)]
    pub category: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct TicketReply {
    #[schema(example = "Payslips are generated on the 5th")]
    #[serde(default)]
    pub reply: String,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HelpdeskQuery {
    pub employee_id: Option<u64>,
    /// open | resolved
    pub status: Option<String>,
    pub category: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

async fn load(pool: &MySqlPool, id: u64) -> Result<HelpdeskTicket, ApiError> {
    find_or_404(
        pool,
        HelpdeskTicket::TABLE,
        HelpdeskTicket::COLUMNS,
        id,
        "Helpdesk ticket",
    )
    .await
}

/// List helpdesk tickets
#[utoipa::path(
    get,
    path = "/api/helpdesk",
    params(HelpdeskQuery),
    responses(
        (status = 200, description = "Paginated ticket list", body = HelpdeskListResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Helpdesk"
)]
pub async fn list_tickets(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<HelpdeskQuery>,
) -> Result<HttpResponse, ApiError> {
    let page = Page::new(query.page, query.per_page);

    let mut filters = Filters::new();
    scope_to_caller(&mut filters, &auth, HR_ROLES, query.employee_id, false)?;
    filters
        .eq_opt("status", query.status.as_deref())
        .eq_opt("category", query.category.as_deref());

    let (data, total) = fetch_page::<HelpdeskTicket>(
        pool.get_ref(),
        HelpdeskTicket::TABLE,
        HelpdeskTicket::COLUMNS,
        &filters,
        "id DESC",
        page,
    )
    .await?;

    Ok(HttpResponse::Ok().json(HelpdeskListResponse::new(data, page, total)))
}

/// Get a helpdesk ticket
#[utoipa::path(
    get,
    path = "/api/helpdesk/{id}",
    params(("id" = u64, Path, description = "Ticket ID")),
    responses(
        (status = 200, description = "Ticket found", body = HelpdeskTicket),
        (status = 404, description = "Ticket not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Helpdesk"
)]
pub async fn get_ticket(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let ticket = load(pool.get_ref(), path.into_inner()).await?;
    ensure_can_view(pool.get_ref(), &auth, HR_ROLES, ticket.employee_id, false).await?;

    Ok(HttpResponse::Ok().json(ticket))
}

/// Raise a helpdesk ticket
#[utoipa::path(
    post,
    path = "/api/helpdesk",
    request_body = CreateTicket,
    responses(
        (status = 201, description = "Ticket raised"),
        (status = 400, description = "Invalid payload")
    ),
    security(("bearer_auth" = [])),
    tag = "Helpdesk"
)]
pub async fn create_ticket(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateTicket>,
) -> Result<HttpResponse, ApiError> {
    let employee_id = auth.employee()?;

    let subject = payload.subject.trim();
    if subject.is_empty() || payload.description.trim().is_empty() {
        return Err(ApiError::bad_request("Subject and description are required"));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO helpdesk_tickets (employee_id, subject, description, category, status)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(employee_id)
    .bind(subject)
    .bind(payload.description.trim())
    .bind(payload.category.as_deref())
    .bind(HelpdeskTicket::OPEN)
    .execute(pool.get_ref())
    .await?;

    let id = result.last_insert_id();
    info!(ticket_id = id, employee_id, "Helpdesk ticket raised");

    Ok(HttpResponse::Created().json(json!({
        "message": "Ticket raised",
        "id": id,
        "status": HelpdeskTicket::OPEN
    })))
}

/// Reply to a ticket (HR/Admin)
///
/// The ticket stays open.
#[utoipa::path(
    post,
    path = "/api/helpdesk/{id}/reply",
    params(("id" = u64, Path, description = "Ticket ID")),
    request_body = TicketReply,
    responses(
        (status = 200, description = "Reply recorded"),
        (status = 400, description = "Empty reply"),
        (status = 404, description = "Ticket not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Helpdesk"
)]
pub async fn reply_ticket(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<TicketReply>,
) -> Result<HttpResponse, ApiError> {
    auth.require_hr_or_admin()?;

    let reply = payload.reply.trim();
    if reply.is_empty() {
        return Err(ApiError::bad_request("Reply cannot be empty"));
    }

    let ticket = load(pool.get_ref(), path.into_inner()).await?;

    sqlx::query("UPDATE helpdesk_tickets SET reply = ? WHERE id = ?")
        .bind(reply)
        .bind(ticket.id)
        .execute(pool.get_ref())
        .await?;

    notify(
        pool.get_ref(),
        ticket.employee_id,
        &format!("New reply on your ticket \"{}\"", ticket.subject),
        Some(format!("/helpdesk/{}", ticket.id)),
    )
    .await;

    Ok(HttpResponse::Ok().json(json!({ "message": "Reply recorded" })))
}

/// Resolve a ticket (HR/Admin)
#[utoipa::path(
    post,
    path = "/api/helpdesk/{id}/resolve",
    params(("id" = u64, Path, description = "Ticket ID")),
    request_body = TicketReply,
    responses(
        (status = 200, description = "Ticket resolved"),
        (status = 400, description = "Ticket already resolved"),
        (status = 404, description = "Ticket not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Helpdesk"
)]
pub async fn resolve_ticket(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: OptionalJson<TicketReply>,
) -> Result<HttpResponse, ApiError> {
    auth.require_hr_or_admin()?;

    let ticket = load(pool.get_ref(), path.into_inner()).await?;
    let reply = Some(payload.into_inner().reply.trim().to_string())
        .filter(|r| !r.is_empty())
        .or(ticket.reply);

    let affected = sqlx::query(
        r#"
        UPDATE helpdesk_tickets
        SET status = ?, reply = ?, resolved_by = ?, resolved_at = UTC_TIMESTAMP()
        WHERE id = ? AND status = ?
        "#,
    )
    .bind(HelpdeskTicket::RESOLVED)
    .bind(reply)
    .bind(auth.user_id)
    .bind(ticket.id)
    .bind(HelpdeskTicket::OPEN)
    .execute(pool.get_ref())
    .await?
    .rows_affected();

    if affected == 0 {
        return Err(ApiError::bad_request("Ticket is already resolved"));
    }

    info!(ticket_id = ticket.id, actor = auth.user_id, "Helpdesk ticket resolved");
    notify(
        pool.get_ref(),
        ticket.employee_id,
        &format!("Your ticket \"{}\" was resolved", ticket.subject),
        Some(format!("/helpdesk/{}", ticket.id)),
    )
    .await;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Ticket resolved",
        "status": HelpdeskTicket::RESOLVED
    })))
}

/// Delete a ticket (Admin)
#[utoipa::path(
    delete,
    path = "/api/helpdesk/{id}",
    params(("id" = u64, Path, description = "Ticket ID")),
    responses(
        (status = 200, description = "Successfully deleted"),
        (status = 404, description = "Ticket not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Helpdesk"
)]
pub async fn delete_ticket(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    if delete_by_id(pool.get_ref(), HelpdeskTicket::TABLE, path.into_inner()).await? == 0 {
        return Err(ApiError::not_found("Helpdesk ticket"));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Successfully deleted" })))
}
