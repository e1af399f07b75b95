use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

use crate::auth::identity::AuthUser;
use crate::error::ApiError;
use crate::model::message::Message;
use crate::utils::db_utils::{Filters, delete_by_id, fetch_page, find_or_404};
use crate::utils::notify::notify;
use crate::utils::pagination::{Page, list_response};

list_response!(MessageListResponse, Message);

#[derive(Deserialize, ToSchema)]
pub struct SendMessage {
    /// Employee id of the recipient
    #[schema(example = 7)]
    pub recipient_id: u64,
    #[schema(example = "Shift change")]
    pub subject: String,
    pub body: String,
}

#[derive(Deserialize, ToSchema)]
pub struct ReplyMessage {
    pub body: String,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MessageQuery {
    /// Only unread (inbox) or read messages
    pub is_read: Option<bool>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

async fn load(pool: &MySqlPool, id: u64) -> Result<Message, ApiError> {
    find_or_404(pool, Message::TABLE, Message::COLUMNS, id, "Message").await
}

async fn insert_message(
    pool: &MySqlPool,
    sender_id: u64,
    recipient_id: u64,
    subject: &str,
    body: &str,
    parent_id: Option<u64>,
) -> Result<u64, ApiError> {
    if sender_id == recipient_id {
        return Err(ApiError::bad_request("You cannot message yourself"));
    }
    if subject.trim().is_empty() || body.trim().is_empty() {
        return Err(ApiError::bad_request("Subject and body are required"));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO messages (sender_id, recipient_id, subject, body, parent_id)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(sender_id)
    .bind(recipient_id)
    .bind(subject.trim())
    .bind(body.trim())
    .bind(parent_id)
    .execute(pool)
    .await?;

    let id = result.last_insert_id();
    notify(
        pool,
        recipient_id,
        &format!("New message: {}", subject.trim()),
        Some(format!("/messages/{id}")),
    )
    .await;

    Ok(id)
}

async fn list_box(
    pool: &MySqlPool,
    column: &str,
    employee_id: u64,
    query: &MessageQuery,
) -> Result<HttpResponse, ApiError> {
    let page = Page::new(query.page, query.per_page);

    let mut filters = Filters::new();
    filters
        .eq(column, employee_id)
        .eq_opt("is_read", query.is_read);

    let (data, total) = fetch_page::<Message>(
        pool,
        Message::TABLE,
        Message::COLUMNS,
        &filters,
        "created_at DESC, id DESC",
        page,
    )
    .await?;

    Ok(HttpResponse::Ok().json(MessageListResponse::new(data, page, total)))
}

/// Messages received by the caller
#[utoipa::path(
    get,
    path = "/api/messages/inbox",
    params(MessageQuery),
    responses(
        (status = 200, description = "Paginated inbox", body = MessageListResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Message"
)]
pub async fn inbox(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<MessageQuery>,
) -> Result<HttpResponse, ApiError> {
    list_box(pool.get_ref(), "recipient_id", auth.employee()?, &query).await
}

/// Messages sent by the caller
#[utoipa::path(
    get,
    path = "/api/messages/sent",
    params(MessageQuery),
    responses(
        (status = 200, description = "Paginated sent messages", body = MessageListResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Message"
)]
pub async fn sent(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<MessageQuery>,
) -> Result<HttpResponse, ApiError> {
    list_box(pool.get_ref(), "sender_id", auth.employee()?, &query).await
}

/// Read a message
///
/// Opening a message as its recipient marks it read.
#[utoipa::path(
    get,
    path = "/api/messages/{id}",
    params(("id" = u64, Path, description = "Message ID")),
    responses(
        (status = 200, description = "Message found", body = Message),
        (status = 403, description = "Not a party to the message"),
        (status = 404, description = "Message not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Message"
)]
pub async fn get_message(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let me = auth.employee()?;
    let mut message = load(pool.get_ref(), path.into_inner()).await?;

    if !message.involves(me) {
        return Err(ApiError::forbidden("You are not a party to this message"));
    }

    if message.recipient_id == me && !message.is_read {
        sqlx::query("UPDATE messages SET is_read = TRUE WHERE id = ?")
            .bind(message.id)
            .execute(pool.get_ref())
            .await?;
        message.is_read = true;
    }

    Ok(HttpResponse::Ok().json(message))
}

/// Send a message to another employee
#[utoipa::path(
    post,
    path = "/api/messages",
    request_body = SendMessage,
    responses(
        (status = 201, description = "Message sent"),
        (status = 400, description = "Invalid payload"),
        (status = 409, description = "Unknown recipient")
    ),
    security(("bearer_auth" = [])),
    tag = "Message"
)]
pub async fn send_message(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<SendMessage>,
) -> Result<HttpResponse, ApiError> {
    let id = insert_message(
        pool.get_ref(),
        auth.employee()?,
        payload.recipient_id,
        &payload.subject,
        &payload.body,
        None,
    )
    .await?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Message sent",
        "id": id
    })))
}

/// Reply to a message
///
/// The reply goes to the other party of the original message.
#[utoipa::path(
    post,
    path = "/api/messages/{id}/reply",
    params(("id" = u64, Path, description = "Message ID")),
    request_body = ReplyMessage,
    responses(
        (status = 201, description = "Reply sent"),
        (status = 403, description = "Not a party to the message"),
        (status = 404, description = "Message not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Message"
)]
pub async fn reply_message(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<ReplyMessage>,
) -> Result<HttpResponse, ApiError> {
    let me = auth.employee()?;
    let original = load(pool.get_ref(), path.into_inner()).await?;

    if !original.involves(me) {
        return Err(ApiError::forbidden("You are not a party to this message"));
    }
    let other = if original.sender_id == me {
        original.recipient_id
    } else {
        original.sender_id
    };

    let id = insert_message(
        pool.get_ref(),
        me,
        other,
        &original.reply_subject(),
        &payload.body,
        Some(original.id),
    )
    .await?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Reply sent",
        "id": id
    })))
}

/// Mark a received message as read
#[utoipa::path(
    post,
    path = "/api/messages/{id}/read",
    params(("id" = u64, Path, description = "Message ID")),
    responses(
        (status = 200, description = "Marked read"),
        (status = 404, description = "Message not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Message"
)]
pub async fn mark_read(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let me = auth.employee()?;
    let message = load(pool.get_ref(), path.into_inner()).await?;

    if message.recipient_id != me {
        return Err(ApiError::forbidden("Only the recipient can mark a message read"));
    }

    sqlx::query("UPDATE messages SET is_read = TRUE WHERE id = ?")
        .bind(message.id)
        .execute(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Marked read" })))
}

/// Delete a message (sender or recipient)
#[utoipa::path(
    delete,
    path = "/api/messages/{id}",
    params(("id" = u64, Path, description = "Message ID")),
    responses(
        (status = 200, description = "Successfully deleted"),
        (status = 403, description = "Not a party to the message"),
        (status = 404, description = "Message not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Message"
)]
pub async fn delete_message(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let me = auth.employee()?;
    let message = load(pool.get_ref(), path.into_inner()).await?;

    if !message.involves(me) {
        return Err(ApiError::forbidden("You are not a party to this message"));
    }

    if delete_by_id(pool.get_ref(), Message::TABLE, message.id).await? == 0 {
        return Err(ApiError::not_found("Message"));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Successfully deleted" })))
}
