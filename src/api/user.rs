use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::{Value, json};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

use crate::auth::identity::AuthUser;
use crate::error::ApiError;
use crate::model::role::Role;
use crate::model::user::User;
use crate::utils::db_utils::{
    Filters, build_update_sql, delete_by_id, execute_update, fetch_page, find_or_404,
};
use crate::utils::pagination::{Page, list_response};

list_response!(UserListResponse, User);

#[derive(Deserialize, ToSchema)]
pub struct CreateUser {
    #[schema(example = "jdoe")]
    pub username: String,
    #[schema(example = "john.doe@company.com")]
    pub email: String,
    /// 1 admin, 2 hr, 3 employee, 4 accounts, 5 lead
    #[schema(example = 3)]
    pub role_id: u8,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserQuery {
    pub role_id: Option<u8>,
    pub is_active: Option<bool>,
    /// Search by username or email
    pub search: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

fn validate_role(role_id: u8) -> Result<Role, ApiError> {
    Role::from_id(role_id).ok_or_else(|| ApiError::bad_request("Unknown role_id"))
}

/// List users (Admin)
#[utoipa::path(
    get,
    path = "/api/users",
    params(UserQuery),
    responses(
        (status = 200, description = "Paginated user list", body = UserListResponse),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "User"
)]
pub async fn list_users(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<UserQuery>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let page = Page::new(query.page, query.per_page);
    let mut filters = Filters::new();
    filters
        .eq_opt("role_id", query.role_id.map(u32::from))
        .eq_opt("is_active", query.is_active);
    if let Some(search) = &query.search {
        filters.search(&["username", "email"], search);
    }

    let (data, total) =
        fetch_page::<User>(pool.get_ref(), User::TABLE, User::COLUMNS, &filters, "id DESC", page)
            .await?;

    Ok(HttpResponse::Ok().json(UserListResponse::new(data, page, total)))
}

/// Get a user (Admin)
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = u64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User found", body = User),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "User"
)]
pub async fn get_user(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let user: User =
        find_or_404(pool.get_ref(), User::TABLE, User::COLUMNS, path.into_inner(), "User").await?;

    Ok(HttpResponse::Ok().json(user))
}

/// Create a user record (Admin)
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUser,
    responses(
        (status = 201, description = "User created"),
        (status = 400, description = "Invalid payload"),
        (status = 409, description = "Username already exists")
    ),
    security(("bearer_auth" = [])),
    tag = "User"
)]
pub async fn create_user(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateUser>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let username = payload.username.trim().to_lowercase();
    if username.is_empty() || payload.email.trim().is_empty() {
        return Err(ApiError::bad_request("Username and email are required"));
    }
    validate_role(payload.role_id)?;

    let result = sqlx::query("INSERT INTO users (username, email, role_id) VALUES (?, ?, ?)")
        .bind(&username)
        .bind(payload.email.trim())
        .bind(payload.role_id)
        .execute(pool.get_ref())
        .await?;

    tracing::info!(username = %username, role_id = payload.role_id, "User created");

    Ok(HttpResponse::Created().json(json!({
        "message": "User created",
        "id": result.last_insert_id()
    })))
}

/// Update a user (Admin)
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    params(("id" = u64, Path, description = "User ID")),
    request_body = Object,
    responses(
        (status = 200, description = "User updated"),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "User"
)]
pub async fn update_user(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    if let Some(role) = body.get("role_id") {
        let role_id = role
            .as_u64()
            .and_then(|r| u8::try_from(r).ok())
            .ok_or_else(|| ApiError::bad_request("role_id must be a number"))?;
        validate_role(role_id)?;
    }

    let update = build_update_sql(User::TABLE, &body, User::UPDATABLE, path.into_inner())?;
    if execute_update(pool.get_ref(), update).await? == 0 {
        return Err(ApiError::not_found("User"));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "User updated" })))
}

/// Delete a user (Admin)
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = u64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "User"
)]
pub async fn delete_user(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let user_id = path.into_inner();
    if user_id == auth.user_id {
        return Err(ApiError::bad_request("You cannot delete your own account"));
    }

    if delete_by_id(pool.get_ref(), User::TABLE, user_id).await? == 0 {
        return Err(ApiError::not_found("User"));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Successfully deleted" })))
}
