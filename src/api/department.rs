use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::{Value, json};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

use crate::auth::identity::AuthUser;
use crate::error::ApiError;
use crate::model::department::Department;
use crate::utils::db_utils::{
    Filters, build_update_sql, delete_by_id, execute_update, fetch_page, find_or_404,
};
use crate::utils::pagination::{Page, list_response};

list_response!(DepartmentListResponse, Department);

#[derive(Deserialize, ToSchema)]
pub struct CreateDepartment {
    #[schema(example = "Finance")]
    pub name: String,
    #[schema(example = "FIN")]
    pub code: Option<String>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DepartmentQuery {
    /// Search by name or code
    pub search: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// List departments
#[utoipa::path(
    get,
    path = "/api/departments",
    params(DepartmentQuery),
    responses(
        (status = 200, description = "Paginated department list", body = DepartmentListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Department"
)]
pub async fn list_departments(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<DepartmentQuery>,
) -> Result<HttpResponse, ApiError> {
    let page = Page::new(query.page, query.per_page);

    let mut filters = Filters::new();
    if let Some(search) = &query.search {
        filters.search(&["name", "code"], search);
    }

    let (data, total) = fetch_page::<Department>(
        pool.get_ref(),
        Department::TABLE,
        Department::COLUMNS,
        &filters,
        "name ASC",
        page,
    )
    .await?;

    Ok(HttpResponse::Ok().json(DepartmentListResponse::new(data, page, total)))
}

/// Get a department
#[utoipa::path(
    get,
    path = "/api/departments/{id}",
    params(("id" = u64, Path, description = "Department ID")),
    responses(
        (status = 200, description = "Department found", body = Department),
        (status = 404, description = "Department not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Department"
)]
pub async fn get_department(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let department: Department = find_or_404(
        pool.get_ref(),
        Department::TABLE,
        Department::COLUMNS,
        path.into_inner(),
        "Department",
    )
    .await?;

    Ok(HttpResponse::Ok().json(department))
}

/// Create a department (HR/Admin)
#[utoipa::path(
    post,
    path = "/api/departments",
    request_body = CreateDepartment,
    responses(
        (status = 201, description = "Department created"),
        (status = 400, description = "Invalid payload"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Department already exists")
    ),
    security(("bearer_auth" = [])),
    tag = "Department"
)]
pub async fn create_department(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateDepartment>,
) -> Result<HttpResponse, ApiError> {
    auth.require_hr_or_admin()?;

    let name = payload.name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("Department name is required"));
    }

    let result = sqlx::query("INSERT INTO departments (name, code) VALUES (?, ?)")
        .bind(name)
        .bind(payload.code.as_deref().map(str::trim))
        .execute(pool.get_ref())
        .await?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Department created",
        "id": result.last_insert_id()
    })))
}

/// Update a department (HR/Admin)
#[utoipa::path(
    put,
    path = "/api/departments/{id}",
    params(("id" = u64, Path, description = "Department ID")),
    request_body = Object,
    responses(
        (status = 200, description = "Department updated"),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Department not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Department"
)]
pub async fn update_department(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> Result<HttpResponse, ApiError> {
    auth.require_hr_or_admin()?;

    let update = build_update_sql(
        Department::TABLE,
        &body,
        Department::UPDATABLE,
        path.into_inner(),
    )?;

    if execute_update(pool.get_ref(), update).await? == 0 {
        return Err(ApiError::not_found("Department"));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Department updated" })))
}

/// Delete a department (HR/Admin)
#[utoipa::path(
    delete,
    path = "/api/departments/{id}",
    params(("id" = u64, Path, description = "Department ID")),
    responses(
        (status = 200, description = "Department deleted"),
        (status = 404, description = "Department not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Department"
)]
pub async fn delete_department(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    auth.require_hr_or_admin()?;

    if delete_by_id(pool.get_ref(), Department::TABLE, path.into_inner()).await? == 0 {
        return Err(ApiError::not_found("Department"));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Successfully deleted" })))
}
