use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::model::supervisor::Supervisor;
use crate::utils::db_utils::{build_update_sql, execute_update};

#[derive(Deserialize, ToSchema)]
pub struct CreateSupervisor {
    #[schema(example = "Jane Perera")]
    pub name: String,
    #[schema(example = "jane.perera@company.com", format = "email")]
    pub email: String,
    #[schema(example = "+94771234567")]
    pub phone: Option<String>,
    #[schema(example = "Cutting")]
    pub section: String,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct SupervisorQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    #[schema(example = "Cutting")]
    pub section: Option<String>,
    /// Search by name or email
    pub search: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct SupervisorListResponse {
    pub success: bool,
    pub data: Vec<Supervisor>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

const UPDATABLE: &[&str] = &["name", "email", "phone", "section"];

enum FilterValue {
    Str(String),
}

#[utoipa::path(
    post,
    path = "/api/v1/supervisors",
    request_body = CreateSupervisor,
    responses(
        (status = 201, description = "Supervisor created"),
        (status = 409, description = "Email already registered")
    ),
    security(("bearer_auth" = [])),
    tag = "Supervisor"
)]
pub async fn create_supervisor(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateSupervisor>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    if payload.name.trim().is_empty() || payload.email.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "success": false,
            "message": "name and email must not be empty"
        })));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO supervisors (name, email, phone, section)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(payload.name.trim())
    .bind(payload.email.trim())
    .bind(&payload.phone)
    .bind(&payload.section)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(_) => Ok(HttpResponse::Created().json(json!({
            "success": true,
            "message": "Supervisor created"
        }))),
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23000") {
                    return Ok(HttpResponse::Conflict().json(json!({
                        "success": false,
                        "message": "Email already registered"
                    })));
                }
            }

            tracing::error!(error = %e, "Failed to create supervisor");
            Ok(HttpResponse::InternalServerError().json(json!({
                "success": false,
                "message": "Internal Server Error"
            })))
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/supervisors",
    params(SupervisorQuery),
    responses(
        (status = 200, description = "Paginated supervisor list", body = SupervisorListResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Supervisor"
)]
pub async fn list_supervisors(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<SupervisorQuery>,
) -> actix_web::Result<impl Responder> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;

    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    if let Some(section) = &query.section {
        where_sql.push_str(" AND section = ?");
        args.push(FilterValue::Str(section.clone()));
    }

    if let Some(search) = &query.search {
        where_sql.push_str(" AND (name LIKE ? OR email LIKE ?)");
        let like = format!("%{}%", search);
        args.push(FilterValue::Str(like.clone()));
        args.push(FilterValue::Str(like));
    }

    let count_sql = format!("SELECT COUNT(*) FROM supervisors{}", where_sql);
    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::Str(s) => count_q.bind(s.clone()),
        };
    }

    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to count supervisors");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let data_sql = format!(
        r#"
        SELECT id, name, email, phone, section
        FROM supervisors
        {}
        ORDER BY name
        LIMIT ? OFFSET ?
        "#,
        where_sql
    );

    let mut data_q = sqlx::query_as::<_, Supervisor>(&data_sql);
    for arg in &args {
        data_q = match arg {
            FilterValue::Str(s) => data_q.bind(s.clone()),
        };
    }

    let rows = data_q
        .bind(per_page as i64)
        .bind(offset as i64)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch supervisor list");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(SupervisorListResponse {
        success: true,
        data: rows,
        page,
        per_page,
        total,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/supervisors/{supervisor_id}",
    params(
        ("supervisor_id", Path, description = "Supervisor ID")
    ),
    responses(
        (status = 200, body = Supervisor),
        (status = 404, description = "Supervisor not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Supervisor"
)]
pub async fn get_supervisor(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let supervisor_id = path.into_inner();

    let row = sqlx::query_as::<_, Supervisor>(
        "SELECT id, name, email, phone, section FROM supervisors WHERE id = ?",
    )
    .bind(supervisor_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, supervisor_id, "Failed to fetch supervisor");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    match row {
        Some(s) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": s
        }))),
        None => Ok(HttpResponse::NotFound().json(json!({
            "success": false,
            "message": "Supervisor not found"
        }))),
    }
}

#[utoipa::path(
    put,
    path = "/api/v1/supervisors/{supervisor_id}",
    params(
        ("supervisor_id", Path, description = "Supervisor ID")
    ),
    request_body = Object,
    responses(
        (status = 200, description = "Supervisor updated"),
        (status = 400, description = "Unknown or invalid field"),
        (status = 404, description = "Supervisor not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Supervisor"
)]
pub async fn update_supervisor(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<i64>,
    body: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let supervisor_id = path.into_inner();

    let update = build_update_sql("supervisors", &body, UPDATABLE, "id", supervisor_id)?;

    let affected = execute_update(pool.get_ref(), update)
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;

    if affected == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "success": false,
            "message": "Supervisor not found"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Supervisor updated"
    })))
}

#[utoipa::path(
    delete,
    path = "/api/v1/supervisors/{supervisor_id}",
    params(
        ("supervisor_id", Path, description = "Supervisor ID")
    ),
    responses(
        (status = 200, description = "Supervisor deleted"),
        (status = 404, description = "Supervisor not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Supervisor"
)]
pub async fn delete_supervisor(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let supervisor_id = path.into_inner();

    let result = sqlx::query("DELETE FROM supervisors WHERE id = ?")
        .bind(supervisor_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, supervisor_id, "Failed to delete supervisor");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "success": false,
            "message": "Supervisor not found"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Supervisor deleted"
    })))
}
