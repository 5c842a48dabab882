use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use std::str::FromStr;
use strum_macros::{Display, EnumString};
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::model::work_query::WorkQuery;

#[derive(Debug, Copy, Clone, Serialize, Deserialize, Display, EnumString, PartialEq, ToSchema)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum WorkQueryStatus {
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl WorkQueryStatus {
    /// Forward-only flow; closed is terminal.
    pub fn can_become(self, next: WorkQueryStatus) -> bool {
        use WorkQueryStatus::*;
        matches!(
            (self, next),
            (Open, InProgress) | (Open, Resolved) | (Open, Closed)
                | (InProgress, Resolved)
                | (InProgress, Closed)
                | (Resolved, Closed)
        )
    }
}

#[derive(Deserialize, ToSchema)]
pub struct CreateWorkQuery {
    #[schema(example = "Machine 14 jams on heavy fabric")]
    pub subject: String,
    pub description: String,
}

#[derive(Deserialize, ToSchema)]
pub struct SetWorkQueryStatus {
    pub status: WorkQueryStatus,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct WorkQueryFilter {
    pub employee_id: Option<u64>,
    #[schema(example = "open")]
    pub status: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct WorkQueryListResponse {
    pub success: bool,
    pub data: Vec<WorkQuery>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

enum FilterValue {
    U64(u64),
    Str(String),
}

#[utoipa::path(
    post,
    path = "/api/v1/work-queries",
    request_body = CreateWorkQuery,
    responses(
        (status = 201, description = "Work query raised"),
        (status = 400, description = "Bad request"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "WorkQuery"
)]
pub async fn create_work_query(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateWorkQuery>,
) -> actix_web::Result<impl Responder> {
    let employee_id: u64 = auth
        .employee_id
        .ok_or_else(|| actix_web::error::ErrorForbidden("No employee profile"))?;

    if payload.subject.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "success": false,
            "message": "subject must not be empty"
        })));
    }

    sqlx::query(
        r#"
        INSERT INTO work_queries (employee_id, subject, description)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(employee_id)
    .bind(payload.subject.trim())
    .bind(&payload.description)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, employee_id, "Failed to raise work query");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Work query raised",
        "status": "open"
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/work-queries",
    params(WorkQueryFilter),
    responses(
        (status = 200, description = "Paginated work query list", body = WorkQueryListResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "WorkQuery"
)]
pub async fn list_work_queries(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<WorkQueryFilter>,
) -> actix_web::Result<impl Responder> {
    // Plain employees only see their own queries
    let employee_id = if auth.is_employee() {
        let own = auth
            .employee_id
            .ok_or_else(|| actix_web::error::ErrorForbidden("No employee profile"))?;
        Some(own)
    } else {
        query.employee_id
    };

    let per_page = query.per_page.unwrap_or(10).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    if let Some(emp_id) = employee_id {
        where_sql.push_str(" AND employee_id = ?");
        args.push(FilterValue::U64(emp_id));
    }

    if let Some(status) = query.status.as_deref() {
        if WorkQueryStatus::from_str(status).is_err() {
            return Ok(HttpResponse::BadRequest().json(json!({
                "success": false,
                "message": "Invalid status. Allowed: open, in_progress, resolved, closed"
            })));
        }
        where_sql.push_str(" AND status = ?");
        args.push(FilterValue::Str(status.to_string()));
    }

    let count_sql = format!("SELECT COUNT(*) FROM work_queries{}", where_sql);
    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Str(s) => count_q.bind(s.clone()),
        };
    }

    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to count work queries");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let data_sql = format!(
        r#"
        SELECT id, employee_id, subject, description, status, created_at
        FROM work_queries
        {}
        ORDER BY created_at DESC
        LIMIT ? OFFSET ?
        "#,
        where_sql
    );

    let mut data_q = sqlx::query_as::<_, WorkQuery>(&data_sql);
    for arg in &args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(*v),
            FilterValue::Str(s) => data_q.bind(s.clone()),
        };
    }

    let rows = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch work query list");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(WorkQueryListResponse {
        success: true,
        data: rows,
        page: page as u32,
        per_page: per_page as u32,
        total,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/work-queries/{query_id}",
    params(
        ("query_id", Path, description = "Work query ID")
    ),
    responses(
        (status = 200, body = WorkQuery),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Work query not found")
    ),
    security(("bearer_auth" = [])),
    tag = "WorkQuery"
)]
pub async fn get_work_query(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let query_id = path.into_inner();

    let row = sqlx::query_as::<_, WorkQuery>(
        r#"
        SELECT id, employee_id, subject, description, status, created_at
        FROM work_queries
        WHERE id = ?
        "#,
    )
    .bind(query_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, query_id, "Failed to fetch work query");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let row = match row {
        Some(r) => r,
        None => {
            return Ok(HttpResponse::NotFound().json(json!({
                "success": false,
                "message": "Work query not found"
            })));
        }
    };

    if auth.is_employee() && Some(row.employee_id) != auth.employee_id {
        return Err(actix_web::error::ErrorForbidden("Not your work query"));
    }

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": row
    })))
}

/// Move a work query along its flow
#[utoipa::path(
    put,
    path = "/api/v1/work-queries/{query_id}/status",
    params(
        ("query_id", Path, description = "Work query ID")
    ),
    request_body = SetWorkQueryStatus,
    responses(
        (status = 200, description = "Status updated"),
        (status = 400, description = "Transition not allowed"),
        (status = 404, description = "Work query not found")
    ),
    security(("bearer_auth" = [])),
    tag = "WorkQuery"
)]
pub async fn set_work_query_status(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<SetWorkQueryStatus>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager()?;

    let query_id = path.into_inner();
    let next = payload.status;

    let current = sqlx::query_scalar::<_, String>("SELECT status FROM work_queries WHERE id = ?")
        .bind(query_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, query_id, "Failed to fetch work query status");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let current = match current {
        Some(s) => s,
        None => {
            return Ok(HttpResponse::NotFound().json(json!({
                "success": false,
                "message": "Work query not found"
            })));
        }
    };

    let current_status = WorkQueryStatus::from_str(&current)
        .map_err(|_| actix_web::error::ErrorInternalServerError("Corrupt status column"))?;

    if !current_status.can_become(next) {
        return Ok(HttpResponse::BadRequest().json(json!({
            "success": false,
            "message": format!("Cannot move work query from {} to {}", current_status, next)
        })));
    }

    // Guard against a concurrent transition since the read
    let result = sqlx::query(
        r#"
        UPDATE work_queries
        SET status = ?
        WHERE id = ?
        AND status = ?
        "#,
    )
    .bind(next.to_string())
    .bind(query_id)
    .bind(&current)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, query_id, "Failed to update work query status");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::BadRequest().json(json!({
            "success": false,
            "message": "Work query was modified concurrently, retry"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Status updated"
    })))
}

#[utoipa::path(
    delete,
    path = "/api/v1/work-queries/{query_id}",
    params(
        ("query_id", Path, description = "Work query ID")
    ),
    responses(
        (status = 200, description = "Work query deleted"),
        (status = 404, description = "Work query not found")
    ),
    security(("bearer_auth" = [])),
    tag = "WorkQuery"
)]
pub async fn delete_work_query(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let query_id = path.into_inner();

    let result = sqlx::query("DELETE FROM work_queries WHERE id = ?")
        .bind(query_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, query_id, "Failed to delete work query");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "success": false,
            "message": "Work query not found"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Work query deleted"
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flow_is_forward_only() {
        use WorkQueryStatus::*;
        assert!(Open.can_become(InProgress));
        assert!(InProgress.can_become(Resolved));
        assert!(Resolved.can_become(Closed));

        assert!(!InProgress.can_become(Open));
        assert!(!Resolved.can_become(InProgress));
    }

    #[test]
    fn closed_is_terminal() {
        use WorkQueryStatus::*;
        assert!(!Closed.can_become(Open));
        assert!(!Closed.can_become(InProgress));
        assert!(!Closed.can_become(Resolved));
    }

    #[test]
    fn open_may_close_directly() {
        assert!(WorkQueryStatus::Open.can_become(WorkQueryStatus::Closed));
    }

    #[test]
    fn snake_case_column_values() {
        assert_eq!(WorkQueryStatus::InProgress.to_string(), "in_progress");
        assert!(WorkQueryStatus::from_str("in_progress").is_ok());
        assert!(WorkQueryStatus::from_str("in-progress").is_err());
    }
}
