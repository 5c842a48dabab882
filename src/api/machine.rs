use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sqlx::MySqlPool;
use std::str::FromStr;
use strum_macros::{Display, EnumString};
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::model::machine::Machine;
use crate::utils::db_utils::{build_update_sql, execute_update};

#[derive(Debug, Copy, Clone, Serialize, Deserialize, Display, EnumString, PartialEq, ToSchema)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MachineStatus {
    Active,
    Maintenance,
    Retired,
}

impl MachineStatus {
    /// Retired machines never come back; everything else may move freely.
    pub fn can_become(self, next: MachineStatus) -> bool {
        self != MachineStatus::Retired && self != next
    }
}

#[derive(Deserialize, ToSchema)]
pub struct CreateMachine {
    #[schema(example = "MC-014")]
    pub machine_code: String,
    #[schema(example = "Overlock 4-thread")]
    pub name: String,
    #[schema(example = "sewing")]
    pub category: String,
    #[schema(example = "Floor 2, Line B")]
    pub location: String,
    #[schema(example = "2024-06-01", value_type = String, format = "date")]
    pub purchase_date: NaiveDate,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct MachineQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    #[schema(example = "active")]
    pub status: Option<String>,
    #[schema(example = "sewing")]
    pub category: Option<String>,
    /// Search by code or name
    pub search: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct MachineListResponse {
    pub success: bool,
    pub data: Vec<Machine>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

#[derive(Deserialize, ToSchema)]
pub struct AssignMachine {
    #[schema(example = 1000)]
    pub employee_id: u64,
}

#[derive(Deserialize, ToSchema)]
pub struct SetMachineStatus {
    pub status: MachineStatus,
}

const UPDATABLE: &[&str] = &["name", "category", "location", "purchase_date"];

enum FilterValue {
    Str(String),
}

#[utoipa::path(
    post,
    path = "/api/v1/machines",
    request_body = CreateMachine,
    responses(
        (status = 201, description = "Machine registered"),
        (status = 409, description = "Machine code already exists")
    ),
    security(("bearer_auth" = [])),
    tag = "Machine"
)]
pub async fn create_machine(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateMachine>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager()?;

    let code = payload.machine_code.trim().to_uppercase();
    if code.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "success": false,
            "message": "machine_code must not be empty"
        })));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO machines
        (machine_code, name, category, location, purchase_date)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&code)
    .bind(&payload.name)
    .bind(&payload.category)
    .bind(&payload.location)
    .bind(payload.purchase_date)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(_) => Ok(HttpResponse::Created().json(json!({
            "success": true,
            "message": "Machine registered"
        }))),
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23000") {
                    return Ok(HttpResponse::Conflict().json(json!({
                        "success": false,
                        "message": "Machine code already exists"
                    })));
                }
            }

            tracing::error!(error = %e, "Failed to register machine");
            Ok(HttpResponse::InternalServerError().json(json!({
                "success": false,
                "message": "Internal Server Error"
            })))
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/machines",
    params(MachineQuery),
    responses(
        (status = 200, description = "Paginated machine list", body = MachineListResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Machine"
)]
pub async fn list_machines(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<MachineQuery>,
) -> actix_web::Result<impl Responder> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;

    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    if let Some(status) = query.status.as_deref() {
        if MachineStatus::from_str(status).is_err() {
            return Ok(HttpResponse::BadRequest().json(json!({
                "success": false,
                "message": "Invalid status. Allowed: active, maintenance, retired"
            })));
        }
        where_sql.push_str(" AND status = ?");
        args.push(FilterValue::Str(status.to_string()));
    }

    if let Some(category) = &query.category {
        where_sql.push_str(" AND category = ?");
        args.push(FilterValue::Str(category.clone()));
    }

    if let Some(search) = &query.search {
        where_sql.push_str(" AND (machine_code LIKE ? OR name LIKE ?)");
        let like = format!("%{}%", search);
        args.push(FilterValue::Str(like.clone()));
        args.push(FilterValue::Str(like));
    }

    let count_sql = format!("SELECT COUNT(*) FROM machines{}", where_sql);
    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::Str(s) => count_q.bind(s.clone()),
        };
    }

    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to count machines");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let data_sql = format!(
        r#"
        SELECT id, machine_code, name, category, location, purchase_date, status, assigned_employee_id
        FROM machines
        {}
        ORDER BY machine_code
        LIMIT ? OFFSET ?
        "#,
        where_sql
    );

    let mut data_q = sqlx::query_as::<_, Machine>(&data_sql);
    for arg in &args {
        data_q = match arg {
            FilterValue::Str(s) => data_q.bind(s.clone()),
        };
    }

    let machines = data_q
        .bind(per_page as i64)
        .bind(offset as i64)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch machine list");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(MachineListResponse {
        success: true,
        data: machines,
        page,
        per_page,
        total,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/machines/{machine_id}",
    params(
        ("machine_id", Path, description = "Machine ID")
    ),
    responses(
        (status = 200, body = Machine),
        (status = 404, description = "Machine not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Machine"
)]
pub async fn get_machine(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let machine_id = path.into_inner();

    let machine = sqlx::query_as::<_, Machine>(
        r#"
        SELECT id, machine_code, name, category, location, purchase_date, status, assigned_employee_id
        FROM machines
        WHERE id = ?
        "#,
    )
    .bind(machine_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, machine_id, "Failed to fetch machine");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    match machine {
        Some(m) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": m
        }))),
        None => Ok(HttpResponse::NotFound().json(json!({
            "success": false,
            "message": "Machine not found"
        }))),
    }
}

#[utoipa::path(
    put,
    path = "/api/v1/machines/{machine_id}",
    params(
        ("machine_id", Path, description = "Machine ID")
    ),
    request_body = Object,
    responses(
        (status = 200, description = "Machine updated"),
        (status = 400, description = "Unknown or invalid field"),
        (status = 404, description = "Machine not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Machine"
)]
pub async fn update_machine(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<i64>,
    body: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager()?;

    let machine_id = path.into_inner();

    let update = build_update_sql("machines", &body, UPDATABLE, "id", machine_id)?;

    let affected = execute_update(pool.get_ref(), update)
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;

    if affected == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "success": false,
            "message": "Machine not found"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Machine updated"
    })))
}

/// Attach an employee to a machine
#[utoipa::path(
    put,
    path = "/api/v1/machines/{machine_id}/assign",
    params(
        ("machine_id", Path, description = "Machine ID")
    ),
    request_body = AssignMachine,
    responses(
        (status = 200, description = "Machine assigned"),
        (status = 400, description = "Machine not found or retired")
    ),
    security(("bearer_auth" = [])),
    tag = "Machine"
)]
pub async fn assign_machine(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<AssignMachine>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager()?;

    let machine_id = path.into_inner();

    let result = sqlx::query(
        r#"
        UPDATE machines
        SET assigned_employee_id = ?
        WHERE id = ?
        AND status <> 'retired'
        "#,
    )
    .bind(payload.employee_id)
    .bind(machine_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, machine_id, "Failed to assign machine");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::BadRequest().json(json!({
            "success": false,
            "message": "Machine not found or retired"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Machine assigned"
    })))
}

/// Move a machine between active/maintenance/retired
#[utoipa::path(
    put,
    path = "/api/v1/machines/{machine_id}/status",
    params(
        ("machine_id", Path, description = "Machine ID")
    ),
    request_body = SetMachineStatus,
    responses(
        (status = 200, description = "Status updated"),
        (status = 400, description = "Machine not found or transition not allowed")
    ),
    security(("bearer_auth" = [])),
    tag = "Machine"
)]
pub async fn set_machine_status(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<SetMachineStatus>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager()?;

    let machine_id = path.into_inner();
    let next = payload.status;

    // Guarded in SQL: the row must still be in a state allowed to move
    let result = sqlx::query(
        r#"
        UPDATE machines
        SET status = ?
        WHERE id = ?
        AND status <> 'retired'
        AND status <> ?
        "#,
    )
    .bind(next.to_string())
    .bind(machine_id)
    .bind(next.to_string())
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, machine_id, "Failed to update machine status");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::BadRequest().json(json!({
            "success": false,
            "message": "Machine not found or transition not allowed"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Status updated"
    })))
}

#[utoipa::path(
    delete,
    path = "/api/v1/machines/{machine_id}",
    params(
        ("machine_id", Path, description = "Machine ID")
    ),
    responses(
        (status = 200, description = "Machine deleted"),
        (status = 404, description = "Machine not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Machine"
)]
pub async fn delete_machine(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let machine_id = path.into_inner();

    let result = sqlx::query("DELETE FROM machines WHERE id = ?")
        .bind(machine_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, machine_id, "Failed to delete machine");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "success": false,
            "message": "Machine not found"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Machine deleted"
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retired_is_terminal() {
        assert!(!MachineStatus::Retired.can_become(MachineStatus::Active));
        assert!(!MachineStatus::Retired.can_become(MachineStatus::Maintenance));
    }

    #[test]
    fn live_states_move_freely() {
        assert!(MachineStatus::Active.can_become(MachineStatus::Maintenance));
        assert!(MachineStatus::Active.can_become(MachineStatus::Retired));
        assert!(MachineStatus::Maintenance.can_become(MachineStatus::Active));
    }

    #[test]
    fn self_transition_is_rejected() {
        assert!(!MachineStatus::Active.can_become(MachineStatus::Active));
    }

    #[test]
    fn status_strings_match_columns() {
        for s in ["active", "maintenance", "retired"] {
            assert_eq!(MachineStatus::from_str(s).unwrap().to_string(), s);
        }
    }
}
