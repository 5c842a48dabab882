use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::model::epf::EpfContribution;

/// Statutory contribution rates applied to the gross salary.
pub const EMPLOYEE_RATE: f64 = 0.08;
pub const EMPLOYER_RATE: f64 = 0.12;

/// Contributions derived from a gross salary, rounded to cents.
pub fn contributions(gross: f64) -> (f64, f64) {
    let employee = (gross * EMPLOYEE_RATE * 100.0).round() / 100.0;
    let employer = (gross * EMPLOYER_RATE * 100.0).round() / 100.0;
    (employee, employer)
}

#[derive(Deserialize, ToSchema)]
pub struct CreateEpf {
    #[schema(example = 1001)]
    pub employee_id: u64,

    #[schema(example = "2026-01-01", value_type = String, format = "date")]
    pub month: NaiveDate,

    #[schema(example = 50000.0)]
    pub gross_salary: f64,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateEpf {
    #[schema(example = 52000.0)]
    pub gross_salary: Option<f64>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct EpfQuery {
    #[schema(example = 1)]
    pub page: Option<u32>,

    #[schema(example = 10)]
    pub per_page: Option<u32>,

    #[schema(example = 1001)]
    pub employee_id: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct EpfListResponse {
    pub success: bool,
    pub data: Vec<EpfContribution>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

#[utoipa::path(
    post,
    path = "/api/v1/epf",
    request_body = CreateEpf,
    responses(
        (status = 201, description = "EPF record created"),
        (status = 400, description = "Bad request"),
        (status = 401),
        (status = 403)
    ),
    security(("bearer_auth" = [])),
    tag = "EPF"
)]
pub async fn create_epf(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateEpf>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    if payload.gross_salary <= 0.0 {
        return Ok(HttpResponse::BadRequest().json(json!({
            "success": false,
            "message": "gross_salary must be positive"
        })));
    }

    let (employee_c, employer_c) = contributions(payload.gross_salary);
    let total = employee_c + employer_c;

    sqlx::query(
        r#"
        INSERT INTO epf_contributions
        (employee_id, month, gross_salary, employee_contribution, employer_contribution, total_contribution)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(payload.employee_id)
    .bind(payload.month)
    .bind(payload.gross_salary)
    .bind(employee_c)
    .bind(employer_c)
    .bind(total)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, employee_id = payload.employee_id, "Failed to create EPF record");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "EPF record created"
    })))
}

#[utoipa::path(
    put,
    path = "/api/v1/epf/{epf_id}",
    request_body = UpdateEpf,
    params(
        ("epf_id", description = "EPF record ID")
    ),
    responses(
        (status = 200, description = "EPF record updated"),
        (status = 404, description = "EPF record not found")
    ),
    security(("bearer_auth" = [])),
    tag = "EPF"
)]
pub async fn update_epf(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<UpdateEpf>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let epf_id = path.into_inner();

    let current = sqlx::query_scalar::<_, f64>(
        r#"
        SELECT gross_salary
        FROM epf_contributions
        WHERE id = ?
        "#,
    )
    .bind(epf_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, epf_id, "Failed to fetch EPF record");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let current_gross = match current {
        Some(g) => g,
        None => {
            return Ok(HttpResponse::NotFound().json(json!({
                "success": false,
                "message": "EPF record not found"
            })));
        }
    };

    let gross = body.gross_salary.unwrap_or(current_gross);
    if gross <= 0.0 {
        return Ok(HttpResponse::BadRequest().json(json!({
            "success": false,
            "message": "gross_salary must be positive"
        })));
    }

    let (employee_c, employer_c) = contributions(gross);
    let total = employee_c + employer_c;

    sqlx::query(
        r#"
        UPDATE epf_contributions
        SET gross_salary = ?, employee_contribution = ?, employer_contribution = ?, total_contribution = ?
        WHERE id = ?
        "#,
    )
    .bind(gross)
    .bind(employee_c)
    .bind(employer_c)
    .bind(total)
    .bind(epf_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, epf_id, "Failed to update EPF record");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "EPF record updated"
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/epf/{epf_id}",
    params(
        ("epf_id", description = "EPF record ID")
    ),
    responses(
        (status = 200, body = EpfContribution),
        (status = 404)
    ),
    security(("bearer_auth" = [])),
    tag = "EPF"
)]
pub async fn get_epf(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let epf_id = path.into_inner();

    let record = sqlx::query_as::<_, EpfContribution>(
        r#"
        SELECT id, employee_id, month, gross_salary, employee_contribution, employer_contribution, total_contribution
        FROM epf_contributions
        WHERE id = ?
        "#,
    )
    .bind(epf_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, epf_id, "Failed to fetch EPF record");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    match record {
        Some(r) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": r
        }))),
        None => Ok(HttpResponse::NotFound().json(json!({
            "success": false,
            "message": "EPF record not found"
        }))),
    }
}

#[utoipa::path(
    delete,
    path = "/api/v1/epf/{epf_id}",
    params(
        ("epf_id", description = "EPF record ID")
    ),
    responses(
        (status = 200, description = "EPF record deleted"),
        (status = 404)
    ),
    security(("bearer_auth" = [])),
    tag = "EPF"
)]
pub async fn delete_epf(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let epf_id = path.into_inner();

    let result = sqlx::query("DELETE FROM epf_contributions WHERE id = ?")
        .bind(epf_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, epf_id, "Failed to delete EPF record");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "success": false,
            "message": "EPF record not found"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "EPF record deleted"
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/epf",
    params(EpfQuery),
    responses(
        (status = 200, body = EpfListResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "EPF"
)]
pub async fn list_epf(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<EpfQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(10).clamp(1, 100);
    let offset = (page - 1) * per_page;

    let (where_sql, employee_id) = match query.employee_id {
        Some(id) => (" WHERE employee_id = ?", Some(id)),
        None => ("", None),
    };

    let count_sql = format!("SELECT COUNT(*) FROM epf_contributions{}", where_sql);
    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    if let Some(id) = employee_id {
        count_q = count_q.bind(id);
    }

    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to count EPF records");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let data_sql = format!(
        r#"
        SELECT id, employee_id, month, gross_salary, employee_contribution, employer_contribution, total_contribution
        FROM epf_contributions
        {}
        ORDER BY month DESC
        LIMIT ? OFFSET ?
        "#,
        where_sql
    );

    let mut data_q = sqlx::query_as::<_, EpfContribution>(&data_sql);
    if let Some(id) = employee_id {
        data_q = data_q.bind(id);
    }

    let data = data_q
        .bind(per_page as i64)
        .bind(offset as i64)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch EPF list");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(EpfListResponse {
        success: true,
        data,
        page,
        per_page,
        total,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contributions_apply_statutory_rates() {
        let (employee, employer) = contributions(50_000.0);
        assert_eq!(employee, 4_000.0);
        assert_eq!(employer, 6_000.0);
    }

    #[test]
    fn contributions_round_to_cents() {
        let (employee, employer) = contributions(33_333.33);
        assert_eq!(employee, 2_666.67);
        assert_eq!(employer, 4_000.0);
    }
}
