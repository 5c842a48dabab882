use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use std::str::FromStr;
use strum_macros::{Display, EnumString};
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::model::invoice::Invoice;

#[derive(Debug, Serialize, Deserialize, Display, EnumString, PartialEq, ToSchema)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Draft,
    Sent,
    Paid,
    Cancelled,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateInvoice {
    #[schema(example = "INV-2026-0001")]
    pub invoice_no: String,
    #[schema(example = "Acme Apparel Ltd")]
    pub client_name: String,
    #[schema(example = "2026-01-05", value_type = String, format = "date")]
    pub issue_date: NaiveDate,
    #[schema(example = "2026-02-05", value_type = String, format = "date")]
    pub due_date: NaiveDate,
    #[schema(example = 120000.0)]
    pub subtotal: f64,
    #[schema(example = 18000.0)]
    pub tax: f64,
    pub notes: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateInvoice {
    pub client_name: Option<String>,
    #[schema(value_type = String, format = "date")]
    pub issue_date: Option<NaiveDate>,
    #[schema(value_type = String, format = "date")]
    pub due_date: Option<NaiveDate>,
    pub subtotal: Option<f64>,
    pub tax: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct InvoiceQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    #[schema(example = "sent")]
    pub status: Option<String>,
    /// Search by client name
    pub search: Option<String>,
    #[schema(value_type = String, format = "date")]
    pub from: Option<NaiveDate>,
    #[schema(value_type = String, format = "date")]
    pub to: Option<NaiveDate>,
}

#[derive(Serialize, ToSchema)]
pub struct InvoiceListResponse {
    pub success: bool,
    pub data: Vec<Invoice>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

/// Amount owed: subtotal plus tax, rounded to cents.
pub fn invoice_total(subtotal: f64, tax: f64) -> f64 {
    ((subtotal + tax) * 100.0).round() / 100.0
}

enum FilterValue {
    Str(String),
    Date(NaiveDate),
}

#[utoipa::path(
    post,
    path = "/api/v1/invoices",
    request_body = CreateInvoice,
    responses(
        (status = 201, description = "Invoice created"),
        (status = 400, description = "Bad request"),
        (status = 409, description = "Invoice number already exists")
    ),
    security(("bearer_auth" = [])),
    tag = "Invoice"
)]
pub async fn create_invoice(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateInvoice>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    if payload.invoice_no.trim().is_empty() || payload.client_name.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "success": false,
            "message": "invoice_no and client_name must not be empty"
        })));
    }

    if payload.subtotal < 0.0 || payload.tax < 0.0 {
        return Ok(HttpResponse::BadRequest().json(json!({
            "success": false,
            "message": "subtotal and tax must not be negative"
        })));
    }

    let total = invoice_total(payload.subtotal, payload.tax);

    let result = sqlx::query(
        r#"
        INSERT INTO invoices
        (invoice_no, client_name, issue_date, due_date, subtotal, tax, total, notes)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(payload.invoice_no.trim())
    .bind(payload.client_name.trim())
    .bind(payload.issue_date)
    .bind(payload.due_date)
    .bind(payload.subtotal)
    .bind(payload.tax)
    .bind(total)
    .bind(&payload.notes)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(_) => Ok(HttpResponse::Created().json(json!({
            "success": true,
            "message": "Invoice created"
        }))),
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23000") {
                    return Ok(HttpResponse::Conflict().json(json!({
                        "success": false,
                        "message": "Invoice number already exists"
                    })));
                }
            }

            tracing::error!(error = %e, "Failed to create invoice");
            Ok(HttpResponse::InternalServerError().json(json!({
                "success": false,
                "message": "Internal Server Error"
            })))
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/invoices",
    params(InvoiceQuery),
    responses(
        (status = 200, description = "Paginated invoice list", body = InvoiceListResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Invoice"
)]
pub async fn list_invoices(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<InvoiceQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;

    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    if let Some(status) = query.status.as_deref() {
        if InvoiceStatus::from_str(status).is_err() {
            return Ok(HttpResponse::BadRequest().json(json!({
                "success": false,
                "message": "Invalid status. Allowed: draft, sent, paid, cancelled"
            })));
        }
        where_sql.push_str(" AND status = ?");
        args.push(FilterValue::Str(status.to_string()));
    }

    if let Some(search) = &query.search {
        where_sql.push_str(" AND (client_name LIKE ? OR invoice_no LIKE ?)");
        let like = format!("%{}%", search);
        args.push(FilterValue::Str(like.clone()));
        args.push(FilterValue::Str(like));
    }

    if let Some(from) = query.from {
        where_sql.push_str(" AND issue_date >= ?");
        args.push(FilterValue::Date(from));
    }

    if let Some(to) = query.to {
        where_sql.push_str(" AND issue_date <= ?");
        args.push(FilterValue::Date(to));
    }

    let count_sql = format!("SELECT COUNT(*) FROM invoices{}", where_sql);
    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::Str(s) => count_q.bind(s.clone()),
            FilterValue::Date(d) => count_q.bind(*d),
        };
    }

    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to count invoices");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let data_sql = format!(
        r#"
        SELECT id, invoice_no, client_name, issue_date, due_date, subtotal, tax, total, status, notes, created_at
        FROM invoices
        {}
        ORDER BY issue_date DESC, id DESC
        LIMIT ? OFFSET ?
        "#,
        where_sql
    );

    let mut data_q = sqlx::query_as::<_, Invoice>(&data_sql);
    for arg in &args {
        data_q = match arg {
            FilterValue::Str(s) => data_q.bind(s.clone()),
            FilterValue::Date(d) => data_q.bind(*d),
        };
    }

    let invoices = data_q
        .bind(per_page as i64)
        .bind(offset as i64)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch invoice list");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(InvoiceListResponse {
        success: true,
        data: invoices,
        page,
        per_page,
        total,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/invoices/{invoice_id}",
    params(
        ("invoice_id", Path, description = "Invoice ID")
    ),
    responses(
        (status = 200, body = Invoice),
        (status = 404, description = "Invoice not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Invoice"
)]
pub async fn get_invoice(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let invoice_id = path.into_inner();

    let invoice = sqlx::query_as::<_, Invoice>(
        r#"
        SELECT id, invoice_no, client_name, issue_date, due_date, subtotal, tax, total, status, notes, created_at
        FROM invoices
        WHERE id = ?
        "#,
    )
    .bind(invoice_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, invoice_id, "Failed to fetch invoice");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    match invoice {
        Some(inv) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": inv
        }))),
        None => Ok(HttpResponse::NotFound().json(json!({
            "success": false,
            "message": "Invoice not found"
        }))),
    }
}

#[utoipa::path(
    put,
    path = "/api/v1/invoices/{invoice_id}",
    request_body = UpdateInvoice,
    params(
        ("invoice_id", Path, description = "Invoice ID")
    ),
    responses(
        (status = 200, description = "Invoice updated"),
        (status = 404, description = "Invoice not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Invoice"
)]
pub async fn update_invoice(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<UpdateInvoice>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let invoice_id = path.into_inner();

    let current = sqlx::query_as::<_, Invoice>(
        r#"
        SELECT id, invoice_no, client_name, issue_date, due_date, subtotal, tax, total, status, notes, created_at
        FROM invoices
        WHERE id = ?
        "#,
    )
    .bind(invoice_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, invoice_id, "Failed to fetch invoice");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let current = match current {
        Some(c) => c,
        None => {
            return Ok(HttpResponse::NotFound().json(json!({
                "success": false,
                "message": "Invoice not found"
            })));
        }
    };

    let client_name = body.client_name.clone().unwrap_or(current.client_name);
    let issue_date = body.issue_date.unwrap_or(current.issue_date);
    let due_date = body.due_date.unwrap_or(current.due_date);
    let subtotal = body.subtotal.unwrap_or(current.subtotal);
    let tax = body.tax.unwrap_or(current.tax);
    let notes = body.notes.clone().or(current.notes);

    if subtotal < 0.0 || tax < 0.0 {
        return Ok(HttpResponse::BadRequest().json(json!({
            "success": false,
            "message": "subtotal and tax must not be negative"
        })));
    }

    let total = invoice_total(subtotal, tax);

    sqlx::query(
        r#"
        UPDATE invoices
        SET client_name = ?, issue_date = ?, due_date = ?, subtotal = ?, tax = ?, total = ?, notes = ?
        WHERE id = ?
        "#,
    )
    .bind(&client_name)
    .bind(issue_date)
    .bind(due_date)
    .bind(subtotal)
    .bind(tax)
    .bind(total)
    .bind(&notes)
    .bind(invoice_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, invoice_id, "Failed to update invoice");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Invoice updated"
    })))
}

/// Send a draft invoice
#[utoipa::path(
    put,
    path = "/api/v1/invoices/{invoice_id}/send",
    params(
        ("invoice_id", Path, description = "Invoice ID")
    ),
    responses(
        (status = 200, description = "Invoice marked sent"),
        (status = 400, description = "Invoice not found or not a draft")
    ),
    security(("bearer_auth" = [])),
    tag = "Invoice"
)]
pub async fn send_invoice(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let invoice_id = path.into_inner();

    let result = sqlx::query(
        r#"
        UPDATE invoices
        SET status = 'sent'
        WHERE id = ?
        AND status = 'draft'
        "#,
    )
    .bind(invoice_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, invoice_id, "Failed to mark invoice sent");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::BadRequest().json(json!({
            "success": false,
            "message": "Invoice not found or not a draft"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Invoice marked sent"
    })))
}

/// Settle a sent invoice
#[utoipa::path(
    put,
    path = "/api/v1/invoices/{invoice_id}/pay",
    params(
        ("invoice_id", Path, description = "Invoice ID")
    ),
    responses(
        (status = 200, description = "Invoice marked paid"),
        (status = 400, description = "Invoice not found or not in sent state")
    ),
    security(("bearer_auth" = [])),
    tag = "Invoice"
)]
pub async fn pay_invoice(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let invoice_id = path.into_inner();

    let result = sqlx::query(
        r#"
        UPDATE invoices
        SET status = 'paid'
        WHERE id = ?
        AND status = 'sent'
        "#,
    )
    .bind(invoice_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, invoice_id, "Failed to mark invoice paid");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::BadRequest().json(json!({
            "success": false,
            "message": "Invoice not found or not in sent state"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Invoice marked paid"
    })))
}

#[utoipa::path(
    delete,
    path = "/api/v1/invoices/{invoice_id}",
    params(
        ("invoice_id", Path, description = "Invoice ID")
    ),
    responses(
        (status = 200, description = "Invoice deleted"),
        (status = 404, description = "Invoice not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Invoice"
)]
pub async fn delete_invoice(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let invoice_id = path.into_inner();

    let result = sqlx::query("DELETE FROM invoices WHERE id = ?")
        .bind(invoice_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, invoice_id, "Failed to delete invoice");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "success": false,
            "message": "Invoice not found"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Invoice deleted"
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_is_subtotal_plus_tax() {
        assert_eq!(invoice_total(120_000.0, 18_000.0), 138_000.0);
    }

    #[test]
    fn total_rounds_to_cents() {
        // 0.1 + 0.2 carries float noise without the rounding step
        assert_eq!(invoice_total(0.1, 0.2), 0.3);
    }

    #[test]
    fn status_strings_match_columns() {
        for s in ["draft", "sent", "paid", "cancelled"] {
            assert_eq!(InvoiceStatus::from_str(s).unwrap().to_string(), s);
        }
        assert!(InvoiceStatus::from_str("overdue").is_err());
    }
}
