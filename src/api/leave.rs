use crate::auth::auth::AuthUser;
use crate::model::leave_request::LeaveRequest;
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use std::str::FromStr;
use strum_macros::{Display, EnumString};
use utoipa::{IntoParams, ToSchema};

/// Which approval tier a request family belongs to. Injected per route scope,
/// so `/leaves`, `/manager-leaves` and `/admin-leaves` share one handler set.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum LeaveTier {
    Employee,
    Manager,
    Admin,
}

impl LeaveTier {
    /// Who may file a request in this tier.
    pub fn require_requester(self, auth: &AuthUser) -> actix_web::Result<()> {
        match self {
            LeaveTier::Employee => Ok(()),
            LeaveTier::Manager => auth.require_manager(),
            LeaveTier::Admin => auth.require_admin(),
        }
    }

    /// Who may approve or reject: always one tier up.
    pub fn require_approver(self, auth: &AuthUser) -> actix_web::Result<()> {
        match self {
            LeaveTier::Employee => auth.require_manager(),
            LeaveTier::Manager => auth.require_admin(),
            LeaveTier::Admin => auth.require_superadmin(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LeaveType {
    Annual,
    Sick,
    Casual,
    Unpaid,
}

#[derive(Debug, Serialize, Deserialize, Display, EnumString, PartialEq, ToSchema)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

/// Inclusive day span of a leave request.
pub fn leave_days(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days() + 1
}

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-03", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "sick")]
    pub leave_type: LeaveType,
    #[schema(example = "Fever")]
    pub reason: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LeaveFilter {
    #[schema(example = 123)]
    /// Filter by employee ID
    pub employee_id: Option<u64>,
    #[schema(example = "pending")]
    /// Filter by leave status
    pub status: Option<String>,
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u64>,
    #[schema(example = 10)]
    /// Pagination per page number
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub success: bool,
    pub leaves: Vec<LeaveRequest>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

#[derive(Debug, Default, Serialize, ToSchema)]
pub struct LeaveStats {
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
    pub cancelled: i64,
    pub total: i64,
}

impl LeaveStats {
    fn from_rows(rows: &[(String, i64)]) -> Self {
        let mut stats = LeaveStats::default();
        for (status, count) in rows {
            match status.as_str() {
                "pending" => stats.pending = *count,
                "approved" => stats.approved = *count,
                "rejected" => stats.rejected = *count,
                "cancelled" => stats.cancelled = *count,
                _ => {}
            }
            stats.total += *count;
        }
        stats
    }
}

// Helper enum for typed SQLx binding
enum FilterValue {
    U64(u64),
    Str(String),
}

/* =========================
Create leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/v1/leaves",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Leave request submitted", body = Object, example = json!({
            "success": true,
            "message": "Leave request submitted",
            "status": "pending"
        })),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    tier: web::Data<LeaveTier>,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateLeave>,
) -> actix_web::Result<impl Responder> {
    let tier = **tier;
    tier.require_requester(&auth)?;

    let employee_id: u64 = auth
        .employee_id
        .ok_or_else(|| actix_web::error::ErrorForbidden("No employee profile"))?;

    if payload.start_date > payload.end_date {
        return Ok(HttpResponse::BadRequest().json(json!({
            "success": false,
            "message": "start_date cannot be after end_date"
        })));
    }

    let days = leave_days(payload.start_date, payload.end_date);

    sqlx::query(
        r#"
        INSERT INTO leave_requests
            (employee_id, tier, start_date, end_date, days, leave_type, reason)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(employee_id)
    .bind(tier.to_string())
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(days)
    .bind(payload.leave_type.to_string())
    .bind(&payload.reason)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, employee_id, %tier, "Failed to create leave request");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Leave request submitted",
        "status": "pending"
    })))
}

/* =========================
Approve leave (one tier up)
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/leaves/{leave_id}/approve",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to approve")
    ),
    responses(
        (status = 200, description = "Leave approved", body = Object, example = json!({
            "success": true,
            "message": "Leave approved"
        })),
        (status = 400, description = "Leave request not found or already processed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    tier: web::Data<LeaveTier>,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let tier = **tier;
    tier.require_approver(&auth)?;

    let leave_id = path.into_inner();

    let result = sqlx::query(
        r#"
        UPDATE leave_requests
        SET status = 'approved'
        WHERE id = ?
        AND tier = ?
        AND status = 'pending'
        "#,
    )
    .bind(leave_id)
    .bind(tier.to_string())
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, leave_id, "Approve leave failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::BadRequest().json(json!({
            "success": false,
            "message": "Leave request not found or already processed"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Leave approved"
    })))
}

/* =========================
Reject leave (one tier up)
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/leaves/{leave_id}/reject",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to reject")
    ),
    responses(
        (status = 200, description = "Leave rejected"),
        (status = 400, description = "Leave request not found or already processed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    tier: web::Data<LeaveTier>,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let tier = **tier;
    tier.require_approver(&auth)?;

    let leave_id = path.into_inner();

    let result = sqlx::query(
        r#"
        UPDATE leave_requests
        SET status = 'rejected'
        WHERE id = ?
        AND tier = ?
        AND status = 'pending'
        "#,
    )
    .bind(leave_id)
    .bind(tier.to_string())
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, leave_id, "Reject leave failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::BadRequest().json(json!({
            "success": false,
            "message": "Leave request not found or already processed"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Leave rejected"
    })))
}

/* =========================
Cancel own pending leave
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/leaves/{leave_id}/cancel",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to cancel")
    ),
    responses(
        (status = 200, description = "Leave cancelled"),
        (status = 400, description = "Leave request not found, not yours, or already processed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn cancel_leave(
    auth: AuthUser,
    tier: web::Data<LeaveTier>,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let tier = **tier;

    let employee_id: u64 = auth
        .employee_id
        .ok_or_else(|| actix_web::error::ErrorForbidden("No employee profile"))?;

    let leave_id = path.into_inner();

    let result = sqlx::query(
        r#"
        UPDATE leave_requests
        SET status = 'cancelled'
        WHERE id = ?
        AND tier = ?
        AND employee_id = ?
        AND status = 'pending'
        "#,
    )
    .bind(leave_id)
    .bind(tier.to_string())
    .bind(employee_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, leave_id, "Cancel leave failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::BadRequest().json(json!({
            "success": false,
            "message": "Leave request not found, not yours, or already processed"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Leave cancelled"
    })))
}

/// Leave request details
#[utoipa::path(
    get,
    path = "/api/v1/leaves/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to fetch")
    ),
    responses(
        (status = 200, description = "Leave request found", body = LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    tier: web::Data<LeaveTier>,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let tier = **tier;
    let leave_id = path.into_inner();

    let leave = sqlx::query_as::<_, LeaveRequest>(
        r#"
        SELECT id, employee_id, tier, start_date, end_date, days, leave_type, reason, status, created_at
        FROM leave_requests
        WHERE id = ? AND tier = ?
        "#,
    )
    .bind(leave_id)
    .bind(tier.to_string())
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, leave_id, "Failed to fetch leave request");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let leave = match leave {
        Some(l) => l,
        None => {
            return Ok(HttpResponse::NotFound().json(json!({
                "success": false,
                "message": "Leave request not found"
            })));
        }
    };

    // Approvers see everything in their tier; everyone else only their own
    if tier.require_approver(&auth).is_err() && Some(leave.employee_id) != auth.employee_id {
        return Err(actix_web::error::ErrorForbidden("Not your leave request"));
    }

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": leave
    })))
}

/// Paginated leave list
#[utoipa::path(
    get,
    path = "/api/v1/leaves",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Paginated leave list", body = LeaveListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    tier: web::Data<LeaveTier>,
    pool: web::Data<MySqlPool>,
    query: web::Query<LeaveFilter>,
) -> actix_web::Result<impl Responder> {
    let tier = **tier;

    // Non-approvers only see their own requests
    let forced_employee_id = if tier.require_approver(&auth).is_err() {
        let own = auth
            .employee_id
            .ok_or_else(|| actix_web::error::ErrorForbidden("No employee profile"))?;
        Some(own)
    } else {
        query.employee_id
    };

    // -------------------------
    // Pagination
    // -------------------------
    let per_page = query.per_page.unwrap_or(10).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    // -------------------------
    // WHERE clause
    // -------------------------
    let mut where_sql = String::from(" WHERE tier = ?");
    let mut args: Vec<FilterValue> = vec![FilterValue::Str(tier.to_string())];

    if let Some(emp_id) = forced_employee_id {
        where_sql.push_str(" AND employee_id = ?");
        args.push(FilterValue::U64(emp_id));
    }

    if let Some(status) = query.status.as_deref() {
        if LeaveStatus::from_str(status).is_err() {
            return Ok(HttpResponse::BadRequest().json(json!({
                "success": false,
                "message": "Invalid status. Allowed: pending, approved, rejected, cancelled"
            })));
        }
        where_sql.push_str(" AND status = ?");
        args.push(FilterValue::Str(status.to_string()));
    }

    // -------------------------
    // COUNT query
    // -------------------------
    let count_sql = format!("SELECT COUNT(*) FROM leave_requests{}", where_sql);

    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Str(s) => count_q.bind(s.clone()),
        };
    }

    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to count leave requests");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    // -------------------------
    // DATA query
    // -------------------------
    let data_sql = format!(
        r#"
        SELECT id, employee_id, tier, start_date, end_date, days, leave_type, reason, status, created_at
        FROM leave_requests
        {}
        ORDER BY created_at DESC
        LIMIT ? OFFSET ?
        "#,
        where_sql
    );

    let mut data_q = sqlx::query_as::<_, LeaveRequest>(&data_sql);
    for arg in &args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(*v),
            FilterValue::Str(s) => data_q.bind(s.clone()),
        };
    }

    let leaves = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch leave list");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(LeaveListResponse {
        success: true,
        leaves,
        page: page as u32,
        per_page: per_page as u32,
        total,
    }))
}

/// Per-status counts for a leave tier
#[utoipa::path(
    get,
    path = "/api/v1/leaves/stats",
    responses(
        (status = 200, description = "Leave stats", body = Object, example = json!({
            "success": true,
            "stats": { "pending": 3, "approved": 12, "rejected": 1, "cancelled": 0, "total": 16 }
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_stats(
    auth: AuthUser,
    tier: web::Data<LeaveTier>,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let tier = **tier;
    tier.require_approver(&auth)?;

    let rows = sqlx::query_as::<_, (String, i64)>(
        r#"
        SELECT status, COUNT(*)
        FROM leave_requests
        WHERE tier = ?
        GROUP BY status
        "#,
    )
    .bind(tier.to_string())
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, %tier, "Failed to aggregate leave stats");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "stats": LeaveStats::from_rows(&rows)
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::role::Role;

    fn user(role: Role) -> AuthUser {
        AuthUser {
            user_id: 1,
            username: "tester".into(),
            role,
            employee_id: Some(10),
        }
    }

    #[test]
    fn leave_days_is_inclusive() {
        let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 1, 3).unwrap();
        assert_eq!(leave_days(start, end), 3);
        assert_eq!(leave_days(start, start), 1);
    }

    #[test]
    fn approval_is_one_tier_up() {
        // employee-tier requests: manager and above
        assert!(LeaveTier::Employee.require_approver(&user(Role::Manager)).is_ok());
        assert!(LeaveTier::Employee.require_approver(&user(Role::Employee)).is_err());

        // manager-tier requests: admin and above
        assert!(LeaveTier::Manager.require_approver(&user(Role::Admin)).is_ok());
        assert!(LeaveTier::Manager.require_approver(&user(Role::Manager)).is_err());

        // admin-tier requests: superadmin only
        assert!(LeaveTier::Admin.require_approver(&user(Role::Superadmin)).is_ok());
        assert!(LeaveTier::Admin.require_approver(&user(Role::Admin)).is_err());
    }

    #[test]
    fn requester_guard_follows_tier() {
        assert!(LeaveTier::Employee.require_requester(&user(Role::Employee)).is_ok());
        assert!(LeaveTier::Manager.require_requester(&user(Role::Employee)).is_err());
        assert!(LeaveTier::Manager.require_requester(&user(Role::Manager)).is_ok());
        assert!(LeaveTier::Admin.require_requester(&user(Role::Manager)).is_err());
    }

    #[test]
    fn tier_column_values() {
        assert_eq!(LeaveTier::Employee.to_string(), "employee");
        assert_eq!(LeaveTier::Manager.to_string(), "manager");
        assert_eq!(LeaveTier::Admin.to_string(), "admin");
    }

    #[test]
    fn stats_fold_counts_by_status() {
        let rows = vec![
            ("pending".to_string(), 3),
            ("approved".to_string(), 12),
            ("rejected".to_string(), 1),
        ];
        let stats = LeaveStats::from_rows(&rows);
        assert_eq!(stats.pending, 3);
        assert_eq!(stats.approved, 12);
        assert_eq!(stats.rejected, 1);
        assert_eq!(stats.cancelled, 0);
        assert_eq!(stats.total, 16);
    }

    #[test]
    fn leave_status_round_trips_through_strings() {
        for s in ["pending", "approved", "rejected", "cancelled"] {
            assert_eq!(LeaveStatus::from_str(s).unwrap().to_string(), s);
        }
        assert!(LeaveStatus::from_str("expired").is_err());
    }
}
