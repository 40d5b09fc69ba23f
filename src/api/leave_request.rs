use std::str::FromStr;

use crate::api::leave_balance::adjust_balance;
use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::leave_request::{LeaveRequest, LeaveStatus, inclusive_days};
use actix_web::{HttpResponse, web};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = 1)]
    pub leave_type_id: u64,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-03", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "Vacation")]
    pub reason: String,
    pub attachment_url: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct DecisionReq {
    /// Optional note from the approver
    pub comments: Option<String>,
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
    pub page: Option<u64>, // 1-based
    #[schema(example = 10)]
    /// Pagination per page number
    pub per_page: Option<u64>, // items per page
}

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub data: Vec<LeaveRequest>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

// Helper enum for typed SQLx binding
enum FilterValue<'a> {
    U64(u64),
    Str(&'a str),
}

/// Row shape used by the workflow transitions; only what the state machine
/// needs, fetched FOR UPDATE.
#[derive(sqlx::FromRow)]
struct RequestHead {
    id: u64,
    employee_id: u64,
    leave_type_id: u64,
    days: i64,
    status: String,
}

fn parse_status(raw: &str) -> Result<LeaveStatus, ApiError> {
    LeaveStatus::from_str(raw)
        .map_err(|_| ApiError::validation(format!("Unknown leave status '{}'", raw)))
}

fn validate_date_range(start: NaiveDate, end: NaiveDate, today: NaiveDate) -> Result<(), ApiError> {
    if start > end {
        return Err(ApiError::validation("start_date cannot be after end_date"));
    }
    if end < today {
        return Err(ApiError::validation("end_date cannot be in the past"));
    }
    Ok(())
}

/* =========================
Create leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/v1/leave",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Leave request submitted successfully",
         body = Object,
         example = json!({
            "message": "Leave request submitted",
            "status": "pending"
         })
        ),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Insufficient balance")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateLeave>,
) -> Result<HttpResponse, ApiError> {
    let employee_id: u64 = auth
        .employee_id
        .ok_or_else(|| ApiError::forbidden("No employee profile"))?;

    validate_date_range(
        payload.start_date,
        payload.end_date,
        Utc::now().date_naive(),
    )?;

    if payload.reason.trim().is_empty() {
        return Err(ApiError::validation("reason must not be empty"));
    }

    let days = inclusive_days(payload.start_date, payload.end_date);

    let mut tx = pool.begin().await?;

    let leave_type = sqlx::query_as::<_, (u64, bool)>(
        r#"
        SELECT id, requires_approval
        FROM leave_types
        WHERE id = ? AND tenant_id = ? AND is_active = TRUE
        "#,
    )
    .bind(payload.leave_type_id)
    .bind(auth.tenant_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| ApiError::not_found("Leave type not found"))?;

    // Balance is checked under a row lock; an over-balance submission is
    // rejected outright and no request row is created.
    let balance = sqlx::query_scalar::<_, f64>(
        r#"
        SELECT balance FROM leave_balances
        WHERE tenant_id = ? AND employee_id = ? AND leave_type_id = ?
        FOR UPDATE
        "#,
    )
    .bind(auth.tenant_id)
    .bind(employee_id)
    .bind(payload.leave_type_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| ApiError::conflict("No leave balance for this leave type"))?;

    if (days as f64) > balance {
        return Err(ApiError::conflict("Insufficient leave balance"));
    }

    let (_, requires_approval) = leave_type;
    let status = if requires_approval {
        LeaveStatus::Pending
    } else {
        LeaveStatus::Approved
    };

    sqlx::query(
        r#"
        INSERT INTO leave_requests
            (tenant_id, employee_id, leave_type_id, start_date, end_date,
             days, reason, status, approval_date, attachment_url)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(auth.tenant_id)
    .bind(employee_id)
    .bind(payload.leave_type_id)
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(days)
    .bind(payload.reason.trim())
    .bind(status.as_ref())
    .bind(if requires_approval { None } else { Some(Utc::now()) })
    .bind(&payload.attachment_url)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        error!(error = %e, employee_id, "Failed to create leave request");
        ApiError::from(e)
    })?;

    // A type without an approval gate deducts immediately, in the same
    // transaction as the insert.
    if !requires_approval {
        adjust_balance(
            &mut tx,
            auth.tenant_id,
            employee_id,
            payload.leave_type_id,
            -(days as f64),
        )
        .await?;
    }

    tx.commit().await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Leave request submitted",
        "status": status.as_ref()
    })))
}

/* =========================
Approve leave (Manager/Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/approve",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to approve")
    ),
    request_body = DecisionReq,
    responses(
        (status = 200, description = "Leave approved successfully", body = Object, example = json!({
            "message": "Leave approved"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Already processed or balance no longer covers the request")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<DecisionReq>,
) -> Result<HttpResponse, ApiError> {
    auth.require_manager_or_admin()?;

    let leave_id = path.into_inner();

    let mut tx = pool.begin().await?;

    let request = sqlx::query_as::<_, RequestHead>(
        r#"
        SELECT id, employee_id, leave_type_id, days, status
        FROM leave_requests
        WHERE id = ? AND tenant_id = ?
        FOR UPDATE
        "#,
    )
    .bind(leave_id)
    .bind(auth.tenant_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| ApiError::not_found("Leave request not found"))?;

    let status = parse_status(&request.status)?;
    if !status.can_transition_to(LeaveStatus::Approved) {
        return Err(ApiError::conflict("Leave request already processed"));
    }

    // Re-check the balance at approval time. Submission already checked it,
    // but two overlapping pending requests can both pass that check; the
    // lock here makes the second approval fail instead of double-deducting.
    let balance = sqlx::query_scalar::<_, f64>(
        r#"
        SELECT balance FROM leave_balances
        WHERE tenant_id = ? AND employee_id = ? AND leave_type_id = ?
        FOR UPDATE
        "#,
    )
    .bind(auth.tenant_id)
    .bind(request.employee_id)
    .bind(request.leave_type_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| ApiError::conflict("No leave balance for this leave type"))?;

    if (request.days as f64) > balance {
        return Err(ApiError::conflict("Insufficient leave balance"));
    }

    sqlx::query(
        r#"
        UPDATE leave_requests
        SET status = ?, approver_id = ?, approval_date = NOW(), comments = COALESCE(?, comments)
        WHERE id = ?
        "#,
    )
    .bind(LeaveStatus::Approved.as_ref())
    .bind(auth.user_id)
    .bind(&body.comments)
    .bind(request.id)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        error!(error = %e, leave_id, "Approve leave failed");
        ApiError::from(e)
    })?;

    adjust_balance(
        &mut tx,
        auth.tenant_id,
        request.employee_id,
        request.leave_type_id,
        -(request.days as f64),
    )
    .await?;

    tx.commit().await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Leave approved"
    })))
}

/* =========================
Reject leave (Manager/Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/reject",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to reject")
    ),
    request_body = DecisionReq,
    responses(
        (status = 200, description = "Leave rejected successfully", body = Object, example = json!({
            "message": "Leave rejected"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Leave request not found or already processed")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<DecisionReq>,
) -> Result<HttpResponse, ApiError> {
    auth.require_manager_or_admin()?;

    let leave_id = path.into_inner();

    // Nothing was deducted while pending, so rejection is a single guarded
    // UPDATE; no transaction needed.
    let result = sqlx::query(
        r#"
        UPDATE leave_requests
        SET status = ?, approver_id = ?, approval_date = NOW(), comments = COALESCE(?, comments)
        WHERE id = ? AND tenant_id = ? AND status = ?
        "#,
    )
    .bind(LeaveStatus::Rejected.as_ref())
    .bind(auth.user_id)
    .bind(&body.comments)
    .bind(leave_id)
    .bind(auth.tenant_id)
    .bind(LeaveStatus::Pending.as_ref())
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, leave_id, "Reject leave failed");
        ApiError::from(e)
    })?;

    if result.rows_affected() == 0 {
        return Err(ApiError::conflict(
            "Leave request not found or already processed",
        ));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Leave rejected"
    })))
}

/* =========================
Cancel leave
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/cancel",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to cancel")
    ),
    request_body = DecisionReq,
    responses(
        (status = 200, description = "Leave cancelled", body = Object, example = json!({
            "message": "Leave cancelled"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Leave request cannot be cancelled")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn cancel_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<DecisionReq>,
) -> Result<HttpResponse, ApiError> {
    let leave_id = path.into_inner();

    let mut tx = pool.begin().await?;

    let request = sqlx::query_as::<_, RequestHead>(
        r#"
        SELECT id, employee_id, leave_type_id, days, status
        FROM leave_requests
        WHERE id = ? AND tenant_id = ?
        FOR UPDATE
        "#,
    )
    .bind(leave_id)
    .bind(auth.tenant_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| ApiError::not_found("Leave request not found"))?;

    let status = parse_status(&request.status)?;
    if !status.can_transition_to(LeaveStatus::Cancelled) {
        return Err(ApiError::conflict("Leave request cannot be cancelled"));
    }
    if !auth.can_cancel(request.employee_id, status) {
        return Err(ApiError::forbidden(
            "Not allowed to cancel this leave request",
        ));
    }

    sqlx::query(
        r#"
        UPDATE leave_requests
        SET status = ?, comments = COALESCE(?, comments)
        WHERE id = ?
        "#,
    )
    .bind(LeaveStatus::Cancelled.as_ref())
    .bind(&body.comments)
    .bind(request.id)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        error!(error = %e, leave_id, "Cancel leave failed");
        ApiError::from(e)
    })?;

    // Cancelling an approved request refunds the deducted days atomically
    // with the status change.
    if status == LeaveStatus::Approved {
        adjust_balance(
            &mut tx,
            auth.tenant_id,
            request.employee_id,
            request.leave_type_id,
            request.days as f64,
        )
        .await?;
    }

    tx.commit().await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Leave cancelled"
    })))
}

/* =========================
Delete leave (pending only)
========================= */
#[utoipa::path(
    delete,
    path = "/api/v1/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to delete")
    ),
    responses(
        (status = 200, description = "Leave request deleted", body = Object, example = json!({
            "message": "Leave request deleted"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Only pending requests can be deleted")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn delete_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let leave_id = path.into_inner();

    let request = sqlx::query_as::<_, (u64, String)>(
        r#"
        SELECT employee_id, status
        FROM leave_requests
        WHERE id = ? AND tenant_id = ?
        "#,
    )
    .bind(leave_id)
    .bind(auth.tenant_id)
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or_else(|| ApiError::not_found("Leave request not found"))?;

    let (owner_id, raw_status) = request;
    if parse_status(&raw_status)? != LeaveStatus::Pending {
        return Err(ApiError::conflict(
            "Only pending requests can be deleted; cancel instead",
        ));
    }
    if auth.employee_id != Some(owner_id) && !auth.can_approve() {
        return Err(ApiError::forbidden(
            "Not allowed to delete this leave request",
        ));
    }

    sqlx::query("DELETE FROM leave_requests WHERE id = ? AND tenant_id = ? AND status = ?")
        .bind(leave_id)
        .bind(auth.tenant_id)
        .bind(LeaveStatus::Pending.as_ref())
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, leave_id, "Delete leave failed");
            ApiError::from(e)
        })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Leave request deleted"
    })))
}

/// for getting a leave application details endpoint
#[utoipa::path(
    get,
    path = "/api/v1/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to fetch")
    ),
    responses(
        (status = 200, description = "Leave request found", body = LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Leave request not found", body = Object, example = json!({
            "message": "Leave request not found"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let leave_id = path.into_inner();

    let leave = sqlx::query_as::<_, LeaveRequest>(
        r#"
        SELECT id, tenant_id, employee_id, leave_type_id, start_date, end_date,
               days, reason, status, request_date, approver_id, approval_date,
               comments, attachment_url
        FROM leave_requests
        WHERE id = ? AND tenant_id = ?
        "#,
    )
    .bind(leave_id)
    .bind(auth.tenant_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, leave_id, "Failed to fetch leave request");
        ApiError::from(e)
    })?
    .ok_or_else(|| ApiError::not_found("Leave request not found"))?;

    // An employee only ever sees their own requests; anything else looks
    // like it does not exist.
    if auth.is_employee() && auth.employee_id != Some(leave.employee_id) {
        return Err(ApiError::not_found("Leave request not found"));
    }

    Ok(HttpResponse::Ok().json(leave))
}

/// for getting leave applications endpoint
#[utoipa::path(
    get,
    path = "/api/v1/leave",
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
    pool: web::Data<MySqlPool>,
    query: web::Query<LeaveFilter>,
) -> Result<HttpResponse, ApiError> {
    // -------------------------
    // Pagination
    // -------------------------
    let per_page = query.per_page.unwrap_or(10).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    // -------------------------
    // WHERE clause
    // -------------------------
    let mut where_sql = String::from(" WHERE tenant_id = ?");
    let mut args: Vec<FilterValue> = Vec::new();

    // Employees are pinned to their own requests regardless of the filter.
    let employee_filter = if auth.is_employee() {
        Some(
            auth.employee_id
                .ok_or_else(|| ApiError::forbidden("No employee profile"))?,
        )
    } else {
        query.employee_id
    };

    if let Some(emp_id) = employee_filter {
        where_sql.push_str(" AND employee_id = ?");
        args.push(FilterValue::U64(emp_id));
    }

    if let Some(status) = query.status.as_deref() {
        parse_status(status)?;
        where_sql.push_str(" AND status = ?");
        args.push(FilterValue::Str(status));
    }

    // -------------------------
    // COUNT query
    // -------------------------
    let count_sql = format!("SELECT COUNT(*) FROM leave_requests{}", where_sql);

    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql).bind(auth.tenant_id);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Str(s) => count_q.bind(*s),
        };
    }

    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to count leave requests");
        ApiError::from(e)
    })?;

    // -------------------------
    // DATA query
    // -------------------------
    let data_sql = format!(
        r#"
        SELECT id, tenant_id, employee_id, leave_type_id, start_date, end_date,
               days, reason, status, request_date, approver_id, approval_date,
               comments, attachment_url
        FROM leave_requests
        {}
        ORDER BY request_date DESC
        LIMIT ? OFFSET ?
        "#,
        where_sql
    );

    let mut data_q = sqlx::query_as::<_, LeaveRequest>(&data_sql).bind(auth.tenant_id);
    for arg in args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(v),
            FilterValue::Str(s) => data_q.bind(s),
        };
    }

    let leaves = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to fetch leave list");
            ApiError::from(e)
        })?;

    let response = LeaveListResponse {
        data: leaves,
        page: page as u32,
        per_page: per_page as u32,
        total,
    };

    Ok(HttpResponse::Ok().json(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn inverted_range_is_rejected() {
        let err = validate_date_range(d("2026-01-05"), d("2026-01-01"), d("2025-01-01"));
        assert!(err.is_err());
    }

    #[test]
    fn retroactive_request_is_rejected() {
        let err = validate_date_range(d("2025-12-01"), d("2025-12-02"), d("2026-01-01"));
        assert!(err.is_err());
    }

    #[test]
    fn range_ending_today_is_accepted() {
        let today = d("2026-01-03");
        assert!(validate_date_range(d("2026-01-01"), today, today).is_ok());
    }

    #[test]
    fn unknown_status_filter_is_a_validation_error() {
        assert!(parse_status("pending").is_ok());
        assert!(parse_status("sideways").is_err());
    }
}
