use actix_web::{HttpResponse, web};
use serde::Deserialize;
use sqlx::{MySql, MySqlPool, Transaction};
use tracing::{error, info};
use utoipa::{IntoParams, ToSchema};

use crate::{auth::auth::AuthUser, error::ApiError, model::leave_balance::LeaveBalanceView};

/// The sole mutation primitive of the ledger: positive delta for accrual or
/// refund, negative for consumption. Always runs inside the transaction of
/// whatever triggered it so balance and trigger commit or roll back together.
pub async fn adjust_balance(
    tx: &mut Transaction<'_, MySql>,
    tenant_id: u64,
    employee_id: u64,
    leave_type_id: u64,
    delta: f64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE leave_balances
        SET balance = balance + ?
        WHERE tenant_id = ? AND employee_id = ? AND leave_type_id = ?
        "#,
    )
    .bind(delta)
    .bind(tenant_id)
    .bind(employee_id)
    .bind(leave_type_id)
    .execute(&mut **tx)
    .await?;

    Ok(result.rows_affected())
}

/// Idempotent seeding: inserts only the rows the employee is missing, one per
/// active leave type whose gender policy matches (a NULL policy matches
/// everyone; an employee without a recorded gender only gets unrestricted
/// types). Seeded at each type's default balance.
pub async fn insert_missing_balances(
    tx: &mut Transaction<'_, MySql>,
    tenant_id: u64,
    employee_id: u64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO leave_balances (tenant_id, employee_id, leave_type_id, balance)
        SELECT lt.tenant_id, ?, lt.id, lt.default_balance
        FROM leave_types lt
        WHERE lt.tenant_id = ?
          AND lt.is_active = TRUE
          AND (lt.applicable_gender IS NULL
               OR lt.applicable_gender = (SELECT gender FROM employees WHERE id = ? AND tenant_id = ?))
          AND NOT EXISTS (
              SELECT 1 FROM leave_balances lb
              WHERE lb.tenant_id = lt.tenant_id
                AND lb.employee_id = ?
                AND lb.leave_type_id = lt.id
          )
        "#,
    )
    .bind(employee_id)
    .bind(tenant_id)
    .bind(employee_id)
    .bind(tenant_id)
    .bind(employee_id)
    .execute(&mut **tx)
    .await?;

    Ok(result.rows_affected())
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct BalanceFilter {
    /// Filter by employee ID (ignored for Employee-role callers, who always
    /// see their own balances)
    pub employee_id: Option<u64>,
}

/// List leave balances
#[utoipa::path(
    get,
    path = "/api/v1/leave/balances",
    params(BalanceFilter),
    responses(
        (status = 200, description = "Balances with leave-type names", body = [LeaveBalanceView]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave Balance"
)]
pub async fn list_balances(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<BalanceFilter>,
) -> Result<HttpResponse, ApiError> {
    let employee_filter = if auth.is_employee() {
        Some(
            auth.employee_id
                .ok_or_else(|| ApiError::forbidden("No employee profile"))?,
        )
    } else {
        query.employee_id
    };

    let mut sql = String::from(
        r#"
        SELECT lb.id, lb.employee_id, lb.leave_type_id, lt.name AS leave_type,
               lb.balance, lb.last_updated
        FROM leave_balances lb
        JOIN leave_types lt ON lt.id = lb.leave_type_id
        WHERE lb.tenant_id = ?
        "#,
    );
    if employee_filter.is_some() {
        sql.push_str(" AND lb.employee_id = ?");
    }
    sql.push_str(" ORDER BY lb.employee_id, lt.name");

    let mut q = sqlx::query_as::<_, LeaveBalanceView>(&sql).bind(auth.tenant_id);
    if let Some(emp_id) = employee_filter {
        q = q.bind(emp_id);
    }

    let balances = q.fetch_all(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to fetch leave balances");
        ApiError::from(e)
    })?;

    Ok(HttpResponse::Ok().json(balances))
}

/// Repair/seed balances for one employee
#[utoipa::path(
    post,
    path = "/api/v1/leave/balances/initialize/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee to seed balances for")
    ),
    responses(
        (status = 200, description = "Missing balance rows inserted", body = Object, example = json!({
            "message": "Balances initialized",
            "created": 2
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave Balance"
)]
pub async fn initialize_balances(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    auth.require_manager_or_admin()?;

    let employee_id = path.into_inner();

    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM employees WHERE id = ? AND tenant_id = ?)",
    )
    .bind(employee_id)
    .bind(auth.tenant_id)
    .fetch_one(pool.get_ref())
    .await?;

    if !exists {
        return Err(ApiError::not_found("Employee not found"));
    }

    let mut tx = pool.begin().await?;
    let created = insert_missing_balances(&mut tx, auth.tenant_id, employee_id)
        .await
        .map_err(|e| {
            error!(error = %e, employee_id, "Failed to initialize balances");
            ApiError::from(e)
        })?;
    tx.commit().await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Balances initialized",
        "created": created
    })))
}

/// Run one accrual cycle for the tenant
#[utoipa::path(
    post,
    path = "/api/v1/leave/balances/accrue",
    responses(
        (status = 200, description = "Accrual applied", body = Object, example = json!({
            "message": "Accrual applied",
            "updated": 42
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave Balance"
)]
pub async fn accrue_balances(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, ApiError> {
    // The recurring trigger lives outside this service (cron or a job
    // runner); this endpoint is one cycle, applied set-wide.
    auth.require_admin()?;

    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r#"
        UPDATE leave_balances lb
        JOIN leave_types lt ON lt.id = lb.leave_type_id
        SET lb.balance = lb.balance + lt.accrual_rate
        WHERE lb.tenant_id = ? AND lt.accrual_rate > 0 AND lt.is_active = TRUE
        "#,
    )
    .bind(auth.tenant_id)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        error!(error = %e, "Accrual run failed");
        ApiError::from(e)
    })?;

    tx.commit().await?;

    info!(tenant_id = auth.tenant_id, updated = result.rows_affected(), "Accrual cycle applied");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Accrual applied",
        "updated": result.rows_affected()
    })))
}
