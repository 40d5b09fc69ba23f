use crate::auth::auth::AuthUser;
use crate::error::{ApiError, is_duplicate_key};
use crate::model::leave_type::LeaveType;
use crate::utils::db_utils::{build_update_sql, execute_update};
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::Value;
use sqlx::MySqlPool;
use tracing::{error, info};
use utoipa::ToSchema;

const UPDATABLE_COLUMNS: &[&str] = &[
    "name",
    "short_code",
    "is_paid",
    "requires_approval",
    "default_balance",
    "accrual_rate",
    "applicable_gender",
    "is_active",
];

#[derive(Deserialize, ToSchema)]
pub struct CreateLeaveType {
    #[schema(example = "Annual Leave")]
    pub name: String,
    #[schema(example = "AL")]
    pub short_code: Option<String>,
    pub is_paid: Option<bool>,
    /// Defaults to true; a type without an approval gate auto-approves and
    /// deducts on submission
    pub requires_approval: Option<bool>,
    #[schema(example = 20.0)]
    pub default_balance: Option<f64>,
    #[schema(example = 1.67)]
    pub accrual_rate: Option<f64>,
    pub applicable_gender: Option<String>,
}

/// List leave types
#[utoipa::path(
    get,
    path = "/api/v1/leave/types",
    responses(
        (status = 200, description = "Leave types for the tenant", body = [LeaveType]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave Type"
)]
pub async fn list_leave_types(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, ApiError> {
    let types = sqlx::query_as::<_, LeaveType>(
        r#"
        SELECT id, tenant_id, name, short_code, is_paid, requires_approval,
               default_balance, accrual_rate, applicable_gender, is_active
        FROM leave_types
        WHERE tenant_id = ?
        ORDER BY name
        "#,
    )
    .bind(auth.tenant_id)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to fetch leave types");
        ApiError::from(e)
    })?;

    Ok(HttpResponse::Ok().json(types))
}

/// Get a leave type by ID
#[utoipa::path(
    get,
    path = "/api/v1/leave/types/{type_id}",
    params(
        ("type_id" = u64, Path, description = "Leave type ID")
    ),
    responses(
        (status = 200, description = "Leave type found", body = LeaveType),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Leave type not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave Type"
)]
pub async fn get_leave_type(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let type_id = path.into_inner();

    let leave_type = sqlx::query_as::<_, LeaveType>(
        r#"
        SELECT id, tenant_id, name, short_code, is_paid, requires_approval,
               default_balance, accrual_rate, applicable_gender, is_active
        FROM leave_types
        WHERE id = ? AND tenant_id = ?
        "#,
    )
    .bind(type_id)
    .bind(auth.tenant_id)
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or_else(|| ApiError::not_found("Leave type not found"))?;

    Ok(HttpResponse::Ok().json(leave_type))
}

/// Create a leave type
#[utoipa::path(
    post,
    path = "/api/v1/leave/types",
    request_body = CreateLeaveType,
    responses(
        (status = 201, description = "Leave type created; balances backfilled", body = Object, example = json!({
            "message": "Leave type created",
            "id": 3,
            "backfilled": 17
        })),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Leave type already exists")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave Type"
)]
pub async fn create_leave_type(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateLeaveType>,
) -> Result<HttpResponse, ApiError> {
    auth.require_manager_or_admin()?;

    let name = payload.name.trim();
    if name.is_empty() {
        return Err(ApiError::validation("name must not be empty"));
    }

    let default_balance = payload.default_balance.unwrap_or(0.0);
    let accrual_rate = payload.accrual_rate.unwrap_or(0.0);
    if default_balance < 0.0 || accrual_rate < 0.0 {
        return Err(ApiError::validation(
            "default_balance and accrual_rate must not be negative",
        ));
    }

    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r#"
        INSERT INTO leave_types
            (tenant_id, name, short_code, is_paid, requires_approval,
             default_balance, accrual_rate, applicable_gender)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(auth.tenant_id)
    .bind(name)
    .bind(&payload.short_code)
    .bind(payload.is_paid.unwrap_or(true))
    .bind(payload.requires_approval.unwrap_or(true))
    .bind(default_balance)
    .bind(accrual_rate)
    .bind(&payload.applicable_gender)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        if is_duplicate_key(&e) {
            ApiError::conflict("A leave type with this name already exists")
        } else {
            error!(error = %e, "Failed to create leave type");
            ApiError::from(e)
        }
    })?;

    let type_id = result.last_insert_id();

    // Backfill: every existing active employee of the tenant gets a balance
    // row at the new type's default, gender policy permitting, atomically
    // with the type itself.
    let backfill = sqlx::query(
        r#"
        INSERT INTO leave_balances (tenant_id, employee_id, leave_type_id, balance)
        SELECT e.tenant_id, e.id, ?, ?
        FROM employees e
        WHERE e.tenant_id = ? AND e.status = 'active'
          AND (? IS NULL OR e.gender = ?)
        "#,
    )
    .bind(type_id)
    .bind(default_balance)
    .bind(auth.tenant_id)
    .bind(&payload.applicable_gender)
    .bind(&payload.applicable_gender)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        error!(error = %e, type_id, "Balance backfill failed");
        ApiError::from(e)
    })?;

    tx.commit().await?;

    info!(
        tenant_id = auth.tenant_id,
        type_id,
        backfilled = backfill.rows_affected(),
        "Leave type created"
    );

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Leave type created",
        "id": type_id,
        "backfilled": backfill.rows_affected()
    })))
}

/// Update a leave type
#[utoipa::path(
    put,
    path = "/api/v1/leave/types/{type_id}",
    params(
        ("type_id" = u64, Path, description = "Leave type ID")
    ),
    request_body = Object,
    responses(
        (status = 200, description = "Leave type updated"),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave type not found"),
        (status = 409, description = "Name already in use")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave Type"
)]
pub async fn update_leave_type(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> Result<HttpResponse, ApiError> {
    auth.require_manager_or_admin()?;

    let type_id = path.into_inner();

    let update = build_update_sql(
        "leave_types",
        &body,
        UPDATABLE_COLUMNS,
        "id",
        type_id,
        auth.tenant_id,
    )?;

    let affected = execute_update(pool.get_ref(), update).await.map_err(|e| {
        error!(error = %e, type_id, "Failed to update leave type");
        ApiError::from(e)
    })?;

    if affected == 0 {
        return Err(ApiError::not_found("Leave type not found"));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Leave type updated"
    })))
}

/// Delete a leave type
#[utoipa::path(
    delete,
    path = "/api/v1/leave/types/{type_id}",
    params(
        ("type_id" = u64, Path, description = "Leave type ID")
    ),
    responses(
        (status = 200, description = "Leave type deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave type not found"),
        (status = 409, description = "Leave type is referenced by balances or requests")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave Type"
)]
pub async fn delete_leave_type(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    auth.require_manager_or_admin()?;

    let type_id = path.into_inner();

    let in_use = sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS(SELECT 1 FROM leave_balances WHERE tenant_id = ? AND leave_type_id = ?)
            OR EXISTS(SELECT 1 FROM leave_requests WHERE tenant_id = ? AND leave_type_id = ?)
        "#,
    )
    .bind(auth.tenant_id)
    .bind(type_id)
    .bind(auth.tenant_id)
    .bind(type_id)
    .fetch_one(pool.get_ref())
    .await?;

    if in_use {
        return Err(ApiError::conflict(
            "Leave type is in use; deactivate it instead",
        ));
    }

    let result = sqlx::query("DELETE FROM leave_types WHERE id = ? AND tenant_id = ?")
        .bind(type_id)
        .bind(auth.tenant_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, type_id, "Failed to delete leave type");
            ApiError::from(e)
        })?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Leave type not found"));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Leave type deleted"
    })))
}
