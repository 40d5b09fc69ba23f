use crate::{
    api::leave_balance::insert_missing_balances,
    auth::auth::AuthUser,
    config::Config,
    error::{ApiError, is_duplicate_key},
    model::employee::{Employee, next_employee_code},
    utils::db_utils::{build_update_sql, execute_update},
};
use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, error, info};
use utoipa::{IntoParams, ToSchema};

const UPDATABLE_COLUMNS: &[&str] = &[
    "first_name",
    "last_name",
    "email",
    "phone",
    "gender",
    "hire_date",
    "status",
    "user_id",
];

#[derive(Deserialize, Serialize, ToSchema)]
pub struct CreateEmployee {
    #[schema(example = "John")]
    pub first_name: String,
    #[schema(example = "Doe")]
    pub last_name: String,
    #[schema(example = "john@email.com", format = "email", value_type = String)]
    pub email: String,
    pub phone: Option<String>,
    #[schema(example = "male")]
    pub gender: Option<String>,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub hire_date: NaiveDate,
    /// Login account to link, if one exists already
    pub user_id: Option<u64>,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct EmployeeQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub status: Option<String>,
    /// Search by name or email
    pub search: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeListResponse {
    pub data: Vec<Employee>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 10)]
    pub total: i64,
}

enum FilterValue<'a> {
    Str(&'a str),
}

const EMPLOYEE_COLUMNS: &str = "id, tenant_id, user_id, employee_code, first_name, last_name, \
                                email, phone, gender, hire_date, status";

/// Create Employee
#[utoipa::path(
    post,
    path = "/api/v1/employees",
    request_body = CreateEmployee,
    responses(
        (status = 201, description = "Employee created with generated code and seeded balances", body = Object, example = json!({
            "message": "Employee created",
            "id": 12,
            "employee_code": "EMP-012"
        })),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Email already in use")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<CreateEmployee>,
) -> Result<HttpResponse, ApiError> {
    auth.require_manager_or_admin()?;

    if payload.first_name.trim().is_empty() || payload.last_name.trim().is_empty() {
        return Err(ApiError::validation("first_name and last_name are required"));
    }
    if !payload.email.contains('@') {
        return Err(ApiError::validation("email is not valid"));
    }

    let prefix = config.employee_code_prefix.as_str();

    // The max-scan is only a hint for the next code; the unique key on
    // (tenant_id, employee_code) is what actually prevents duplicates, so a
    // concurrent insert shows up as a duplicate-key error and we re-scan once.
    for attempt in 0..2 {
        let mut tx = pool.begin().await?;

        let existing: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT employee_code FROM employees
            WHERE tenant_id = ? AND employee_code LIKE CONCAT(?, '%')
            FOR UPDATE
            "#,
        )
        .bind(auth.tenant_id)
        .bind(prefix)
        .fetch_all(&mut *tx)
        .await?;

        let code = next_employee_code(prefix, existing.iter().map(String::as_str));

        let inserted = sqlx::query(
            r#"
            INSERT INTO employees
                (tenant_id, user_id, employee_code, first_name, last_name,
                 email, phone, gender, hire_date)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(auth.tenant_id)
        .bind(payload.user_id)
        .bind(&code)
        .bind(payload.first_name.trim())
        .bind(payload.last_name.trim())
        .bind(payload.email.trim())
        .bind(&payload.phone)
        .bind(&payload.gender)
        .bind(payload.hire_date)
        .execute(&mut *tx)
        .await;

        let employee_id = match inserted {
            Ok(result) => result.last_insert_id(),
            Err(e) if is_duplicate_key(&e) => {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.message().contains("uq_employees_email") {
                        return Err(ApiError::conflict(
                            "An employee with this email already exists",
                        ));
                    }
                }
                if attempt == 0 {
                    debug!(%code, "Employee code raced; rescanning");
                    tx.rollback().await?;
                    continue;
                }
                return Err(ApiError::conflict("Could not allocate an employee code"));
            }
            Err(e) => {
                error!(error = %e, "Failed to create employee");
                return Err(e.into());
            }
        };

        // Onboarding seeds a balance row per applicable leave type, in the
        // same transaction as the insert.
        let seeded = insert_missing_balances(&mut tx, auth.tenant_id, employee_id)
            .await
            .map_err(|e| {
                error!(error = %e, employee_id, "Failed to seed leave balances");
                ApiError::from(e)
            })?;

        tx.commit().await?;

        info!(
            tenant_id = auth.tenant_id,
            employee_id,
            %code,
            seeded,
            "Employee created"
        );

        return Ok(HttpResponse::Created().json(json!({
            "message": "Employee created",
            "id": employee_id,
            "employee_code": code
        })));
    }

    unreachable!("employee creation loop always returns")
}

// -------------------- Handler --------------------

#[utoipa::path(
    get,
    path = "/api/v1/employees",
    params(EmployeeQuery),
    responses(
        (status = 200, description = "Paginated employee list", body = EmployeeListResponse)
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_employees(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<EmployeeQuery>,
) -> Result<HttpResponse, ApiError> {
    auth.require_manager_or_admin()?;

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;

    // ---------- build WHERE clause dynamically ----------
    let like = query.search.as_deref().map(|s| format!("%{}%", s));
    let mut where_sql = String::from(" WHERE tenant_id = ?");
    let mut args: Vec<FilterValue> = Vec::new();

    if let Some(status) = query.status.as_deref() {
        where_sql.push_str(" AND status = ?");
        args.push(FilterValue::Str(status));
    }

    if let Some(like) = like.as_deref() {
        where_sql.push_str(" AND (first_name LIKE ? OR last_name LIKE ? OR email LIKE ?)");
        args.push(FilterValue::Str(like));
        args.push(FilterValue::Str(like));
        args.push(FilterValue::Str(like));
    }

    // ---------- total count ----------
    let count_sql = format!("SELECT COUNT(*) FROM employees{}", where_sql);
    debug!(sql = %count_sql, "Counting employees");

    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql).bind(auth.tenant_id);
    for arg in &args {
        count_q = match arg {
            FilterValue::Str(s) => count_q.bind(*s),
        };
    }

    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to count employees");
        ApiError::from(e)
    })?;

    // ---------- data query ----------
    let data_sql = format!(
        "SELECT {} FROM employees{} ORDER BY id DESC LIMIT ? OFFSET ?",
        EMPLOYEE_COLUMNS, where_sql
    );
    debug!(sql = %data_sql, page, per_page, offset, "Fetching employees");

    let mut data_q = sqlx::query_as::<_, Employee>(&data_sql).bind(auth.tenant_id);
    for arg in &args {
        data_q = match arg {
            FilterValue::Str(s) => data_q.bind(*s),
        };
    }

    let employees = data_q
        .bind(per_page as i64)
        .bind(offset as i64)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to fetch employees");
            ApiError::from(e)
        })?;

    Ok(HttpResponse::Ok().json(EmployeeListResponse {
        data: employees,
        page,
        per_page,
        total,
    }))
}

/// Get Employee by ID
#[utoipa::path(
    get,
    path = "/api/v1/employees/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Employee found", body = Employee),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "message": "Employee not found"
        }))
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let employee_id = path.into_inner();

    // Employees can read their own record; everything else needs management.
    if auth.is_employee() && auth.employee_id != Some(employee_id) {
        return Err(ApiError::not_found("Employee not found"));
    }

    let sql = format!(
        "SELECT {} FROM employees WHERE id = ? AND tenant_id = ?",
        EMPLOYEE_COLUMNS
    );
    let employee = sqlx::query_as::<_, Employee>(&sql)
        .bind(employee_id)
        .bind(auth.tenant_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, employee_id, "Failed to fetch employee");
            ApiError::from(e)
        })?
        .ok_or_else(|| ApiError::not_found("Employee not found"))?;

    Ok(HttpResponse::Ok().json(employee))
}

/// Update Employee
#[utoipa::path(
    put,
    path = "/api/v1/employees/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee ID")
    ),
    request_body = Object,
    responses(
        (status = 200, description = "Employee updated successfully"),
        (status = 400, description = "Bad request"),
        (status = 404, description = "Employee not found"),
        (status = 409, description = "Email already in use")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> Result<HttpResponse, ApiError> {
    auth.require_manager_or_admin()?;

    let employee_id = path.into_inner();

    let update = build_update_sql(
        "employees",
        &body,
        UPDATABLE_COLUMNS,
        "id",
        employee_id,
        auth.tenant_id,
    )?;

    let affected = execute_update(pool.get_ref(), update).await.map_err(|e| {
        error!(error = %e, employee_id, "Failed to update employee");
        ApiError::from(e)
    })?;

    if affected == 0 {
        return Err(ApiError::not_found("Employee not found"));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Employee updated successfully"
    })))
}

/// Delete Employee
#[utoipa::path(
    delete,
    path = "/api/v1/employees/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Successfully deleted", body = Object, example = json!({
            "message": "Successfully deleted"
        })),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let employee_id = path.into_inner();

    // The linked login account goes with the employee; both deletions commit
    // or roll back together. Balances and requests follow via the schema's
    // cascade on employee_id.
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM users WHERE tenant_id = ? AND employee_id = ?")
        .bind(auth.tenant_id)
        .bind(employee_id)
        .execute(&mut *tx)
        .await?;

    let result = sqlx::query("DELETE FROM employees WHERE id = ? AND tenant_id = ?")
        .bind(employee_id)
        .bind(auth.tenant_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            error!(error = %e, employee_id, "Failed to delete employee");
            ApiError::from(e)
        })?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Employee not found"));
    }

    tx.commit().await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Successfully deleted"
    })))
}
