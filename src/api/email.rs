use crate::auth::auth::AuthUser;
use crate::error::{ApiError, is_duplicate_key};
use crate::model::email::{EmailConfiguration, EmailTemplate};
use crate::utils::db_utils::{build_update_sql, execute_update};
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::Value;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::ToSchema;

const TEMPLATE_COLUMNS: &[&str] = &["name", "subject", "body", "is_active"];

#[derive(Deserialize, ToSchema)]
pub struct CreateTemplate {
    #[schema(example = "leave-approved")]
    pub name: String,
    #[schema(example = "Your leave request was approved")]
    pub subject: String,
    pub body: String,
}

/// Sending mail is out of scope here; this stores per-tenant SMTP settings
/// for whatever relay actually delivers.
#[derive(Deserialize, ToSchema)]
pub struct UpsertEmailConfig {
    pub smtp_host: String,
    #[schema(example = 587)]
    pub smtp_port: Option<u32>,
    pub smtp_username: String,
    /// Write-only; never echoed back
    pub smtp_password: String,
    pub from_address: String,
    pub use_tls: Option<bool>,
}

#[utoipa::path(
    post,
    path = "/api/v1/email/templates",
    request_body = CreateTemplate,
    responses(
        (status = 201, description = "Template created"),
        (status = 400),
        (status = 409, description = "Template name already exists")
    ),
    security(("bearer_auth" = [])),
    tag = "Email"
)]
pub async fn create_template(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateTemplate>,
) -> Result<HttpResponse, ApiError> {
    auth.require_manager_or_admin()?;

    if payload.name.trim().is_empty() || payload.subject.trim().is_empty() {
        return Err(ApiError::validation("name and subject are required"));
    }

    let result = sqlx::query(
        "INSERT INTO email_templates (tenant_id, name, subject, body) VALUES (?, ?, ?, ?)",
    )
    .bind(auth.tenant_id)
    .bind(payload.name.trim())
    .bind(payload.subject.trim())
    .bind(&payload.body)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        if is_duplicate_key(&e) {
            ApiError::conflict("A template with this name already exists")
        } else {
            error!(error = %e, "Failed to create email template");
            ApiError::from(e)
        }
    })?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Template created",
        "id": result.last_insert_id()
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/email/templates",
    responses(
        (status = 200, description = "Templates for the tenant", body = [EmailTemplate])
    ),
    security(("bearer_auth" = [])),
    tag = "Email"
)]
pub async fn list_templates(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, ApiError> {
    auth.require_manager_or_admin()?;

    let templates = sqlx::query_as::<_, EmailTemplate>(
        "SELECT id, tenant_id, name, subject, body, is_active \
         FROM email_templates WHERE tenant_id = ? ORDER BY name",
    )
    .bind(auth.tenant_id)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to fetch email templates");
        ApiError::from(e)
    })?;

    Ok(HttpResponse::Ok().json(templates))
}

#[utoipa::path(
    get,
    path = "/api/v1/email/templates/{template_id}",
    params(("template_id" = u64, Path, description = "Template ID")),
    responses(
        (status = 200, body = EmailTemplate),
        (status = 404)
    ),
    security(("bearer_auth" = [])),
    tag = "Email"
)]
pub async fn get_template(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    auth.require_manager_or_admin()?;

    let template_id = path.into_inner();

    let template = sqlx::query_as::<_, EmailTemplate>(
        "SELECT id, tenant_id, name, subject, body, is_active \
         FROM email_templates WHERE id = ? AND tenant_id = ?",
    )
    .bind(template_id)
    .bind(auth.tenant_id)
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or_else(|| ApiError::not_found("Template not found"))?;

    Ok(HttpResponse::Ok().json(template))
}

#[utoipa::path(
    put,
    path = "/api/v1/email/templates/{template_id}",
    params(("template_id" = u64, Path, description = "Template ID")),
    request_body = Object,
    responses(
        (status = 200, description = "Template updated"),
        (status = 400),
        (status = 404),
        (status = 409, description = "Template name already exists")
    ),
    security(("bearer_auth" = [])),
    tag = "Email"
)]
pub async fn update_template(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> Result<HttpResponse, ApiError> {
    auth.require_manager_or_admin()?;

    let template_id = path.into_inner();

    let update = build_update_sql(
        "email_templates",
        &body,
        TEMPLATE_COLUMNS,
        "id",
        template_id,
        auth.tenant_id,
    )?;

    let affected = execute_update(pool.get_ref(), update).await.map_err(|e| {
        error!(error = %e, template_id, "Failed to update email template");
        ApiError::from(e)
    })?;

    if affected == 0 {
        return Err(ApiError::not_found("Template not found"));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Template updated"
    })))
}

#[utoipa::path(
    delete,
    path = "/api/v1/email/templates/{template_id}",
    params(("template_id" = u64, Path, description = "Template ID")),
    responses(
        (status = 200, description = "Template deleted"),
        (status = 404)
    ),
    security(("bearer_auth" = [])),
    tag = "Email"
)]
pub async fn delete_template(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    auth.require_manager_or_admin()?;

    let template_id = path.into_inner();

    let result = sqlx::query("DELETE FROM email_templates WHERE id = ? AND tenant_id = ?")
        .bind(template_id)
        .bind(auth.tenant_id)
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Template not found"));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Template deleted"
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/email/config",
    responses(
        (status = 200, description = "SMTP settings (password omitted)", body = EmailConfiguration),
        (status = 404, description = "Not configured yet")
    ),
    security(("bearer_auth" = [])),
    tag = "Email"
)]
pub async fn get_email_config(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let config = sqlx::query_as::<_, EmailConfiguration>(
        "SELECT id, tenant_id, smtp_host, smtp_port, smtp_username, from_address, use_tls \
         FROM email_configurations WHERE tenant_id = ?",
    )
    .bind(auth.tenant_id)
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or_else(|| ApiError::not_found("Email configuration not set"))?;

    Ok(HttpResponse::Ok().json(config))
}

#[utoipa::path(
    put,
    path = "/api/v1/email/config",
    request_body = UpsertEmailConfig,
    responses(
        (status = 200, description = "SMTP settings saved"),
        (status = 400),
        (status = 403)
    ),
    security(("bearer_auth" = [])),
    tag = "Email"
)]
pub async fn upsert_email_config(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<UpsertEmailConfig>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    if payload.smtp_host.trim().is_empty() || payload.from_address.trim().is_empty() {
        return Err(ApiError::validation("smtp_host and from_address are required"));
    }

    sqlx::query(
        r#"
        INSERT INTO email_configurations
            (tenant_id, smtp_host, smtp_port, smtp_username, smtp_password, from_address, use_tls)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON DUPLICATE KEY UPDATE
            smtp_host = VALUES(smtp_host),
            smtp_port = VALUES(smtp_port),
            smtp_username = VALUES(smtp_username),
            smtp_password = VALUES(smtp_password),
            from_address = VALUES(from_address),
            use_tls = VALUES(use_tls)
        "#,
    )
    .bind(auth.tenant_id)
    .bind(payload.smtp_host.trim())
    .bind(payload.smtp_port.unwrap_or(587))
    .bind(&payload.smtp_username)
    .bind(&payload.smtp_password)
    .bind(payload.from_address.trim())
    .bind(payload.use_tls.unwrap_or(true))
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to save email configuration");
        ApiError::from(e)
    })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Email configuration saved"
    })))
}
