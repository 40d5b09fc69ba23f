use std::str::FromStr;

use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::job_posting::{JobPosting, PostingStatus};
use crate::utils::db_utils::{build_update_sql, execute_update};
use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

const UPDATABLE_COLUMNS: &[&str] = &["title", "description", "department", "status", "closes_at"];

#[derive(Deserialize, ToSchema)]
pub struct CreatePosting {
    #[schema(example = "Backend Engineer")]
    pub title: String,
    pub description: String,
    pub department: Option<String>,
    #[schema(example = "2026-03-01", format = "date", value_type = String)]
    pub closes_at: Option<NaiveDate>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct PostingFilter {
    #[schema(example = "open")]
    pub status: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/v1/recruitment/postings",
    request_body = CreatePosting,
    responses(
        (status = 201, description = "Job posting created"),
        (status = 400),
        (status = 403)
    ),
    security(("bearer_auth" = [])),
    tag = "Recruitment"
)]
pub async fn create_posting(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreatePosting>,
) -> Result<HttpResponse, ApiError> {
    auth.require_manager_or_admin()?;

    if payload.title.trim().is_empty() {
        return Err(ApiError::validation("title must not be empty"));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO job_postings (tenant_id, title, description, department, closes_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(auth.tenant_id)
    .bind(payload.title.trim())
    .bind(&payload.description)
    .bind(&payload.department)
    .bind(payload.closes_at)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to create job posting");
        ApiError::from(e)
    })?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Job posting created",
        "id": result.last_insert_id()
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/recruitment/postings",
    params(PostingFilter),
    responses(
        (status = 200, description = "Job postings", body = [JobPosting])
    ),
    security(("bearer_auth" = [])),
    tag = "Recruitment"
)]
pub async fn list_postings(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<PostingFilter>,
) -> Result<HttpResponse, ApiError> {
    let mut sql = String::from(
        "SELECT id, tenant_id, title, description, department, status, posted_at, closes_at \
         FROM job_postings WHERE tenant_id = ?",
    );
    if let Some(status) = query.status.as_deref() {
        PostingStatus::from_str(status)
            .map_err(|_| ApiError::validation(format!("Unknown posting status '{}'", status)))?;
        sql.push_str(" AND status = ?");
    }
    sql.push_str(" ORDER BY posted_at DESC");

    let mut q = sqlx::query_as::<_, JobPosting>(&sql).bind(auth.tenant_id);
    if let Some(status) = query.status.as_deref() {
        q = q.bind(status);
    }

    let postings = q.fetch_all(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to fetch job postings");
        ApiError::from(e)
    })?;

    Ok(HttpResponse::Ok().json(postings))
}

#[utoipa::path(
    get,
    path = "/api/v1/recruitment/postings/{posting_id}",
    params(("posting_id" = u64, Path, description = "Job posting ID")),
    responses(
        (status = 200, body = JobPosting),
        (status = 404)
    ),
    security(("bearer_auth" = [])),
    tag = "Recruitment"
)]
pub async fn get_posting(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let posting_id = path.into_inner();

    let posting = sqlx::query_as::<_, JobPosting>(
        "SELECT id, tenant_id, title, description, department, status, posted_at, closes_at \
         FROM job_postings WHERE id = ? AND tenant_id = ?",
    )
    .bind(posting_id)
    .bind(auth.tenant_id)
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or_else(|| ApiError::not_found("Job posting not found"))?;

    Ok(HttpResponse::Ok().json(posting))
}

#[utoipa::path(
    put,
    path = "/api/v1/recruitment/postings/{posting_id}",
    params(("posting_id" = u64, Path, description = "Job posting ID")),
    request_body = Object,
    responses(
        (status = 200, description = "Job posting updated"),
        (status = 400),
        (status = 404)
    ),
    security(("bearer_auth" = [])),
    tag = "Recruitment"
)]
pub async fn update_posting(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> Result<HttpResponse, ApiError> {
    auth.require_manager_or_admin()?;

    let posting_id = path.into_inner();

    if let Some(status) = body.get("status").and_then(Value::as_str) {
        PostingStatus::from_str(status)
            .map_err(|_| ApiError::validation(format!("Unknown posting status '{}'", status)))?;
    }

    let update = build_update_sql(
        "job_postings",
        &body,
        UPDATABLE_COLUMNS,
        "id",
        posting_id,
        auth.tenant_id,
    )?;

    let affected = execute_update(pool.get_ref(), update).await.map_err(|e| {
        error!(error = %e, posting_id, "Failed to update job posting");
        ApiError::from(e)
    })?;

    if affected == 0 {
        return Err(ApiError::not_found("Job posting not found"));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Job posting updated"
    })))
}

#[utoipa::path(
    delete,
    path = "/api/v1/recruitment/postings/{posting_id}",
    params(("posting_id" = u64, Path, description = "Job posting ID")),
    responses(
        (status = 200, description = "Job posting deleted"),
        (status = 404),
        (status = 409, description = "Posting still has candidates")
    ),
    security(("bearer_auth" = [])),
    tag = "Recruitment"
)]
pub async fn delete_posting(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    auth.require_manager_or_admin()?;

    let posting_id = path.into_inner();

    let has_candidates = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM candidates WHERE tenant_id = ? AND job_posting_id = ?)",
    )
    .bind(auth.tenant_id)
    .bind(posting_id)
    .fetch_one(pool.get_ref())
    .await?;

    if has_candidates {
        return Err(ApiError::conflict(
            "Posting still has candidates; close it instead",
        ));
    }

    let result = sqlx::query("DELETE FROM job_postings WHERE id = ? AND tenant_id = ?")
        .bind(posting_id)
        .bind(auth.tenant_id)
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Job posting not found"));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Job posting deleted"
    })))
}
