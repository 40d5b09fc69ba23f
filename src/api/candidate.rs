use std::str::FromStr;

use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::candidate::{Candidate, CandidateStatus};
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateCandidate {
    #[schema(example = 1)]
    pub job_posting_id: u64,
    #[schema(example = "Jane Doe")]
    pub name: String,
    #[schema(example = "jane@email.com", format = "email", value_type = String)]
    pub email: String,
    pub phone: Option<String>,
    pub resume_url: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct CandidateStatusReq {
    #[schema(example = "interview")]
    pub status: String,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct CandidateFilter {
    pub job_posting_id: Option<u64>,
    #[schema(example = "applied")]
    pub status: Option<String>,
}

enum FilterValue<'a> {
    U64(u64),
    Str(&'a str),
}

const CANDIDATE_COLUMNS: &str =
    "id, tenant_id, job_posting_id, name, email, phone, status, resume_url, applied_at";

#[utoipa::path(
    post,
    path = "/api/v1/recruitment/candidates",
    request_body = CreateCandidate,
    responses(
        (status = 201, description = "Candidate created"),
        (status = 400),
        (status = 404, description = "Job posting not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Recruitment"
)]
pub async fn create_candidate(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateCandidate>,
) -> Result<HttpResponse, ApiError> {
    auth.require_manager_or_admin()?;

    if payload.name.trim().is_empty() {
        return Err(ApiError::validation("name must not be empty"));
    }
    if !payload.email.contains('@') {
        return Err(ApiError::validation("email is not valid"));
    }

    let posting_exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM job_postings WHERE id = ? AND tenant_id = ?)",
    )
    .bind(payload.job_posting_id)
    .bind(auth.tenant_id)
    .fetch_one(pool.get_ref())
    .await?;

    if !posting_exists {
        return Err(ApiError::not_found("Job posting not found"));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO candidates (tenant_id, job_posting_id, name, email, phone, resume_url)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(auth.tenant_id)
    .bind(payload.job_posting_id)
    .bind(payload.name.trim())
    .bind(payload.email.trim())
    .bind(&payload.phone)
    .bind(&payload.resume_url)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to create candidate");
        ApiError::from(e)
    })?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Candidate created",
        "id": result.last_insert_id()
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/recruitment/candidates",
    params(CandidateFilter),
    responses(
        (status = 200, description = "Candidates", body = [Candidate])
    ),
    security(("bearer_auth" = [])),
    tag = "Recruitment"
)]
pub async fn list_candidates(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<CandidateFilter>,
) -> Result<HttpResponse, ApiError> {
    auth.require_manager_or_admin()?;

    let mut where_sql = String::from(" WHERE tenant_id = ?");
    let mut args: Vec<FilterValue> = Vec::new();

    if let Some(posting_id) = query.job_posting_id {
        where_sql.push_str(" AND job_posting_id = ?");
        args.push(FilterValue::U64(posting_id));
    }
    if let Some(status) = query.status.as_deref() {
        CandidateStatus::from_str(status)
            .map_err(|_| ApiError::validation(format!("Unknown candidate status '{}'", status)))?;
        where_sql.push_str(" AND status = ?");
        args.push(FilterValue::Str(status));
    }

    let sql = format!(
        "SELECT {} FROM candidates{} ORDER BY applied_at DESC",
        CANDIDATE_COLUMNS, where_sql
    );

    let mut q = sqlx::query_as::<_, Candidate>(&sql).bind(auth.tenant_id);
    for arg in args {
        q = match arg {
            FilterValue::U64(v) => q.bind(v),
            FilterValue::Str(s) => q.bind(s),
        };
    }

    let candidates = q.fetch_all(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to fetch candidates");
        ApiError::from(e)
    })?;

    Ok(HttpResponse::Ok().json(candidates))
}

#[utoipa::path(
    get,
    path = "/api/v1/recruitment/candidates/{candidate_id}",
    params(("candidate_id" = u64, Path, description = "Candidate ID")),
    responses(
        (status = 200, body = Candidate),
        (status = 404)
    ),
    security(("bearer_auth" = [])),
    tag = "Recruitment"
)]
pub async fn get_candidate(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    auth.require_manager_or_admin()?;

    let candidate_id = path.into_inner();

    let sql = format!(
        "SELECT {} FROM candidates WHERE id = ? AND tenant_id = ?",
        CANDIDATE_COLUMNS
    );
    let candidate = sqlx::query_as::<_, Candidate>(&sql)
        .bind(candidate_id)
        .bind(auth.tenant_id)
        .fetch_optional(pool.get_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("Candidate not found"))?;

    Ok(HttpResponse::Ok().json(candidate))
}

#[utoipa::path(
    put,
    path = "/api/v1/recruitment/candidates/{candidate_id}/status",
    params(("candidate_id" = u64, Path, description = "Candidate ID")),
    request_body = CandidateStatusReq,
    responses(
        (status = 200, description = "Candidate status updated"),
        (status = 400),
        (status = 404)
    ),
    security(("bearer_auth" = [])),
    tag = "Recruitment"
)]
pub async fn update_candidate_status(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<CandidateStatusReq>,
) -> Result<HttpResponse, ApiError> {
    auth.require_manager_or_admin()?;

    let candidate_id = path.into_inner();

    let status = CandidateStatus::from_str(&body.status).map_err(|_| {
        ApiError::validation(format!("Unknown candidate status '{}'", body.status))
    })?;

    let result = sqlx::query("UPDATE candidates SET status = ? WHERE id = ? AND tenant_id = ?")
        .bind(status.to_string())
        .bind(candidate_id)
        .bind(auth.tenant_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, candidate_id, "Failed to update candidate status");
            ApiError::from(e)
        })?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Candidate not found"));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Candidate status updated"
    })))
}

#[utoipa::path(
    delete,
    path = "/api/v1/recruitment/candidates/{candidate_id}",
    params(("candidate_id" = u64, Path, description = "Candidate ID")),
    responses(
        (status = 200, description = "Candidate deleted"),
        (status = 404)
    ),
    security(("bearer_auth" = [])),
    tag = "Recruitment"
)]
pub async fn delete_candidate(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    auth.require_manager_or_admin()?;

    let candidate_id = path.into_inner();

    let result = sqlx::query("DELETE FROM candidates WHERE id = ? AND tenant_id = ?")
        .bind(candidate_id)
        .bind(auth.tenant_id)
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Candidate not found"));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Candidate deleted"
    })))
}
