use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct EmailTemplate {
    pub id: u64,
    pub tenant_id: u64,
    #[schema(example = "leave-approved")]
    pub name: String,
    pub subject: String,
    pub body: String,
    pub is_active: bool,
}

/// Per-tenant SMTP settings. The password column is write-only: it never
/// appears in this struct and therefore never in a response body.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct EmailConfiguration {
    pub id: u64,
    pub tenant_id: u64,
    pub smtp_host: String,
    pub smtp_port: u32,
    pub smtp_username: String,
    pub from_address: String,
    pub use_tls: bool,
}
