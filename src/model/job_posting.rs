use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PostingStatus {
    Open,
    Closed,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct JobPosting {
    pub id: u64,
    pub tenant_id: u64,
    #[schema(example = "Backend Engineer")]
    pub title: String,
    pub description: String,
    pub department: Option<String>,
    #[schema(example = "open")]
    pub status: String,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub posted_at: Option<DateTime<Utc>>,
    #[schema(value_type = Option<String>, format = "date")]
    pub closes_at: Option<NaiveDate>,
}
